//! Command enum for the UI host seam
//!
//! Commands represent what the host asks of a session without side effects.
//! Front ends build Commands which are then executed by `dispatch`.

use std::path::PathBuf;

use shrep_core::{CompilerTarget, ShaderAsset, Session, SessionError, VariantOracle};

/// Operations a UI host can request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // === Target ===
    /// Load and select the shader at the path, or deselect with `None`
    SelectShader(Option<PathBuf>),
    /// Re-read the selected shader and rebuild its passes
    Refresh,

    // === Selection ===
    /// Make a pass active
    SelectPass(usize),
    /// Choose an option within a keyword group of the active pass
    SelectKeywordOption { group: usize, option: usize },

    // === Reports ===
    /// Compile the active variant for every supported stage
    CompileAndReport,
    /// Drop every stage report
    ClearReport,

    // === Compiler ===
    /// Switch the external compiler
    SetCompiler(CompilerTarget),
}

/// Apply `command` to `session`
pub fn dispatch<O: VariantOracle>(
    session: &mut Session<O>,
    command: Command,
) -> Result<(), SessionError> {
    log::debug!("Dispatching {:?}", command);
    match command {
        Command::SelectShader(Some(path)) => {
            let asset = ShaderAsset::load(&path)?;
            session.select_shader(Some(asset));
        }
        Command::SelectShader(None) => {
            session.select_shader(None);
        }
        Command::Refresh => session.refresh()?,
        Command::SelectPass(index) => session.select_pass(index)?,
        Command::SelectKeywordOption { group, option } => {
            session.select_keyword_option(group, option)?
        }
        Command::CompileAndReport => session.compile_and_report()?,
        Command::ClearReport => session.clear_reports(),
        Command::SetCompiler(target) => session.set_compiler(target),
    }
    Ok(())
}

/// Apply each command in order, stopping at the first failure
pub fn dispatch_all<O: VariantOracle>(
    session: &mut Session<O>,
    commands: impl IntoIterator<Item = Command>,
) -> Result<(), SessionError> {
    commands
        .into_iter()
        .try_for_each(|command| dispatch(session, command))
}
