//! Command-line argument parsing

use std::path::PathBuf;

use shrep_core::CompilerTarget;
use thiserror::Error;

use crate::commands::Command;

pub const USAGE: &str = "\
Usage:
  shrep keywords <shader>
  shrep report <shader> [--pass N] [--select GROUP=OPTION]... [--compiler malioc|malisc|PATH]
  shrep watch <shader> [--pass N] [--select GROUP=OPTION]... [--compiler malioc|malisc|PATH]
  shrep init-config

<shader> is a .toml manifest or a bare shader source file.
Set RUST_LOG=debug for detailed logging.";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CliError {
    #[error("missing subcommand")]
    MissingSubcommand,

    #[error("unknown subcommand '{0}'")]
    UnknownSubcommand(String),

    #[error("missing shader path")]
    MissingShader,

    #[error("option '{0}' needs a value")]
    MissingValue(String),

    #[error("invalid value '{value}' for '{option}'")]
    InvalidValue { option: String, value: String },

    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),
}

/// Options shared by `report` and `watch`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOptions {
    pub shader: PathBuf,
    pub pass: Option<usize>,
    /// `(group, option)` pairs, applied in order
    pub selections: Vec<(usize, usize)>,
    pub compiler: Option<CompilerTarget>,
}

impl CycleOptions {
    /// Commands preparing the session for a compile-and-report cycle
    pub fn setup_commands(&self) -> Vec<Command> {
        let mut commands = Vec::with_capacity(self.selections.len() + 3);
        if let Some(target) = &self.compiler {
            commands.push(Command::SetCompiler(target.clone()));
        }
        commands.push(Command::SelectShader(Some(self.shader.clone())));
        commands.extend(self.selection_commands());
        commands
    }

    /// Pass and keyword choices, reapplied after every refresh
    pub fn selection_commands(&self) -> Vec<Command> {
        let mut commands = Vec::with_capacity(self.selections.len() + 1);
        if let Some(pass) = self.pass {
            commands.push(Command::SelectPass(pass));
        }
        commands.extend(
            self.selections
                .iter()
                .map(|&(group, option)| Command::SelectKeywordOption { group, option }),
        );
        commands
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Keywords { shader: PathBuf },
    Report(CycleOptions),
    Watch(CycleOptions),
    InitConfig,
    Help,
}

/// Parse arguments, program name excluded
pub fn parse_args<I, S>(args: I) -> Result<CliCommand, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut args = args.into_iter().map(Into::into);
    let subcommand = args.next().ok_or(CliError::MissingSubcommand)?;

    match subcommand.as_str() {
        "keywords" => {
            let shader = args.next().ok_or(CliError::MissingShader)?;
            if let Some(extra) = args.next() {
                return Err(CliError::UnexpectedArgument(extra));
            }
            Ok(CliCommand::Keywords {
                shader: PathBuf::from(shader),
            })
        }
        "report" => Ok(CliCommand::Report(parse_cycle_options(args)?)),
        "watch" => Ok(CliCommand::Watch(parse_cycle_options(args)?)),
        "init-config" => Ok(CliCommand::InitConfig),
        "help" | "-h" | "--help" => Ok(CliCommand::Help),
        other => Err(CliError::UnknownSubcommand(other.to_string())),
    }
}

fn parse_cycle_options(mut args: impl Iterator<Item = String>) -> Result<CycleOptions, CliError> {
    let mut shader = None;
    let mut pass = None;
    let mut selections = Vec::new();
    let mut compiler = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--pass" | "-p" => {
                let value = args.next().ok_or_else(|| CliError::MissingValue(arg.clone()))?;
                pass = Some(parse_index(&arg, &value)?);
            }
            "--select" | "-s" => {
                let value = args.next().ok_or_else(|| CliError::MissingValue(arg.clone()))?;
                selections.push(parse_selection(&arg, &value)?);
            }
            "--compiler" | "-c" => {
                let value = args.next().ok_or_else(|| CliError::MissingValue(arg.clone()))?;
                compiler = Some(parse_compiler(&value));
            }
            _ if arg.starts_with('-') => return Err(CliError::UnexpectedArgument(arg)),
            _ if shader.is_none() => shader = Some(PathBuf::from(arg)),
            _ => return Err(CliError::UnexpectedArgument(arg)),
        }
    }

    Ok(CycleOptions {
        shader: shader.ok_or(CliError::MissingShader)?,
        pass,
        selections,
        compiler,
    })
}

fn parse_index(option: &str, value: &str) -> Result<usize, CliError> {
    value.parse().map_err(|_| CliError::InvalidValue {
        option: option.to_string(),
        value: value.to_string(),
    })
}

fn parse_selection(option: &str, value: &str) -> Result<(usize, usize), CliError> {
    let invalid = || CliError::InvalidValue {
        option: option.to_string(),
        value: value.to_string(),
    };
    let (group, choice) = value.split_once('=').ok_or_else(invalid)?;
    let group = group.trim().parse().map_err(|_| invalid())?;
    let choice = choice.trim().parse().map_err(|_| invalid())?;
    Ok((group, choice))
}

/// `malioc` and `malisc` name the known compilers; anything else is a path
pub fn parse_compiler(value: &str) -> CompilerTarget {
    match value {
        "malioc" => CompilerTarget::Malioc,
        "malisc" => CompilerTarget::Malisc,
        path => CompilerTarget::Custom(PathBuf::from(path)),
    }
}
