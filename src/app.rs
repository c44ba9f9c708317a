//! Subcommand execution

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use shrep_config::{Config, ShaderWatcher, WatchEvent};
use shrep_core::{CompilerTarget, Session, VariantSettings};

use crate::cli::{CliCommand, CycleOptions, USAGE};
use crate::commands::{Command, dispatch, dispatch_all};
use crate::render::{write_keywords, write_reports};

/// How long the watch loop blocks before polling again
const WATCH_POLL: Duration = Duration::from_secs(1);

pub fn run(command: CliCommand) -> anyhow::Result<()> {
    match command {
        CliCommand::Help => {
            println!("{USAGE}");
            Ok(())
        }
        CliCommand::InitConfig => {
            let path = Config::create_default_config()?;
            println!("Wrote {}", path.display());
            Ok(())
        }
        CliCommand::Keywords { shader } => {
            let mut session = Session::new(CompilerTarget::default(), VariantSettings::default());
            dispatch(&mut session, Command::SelectShader(Some(shader.clone())))
                .with_context(|| format!("cannot inspect {}", shader.display()))?;
            write_keywords(&mut io::stdout().lock(), &session)?;
            Ok(())
        }
        CliCommand::Report(options) => {
            let config = Config::load()?;
            let mut session = session_for(&config);
            dispatch_all(&mut session, options.setup_commands())?;
            compile_and_print(&mut session)
        }
        CliCommand::Watch(options) => {
            let config = Config::load()?;
            watch(&options, config)
        }
    }
}

/// Session configured from `config`
pub fn session_for(config: &Config) -> Session {
    Session::new(config.compiler_target(), config.variant_settings())
}

/// Run one compile-and-report cycle and print the reports
pub fn compile_and_print(session: &mut Session) -> anyhow::Result<()> {
    dispatch(session, Command::CompileAndReport)?;

    let mut out = io::stdout().lock();
    if let Some(pass) = session.active_pass() {
        writeln!(
            out,
            "Pass '{}' with keywords [{}] using {}",
            pass.name(),
            session.current_keywords().join(" "),
            session.compiler()
        )?;
    }
    write_reports(&mut out, session.reports())?;
    out.flush()?;
    Ok(())
}

fn watch(options: &CycleOptions, config: Config) -> anyhow::Result<()> {
    let config_file = Config::config_file_path().ok();
    let debounce = Duration::from_millis(config.watch.debounce_ms);

    let mut session = session_for(&config);
    dispatch_all(&mut session, options.setup_commands())?;
    compile_and_print(&mut session)?;

    let mut watcher = ShaderWatcher::new(config_file.clone(), &shader_paths(&session), debounce)?;
    log::info!("Watching for changes, press Ctrl-C to stop");

    loop {
        let Some(first) = watcher.recv_timeout(WATCH_POLL) else {
            continue;
        };

        let mut shader_changed = false;
        let mut new_config = None;
        for event in std::iter::once(first).chain(watcher.drain_events()) {
            match event {
                WatchEvent::ShaderChanged(path) => {
                    log::debug!("Change in {:?}", path);
                    shader_changed = true;
                }
                WatchEvent::ConfigChanged(config) => new_config = Some(config),
                WatchEvent::WatchError(e) => log::warn!("Watcher: {}", e),
            }
        }

        if let Some(config) = new_config {
            log::info!("Applying reloaded configuration");
            session.set_settings(config.variant_settings());
            if options.compiler.is_none() {
                session.set_compiler(config.compiler_target());
            }
        } else if !shader_changed {
            continue;
        }

        if shader_changed {
            let refreshed = dispatch(&mut session, Command::Refresh)
                .and_then(|()| dispatch_all(&mut session, options.selection_commands()));
            if let Err(e) = refreshed {
                log::error!("Refresh failed: {}", e);
                continue;
            }

            let paths = shader_paths(&session);
            if paths != watcher.shader_paths() {
                watcher = ShaderWatcher::new(config_file.clone(), &paths, debounce)?;
            }
        }

        if let Err(e) = compile_and_print(&mut session) {
            log::error!("Compile cycle failed: {:#}", e);
        }
    }
}

fn shader_paths(session: &Session) -> Vec<PathBuf> {
    session
        .shader()
        .map(|shader| shader.watched_paths())
        .unwrap_or_default()
        .into_iter()
        .map(|path| path.canonicalize().unwrap_or(path))
        .collect()
}
