//! External compiler invocation
//!
//! Runs the offline compiler once per stage. Standard output is read line by
//! line on a reader thread and delivered over a channel while the caller
//! blocks until the process exits.

use std::ffi::OsString;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;

use thiserror::Error;

use crate::stage::Stage;

/// Which offline compiler to run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CompilerTarget {
    /// Arm Mobile Studio compiler, looked up on PATH
    #[default]
    Malioc,
    /// Legacy Mali Offline Compiler (6.4 and earlier), looked up on PATH
    Malisc,
    /// Explicit executable location
    Custom(PathBuf),
}

impl CompilerTarget {
    /// Program to execute
    pub fn program(&self) -> PathBuf {
        let name = match self {
            CompilerTarget::Malioc => "malioc",
            CompilerTarget::Malisc => "malisc",
            CompilerTarget::Custom(path) => return path.clone(),
        };
        PathBuf::from(format!("{name}{}", std::env::consts::EXE_SUFFIX))
    }

    /// What to check when the compiler cannot be started
    pub fn launch_hint(&self) -> &'static str {
        match self {
            CompilerTarget::Malioc => "Is Arm Mobile Studio installed and included in the PATH?",
            CompilerTarget::Malisc => "Is the Mali Offline Compiler installed and included in the PATH?",
            CompilerTarget::Custom(_) => "Has the compiler location been set?",
        }
    }
}

impl std::fmt::Display for CompilerTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompilerTarget::Malioc => f.write_str("malioc"),
            CompilerTarget::Malisc => f.write_str("malisc"),
            CompilerTarget::Custom(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Error, Debug)]
pub enum InvokeError {
    #[error("unable to start {program:?}: {source}")]
    Launch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("standard output of {0:?} was not captured")]
    MissingStdout(PathBuf),

    #[error("failed waiting for {program:?}: {source}")]
    Wait {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Captured result of one stage run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutput {
    /// Non-empty output lines, each newline-terminated
    pub text: String,
    pub lines: usize,
    /// Process exit code; `None` when killed by a signal
    pub exit_code: Option<i32>,
}

/// Line accumulator reused across stage runs
#[derive(Debug, Default)]
struct OutputBuffer {
    text: String,
    lines: usize,
}

impl OutputBuffer {
    fn reset(&mut self) {
        self.text.clear();
        self.lines = 0;
    }

    fn push_line(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }
        self.lines += 1;
        self.text.push_str(line);
        self.text.push('\n');
    }
}

/// Runs the configured compiler, one stage at a time
#[derive(Debug, Default)]
pub struct CompilerInvoker {
    target: CompilerTarget,
    buffer: OutputBuffer,
}

impl CompilerInvoker {
    pub fn new(target: CompilerTarget) -> Self {
        Self {
            target,
            buffer: OutputBuffer::default(),
        }
    }

    pub fn target(&self) -> &CompilerTarget {
        &self.target
    }

    pub fn set_target(&mut self, target: CompilerTarget) {
        self.target = target;
    }

    /// Arguments for one stage: `<flag> <path> -D <DEFINE>`
    pub fn stage_args(stage: Stage, path: &Path) -> Vec<OsString> {
        vec![
            OsString::from(stage.flag()),
            path.as_os_str().to_owned(),
            OsString::from("-D"),
            OsString::from(stage.define()),
        ]
    }

    /// Compile `path` for `stage` and capture the compiler's standard output.
    ///
    /// Blocks until the process exits. A non-zero exit code still produces
    /// output; only failing to run the process is an error.
    pub fn run_stage(&mut self, path: &Path, stage: Stage) -> Result<StageOutput, InvokeError> {
        self.buffer.reset();

        let program = self.target.program();
        log::debug!("Running {:?} for the {} stage of {:?}", program, stage, path);

        let mut child = Command::new(&program)
            .args(Self::stage_args(stage, path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| InvokeError::Launch {
                program: program.clone(),
                source,
            })?;

        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(InvokeError::MissingStdout(program));
        };

        let (line_tx, line_rx) = mpsc::channel::<String>();

        // Reader thread - forwards each stdout line until EOF
        let reader = thread::spawn(move || {
            let mut reader = BufReader::new(stdout);
            let mut raw = Vec::new();
            loop {
                raw.clear();
                match reader.read_until(b'\n', &mut raw) {
                    Ok(0) => break, // EOF
                    Ok(_) => {
                        let line = String::from_utf8_lossy(&raw);
                        let line = line.trim_end_matches(['\n', '\r']).to_string();
                        if line_tx.send(line).is_err() {
                            break; // Channel closed
                        }
                    }
                    Err(e) => {
                        log::error!("Compiler output read error: {}", e);
                        break;
                    }
                }
            }
            log::debug!("Compiler reader thread exiting");
        });

        // Ends once the reader drops its sender
        for line in line_rx {
            self.buffer.push_line(&line);
        }

        if reader.join().is_err() {
            log::warn!("Compiler reader thread panicked");
        }

        let status = child.wait().map_err(|source| InvokeError::Wait {
            program: program.clone(),
            source,
        })?;

        if status.success() {
            log::debug!("{} stage finished with {} lines", stage, self.buffer.lines);
        } else {
            log::info!(
                "{:?} exited with {} for the {} stage; keeping its output",
                program,
                status,
                stage
            );
        }

        Ok(StageOutput {
            text: self.buffer.text.clone(),
            lines: self.buffer.lines,
            exit_code: status.code(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_names() {
        let suffix = std::env::consts::EXE_SUFFIX;
        assert_eq!(CompilerTarget::Malioc.program(), PathBuf::from(format!("malioc{suffix}")));
        assert_eq!(CompilerTarget::Malisc.program(), PathBuf::from(format!("malisc{suffix}")));
        assert_eq!(
            CompilerTarget::Custom(PathBuf::from("/opt/mali/malioc")).program(),
            PathBuf::from("/opt/mali/malioc")
        );
    }

    #[test]
    fn stage_argument_convention() {
        let args = CompilerInvoker::stage_args(Stage::Geometry, Path::new("/tmp/v.shader"));
        assert_eq!(args, vec!["-g", "/tmp/v.shader", "-D", "GEOMETRY"]);
    }

    #[test]
    fn output_buffer_skips_empty_lines() {
        let mut buffer = OutputBuffer::default();
        buffer.push_line("first");
        buffer.push_line("");
        buffer.push_line("second");
        assert_eq!(buffer.text, "first\nsecond\n");
        assert_eq!(buffer.lines, 2);

        buffer.reset();
        assert!(buffer.text.is_empty());
        assert_eq!(buffer.lines, 0);
    }

    #[test]
    fn missing_compiler_is_launch_error() {
        let mut invoker = CompilerInvoker::new(CompilerTarget::Custom(PathBuf::from(
            "/nonexistent/shrep/compiler",
        )));
        let err = invoker
            .run_stage(Path::new("/tmp/whatever.shader"), Stage::Vertex)
            .unwrap_err();
        assert!(matches!(err, InvokeError::Launch { .. }));
    }

    // `/bin/sh -v <script> -D VERTEX` runs the script with `$1 = -D` and
    // `$2 = VERTEX`, which stands in for a real compiler.
    #[cfg(unix)]
    #[test]
    fn captures_stdout_lines() {
        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("fake.shader");
        std::fs::write(&script, "echo \"define=$2\"\necho\necho \"flag=$1\"\nexit 3\n").unwrap();

        let mut invoker = CompilerInvoker::new(CompilerTarget::Custom(PathBuf::from("/bin/sh")));
        let output = invoker.run_stage(&script, Stage::Vertex).unwrap();

        assert_eq!(output.text, "define=VERTEX\nflag=-D\n");
        assert_eq!(output.lines, 2);
        assert_eq!(output.exit_code, Some(3));
    }

    #[cfg(unix)]
    #[test]
    fn buffer_is_reset_between_stages() {
        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("fake.shader");
        std::fs::write(&script, "echo \"$2\"\n").unwrap();

        let mut invoker = CompilerInvoker::new(CompilerTarget::Custom(PathBuf::from("/bin/sh")));
        let vertex = invoker.run_stage(&script, Stage::Vertex).unwrap();
        let fragment = invoker.run_stage(&script, Stage::Fragment).unwrap();

        assert_eq!(vertex.text, "VERTEX\n");
        assert_eq!(fragment.text, "FRAGMENT\n");
    }
}
