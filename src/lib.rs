//! shrep - Shader variant explorer and offline compiler reports
//!
//! The implementation lives in:
//! - `shrep-scan` - Directive scanning and keyword indexing
//! - `shrep-core` - Session, selection, compiler invocation and reports
//! - `shrep-config` - Configuration file and hot-reload watcher
//!
//! This crate holds the command seam a UI host drives and the CLI front end.

pub mod app;
pub mod cli;
pub mod commands;
pub mod render;

pub use cli::{CliCommand, CliError, CycleOptions, parse_args};
pub use commands::{Command, dispatch, dispatch_all};
