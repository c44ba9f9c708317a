//! shrep-core - Shader variant session and compiler driving
//!
//! This crate provides:
//! - Shader assets loaded from manifests or bare source files
//! - Per-pass keyword groups and the keyword selection
//! - Variant materialization and the external compiler invoker
//! - Per-stage reports of the last compile-and-report cycle

pub mod asset;
pub mod invoker;
pub mod oracle;
pub mod pass;
pub mod report;
pub mod selection;
pub mod session;
pub mod stage;

pub use asset::{AssetError, PassSource, ShaderAsset, Subshader};
pub use invoker::{CompilerInvoker, CompilerTarget, InvokeError, StageOutput};
pub use oracle::{
    BuildTarget, CompilerPlatform, DefineOracle, VariantOracle, VariantSettings,
    patch_version_preamble, write_variant,
};
pub use pass::{NO_KEYWORD_LABEL, PassInfo, build_passes};
pub use report::{ReportAggregator, StageReport, StageReports};
pub use selection::{SelectionError, SelectionState};
pub use session::{Session, SessionError};
pub use stage::Stage;
