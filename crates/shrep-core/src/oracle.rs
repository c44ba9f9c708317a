//! Variant materialization
//!
//! The oracle turns a pass plus a keyword set into the transitional source the
//! external compiler reads. The core then normalises its `#version` preamble
//! and writes it to a temp file.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::pass::PassInfo;
use crate::stage::Stage;

/// Graphics API the variant is produced for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilerPlatform {
    #[default]
    Gles3x,
    Gles20,
    Vulkan,
    Metal,
}

impl CompilerPlatform {
    /// Whether the platform consumes GLSL text
    pub fn is_glsl(self) -> bool {
        matches!(self, CompilerPlatform::Gles3x | CompilerPlatform::Gles20)
    }
}

impl std::fmt::Display for CompilerPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CompilerPlatform::Gles3x => "gles3x",
            CompilerPlatform::Gles20 => "gles20",
            CompilerPlatform::Vulkan => "vulkan",
            CompilerPlatform::Metal => "metal",
        };
        f.write_str(name)
    }
}

/// Device family the variant is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildTarget {
    #[default]
    Android,
    Ios,
    Standalone,
}

/// Produces the transitional source of a variant
pub trait VariantOracle {
    /// Whether `pass` has a program for `stage`
    fn stage_support(&self, pass: &PassInfo, stage: Stage) -> bool;

    /// Source bytes of `pass` compiled with `keywords`
    fn materialize_variant(
        &self,
        pass: &PassInfo,
        keywords: &[String],
        stage: Stage,
        platform: CompilerPlatform,
        target: BuildTarget,
    ) -> anyhow::Result<Vec<u8>>;
}

/// GLSL oracle: one `#define` per active keyword followed by the pass source
#[derive(Debug, Clone, Copy, Default)]
pub struct DefineOracle;

impl VariantOracle for DefineOracle {
    fn stage_support(&self, pass: &PassInfo, stage: Stage) -> bool {
        pass.declares_stage(stage)
    }

    fn materialize_variant(
        &self,
        pass: &PassInfo,
        keywords: &[String],
        stage: Stage,
        platform: CompilerPlatform,
        _target: BuildTarget,
    ) -> anyhow::Result<Vec<u8>> {
        if !platform.is_glsl() {
            anyhow::bail!("platform {platform} is not supported by the define oracle");
        }
        if !pass.declares_stage(stage) {
            anyhow::bail!("pass '{}' has no {stage} program", pass.name());
        }

        let mut code = String::with_capacity(pass.source().len() + keywords.len() * 32);
        for keyword in keywords {
            code.push_str("#define ");
            code.push_str(keyword);
            code.push('\n');
        }
        code.push_str(pass.source());

        Ok(code.into_bytes())
    }
}

/// How materialized variants are written out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSettings {
    pub platform: CompilerPlatform,
    pub build_target: BuildTarget,
    /// Line placed at the top of every materialized file
    pub version_line: String,
    /// Extension of the temp file, without the dot
    pub extension: String,
    /// Directory for temp files; the system temp dir when unset
    pub temp_dir: Option<PathBuf>,
}

impl Default for VariantSettings {
    fn default() -> Self {
        Self {
            platform: CompilerPlatform::default(),
            build_target: BuildTarget::default(),
            version_line: "#version 310 es".to_string(),
            extension: "shader".to_string(),
            temp_dir: None,
        }
    }
}

fn version_regex() -> &'static Regex {
    static VERSION_REGEX: OnceLock<Regex> = OnceLock::new();
    VERSION_REGEX.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*#[ \t]*version\b[^\n]*(\n|$)").expect("Invalid version regex")
    })
}

/// Drop every `#version` line and put `version_line` first
pub fn patch_version_preamble(code: &str, version_line: &str) -> String {
    let body = version_regex().replace_all(code, "");
    let mut patched = String::with_capacity(version_line.len() + 1 + body.len());
    patched.push_str(version_line);
    patched.push('\n');
    patched.push_str(&body);
    patched
}

/// Patch `bytes` and write them to a fresh temp file, which is kept on disk.
pub fn write_variant(bytes: &[u8], settings: &VariantSettings) -> std::io::Result<PathBuf> {
    let code = patch_version_preamble(&String::from_utf8_lossy(bytes), &settings.version_line);
    let suffix = format!(".{}", settings.extension);

    let mut builder = tempfile::Builder::new();
    builder.prefix("shrep-variant-").suffix(&suffix);
    let mut file = match &settings.temp_dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };

    file.write_all(code.as_bytes())?;
    file.flush()?;

    let (_, path) = file.keep().map_err(|e| e.error)?;
    log::debug!("Wrote variant source to {:?}", path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::PassSource;
    use shrep_scan::KeywordVocabulary;
    use tempfile::TempDir;

    fn pass(source: &str, stages: Vec<Stage>) -> PassInfo {
        let mut vocabulary = KeywordVocabulary::new();
        PassInfo::build(0, 0, &PassSource::new("Forward", source, stages), &mut vocabulary)
    }

    #[test]
    fn patch_replaces_all_version_variants() {
        let code = "#version 300 es\nprecision mediump float;\n  #version 310 es\nvoid main() {}\n";
        let patched = patch_version_preamble(code, "#version 310 es");
        assert_eq!(
            patched,
            "#version 310 es\nprecision mediump float;\nvoid main() {}\n"
        );
    }

    #[test]
    fn patch_without_version_line() {
        assert_eq!(patch_version_preamble("x", "#version 310 es"), "#version 310 es\nx");
    }

    #[test]
    fn patch_keeps_lookalike_identifiers() {
        let code = "int versionCount;\n";
        assert_eq!(
            patch_version_preamble(code, "#version 310 es"),
            "#version 310 es\nint versionCount;\n"
        );
    }

    #[test]
    fn define_oracle_prepends_keywords() {
        let pass = pass("#version 300 es\nvoid main() {}\n", vec![Stage::Vertex]);
        let bytes = DefineOracle
            .materialize_variant(
                &pass,
                &["FOG".to_string(), "SHADOWS".to_string()],
                Stage::Vertex,
                CompilerPlatform::Gles3x,
                BuildTarget::Android,
            )
            .unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "#define FOG\n#define SHADOWS\n#version 300 es\nvoid main() {}\n"
        );
    }

    #[test]
    fn define_oracle_rejects_non_glsl_platforms() {
        let pass = pass("void main() {}", vec![Stage::Vertex]);
        let result = DefineOracle.materialize_variant(
            &pass,
            &[],
            Stage::Vertex,
            CompilerPlatform::Metal,
            BuildTarget::Ios,
        );
        assert!(result.is_err());
    }

    #[test]
    fn define_oracle_stage_support_follows_pass() {
        let pass = pass("", vec![Stage::Fragment]);
        assert!(DefineOracle.stage_support(&pass, Stage::Fragment));
        assert!(!DefineOracle.stage_support(&pass, Stage::Vertex));
    }

    #[test]
    fn write_variant_patches_and_keeps_file() {
        let dir = TempDir::new().unwrap();
        let settings = VariantSettings {
            temp_dir: Some(dir.path().to_path_buf()),
            ..VariantSettings::default()
        };

        let path = write_variant(b"#define A\n#version 300 es\nvoid main() {}\n", &settings).unwrap();
        assert!(path.starts_with(dir.path()));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("shader"));

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "#version 310 es\n#define A\nvoid main() {}\n");
    }
}
