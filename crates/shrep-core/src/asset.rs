//! Shader assets
//!
//! A shader is a list of subshaders, each holding compilable passes. Assets
//! come from a TOML manifest:
//!
//! ```toml
//! name = "Lit"
//!
//! [[subshader]]
//! [[subshader.pass]]
//! name = "ForwardLit"
//! source = "lit_forward.glsl"
//! stages = ["vertex", "fragment"]
//! ```
//!
//! or from a bare source file, which becomes one subshader with one pass.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::stage::Stage;

/// File extension that marks a manifest
pub const MANIFEST_EXTENSION: &str = "toml";

/// Stages of a bare source file; a geometry program needs a manifest
const BARE_SOURCE_STAGES: [Stage; 2] = [Stage::Vertex, Stage::Fragment];

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("failed to read {0:?}: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("failed to parse manifest {0:?}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("pass '{pass}' in {manifest:?} has neither `source` nor `code`")]
    MissingSource { manifest: PathBuf, pass: String },
}

/// Raw source and stage declarations of one pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSource {
    pub name: String,
    pub source: String,
    pub stages: Vec<Stage>,
    /// File the source was read from, if any
    pub source_path: Option<PathBuf>,
}

impl PassSource {
    pub fn new(name: impl Into<String>, source: impl Into<String>, stages: Vec<Stage>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            stages,
            source_path: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subshader {
    pub passes: Vec<PassSource>,
}

/// A loaded shader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderAsset {
    name: String,
    origin: Option<PathBuf>,
    subshaders: Vec<Subshader>,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    name: Option<String>,
    #[serde(default, rename = "subshader")]
    subshaders: Vec<ManifestSubshader>,
}

#[derive(Debug, Deserialize)]
struct ManifestSubshader {
    #[serde(default, rename = "pass")]
    passes: Vec<ManifestPass>,
}

#[derive(Debug, Deserialize)]
struct ManifestPass {
    #[serde(default)]
    name: String,
    source: Option<PathBuf>,
    code: Option<String>,
    #[serde(default = "default_stages")]
    stages: Vec<Stage>,
}

fn default_stages() -> Vec<Stage> {
    vec![Stage::Vertex, Stage::Fragment]
}

impl ShaderAsset {
    /// Build an in-memory asset
    pub fn new(name: impl Into<String>, subshaders: Vec<Subshader>) -> Self {
        Self {
            name: name.into(),
            origin: None,
            subshaders,
        }
    }

    /// Single-pass asset from source text
    pub fn from_source(name: impl Into<String>, source: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(
            name.clone(),
            vec![Subshader {
                passes: vec![PassSource::new(name, source, BARE_SOURCE_STAGES.to_vec())],
            }],
        )
    }

    /// Load a manifest (`*.toml`) or a bare shader source file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let is_manifest = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(MANIFEST_EXTENSION));

        let mut asset = if is_manifest {
            Self::load_manifest(path)?
        } else {
            let source = fs::read_to_string(path).map_err(|e| AssetError::Read(path.to_path_buf(), e))?;
            let name = file_stem(path);
            let mut asset = Self::from_source(name, source);
            for pass in asset.subshaders.iter_mut().flat_map(|s| s.passes.iter_mut()) {
                pass.source_path = Some(path.to_path_buf());
            }
            asset
        };

        asset.origin = Some(path.to_path_buf());
        log::info!(
            "Loaded shader '{}' from {:?} ({} passes)",
            asset.name,
            path,
            asset.pass_count()
        );
        Ok(asset)
    }

    fn load_manifest(path: &Path) -> Result<Self, AssetError> {
        let content = fs::read_to_string(path).map_err(|e| AssetError::Read(path.to_path_buf(), e))?;
        let manifest: Manifest =
            toml::from_str(&content).map_err(|e| AssetError::Parse(path.to_path_buf(), e))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));

        let mut subshaders = Vec::with_capacity(manifest.subshaders.len());
        for sub in manifest.subshaders {
            let mut passes = Vec::with_capacity(sub.passes.len());
            for pass in sub.passes {
                let (source, source_path) = match (pass.code, pass.source) {
                    (Some(code), _) => (code, None),
                    (None, Some(relative)) => {
                        let full = base.join(relative);
                        let text = fs::read_to_string(&full).map_err(|e| AssetError::Read(full.clone(), e))?;
                        (text, Some(full))
                    }
                    (None, None) => {
                        return Err(AssetError::MissingSource {
                            manifest: path.to_path_buf(),
                            pass: pass.name,
                        });
                    }
                };
                passes.push(PassSource {
                    name: pass.name,
                    source,
                    stages: pass.stages,
                    source_path,
                });
            }
            subshaders.push(Subshader { passes });
        }

        Ok(Self {
            name: manifest.name.unwrap_or_else(|| file_stem(path)),
            origin: None,
            subshaders,
        })
    }

    /// Re-read the asset from where it was loaded; in-memory assets are cloned.
    pub fn reload(&self) -> Result<Self, AssetError> {
        match &self.origin {
            Some(path) => Self::load(path),
            None => Ok(self.clone()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Manifest or source file the asset was loaded from
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    pub fn subshaders(&self) -> &[Subshader] {
        &self.subshaders
    }

    pub fn pass_count(&self) -> usize {
        self.subshaders.iter().map(|s| s.passes.len()).sum()
    }

    /// Whether `other` designates the same shader (same file, or same name
    /// for in-memory assets)
    pub fn same_asset(&self, other: &ShaderAsset) -> bool {
        match (&self.origin, &other.origin) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.name == other.name,
            _ => false,
        }
    }

    /// Every file whose change should trigger a refresh
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.origin.iter().cloned().collect();
        for pass in self.subshaders.iter().flat_map(|s| s.passes.iter()) {
            if let Some(path) = &pass.source_path {
                if !paths.contains(path) {
                    paths.push(path.clone());
                }
            }
        }
        paths
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
