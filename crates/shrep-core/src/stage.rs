//! Pipeline stages

use serde::{Deserialize, Serialize};

/// A pipeline phase compiled and reported on its own
///
/// The derived ordering is the fixed report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Vertex,
    Geometry,
    Fragment,
}

impl Stage {
    /// Every stage, in report order
    pub const ALL: [Stage; 3] = [Stage::Vertex, Stage::Geometry, Stage::Fragment];

    /// Command-line flag selecting the stage on the compiler
    pub fn flag(self) -> &'static str {
        match self {
            Stage::Vertex => "-v",
            Stage::Geometry => "-g",
            Stage::Fragment => "-f",
        }
    }

    /// Preprocessor define passed with `-D`
    pub fn define(self) -> &'static str {
        match self {
            Stage::Vertex => "VERTEX",
            Stage::Geometry => "GEOMETRY",
            Stage::Fragment => "FRAGMENT",
        }
    }

    /// Heading shown above the stage's report
    pub fn label(self) -> &'static str {
        match self {
            Stage::Vertex => "Vertex Shader",
            Stage::Geometry => "Geometry Shader",
            Stage::Fragment => "Fragment Shader",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Vertex => "vertex",
            Stage::Geometry => "geometry",
            Stage::Fragment => "fragment",
        };
        f.write_str(name)
    }
}
