//! Common test utilities and harness
//!
//! Provides reusable utilities for functional testing including:
//! - Test environment setup (temp directories, shader projects, configs)
//! - A scripted stand-in for the offline compiler
//! - Session construction helpers

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use shrep_core::{CompilerTarget, Session, VariantSettings};
use tempfile::TempDir;

/// Test environment with an isolated project directory
pub struct TestEnvironment {
    /// Temporary directory holding shaders, configs and variants
    pub temp_dir: TempDir,
    /// Where materialized variants are written
    pub variant_dir: PathBuf,
}

impl TestEnvironment {
    /// Create a new isolated test environment
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let variant_dir = temp_dir.path().join("variants");

        std::fs::create_dir_all(&variant_dir).expect("Failed to create variants directory");

        Self {
            temp_dir,
            variant_dir,
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a file relative to the environment root
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path().join(name);
        std::fs::write(&path, content).expect("Failed to write test file");
        path
    }

    /// Write a shader manifest
    pub fn write_manifest(&self, name: &str, content: &str) -> PathBuf {
        self.write_file(&format!("{name}.toml"), content)
    }

    /// Variant settings writing into this environment
    pub fn variant_settings(&self) -> VariantSettings {
        VariantSettings {
            temp_dir: Some(self.variant_dir.clone()),
            ..VariantSettings::default()
        }
    }

    /// Session using `target` and this environment's variant directory
    pub fn session(&self, target: CompilerTarget) -> Session {
        Session::new(target, self.variant_settings())
    }

    /// Install an executable fake compiler.
    ///
    /// It prints its stage flag and define, every `#define` line of the
    /// variant file, an empty line, and exits with `exit_code`.
    #[cfg(unix)]
    pub fn fake_compiler(&self, exit_code: i32) -> CompilerTarget {
        use std::os::unix::fs::PermissionsExt;

        let script = format!(
            "#!/bin/sh\n\
             echo \"flag=$1 define=$4\"\n\
             grep '^#define' \"$2\"\n\
             echo\n\
             exit {exit_code}\n"
        );
        let path = self.write_file(&format!("fake-compiler-{exit_code}"), &script);
        let mut permissions = std::fs::metadata(&path)
            .expect("Failed to stat fake compiler")
            .permissions();
        permissions.set_mode(0o755);
        std::fs::set_permissions(&path, permissions).expect("Failed to mark fake compiler executable");
        CompilerTarget::Custom(path)
    }

    /// A compiler location that does not exist
    pub fn missing_compiler(&self) -> CompilerTarget {
        CompilerTarget::Custom(self.path().join("no-such-compiler"))
    }

    /// Number of variant files written so far
    pub fn variant_files(&self) -> usize {
        std::fs::read_dir(&self.variant_dir)
            .expect("Failed to list variants directory")
            .count()
    }
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

/// A two-subshader manifest exercising both directive families and comments
pub const LIT_MANIFEST: &str = r#"
name = "Lit"

[[subshader]]
[[subshader.pass]]
name = "Forward"
source = "forward.glsl"
stages = ["vertex", "fragment"]

[[subshader.pass]]
name = "Outline"
code = """
#pragma multi_compile_local THIN THICK
#pragma shader_feature_fragment _ GLOW
"""
stages = ["vertex", "geometry", "fragment"]

[[subshader]]
[[subshader.pass]]
name = "Fallback"
code = "void main() {}"
stages = ["fragment"]
"#;

/// Source of the `Forward` pass
pub const FORWARD_SOURCE: &str = "\
#version 300 es
/* #pragma multi_compile DISABLED_A DISABLED_B */
// #pragma multi_compile COMMENTED
#pragma multi_compile _ SHADOWS_LOW SHADOWS_HIGH // trailing note
#pragma shader_feature FOG
void main() {}
";
