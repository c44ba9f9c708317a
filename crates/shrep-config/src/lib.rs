//! shrep Configuration Management
//!
//! Handles loading and managing configuration from ~/.shrep/config.toml
//! (or `$SHREP_CONFIG_DIR/config.toml`). Supports hot-reloading and default
//! config generation.

pub mod watcher;

pub use watcher::{ShaderWatcher, WatchEvent};

use serde::{Deserialize, Serialize};
use shrep_core::{BuildTarget, CompilerPlatform, CompilerTarget, VariantSettings};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration directory name
const CONFIG_DIR_NAME: &str = ".shrep";
/// Default configuration file name
const CONFIG_FILE_NAME: &str = "config.toml";
/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "SHREP_CONFIG_DIR";

/// Compiler selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompilerKind {
    #[default]
    Malioc,
    Malisc,
    Custom,
}

/// Compiler configuration section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CompilerConfig {
    /// Which compiler to run
    #[serde(default)]
    pub target: CompilerKind,

    /// Executable used when `target = "custom"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_path: Option<PathBuf>,
}

/// Variant materialization section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantConfig {
    #[serde(default)]
    pub platform: CompilerPlatform,

    #[serde(default)]
    pub build_target: BuildTarget,

    /// First line of every materialized variant
    #[serde(default = "default_version_line")]
    pub version_line: String,

    /// Temp file extension, without the dot
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Where variant files go; the system temp dir when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
}

fn default_version_line() -> String {
    "#version 310 es".to_string()
}

fn default_extension() -> String {
    "shader".to_string()
}

impl Default for VariantConfig {
    fn default() -> Self {
        Self {
            platform: CompilerPlatform::default(),
            build_target: BuildTarget::default(),
            version_line: default_version_line(),
            extension: default_extension(),
            temp_dir: None,
        }
    }
}

/// Watch mode section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Events for the same file closer than this are merged
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    200
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Compiler settings
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// Variant settings
    #[serde(default)]
    pub variant: VariantConfig,

    /// Watch settings
    #[serde(default)]
    pub watch: WatchConfig,
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_or_create_in(&Self::config_dir()?)
    }

    /// Load `config.toml` from `dir`, writing the default one first if missing
    pub fn load_or_create_in(dir: &Path) -> Result<Self, ConfigError> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            log::info!("Config file not found, creating default at {:?}", config_path);
            Self::create_default_config_in(dir)?;
        }

        let config = Self::load_from(&config_path)?;
        log::info!("Loaded configuration from {:?}", config_path);
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e))?;

        Ok(config)
    }

    /// Get the configuration directory path (`$SHREP_CONFIG_DIR` or ~/.shrep/)
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
            return Ok(PathBuf::from(dir));
        }
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
        Ok(home.join(CONFIG_DIR_NAME))
    }

    /// Get the configuration file path
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Create the default configuration file in the configuration directory
    pub fn create_default_config() -> Result<PathBuf, ConfigError> {
        Self::create_default_config_in(&Self::config_dir()?)
    }

    /// Create `dir` and a default `config.toml` inside it
    pub fn create_default_config_in(dir: &Path) -> Result<PathBuf, ConfigError> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        fs::create_dir_all(dir)
            .map_err(|e| ConfigError::CreateDirError(dir.to_path_buf(), e))?;

        let toml_content = toml::to_string_pretty(&Config::default())
            .map_err(ConfigError::SerializeError)?;

        // Add header comment
        let content = format!(
            "# shrep Configuration\n\
             #\n\
             # [compiler] target: malioc, malisc or custom (set custom_path)\n\
             # [variant] platform: gles3x or gles20 (GLSL); vulkan and metal need\n\
             #           a non-GLSL variant oracle and are rejected by the default one\n\
             # [variant] build_target: android, ios or standalone\n\
             \n\
             {toml_content}"
        );

        fs::write(&config_path, content)
            .map_err(|e| ConfigError::WriteError(config_path.clone(), e))?;

        log::info!("Created default configuration at {:?}", config_path);
        Ok(config_path)
    }

    /// Compiler the session should run
    pub fn compiler_target(&self) -> CompilerTarget {
        match self.compiler.target {
            CompilerKind::Malioc => CompilerTarget::Malioc,
            CompilerKind::Malisc => CompilerTarget::Malisc,
            CompilerKind::Custom => match &self.compiler.custom_path {
                Some(path) => CompilerTarget::Custom(path.clone()),
                None => {
                    log::warn!("Custom compiler selected without custom_path");
                    CompilerTarget::Custom(PathBuf::new())
                }
            },
        }
    }

    /// Materialization settings for the session
    pub fn variant_settings(&self) -> VariantSettings {
        VariantSettings {
            platform: self.variant.platform,
            build_target: self.variant.build_target,
            version_line: self.variant.version_line.clone(),
            extension: self.variant.extension.clone(),
            temp_dir: self.variant.temp_dir.clone(),
        }
    }
}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    /// Home directory not found
    NoHomeDirectory,
    /// Failed to read config file
    ReadError(PathBuf, std::io::Error),
    /// Failed to parse config file
    ParseError(PathBuf, toml::de::Error),
    /// Failed to serialize config
    SerializeError(toml::ser::Error),
    /// Failed to write config file
    WriteError(PathBuf, std::io::Error),
    /// Failed to create directory
    CreateDirError(PathBuf, std::io::Error),
    /// Failed to set up file watcher
    WatchError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NoHomeDirectory => write!(f, "Could not determine home directory"),
            ConfigError::ReadError(path, e) => write!(f, "Failed to read {:?}: {}", path, e),
            ConfigError::ParseError(path, e) => write!(f, "Failed to parse {:?}: {}", path, e),
            ConfigError::SerializeError(e) => write!(f, "Failed to serialize config: {}", e),
            ConfigError::WriteError(path, e) => write!(f, "Failed to write {:?}: {}", path, e),
            ConfigError::CreateDirError(path, e) => write!(f, "Failed to create {:?}: {}", path, e),
            ConfigError::WatchError(e) => write!(f, "Failed to watch files: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.compiler.target, CompilerKind::Malioc);
        assert_eq!(config.variant.platform, CompilerPlatform::Gles3x);
        assert_eq!(config.variant.build_target, BuildTarget::Android);
        assert_eq!(config.variant.version_line, "#version 310 es");
        assert_eq!(config.variant.extension, "shader");
        assert_eq!(config.watch.debounce_ms, 200);
    }

    #[test]
    fn test_serialize_deserialize() {
        let mut config = Config::default();
        config.compiler.target = CompilerKind::Custom;
        config.compiler.custom_path = Some(PathBuf::from("/opt/mali/malioc"));
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_config() {
        let partial = r#"
            [variant]
            platform = "gles20"
        "#;
        let config: Config = toml::from_str(partial).unwrap();
        assert_eq!(config.variant.platform, CompilerPlatform::Gles20);
        // Other fields should have defaults
        assert_eq!(config.variant.extension, "shader");
        assert_eq!(config.compiler.target, CompilerKind::Malioc);
    }

    #[test]
    fn test_compiler_target_mapping() {
        let mut config = Config::default();
        assert_eq!(config.compiler_target(), CompilerTarget::Malioc);

        config.compiler.target = CompilerKind::Malisc;
        assert_eq!(config.compiler_target(), CompilerTarget::Malisc);

        config.compiler.target = CompilerKind::Custom;
        assert_eq!(config.compiler_target(), CompilerTarget::Custom(PathBuf::new()));

        config.compiler.custom_path = Some(PathBuf::from("/usr/local/bin/malioc"));
        assert_eq!(
            config.compiler_target(),
            CompilerTarget::Custom(PathBuf::from("/usr/local/bin/malioc"))
        );
    }

    #[test]
    fn test_variant_settings_mapping() {
        let mut config = Config::default();
        config.variant.temp_dir = Some(PathBuf::from("/tmp/variants"));
        config.variant.version_line = "#version 300 es".to_string();

        let settings = config.variant_settings();
        assert_eq!(settings.version_line, "#version 300 es");
        assert_eq!(settings.temp_dir, Some(PathBuf::from("/tmp/variants")));
        assert_eq!(settings.platform, CompilerPlatform::Gles3x);
    }

    #[test]
    fn test_default_file_is_created_and_loadable() {
        let dir = TempDir::new().unwrap();
        let config_dir = dir.path().join("nested");

        let config = Config::load_or_create_in(&config_dir).unwrap();
        assert_eq!(config, Config::default());

        let content = fs::read_to_string(config_dir.join(CONFIG_FILE_NAME)).unwrap();
        assert!(content.starts_with("# shrep Configuration"));
        assert!(content.contains("vulkan and metal need"));
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[compiler]\ntarget = \"gcc\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(ref p, _) if p == &path));
    }
}
