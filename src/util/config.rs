//! Configuration file support for wdlpack.
//!
//! Two configuration file locations are read:
//! - Global: `~/.wdlpack/config.toml` - User-wide defaults
//! - Project: `.wdlpack/config.toml` - Overrides for the current directory
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::util::archive::ArchiveFormat;

/// Name of the per-user and per-project configuration directory.
pub const CONFIG_DIR_NAME: &str = ".wdlpack";

/// wdlpack configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source archive settings
    pub archive: ArchiveConfig,

    /// Bundle settings
    pub bundle: BundleConfig,
}

/// Source archive configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Default archive format (zip, tar, gztar)
    pub format: Option<String>,

    /// Directory `zip` writes to when no output path is given
    pub output_dir: Option<PathBuf>,
}

/// Bundle configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    /// Emit compact (compressed) bundles by default
    pub compress: bool,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.archive.format.is_some() {
            self.archive.format = other.archive.format;
        }
        if other.archive.output_dir.is_some() {
            self.archive.output_dir = other.archive.output_dir;
        }
        if other.bundle.compress {
            self.bundle.compress = true;
        }
    }

    /// Parse the configured archive format.
    ///
    /// An unrecognised name is reported and ignored.
    pub fn archive_format(&self) -> Option<ArchiveFormat> {
        let name = self.archive.format.as_ref()?;
        match name.parse() {
            Ok(format) => Some(format),
            Err(e) => {
                tracing::warn!("Ignoring configured archive format: {}", e);
                None
            }
        }
    }
}

/// Get the global wdlpack config directory (~/.wdlpack).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(CONFIG_DIR_NAME))
}

/// Get the global config path (~/.wdlpack/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.wdlpack/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR_NAME).join("config.toml")
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.wdlpack/config.toml)
/// 2. Global config (~/.wdlpack/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    // Project config overrides global
    config.merge(Config::load_or_default(project_path));

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.archive.format.is_none());
        assert!(config.archive.output_dir.is_none());
        assert!(!config.bundle.compress);
        assert_eq!(config.archive_format(), None);
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
[archive]
format = "gztar"
output_dir = "./dist"

[bundle]
compress = true
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.archive.format, Some("gztar".to_string()));
        assert_eq!(config.archive.output_dir, Some(PathBuf::from("./dist")));
        assert!(config.bundle.compress);
        assert_eq!(config.archive_format(), Some(ArchiveFormat::GzTar));
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        base.archive.format = Some("tar".to_string());
        base.archive.output_dir = Some(PathBuf::from("out"));

        let mut override_cfg = Config::default();
        override_cfg.archive.format = Some("zip".to_string());

        base.merge(override_cfg);

        assert_eq!(base.archive_format(), Some(ArchiveFormat::Zip));
        assert_eq!(base.archive.output_dir, Some(PathBuf::from("out"))); // Not overridden
    }

    #[test]
    fn test_unknown_format_is_ignored() {
        let mut config = Config::default();
        config.archive.format = Some("rar".to_string());
        assert_eq!(config.archive_format(), None);
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global = tmp.path().join("global.toml");
        let project = project_config_path(tmp.path());

        std::fs::write(&global, "[archive]\nformat = \"tar\"\n\n[bundle]\ncompress = true\n")
            .unwrap();
        std::fs::create_dir_all(project.parent().unwrap()).unwrap();
        std::fs::write(&project, "[archive]\nformat = \"gztar\"\n").unwrap();

        let config = load_config(Some(global.as_path()), &project);
        assert_eq!(config.archive_format(), Some(ArchiveFormat::GzTar));
        assert!(config.bundle.compress);
    }

    #[test]
    fn test_invalid_config_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[archive\nformat = ").unwrap();

        assert!(Config::load(&path).is_err());
        assert!(Config::load_or_default(&path).archive.format.is_none());
    }
}
