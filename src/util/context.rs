//! Global context for wdlpack operations.
//!
//! Provides centralized access to configuration, paths, and environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::archive::ArchiveFormat;
use crate::util::config::{
    global_config_dir, global_config_path, load_config, project_config_path, Config,
    CONFIG_DIR_NAME,
};

/// Global context shared by CLI commands.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Home directory for global wdlpack data (~/.wdlpack/)
    home: PathBuf,

    /// Whether to use verbose output
    verbose: bool,

    /// Whether to use colors in output
    color: bool,

    /// Merged global and project configuration
    config: Config,
}

impl GlobalContext {
    /// Create a new GlobalContext, loading configuration for the current
    /// directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        let home = global_config_dir().unwrap_or_else(|| PathBuf::from(CONFIG_DIR_NAME));
        let config = load_config(global_config_path().as_deref(), &project_config_path(&cwd));

        GlobalContext {
            cwd,
            home,
            verbose: false,
            color: true,
            config,
        }
    }

    /// Replace the loaded configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Set verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Set color output.
    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the wdlpack home directory (~/.wdlpack/).
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if color output is enabled.
    pub fn color(&self) -> bool {
        self.color
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Archive format to use when none is requested explicitly.
    pub fn default_format(&self) -> ArchiveFormat {
        self.config.archive_format().unwrap_or_default()
    }

    /// Resolve a path given on the command line against the working directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    /// Where `zip` writes an archive named `file_name` when no output path
    /// is given: the configured output directory, or the working directory.
    pub fn default_output(&self, file_name: &str) -> PathBuf {
        match &self.config.archive.output_dir {
            Some(dir) => self.resolve(dir).join(file_name),
            None => self.cwd.join(file_name),
        }
    }
}
