//! Global context for bootstage operations.
//!
//! Provides centralized access to the project root and its configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::config::{Config, CONFIG_FILE};

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Project root; every target path is relative to it
    root: PathBuf,

    /// Whether to use verbose output
    verbose: bool,
}

impl GlobalContext {
    /// Create a GlobalContext rooted at the current directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(GlobalContext {
            root: cwd,
            verbose: false,
        })
    }

    /// Create a GlobalContext rooted at `root`.
    ///
    /// A relative `root` is taken relative to the current directory.
    pub fn with_root(root: impl AsRef<Path>) -> Result<Self> {
        let mut ctx = Self::new()?;
        ctx.root = ctx.root.join(root.as_ref());
        if !ctx.root.is_dir() {
            anyhow::bail!("project directory does not exist: {}", ctx.root.display());
        }
        Ok(ctx)
    }

    /// Set verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Get the project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the project configuration file path.
    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Load the project configuration.
    pub fn load_config(&self) -> Result<Config> {
        Config::load_or_default(&self.config_path())
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}
