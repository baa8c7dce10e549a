//! Configuration file support for bootstage.
//!
//! An optional `bootstage.toml` at the project root overrides the
//! toolchain executable and the argument lists used by the bootstrap
//! chain. Every field has a default, so an empty or missing file is valid.
//!
//! ```toml
//! [toolchain]
//! go = "/usr/local/go/bin/go"
//!
//! [generator]
//! flags = ["-switch", "-inline"]
//!
//! [test]
//! args = ["test", "-short", "-tags", "grammars", "./..."]
//!
//! [bench]
//! args = ["test", "-benchmem", "-bench", "."]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = "bootstage.toml";

/// bootstage configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Compiler toolchain settings
    pub toolchain: ToolchainSettings,

    /// Flags passed to the production generator for grammar targets
    pub generator: GeneratorConfig,

    /// Test suite invocation
    pub test: CommandArgs,

    /// Benchmark invocation
    pub bench: CommandArgs,
}

/// Compiler toolchain settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainSettings {
    /// The toolchain executable used for `build` and `test`
    pub go: PathBuf,
}

impl Default for ToolchainSettings {
    fn default() -> Self {
        ToolchainSettings {
            go: PathBuf::from("go"),
        }
    }
}

/// Grammar regeneration settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub flags: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            flags: strings(&["-switch", "-inline"]),
        }
    }
}

/// Arguments for a toolchain invocation. Empty means "use the built-in default".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandArgs {
    pub args: Vec<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration, or defaults if the file doesn't exist.
    ///
    /// A file that exists but fails to parse is an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("no config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Override the toolchain executable.
    pub fn with_go(mut self, go: Option<PathBuf>) -> Self {
        if let Some(go) = go {
            self.toolchain.go = go;
        }
        self
    }

    /// Anchor a relative toolchain path at the project root.
    ///
    /// Actions run in different directories, so a path like `tools/go` must
    /// not be left relative. Bare names (`go`) are kept for `PATH` lookup.
    pub fn rooted_at(mut self, root: &Path) -> Self {
        let go = &self.toolchain.go;
        if go.is_relative() && go.components().count() > 1 {
            self.toolchain.go = root.join(go);
        }
        self
    }

    /// Arguments for the test target.
    pub fn test_args(&self) -> Vec<String> {
        if self.test.args.is_empty() {
            strings(&["test", "-short", "-tags", "grammars", "./..."])
        } else {
            self.test.args.clone()
        }
    }

    /// Arguments for the bench target.
    pub fn bench_args(&self) -> Vec<String> {
        if self.bench.args.is_empty() {
            strings(&["test", "-benchmem", "-bench", "."])
        } else {
            self.bench.args.clone()
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
