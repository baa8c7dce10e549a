//! CLI definitions using clap.

use std::path::PathBuf;

use bootstage::util::shell::ColorChoice;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// bootstage - staged bootstrap build orchestrator for a self-hosting
/// parser generator
#[derive(Parser)]
#[command(name = "bootstage")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options shared by every command.
#[derive(Args, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print only errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Output format for status messages
    #[arg(long, global = true, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,

    /// Project root (defaults to the current directory)
    #[arg(short = 'C', long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Go toolchain executable (overrides bootstage.toml)
    #[arg(long, global = true, env = "BOOTSTAGE_GO")]
    pub go: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    Human,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a target and everything it depends on
    Run(RunArgs),

    /// Remove generated binaries and sources
    Clean,

    /// Generate buildinfo.go from the git history
    Buildinfo,

    /// List every target
    List,
}

#[derive(Args, Default)]
pub struct RunArgs {
    /// Target to build (`clean` and `buildinfo` are accepted too)
    pub target: Option<String>,
}
