//! Build error types.
//!
//! Every failure here is fatal for the run: the dispatcher decides how it
//! maps to an exit code.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::target::TargetId;

/// Hint printed with unknown target errors.
pub const LIST_TARGETS_HINT: &str = "run `bootstage list` to see available targets";

/// Error during target evaluation or execution.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("dependency `{}` cannot be read", .path.display())]
    MissingDependency {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot change directory to `{}`", .path.display())]
    ChangeDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to spawn `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` failed with exit code {}\n{stderr}", .code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("I/O error on `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unknown target `{name}`; {}", LIST_TARGETS_HINT)]
    UnknownTarget { name: String },

    #[error("target `{id}` is referenced but not defined")]
    UndefinedTarget { id: TargetId },

    #[error("output `{}` is claimed by both `{first}` and `{second}`", .path.display())]
    DuplicateOutput {
        path: PathBuf,
        first: TargetId,
        second: TargetId,
    },

    #[error("dependency cycle: {}", format_cycle(.path))]
    Cycle { path: Vec<TargetId> },
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}

fn format_cycle(path: &[TargetId]) -> String {
    path.iter()
        .map(|id| id.name())
        .collect::<Vec<_>>()
        .join(" -> ")
}
