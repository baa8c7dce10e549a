//! Test utilities for bootstage unit tests.
//!
//! [`RecordingRunner`] stands in for real child processes: it records every
//! invocation, can materialize files the command would have produced, and
//! can be told to fail specific commands.
//!
//! ```rust,ignore
//! let runner = RecordingRunner::new().produces("go build -tags bootstrap -o peg0", "peg0");
//! let log = runner.log();
//! let mut cx = BuildContext::new(root, Box::new(runner));
//! // ...
//! assert_eq!(log.count_matching("peg0"), 1);
//! ```

pub mod fixtures;

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use crate::builder::errors::BuildError;
use crate::util::process::{CommandRunner, Invocation};

pub use fixtures::*;

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    /// Working directory the command ran in
    pub cwd: PathBuf,
    /// The command with redirections, as displayed
    pub command: String,
}

/// Shared view of everything a [`RecordingRunner`] ran.
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    entries: Arc<Mutex<Vec<Recorded>>>,
}

impl CommandLog {
    fn push(&self, entry: Recorded) {
        self.entries.lock().unwrap().push(entry);
    }

    /// All recorded invocations, in order.
    pub fn entries(&self) -> Vec<Recorded> {
        self.entries.lock().unwrap().clone()
    }

    /// All recorded commands, in order.
    pub fn commands(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.command).collect()
    }

    /// Number of recorded commands containing `needle`.
    pub fn count_matching(&self, needle: &str) -> usize {
        self.commands().iter().filter(|c| c.contains(needle)).count()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

/// A file a matching command creates.
#[derive(Debug, Clone)]
struct ProduceRule {
    /// Only match commands run in exactly this directory
    cwd: Option<PathBuf>,
    /// Command substring
    pattern: String,
    /// File to create, relative to the command's working directory
    path: PathBuf,
}

/// Command runner that records instead of spawning.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    log: CommandLog,
    produces: Vec<ProduceRule>,
    /// Command substrings that exit with status 1
    failures: Vec<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        RecordingRunner::default()
    }

    /// When a command containing `pattern` runs, create `path` (relative to
    /// the command's working directory).
    pub fn produces(mut self, pattern: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.produces.push(ProduceRule {
            cwd: None,
            pattern: pattern.into(),
            path: path.into(),
        });
        self
    }

    /// Like [`produces`](Self::produces), restricted to commands run in `cwd`.
    pub fn produces_in(
        mut self,
        cwd: impl Into<PathBuf>,
        pattern: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        self.produces.push(ProduceRule {
            cwd: Some(cwd.into()),
            pattern: pattern.into(),
            path: path.into(),
        });
        self
    }

    /// Make commands containing `pattern` fail with exit code 1.
    pub fn fails_on(mut self, pattern: impl Into<String>) -> Self {
        self.failures.push(pattern.into());
        self
    }

    /// Handle to the invocation log, usable after the runner is boxed.
    pub fn log(&self) -> CommandLog {
        self.log.clone()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&mut self, cwd: &Path, invocation: &Invocation) -> Result<(), BuildError> {
        let command = invocation.to_string();
        self.log.push(Recorded {
            cwd: cwd.to_path_buf(),
            command: command.clone(),
        });

        if self.failures.iter().any(|p| command.contains(p.as_str())) {
            return Err(BuildError::CommandFailed {
                command: invocation.display_command(),
                code: Some(1),
                stderr: "simulated failure".to_string(),
            });
        }

        if let Some(output) = invocation.output() {
            fs::write(cwd.join(output), command.as_bytes())
                .map_err(|e| BuildError::io(cwd.join(output), e))?;
        }

        for rule in &self.produces {
            let in_dir = rule.cwd.as_deref().map_or(true, |dir| dir == cwd);
            if in_dir && command.contains(rule.pattern.as_str()) {
                let path = cwd.join(&rule.path);
                fs::write(&path, command.as_bytes()).map_err(|e| BuildError::io(&path, e))?;
            }
        }

        Ok(())
    }
}

/// Write `contents` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: impl AsRef<Path>, contents: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

/// Set the modification time of `path`.
pub fn set_mtime(path: &Path, time: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

/// A fixed point in time, `secs` seconds after an arbitrary epoch.
///
/// Tests use explicit times so ordering never depends on filesystem
/// timestamp granularity.
pub fn at(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000 + secs)
}
