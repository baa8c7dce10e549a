//! Build context - per-run state threaded through every evaluation.
//!
//! A `BuildContext` owns the evaluation cache, the working-directory stack
//! and the command runner. Nothing here touches the process-wide working
//! directory: the "current directory" of a build is the top of its own
//! stack, and every invocation is spawned there.

use std::fmt;
use std::io;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::builder::cache::EvaluationCache;
use crate::builder::errors::BuildError;
use crate::core::target::TargetId;
use crate::util::process::{CommandRunner, Invocation, ProcessRunner};
use crate::util::shell::Shell;

/// Per-run build state.
pub struct BuildContext {
    /// Project root; target outputs and file dependencies are relative to it
    root: PathBuf,

    /// Entered directories, innermost last
    dirs: Vec<PathBuf>,

    /// Results of targets evaluated this run
    cache: EvaluationCache,

    /// Targets currently being evaluated, outermost first
    in_progress: Vec<TargetId>,

    runner: Box<dyn CommandRunner>,

    shell: Arc<Shell>,

    /// Number of invocations handed to the runner
    invocations: usize,
}

impl fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("root", &self.root)
            .field("dirs", &self.dirs)
            .field("cache", &self.cache)
            .field("in_progress", &self.in_progress)
            .field("invocations", &self.invocations)
            .finish()
    }
}

impl BuildContext {
    /// Create a context rooted at `root` that runs commands with `runner`.
    pub fn new(root: impl Into<PathBuf>, runner: Box<dyn CommandRunner>) -> Self {
        BuildContext {
            root: root.into(),
            dirs: Vec::new(),
            cache: EvaluationCache::new(),
            in_progress: Vec::new(),
            runner,
            shell: Arc::new(Shell::default()),
            invocations: 0,
        }
    }

    /// Create a context that spawns real child processes.
    pub fn with_processes(root: impl Into<PathBuf>) -> Self {
        Self::new(root, Box::new(ProcessRunner))
    }

    /// Use `shell` for status output.
    pub fn with_shell(mut self, shell: Arc<Shell>) -> Self {
        self.shell = shell;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The build's current working directory.
    pub fn current_dir(&self) -> &Path {
        self.dirs.last().map(PathBuf::as_path).unwrap_or(&self.root)
    }

    /// Resolve a project-relative path.
    pub fn project_path(&self, rel: &Path) -> PathBuf {
        self.root.join(rel)
    }

    pub fn cache(&self) -> &EvaluationCache {
        &self.cache
    }

    pub(crate) fn cache_mut(&mut self) -> &mut EvaluationCache {
        &mut self.cache
    }

    /// Forget every evaluation result of this run.
    pub fn reset_cache(&mut self) {
        self.cache.reset();
    }

    pub(crate) fn in_progress_mut(&mut self) -> &mut Vec<TargetId> {
        &mut self.in_progress
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    /// Number of process invocations issued so far.
    pub fn invocations(&self) -> usize {
        self.invocations
    }

    /// Switch into `dir` (relative to the current directory) until the
    /// returned guard drops.
    pub fn enter_dir(&mut self, dir: impl AsRef<Path>) -> Result<DirGuard<'_>, BuildError> {
        let dir = dir.as_ref();
        let path = self.current_dir().join(dir);

        let meta = std::fs::metadata(&path).map_err(|source| BuildError::ChangeDir {
            path: path.clone(),
            source,
        })?;
        if !meta.is_dir() {
            return Err(BuildError::ChangeDir {
                path,
                source: io::Error::other("not a directory"),
            });
        }

        info!("cd {}", dir.display());
        let depth = self.dirs.len();
        self.dirs.push(path);
        Ok(DirGuard { cx: self, depth })
    }

    /// Run one invocation in the current directory.
    pub fn run(&mut self, invocation: &Invocation) -> Result<(), BuildError> {
        info!("{}", invocation);
        self.invocations += 1;
        let cwd = self.dirs.last().unwrap_or(&self.root);
        self.runner.run(cwd, invocation)
    }
}

/// Scoped directory switch.
///
/// Dereferences to the [`BuildContext`] it borrows; dropping it restores the
/// directory that was current when it was created, on every exit path.
pub struct DirGuard<'a> {
    cx: &'a mut BuildContext,
    depth: usize,
}

impl fmt::Debug for DirGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirGuard")
            .field("dir", &self.cx.current_dir())
            .field("depth", &self.depth)
            .finish()
    }
}

impl Deref for DirGuard<'_> {
    type Target = BuildContext;

    fn deref(&self) -> &BuildContext {
        self.cx
    }
}

impl DerefMut for DirGuard<'_> {
    fn deref_mut(&mut self) -> &mut BuildContext {
        self.cx
    }
}

impl Drop for DirGuard<'_> {
    fn drop(&mut self) {
        self.cx.dirs.truncate(self.depth);
        let back = self.cx.current_dir();
        let shown = back
            .strip_prefix(&self.cx.root)
            .ok()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(back);
        info!("cd {}", shown.display());
    }
}
