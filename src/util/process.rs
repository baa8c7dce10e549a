//! Subprocess execution utilities.
//!
//! An [`Invocation`] describes one external command: program, arguments,
//! and optional stdin/stdout redirections to files. A [`CommandRunner`]
//! carries it out; [`ProcessRunner`] is the real one.

use std::ffi::OsStr;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread;

use tempfile::NamedTempFile;

use crate::builder::errors::BuildError;

/// One external command with optional file redirections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<String>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
}

impl Invocation {
    /// Create an invocation of `program`.
    pub fn new(program: impl AsRef<Path>) -> Self {
        Invocation {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            input: None,
            output: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Stream the contents of `path` to the child's stdin.
    pub fn stdin_from(mut self, path: impl Into<PathBuf>) -> Self {
        self.input = Some(path.into());
        self
    }

    /// Capture the child's stdout into `path`.
    pub fn stdout_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn input(&self) -> Option<&Path> {
        self.input.as_deref()
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    /// Display the command without redirections.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_command())?;
        if let Some(input) = &self.input {
            write!(f, " < {}", input.display())?;
        }
        if let Some(output) = &self.output {
            write!(f, " > {}", output.display())?;
        }
        Ok(())
    }
}

/// Executes invocations on behalf of a build.
///
/// `cwd` is the build's current working directory; relative program and
/// redirection paths are resolved against it.
pub trait CommandRunner {
    fn run(&mut self, cwd: &Path, invocation: &Invocation) -> Result<(), BuildError>;
}

/// Runs invocations as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&mut self, cwd: &Path, invocation: &Invocation) -> Result<(), BuildError> {
        let mut pb = ProcessBuilder::new(resolve_program(cwd, invocation.program()))
            .args(invocation.get_args())
            .cwd(cwd);

        if let Some(input) = invocation.input() {
            pb = pb.stdin_file(cwd.join(input));
        }

        let output = pb.exec_and_check()?;

        match invocation.output() {
            Some(path) => write_atomic(&cwd.join(path), &output.stdout),
            None => {
                echo(&output);
                Ok(())
            }
        }
    }
}

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    stdin: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
            stdin: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Stream a file to the child's stdin.
    pub fn stdin_file(mut self, path: impl AsRef<Path>) -> Self {
        self.stdin = Some(path.as_ref().to_path_buf());
        self
    }

    /// Build the Command.
    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Execute the command and wait for completion.
    ///
    /// Stdin is fed from a separate thread while the child runs, so a
    /// child that fills its stdout pipe before draining stdin cannot
    /// deadlock the parent.
    pub fn exec(&self) -> Result<Output, BuildError> {
        let input = match &self.stdin {
            Some(path) => Some(std::fs::read(path).map_err(|e| BuildError::io(path, e))?),
            None => None,
        };

        let mut cmd = self.build_command();
        cmd.stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|source| BuildError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;

        let feeder = match (input, child.stdin.take()) {
            (Some(bytes), Some(mut stdin)) => Some(thread::spawn(move || -> io::Result<()> {
                stdin.write_all(&bytes)
            })),
            _ => None,
        };

        let output = child
            .wait_with_output()
            .map_err(|e| BuildError::io(&self.program, e))?;

        if let Some(feeder) = feeder {
            let written = feeder
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stdin feeder panicked")));
            match written {
                Ok(()) => {}
                // The child may legitimately exit without reading all input.
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                Err(e) => {
                    let path = self.stdin.clone().unwrap_or_default();
                    return Err(BuildError::io(path, e));
                }
            }
        }

        Ok(output)
    }

    /// Execute and require success.
    pub fn exec_and_check(&self) -> Result<Output, BuildError> {
        let output = self.exec()?;
        if !output.status.success() {
            return Err(BuildError::CommandFailed {
                command: self.display_command(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(output)
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Resolve a program path against the build's working directory.
///
/// Paths with more than one component (`./peg0`, `../../peg`) are relative
/// to `cwd`; bare names are looked up on `PATH`.
pub fn resolve_program(cwd: &Path, program: &Path) -> PathBuf {
    if program.is_absolute() || program.components().count() > 1 {
        return cwd.join(program);
    }
    find_executable(&program.to_string_lossy()).unwrap_or_else(|| program.to_path_buf())
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Mode of a newly written output file, as created under a `022` umask.
#[cfg(unix)]
const OUTPUT_MODE: u32 = 0o644;

/// Replace `path` with `contents` in one rename.
///
/// An existing file keeps its permissions; a new one gets ordinary
/// file permissions rather than the temp file's owner-only mode.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), BuildError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| BuildError::io(dir, e))?;
    tmp.write_all(contents)
        .map_err(|e| BuildError::io(tmp.path(), e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let perms = std::fs::metadata(path)
            .map(|meta| meta.permissions())
            .unwrap_or_else(|_| std::fs::Permissions::from_mode(OUTPUT_MODE));
        tmp.as_file()
            .set_permissions(perms)
            .map_err(|e| BuildError::io(tmp.path(), e))?;
    }

    tmp.persist(path)
        .map_err(|e| BuildError::io(path, e.error))?;
    Ok(())
}

fn echo(output: &Output) {
    let mut stderr = io::stderr().lock();
    let _ = stderr.write_all(&output.stdout);
    let _ = stderr.write_all(&output.stderr);
}
