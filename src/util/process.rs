//! Subprocess execution utilities.
//!
//! Commands are always an explicit argument vector, never a shell string.
//! Every run honors an optional timeout and an optional [`CancelToken`]; in
//! both cases the child is killed and reaped before the call returns.

use std::ffi::OsStr;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;

/// How often a running child is polled for exit, timeout and cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Error raised while running an external command.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("`{program}` was not found")]
    NotFound { program: String },

    #[error("failed to spawn `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for `{program}`")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("`{program}` was cancelled")]
    Cancelled { program: String },

    #[error("`{program}` failed with exit code {code:?}\n{stderr}")]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

impl ProcessError {
    /// The program the error concerns.
    pub fn program(&self) -> &str {
        match self {
            ProcessError::NotFound { program }
            | ProcessError::Spawn { program, .. }
            | ProcessError::Wait { program, .. }
            | ProcessError::Timeout { program, .. }
            | ProcessError::Cancelled { program }
            | ProcessError::Failed { program, .. } => program,
        }
    }
}

/// Shared flag used to cancel an in-flight command.
///
/// Clones share the same flag, so the host keeps one clone and hands the
/// other to the build call.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when terminated by a signal
    pub status: Option<i32>,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl ProcessOutput {
    /// Whether the command exited with status 0.
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Lines of standard output.
    pub fn stdout_lines(&self) -> Vec<String> {
        self.stdout.lines().map(str::to_string).collect()
    }

    /// Lines of standard output followed by lines of standard error.
    pub fn all_lines(&self) -> Vec<String> {
        self.stdout
            .lines()
            .chain(self.stderr.lines())
            .map(str::to_string)
            .collect()
    }
}

/// Builder for subprocess execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
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

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    /// Build the Command.
    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    /// Execute the command and wait for completion.
    ///
    /// A non-zero exit status is not an error here; use
    /// [`CommandRunner::run_checked`] when it should be.
    pub fn exec(
        &self,
        timeout: Option<Duration>,
        cancel: Option<&CancelToken>,
    ) -> Result<ProcessOutput, ProcessError> {
        let program = self.program_name();
        let is_cancelled = || cancel.is_some_and(CancelToken::is_cancelled);

        if is_cancelled() {
            return Err(ProcessError::Cancelled { program });
        }

        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("running `{}`", self.display_command());

        let mut child = cmd.spawn().map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ProcessError::NotFound {
                    program: program.clone(),
                }
            } else {
                ProcessError::Spawn {
                    program: program.clone(),
                    source,
                }
            }
        })?;

        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(source) => {
                    kill_and_reap(&mut child);
                    return Err(ProcessError::Wait { program, source });
                }
            }

            if is_cancelled() {
                kill_and_reap(&mut child);
                return Err(ProcessError::Cancelled { program });
            }

            if let Some(limit) = timeout {
                if started.elapsed() >= limit {
                    kill_and_reap(&mut child);
                    return Err(ProcessError::Timeout {
                        program,
                        timeout: limit,
                    });
                }
            }

            thread::sleep(POLL_INTERVAL);
        };

        Ok(ProcessOutput {
            status: status.code(),
            stdout: join_reader(stdout),
            stderr: join_reader(stderr),
        })
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join_reader(handle: Option<JoinHandle<String>>) -> String {
    handle
        .map(|h| h.join().unwrap_or_default())
        .unwrap_or_default()
}

fn kill_and_reap(child: &mut Child) {
    if let Err(e) = child.kill() {
        tracing::debug!("failed to kill child process: {}", e);
    }
    if let Err(e) = child.wait() {
        tracing::debug!("failed to reap child process: {}", e);
    }
}

/// Runs commands on behalf of a builder.
///
/// The real implementation spawns processes; tests substitute a runner that
/// replays canned output.
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion, regardless of its exit status.
    fn run(
        &self,
        cmd: &ProcessBuilder,
        timeout: Option<Duration>,
        cancel: Option<&CancelToken>,
    ) -> Result<ProcessOutput, ProcessError>;

    /// Run a command and require a zero exit status.
    fn run_checked(
        &self,
        cmd: &ProcessBuilder,
        timeout: Option<Duration>,
        cancel: Option<&CancelToken>,
    ) -> Result<ProcessOutput, ProcessError> {
        let output = self.run(cmd, timeout, cancel)?;
        if !output.success() {
            return Err(ProcessError::Failed {
                program: cmd.display_command(),
                code: output.status,
                stderr: output.stderr,
            });
        }
        Ok(output)
    }
}

/// Runner that spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        cmd: &ProcessBuilder,
        timeout: Option<Duration>,
        cancel: Option<&CancelToken>,
    ) -> Result<ProcessOutput, ProcessError> {
        cmd.exec(timeout, cancel)
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(unix)]
    fn test_process_builder() {
        let output = ProcessBuilder::new("echo").arg("hello").exec(None, None).unwrap();

        assert!(output.success());
        assert_eq!(output.stdout_lines(), vec!["hello".to_string()]);
    }

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("verilator").args(["--cc", "-O0", "top.v"]);

        assert_eq!(pb.display_command(), "verilator --cc -O0 top.v");
    }

    #[test]
    fn test_missing_program_is_not_found() {
        let err = ProcessBuilder::new("hdlcheck-no-such-tool-4242")
            .arg("--version")
            .exec(None, None)
            .unwrap_err();

        assert!(matches!(err, ProcessError::NotFound { .. }));
    }

    #[test]
    #[cfg(unix)]
    fn test_timeout_kills_process() {
        let started = Instant::now();
        let err = ProcessBuilder::new("sleep")
            .arg("5")
            .exec(Some(Duration::from_millis(100)), None)
            .unwrap_err();

        assert!(matches!(err, ProcessError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    #[cfg(unix)]
    fn test_cancel_kills_process() {
        let token = CancelToken::new();
        let remote = token.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            remote.cancel();
        });

        let err = ProcessBuilder::new("sleep")
            .arg("5")
            .exec(None, Some(&token))
            .unwrap_err();
        canceller.join().unwrap();

        assert!(matches!(err, ProcessError::Cancelled { .. }));
    }

    #[test]
    fn test_pre_cancelled_token_never_spawns() {
        let token = CancelToken::new();
        token.cancel();

        let err = ProcessBuilder::new("hdlcheck-no-such-tool-4242")
            .exec(None, Some(&token))
            .unwrap_err();

        assert!(matches!(err, ProcessError::Cancelled { .. }));
    }

    #[test]
    #[cfg(unix)]
    fn test_run_checked_rejects_failure() {
        let err = SystemRunner
            .run_checked(&ProcessBuilder::new("false"), None, None)
            .unwrap_err();

        assert!(matches!(err, ProcessError::Failed { code: Some(1), .. }));
    }

    #[test]
    fn test_all_lines_orders_stdout_first() {
        let output = ProcessOutput {
            status: Some(1),
            stdout: "a\nb\n".to_string(),
            stderr: "c\n".to_string(),
        };
        assert_eq!(output.all_lines(), vec!["a", "b", "c"]);
        assert!(!output.success());
    }
}
