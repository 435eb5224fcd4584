//! Test utilities and mocks for hdlcheck unit tests.
//!
//! [`MockRunner`] stands in for [`SystemRunner`](crate::util::process::SystemRunner)
//! so builders can be exercised against canned tool output without any HDL
//! tool installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use hdlcheck::test_support::{MockRunner, MockProcessOutput, VERILATOR_VERSION};
//!
//! let runner = Arc::new(MockRunner::new());
//! runner.expect("verilator --version", MockProcessOutput::success(VERILATOR_VERSION));
//! let builder = Verilator::new(BuilderConfig::new(tmp.path()).runner(runner.clone()));
//! ```

pub mod fixtures;

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::util::process::{CancelToken, CommandRunner, ProcessBuilder, ProcessError, ProcessOutput};

// Re-export fixtures for convenience
pub use fixtures::*;

/// Mock process output for testing command execution.
#[derive(Debug, Clone)]
pub struct MockProcessOutput {
    /// Exit status code (0 = success).
    pub status: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl MockProcessOutput {
    /// Create a successful output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        MockProcessOutput {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Create a failure output with the given stderr and status code.
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Create an output with both stdout and stderr.
    pub fn with_output(status: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    fn to_output(&self) -> ProcessOutput {
        ProcessOutput {
            status: Some(self.status),
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
        }
    }
}

/// Pattern for matching commands in [`MockRunner`].
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on full command string.
    Exact(String),
    /// Match if command starts with prefix.
    StartsWith(String),
}

impl CommandPattern {
    /// Check if this pattern matches the given command.
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
        }
    }
}

/// What a matched command produces.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// The command ran and produced this output.
    Output(MockProcessOutput),
    /// The command hit its timeout.
    Timeout,
}

#[derive(Debug)]
struct Expectation {
    pattern: CommandPattern,
    response: MockResponse,
}

#[derive(Debug, Default)]
struct MockState {
    expectations: Vec<Expectation>,
    calls: Vec<String>,
}

/// Command runner that replays canned output.
///
/// Commands are matched against expectations in insertion order using
/// [`ProcessBuilder::display_command`]. A command nothing matches fails as
/// if the program did not exist.
#[derive(Debug, Default)]
pub struct MockRunner {
    state: Mutex<MockState>,
}

impl MockRunner {
    /// Create a runner with no expectations.
    pub fn new() -> Self {
        MockRunner::default()
    }

    fn push(&self, pattern: CommandPattern, response: MockResponse) -> &Self {
        self.lock().expectations.push(Expectation { pattern, response });
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an expectation for an exact command match.
    pub fn expect(&self, cmd: &str, output: MockProcessOutput) -> &Self {
        self.push(CommandPattern::Exact(cmd.to_string()), MockResponse::Output(output))
    }

    /// Add an expectation for a command starting with a prefix.
    pub fn expect_prefix(&self, prefix: &str, output: MockProcessOutput) -> &Self {
        self.push(
            CommandPattern::StartsWith(prefix.to_string()),
            MockResponse::Output(output),
        )
    }

    /// Make commands starting with `prefix` time out.
    pub fn expect_timeout(&self, prefix: &str) -> &Self {
        self.push(CommandPattern::StartsWith(prefix.to_string()), MockResponse::Timeout)
    }

    /// All commands that were run, in order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }
}

impl CommandRunner for MockRunner {
    fn run(
        &self,
        cmd: &ProcessBuilder,
        timeout: Option<Duration>,
        cancel: Option<&CancelToken>,
    ) -> Result<ProcessOutput, ProcessError> {
        let program = cmd.get_program().display().to_string();
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(ProcessError::Cancelled { program });
        }

        let full_cmd = cmd.display_command();
        let mut state = self.lock();
        state.calls.push(full_cmd.clone());

        let response = state
            .expectations
            .iter()
            .find(|e| e.pattern.matches(&full_cmd))
            .map(|e| e.response.clone());

        match response {
            Some(MockResponse::Output(output)) => Ok(output.to_output()),
            Some(MockResponse::Timeout) => Err(ProcessError::Timeout {
                program,
                timeout: timeout.unwrap_or_default(),
            }),
            None => Err(ProcessError::NotFound { program }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_runner_basic() {
        let runner = MockRunner::new();
        runner
            .expect("ghdl --version", MockProcessOutput::success(GHDL_VERSION))
            .expect_prefix("ghdl -a", MockProcessOutput::failure(1, "top.vhd:1:1: oops"));

        let out = runner
            .run(&ProcessBuilder::new("ghdl").arg("--version"), None, None)
            .unwrap();
        assert!(out.success());

        let out = runner
            .run(&ProcessBuilder::new("ghdl").arg("-a").arg("top.vhd"), None, None)
            .unwrap();
        assert_eq!(out.status, Some(1));
        assert_eq!(runner.calls(), ["ghdl --version", "ghdl -a top.vhd"]);
    }

    #[test]
    fn test_mock_runner_unexpected() {
        let runner = MockRunner::new();
        let err = runner
            .run(&ProcessBuilder::new("unknown"), None, None)
            .unwrap_err();
        assert!(matches!(err, ProcessError::NotFound { .. }));
    }

    #[test]
    fn test_mock_runner_honors_cancel() {
        let runner = MockRunner::new();
        runner.expect("ghdl --version", MockProcessOutput::success(GHDL_VERSION));
        let token = CancelToken::new();
        token.cancel();

        let err = runner
            .run(&ProcessBuilder::new("ghdl").arg("--version"), None, Some(&token))
            .unwrap_err();
        assert!(matches!(err, ProcessError::Cancelled { .. }));
        assert!(runner.calls().is_empty());
    }
}
