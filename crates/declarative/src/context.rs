//! Apply context and provider traits
//!
//! Reconcilers get the API client and a command runner through
//! [`ApplyContext`], so they never depend on a concrete transport or on how
//! local commands are executed.

use crate::types::CommandOutput;
use runcloud_api::{Client, Error, Result};
use std::sync::{Arc, Mutex};

/// Runs scripts on the local machine
///
/// Used for the server agent installation script, which needs root.
/// The implementation decides how privileges are obtained.
pub trait CommandRunner: Send + Sync {
    /// Run a shell script
    fn run(&self, script: &str) -> Result<CommandOutput>;

    /// Run a script and fail unless it exits successfully
    fn run_checked(&self, script: &str) -> Result<String> {
        let output = self.run(script)?;
        if !output.success {
            return Err(Error::Command(output.stderr_str().trim().to_string()));
        }
        Ok(output.stdout_str())
    }
}

/// Runner that refuses to execute anything
pub struct NoRunner;

impl CommandRunner for NoRunner {
    fn run(&self, _script: &str) -> Result<CommandOutput> {
        Err(Error::Command(
            "local script execution is not available".to_string(),
        ))
    }
}

/// Runner that records scripts instead of running them
#[derive(Debug, Clone, Default)]
pub struct MockRunner {
    scripts: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// A runner whose scripts all exit with failure
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Scripts received so far
    pub fn scripts(&self) -> Vec<String> {
        self.scripts.lock().unwrap().clone()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, script: &str) -> Result<CommandOutput> {
        self.scripts.lock().unwrap().push(script.to_string());
        Ok(CommandOutput {
            stdout: Vec::new(),
            stderr: if self.fail { b"exit 1".to_vec() } else { Vec::new() },
            success: !self.fail,
        })
    }
}

/// Context passed to reconcilers
pub struct ApplyContext<'a> {
    /// API client
    pub client: &'a Client,
    /// Runner for local scripts
    pub runner: &'a dyn CommandRunner,
}

impl<'a> ApplyContext<'a> {
    /// Create a context that cannot run local scripts
    pub fn new(client: &'a Client) -> Self {
        Self {
            client,
            runner: &NoRunner,
        }
    }

    /// Create a context with a command runner
    pub fn with_runner(client: &'a Client, runner: &'a dyn CommandRunner) -> Self {
        Self { client, runner }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_runner_refuses() {
        let err = NoRunner.run("echo hi").unwrap_err();
        assert!(matches!(err, Error::Command(_)));
    }

    #[test]
    fn test_mock_runner_records() {
        let runner = MockRunner::new();
        assert!(runner.run_checked("bash install.sh").is_ok());
        assert_eq!(runner.scripts(), vec!["bash install.sh".to_string()]);
    }

    #[test]
    fn test_run_checked_reports_stderr() {
        let err = MockRunner::failing().run_checked("false").unwrap_err();
        assert_eq!(err.to_string(), "command failed: exit 1");
    }
}
