//! Local script execution for the server installation script

use declarative::{CommandOutput, CommandRunner};
use runcloud_api::{Error, Result};
use std::process::{Command, Stdio};

/// Runs scripts with `sh -c`, optionally under `sudo`
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner {
    sudo: bool,
}

impl ShellRunner {
    pub fn new(sudo: bool) -> Self {
        Self { sudo }
    }

    fn command(&self, script: &str) -> Command {
        let mut cmd = if self.sudo {
            let mut cmd = Command::new("sudo");
            cmd.arg("sh");
            cmd
        } else {
            Command::new("sh")
        };
        cmd.arg("-c").arg(script);
        cmd
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, script: &str) -> Result<CommandOutput> {
        log::debug!("running script ({} bytes, sudo: {})", script.len(), self.sudo);
        let output = self
            .command(script)
            .stdin(Stdio::inherit())
            .output()
            .map_err(|e| Error::Command(format!("Failed to execute sh: {e}")))?;
        Ok(output.into())
    }
}
