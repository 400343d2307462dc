//! Builder for running external tools
//!
//! Every helper shells out (`ssh`, `gh`, `git`, `npm`, ...). [`ToolCommand`]
//! gives them one fluent API with consistent logging and error mapping:
//! a missing executable becomes [`ToolError::ToolNotFound`], a non-zero exit
//! becomes [`ToolError::CommandFailed`] carrying the tool's own output.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

use crate::core::ToolError;

/// Masked form of arguments registered with [`ToolCommand::secret_arg`].
const REDACTED: &str = "******";

pub struct ToolCommand {
    program: String,

    args: Vec<String>,

    /// Indices into `args` that must never be logged
    secret_indices: Vec<usize>,

    current_dir: Option<PathBuf>,

    env_vars: Vec<(String, String)>,

    context: Option<String>,
}

/// Captured result of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Exit status and captured stderr of a command that is allowed to fail.
#[derive(Debug, Clone)]
pub struct ProbeOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            secret_indices: Vec::new(),
            current_dir: None,
            env_vars: Vec::new(),
            context: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add an argument that is passed through but masked in logs and errors.
    pub fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.secret_indices.push(self.args.len());
        self.args.push(arg.into());
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// The command line as it may be shown to the user.
    pub fn display_line(&self) -> String {
        let mut parts = vec![self.program.clone()];
        for (i, arg) in self.args.iter().enumerate() {
            if self.secret_indices.contains(&i) {
                parts.push(REDACTED.to_string());
            } else {
                parts.push(arg.clone());
            }
        }
        parts.join(" ")
    }

    fn build(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }

        for (key, value) in &self.env_vars {
            // values may be secrets (SSHPASS)
            tracing::trace!(target: "command", "Setting env var: {}", key);
            cmd.env(key, value);
        }

        match &self.context {
            Some(ctx) => {
                tracing::debug!(target: "command", "({}) Executing: {}", ctx, self.display_line())
            }
            None => tracing::debug!(target: "command", "Executing: {}", self.display_line()),
        }

        cmd
    }

    fn spawn_error(&self, err: std::io::Error) -> anyhow::Error {
        if err.kind() == std::io::ErrorKind::NotFound {
            ToolError::ToolNotFound {
                tool: self.program.clone(),
            }
            .into()
        } else {
            anyhow::Error::new(err).context(format!("Failed to execute {}", self.display_line()))
        }
    }

    /// Run with captured output; a non-zero exit is an error.
    pub async fn execute(self) -> Result<CommandOutput> {
        let probe = self.probe().await?;

        if !probe.success {
            let output = if probe.stderr.trim().is_empty() {
                probe.stdout
            } else {
                probe.stderr
            };
            return Err(ToolError::CommandFailed {
                command: self.display_line(),
                output,
            }
            .into());
        }

        Ok(CommandOutput {
            stdout: probe.stdout,
            stderr: probe.stderr,
        })
    }

    /// Run with captured output and return stdout trimmed.
    pub async fn execute_stdout(self) -> Result<String> {
        let output = self.execute().await?;
        Ok(output.stdout.trim().to_string())
    }

    /// Run with captured output; a non-zero exit is reported, not raised.
    pub async fn probe(&self) -> Result<ProbeOutput> {
        let mut cmd = self.build();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let output = cmd.output().await.map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            tracing::debug!(
                target: "command",
                "Command failed with exit code: {:?}",
                output.status.code()
            );
        }

        Ok(ProbeOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    /// Run in the foreground with the terminal attached.
    ///
    /// There is no timeout: a hung tool blocks until the user interrupts it.
    pub async fn run_interactive(self) -> Result<ExitStatus> {
        let mut cmd = self.build();
        cmd.stdin(Stdio::inherit());
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());

        let mut child = cmd.spawn().map_err(|e| self.spawn_error(e))?;
        let status = child
            .wait()
            .await
            .with_context(|| format!("Failed to wait for {}", self.program))?;

        tracing::debug!(target: "command", "{} exited with {:?}", self.program, status.code());
        Ok(status)
    }

    /// Run in the foreground and fail on a non-zero exit.
    ///
    /// The tool already printed its own error output to the terminal.
    pub async fn run_interactive_checked(self) -> Result<()> {
        let line = self.display_line();
        let status = self.run_interactive().await?;
        if status.success() {
            Ok(())
        } else {
            Err(ToolError::CommandFailed {
                command: line,
                output: format!("exit code {}", status.code().unwrap_or(-1)),
            }
            .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_line_masks_secrets() {
        let cmd = ToolCommand::new("sshpass").arg("-p").secret_arg("hunter2").args(["ssh", "a@b"]);
        assert_eq!(cmd.display_line(), "sshpass -p ****** ssh a@b");
        assert_eq!(cmd.get_args()[1], "hunter2");
    }

    #[tokio::test]
    async fn test_missing_program_is_tool_not_found() {
        let err = ToolCommand::new("definitely-not-a-real-tool-xyz").execute().await.unwrap_err();
        let tool_err = err.downcast_ref::<ToolError>().unwrap();
        assert!(matches!(tool_err, ToolError::ToolNotFound { tool } if tool == "definitely-not-a-real-tool-xyz"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_captures_stdout() {
        let out = ToolCommand::new("sh").args(["-c", "echo hello"]).execute_stdout().await.unwrap();
        assert_eq!(out, "hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failure_carries_stderr() {
        let err = ToolCommand::new("sh")
            .args(["-c", "echo boom >&2; exit 3"])
            .execute()
            .await
            .unwrap_err();
        match err.downcast_ref::<ToolError>().unwrap() {
            ToolError::CommandFailed { output, .. } => assert_eq!(output.trim(), "boom"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_probe_reports_failure_without_error() {
        let probe = ToolCommand::new("sh").args(["-c", "exit 1"]).probe().await.unwrap();
        assert!(!probe.success);
    }
}
