use runkit_core::ExecutionMode;
use std::process::Stdio;

use crate::tool::{ExecError, Tool};

/// Single choke point for every external command.
///
/// Production code uses [`Shim`], which either runs the tool
/// ([`RealExecutor`]) or prints a trace ([`DryRunExecutor`]). Tests use
/// mockall-generated mocks.
#[allow(async_fn_in_trait)]
pub trait CommandExecutor: Send + Sync {
    /// Execute a command and capture stdout.
    async fn exec(&self, tool: Tool, args: &[String]) -> Result<String, ExecError>;

    /// Execute a command, streaming its output to the terminal.
    async fn exec_streaming(&self, tool: Tool, args: &[String]) -> Result<(), ExecError>;

    /// Execute a command with data piped to stdin.
    async fn exec_with_stdin(
        &self,
        tool: Tool,
        args: &[String],
        stdin_data: &[u8],
    ) -> Result<String, ExecError>;

    /// Whether commands are only being traced.
    fn is_simulated(&self) -> bool;
}

/// Trace line printed in dry-run mode: `[DRY-RUN] <tool> <args...>`.
///
/// Arguments are joined as-is, never quoted.
pub fn dry_run_trace(tool: Tool, args: &[String]) -> String {
    let mut line = format!("[DRY-RUN] {}", tool.program());
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

// ── Real ──

/// Runs the tool as a child process.
pub struct RealExecutor;

fn command(tool: Tool, args: &[String]) -> tokio::process::Command {
    tracing::debug!(tool = %tool, args = ?args, "exec");
    let mut cmd = tokio::process::Command::new(tool.program());
    cmd.args(args);
    cmd
}

fn check_output(
    tool: Tool,
    args: &[String],
    output: std::process::Output,
) -> Result<String, ExecError> {
    if output.status.success() {
        String::from_utf8(output.stdout).map_err(|e| ExecError::InvalidUtf8 { tool, source: e })
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        tracing::debug!(tool = %tool, code = ?output.status.code(), "command failed");
        Err(ExecError::CommandFailed {
            tool,
            args: args.to_vec(),
            code: output.status.code(),
            stderr,
        })
    }
}

impl CommandExecutor for RealExecutor {
    async fn exec(&self, tool: Tool, args: &[String]) -> Result<String, ExecError> {
        let output = command(tool, args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ExecError::NotFound { tool, source: e })?;

        check_output(tool, args, output)
    }

    async fn exec_streaming(&self, tool: Tool, args: &[String]) -> Result<(), ExecError> {
        let status = command(tool, args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| ExecError::NotFound { tool, source: e })?;

        if status.success() {
            Ok(())
        } else {
            Err(ExecError::CommandFailed {
                tool,
                args: args.to_vec(),
                code: status.code(),
                stderr: String::new(),
            })
        }
    }

    async fn exec_with_stdin(
        &self,
        tool: Tool,
        args: &[String],
        stdin_data: &[u8],
    ) -> Result<String, ExecError> {
        use tokio::io::AsyncWriteExt;

        let mut child = command(tool, args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ExecError::NotFound { tool, source: e })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(stdin_data)
                .await
                .map_err(|e| ExecError::StdinWrite { tool, source: e })?;
            stdin
                .shutdown()
                .await
                .map_err(|e| ExecError::StdinWrite { tool, source: e })?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ExecError::NotFound { tool, source: e })?;

        check_output(tool, args, output)
    }

    fn is_simulated(&self) -> bool {
        false
    }
}

// ── Dry run ──

/// Prints what would run and reports success without touching anything.
/// Captured output is always empty. Data sent to stdin is never printed.
pub struct DryRunExecutor;

impl CommandExecutor for DryRunExecutor {
    async fn exec(&self, tool: Tool, args: &[String]) -> Result<String, ExecError> {
        println!("{}", dry_run_trace(tool, args));
        Ok(String::new())
    }

    async fn exec_streaming(&self, tool: Tool, args: &[String]) -> Result<(), ExecError> {
        println!("{}", dry_run_trace(tool, args));
        Ok(())
    }

    async fn exec_with_stdin(
        &self,
        tool: Tool,
        args: &[String],
        _stdin_data: &[u8],
    ) -> Result<String, ExecError> {
        println!("{}", dry_run_trace(tool, args));
        Ok(String::new())
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

// ── Mode switch ──

/// The executor selected by [`ExecutionMode::dry_run`].
pub enum Shim {
    Live(RealExecutor),
    DryRun(DryRunExecutor),
}

impl Shim {
    pub fn for_mode(mode: &ExecutionMode) -> Self {
        if mode.dry_run {
            Self::DryRun(DryRunExecutor)
        } else {
            Self::Live(RealExecutor)
        }
    }
}

impl CommandExecutor for Shim {
    async fn exec(&self, tool: Tool, args: &[String]) -> Result<String, ExecError> {
        match self {
            Self::Live(e) => e.exec(tool, args).await,
            Self::DryRun(e) => e.exec(tool, args).await,
        }
    }

    async fn exec_streaming(&self, tool: Tool, args: &[String]) -> Result<(), ExecError> {
        match self {
            Self::Live(e) => e.exec_streaming(tool, args).await,
            Self::DryRun(e) => e.exec_streaming(tool, args).await,
        }
    }

    async fn exec_with_stdin(
        &self,
        tool: Tool,
        args: &[String],
        stdin_data: &[u8],
    ) -> Result<String, ExecError> {
        match self {
            Self::Live(e) => e.exec_with_stdin(tool, args, stdin_data).await,
            Self::DryRun(e) => e.exec_with_stdin(tool, args, stdin_data).await,
        }
    }

    fn is_simulated(&self) -> bool {
        matches!(self, Self::DryRun(_))
    }
}
