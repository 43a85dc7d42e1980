//! Builder for executing external tool commands with timeout support.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Default command timeout: 24 hours, to accommodate long encodes.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(86_400);

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// A builder for constructing and executing external tool invocations.
///
/// # Example
///
/// ```no_run
/// use tm_av::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> tm_core::Result<()> {
/// let output = ToolCommand::new(PathBuf::from("ffprobe"))
///     .arg("-v").arg("quiet")
///     .arg("-print_format").arg("json")
///     .arg("-show_format")
///     .arg("-show_streams")
///     .arg("/path/to/video.mkv")
///     .execute()
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the maximum execution time.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// - Returns [`tm_core::Error::Tool`] if the process times out, is
    ///   cancelled, or fails to spawn.
    /// - Returns [`tm_core::Error::Tool`] if the process exits with a non-zero
    ///   status (message includes stderr).
    pub async fn execute(&self) -> tm_core::Result<ToolOutput> {
        let output = self.run(None).await?;

        if !output.status.success() {
            return Err(tm_core::Error::Tool {
                tool: self.program_name(),
                message: format!(
                    "exited with status {}: {}",
                    output.status,
                    output.stderr.trim()
                ),
            });
        }

        Ok(output)
    }

    /// Execute the command, capturing output regardless of exit status.
    ///
    /// A non-zero exit is *not* an error here; callers that classify tool
    /// failures (the retry engine) inspect [`ToolOutput::status`] and
    /// [`ToolOutput::stderr`] themselves. Spawn failures, timeouts, and
    /// cancellation still surface as [`tm_core::Error::Tool`].
    pub async fn run(&self, cancel: Option<&CancellationToken>) -> tm_core::Result<ToolOutput> {
        let program_name = self.program_name();

        tracing::debug!("Running {} {}", program_name, self.args.join(" "));

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.stdin(std::process::Stdio::null());
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());
        cmd.kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| tm_core::Error::Tool {
            tool: program_name.clone(),
            message: format!("failed to spawn: {e}"),
        })?;

        let wait = child.wait_with_output();
        tokio::pin!(wait);

        let result = if let Some(cancel) = cancel {
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(tm_core::Error::Tool {
                        tool: program_name,
                        message: "cancelled".into(),
                    });
                }
                r = tokio::time::timeout(self.timeout, &mut wait) => r,
            }
        } else {
            tokio::time::timeout(self.timeout, &mut wait).await
        };

        match result {
            Ok(Ok(output)) => Ok(ToolOutput {
                status: output.status,
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            }),
            Ok(Err(e)) => Err(tm_core::Error::Tool {
                tool: program_name,
                message: format!("I/O error waiting for process: {e}"),
            }),
            Err(_elapsed) => Err(tm_core::Error::Tool {
                tool: program_name,
                message: format!("timed out after {:?}", self.timeout),
            }),
        }
    }
}
