//! Builder for executing external tool commands with timeout support.

use crate::{Error, Result};
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Default command timeout: 10 minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

const POLL_INTERVAL: Duration = Duration::from_millis(20);

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
/// Execution blocks the caller until the process exits or the timeout
/// expires, in which case the process is killed.
///
/// # Example
///
/// ```no_run
/// use cutlist_av::ToolCommand;
///
/// let output = ToolCommand::new("ffprobe")
///     .arg("-v").arg("quiet")
///     .arg("-print_format").arg("json")
///     .arg("-show_format")
///     .arg("/path/to/song.mp3")
///     .execute()?;
/// println!("{}", output.stdout);
/// # Ok::<(), cutlist_av::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
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

    /// The arguments added so far.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Shell-style rendering of the full command line, for logs and errors.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.to_string_lossy().to_string())
            .chain(self.args.iter().cloned())
            .map(|part| quote(&part))
            .collect::<Vec<_>>()
            .join(" ")
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
    /// - [`Error::ToolNotFound`] if the program cannot be found.
    /// - [`Error::Timeout`] if the process outlives the timeout.
    /// - [`Error::CommandFailed`] if the process exits with a non-zero status
    ///   (carries the command line and stderr).
    pub fn execute(&self) -> Result<ToolOutput> {
        let command_line = self.command_line();
        tracing::debug!("run_command: {}", command_line);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::tool_not_found(self.program_name())
                } else {
                    Error::Io(e)
                }
            })?;

        // Drain both pipes off-thread so a chatty tool never blocks on a full pipe.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                tracing::warn!("Killed after {:?}: {}", self.timeout, command_line);
                return Err(Error::Timeout {
                    command: command_line,
                    timeout: self.timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        let output = ToolOutput {
            status,
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        };

        if !output.stderr.is_empty() {
            tracing::trace!("{} stderr: {}", self.program_name(), output.stderr.trim());
        }

        if !status.success() {
            return Err(Error::command_failed(
                command_line,
                status.to_string(),
                output.stderr.trim(),
            ));
        }

        Ok(output)
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn quote(part: &str) -> String {
    if !part.is_empty() && !part.contains(|c: char| c.is_whitespace() || c == '"' || c == '\'') {
        return part.to_string();
    }
    format!("\"{}\"", part.replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn execute_echo() {
        // `echo` should be universally available.
        let output = ToolCommand::new("echo").arg("hello").execute();

        match output {
            Ok(out) => {
                assert!(out.status.success());
                assert!(out.stdout.trim().contains("hello"));
            }
            Err(_) => {
                // On some minimal environments echo may not exist; skip.
            }
        }
    }

    #[test]
    fn execute_nonexistent_tool() {
        let result = ToolCommand::new("nonexistent_tool_xyz_12345").execute();
        assert_matches!(result, Err(Error::ToolNotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_command_failed() {
        let result = ToolCommand::new("sh")
            .args(["-c", "echo oops >&2; exit 3"])
            .execute();

        match result {
            Err(Error::CommandFailed {
                command, stderr, ..
            }) => {
                assert!(command.starts_with("sh -c"));
                assert_eq!(stderr, "oops");
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn timeout_fires() {
        // `sleep 10` should be killed well before 10 seconds.
        let result = ToolCommand::new("sleep")
            .arg("10")
            .timeout(Duration::from_millis(100))
            .execute();
        let err = result.unwrap_err();
        assert!(err.to_string().contains("timed out"), "unexpected error: {err}");
    }

    #[test]
    fn command_line_quotes_spaces() {
        let mut cmd = ToolCommand::new("ffmpeg");
        cmd.arg("-i").arg("my song.mp3").arg("out.wav");
        assert_eq!(cmd.command_line(), "ffmpeg -i \"my song.mp3\" out.wav");
        assert_eq!(cmd.get_args().len(), 3);
    }
}
