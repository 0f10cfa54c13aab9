//! Invocation of external media tools (ffprobe, ffmpeg).

use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Command;

const MAX_STDERR_BYTES: usize = 2048;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid path for {tool}: {reason}")]
    InvalidPath { tool: &'static str, reason: String },

    #[error("Failed to execute {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} timed out after {}s", .timeout.as_secs())]
    TimedOut {
        tool: &'static str,
        timeout: Duration,
    },

    #[error("{tool} failed ({status}): {stderr}")]
    Failed {
        tool: &'static str,
        status: ExitStatus,
        stderr: String,
    },
}

/// Validate that a tool path doesn't contain shell metacharacters or traversal
pub fn validate_tool_path(tool: &'static str, path: &str) -> Result<(), ToolError> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.is_empty() {
        return Err(ToolError::InvalidPath {
            tool,
            reason: "path is empty".to_string(),
        });
    }
    if path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(ToolError::InvalidPath {
            tool,
            reason: format!("path contains dangerous characters: {}", path),
        });
    }
    if path.contains("..") {
        return Err(ToolError::InvalidPath {
            tool,
            reason: format!("path contains directory traversal: {}", path),
        });
    }
    Ok(())
}

/// Run `command` to completion and return its stdout.
///
/// The child is killed if `timeout` elapses first. A non-zero exit is an error
/// carrying the (truncated) stderr.
pub(crate) async fn run(
    tool: &'static str,
    mut command: Command,
    timeout: Duration,
) -> Result<Vec<u8>, ToolError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(result) => result.map_err(|source| ToolError::Spawn { tool, source })?,
        Err(_) => return Err(ToolError::TimedOut { tool, timeout }),
    };

    if !output.status.success() {
        let mut stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if stderr.len() > MAX_STDERR_BYTES {
            let mut cut = MAX_STDERR_BYTES;
            while !stderr.is_char_boundary(cut) {
                cut -= 1;
            }
            stderr.truncate(cut);
        }
        return Err(ToolError::Failed {
            tool,
            status: output.status,
            stderr,
        });
    }

    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_tool_path() {
        assert!(validate_tool_path("ffmpeg", "ffmpeg").is_ok());
        assert!(validate_tool_path("ffmpeg", "/usr/local/bin/ffmpeg").is_ok());
        assert!(validate_tool_path("ffmpeg", "").is_err());
        assert!(validate_tool_path("ffmpeg", "ffmpeg; rm -rf /").is_err());
        assert!(validate_tool_path("ffmpeg", "$(whoami)").is_err());
        assert!(validate_tool_path("ffmpeg", "../bin/ffmpeg").is_err());
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let command = Command::new("/nonexistent/clipvault-test-tool");
        let result = run("ffprobe", command, Duration::from_secs(5)).await;
        assert!(matches!(result, Err(ToolError::Spawn { tool: "ffprobe", .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_carries_stderr() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo broken input >&2; exit 3"]);
        let result = run("ffmpeg", command, Duration::from_secs(5)).await;
        match result {
            Err(ToolError::Failed { stderr, status, .. }) => {
                assert_eq!(stderr, "broken input");
                assert_eq!(status.code(), Some(3));
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_tool() {
        let mut command = Command::new("sleep");
        command.arg("5");
        let start = std::time::Instant::now();
        let result = run("ffmpeg", command, Duration::from_millis(100)).await;
        assert!(matches!(result, Err(ToolError::TimedOut { .. })));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stdout_is_returned() {
        let mut command = Command::new("sh");
        command.args(["-c", "printf hello"]);
        let stdout = run("ffprobe", command, Duration::from_secs(5)).await.unwrap();
        assert_eq!(stdout, b"hello");
    }
}
