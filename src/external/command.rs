use std::io::Write;
use std::process::{Command, Stdio};

use super::ToolError;

/// Run a prepared command to completion, optionally feeding `stdin`.
///
/// Returns the captured standard output.
///
/// # Errors
///
/// Returns `ToolError::Spawn` if the binary cannot be started and
/// `ToolError::NonZeroExit` if it exits unsuccessfully.
pub fn run_tool(tool: &str, command: &mut Command, stdin: Option<&[u8]>) -> Result<String, ToolError> {
    tracing::debug!(tool, command = ?command, "Running external tool");

    command
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command.spawn().map_err(|source| ToolError::Spawn {
        tool: tool.to_string(),
        source,
    })?;

    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        // Written before waiting; inputs are small (spacers, repeats)
        pipe.write_all(input)?;
    }

    let output = child.wait_with_output()?;
    if !output.status.success() {
        return Err(ToolError::NonZeroExit {
            tool: tool.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_spawn_error() {
        let mut cmd = Command::new("definitely-not-an-installed-binary-4821");
        let err = run_tool("missing", &mut cmd, None).unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_reported() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo broken >&2; exit 3"]);
        let err = run_tool("sh", &mut cmd, None).unwrap_err();
        match err {
            ToolError::NonZeroExit { stderr, .. } => assert_eq!(stderr, "broken"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_stdin_is_forwarded() {
        let mut cmd = Command::new("cat");
        let out = run_tool("cat", &mut cmd, Some(b">a\nACGT\n")).unwrap();
        assert_eq!(out, ">a\nACGT\n");
    }
}
