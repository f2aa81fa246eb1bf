//! Subprocess execution for the VCS adapter.
//!
//! Every git invocation goes through [`run`], which always passes an argv
//! array (never a shell string) and always enforces a per-operation
//! timeout via `wait_timeout`, since the engine is synchronous end to end.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use wait_timeout::ChildExt;

use super::error::VcsError;

/// Result of a completed (non-timed-out) subprocess run.
pub(crate) struct Output {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Run `git <args>` in `cwd`, bounded by `timeout`.
///
/// `operation` names the logical operation for error messages (e.g.
/// `"worktree add"`), which may differ from the raw argv when a caller
/// wants a friendlier label.
pub(crate) fn run_git(
    cwd: &Path,
    args: &[&str],
    timeout: Duration,
    operation: &str,
) -> Result<Output, VcsError> {
    let mut child = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| VcsError::ToolNotFound {
            operation: operation.to_string(),
            source: e.to_string(),
        })?;

    // Handles must be taken before wait_timeout, which can reap the child.
    let mut stdout_handle = child.stdout.take();
    let mut stderr_handle = child.stderr.take();

    match child.wait_timeout(timeout) {
        Ok(Some(status)) => {
            let mut stdout = Vec::new();
            let mut stderr = Vec::new();
            if let Some(h) = stdout_handle.as_mut() {
                let _ = h.read_to_end(&mut stdout);
            }
            if let Some(h) = stderr_handle.as_mut() {
                let _ = h.read_to_end(&mut stderr);
            }
            Ok(Output {
                success: status.success(),
                stdout: String::from_utf8_lossy(&stdout).into_owned(),
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
            })
        }
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            Err(VcsError::Timeout {
                operation: operation.to_string(),
            })
        }
        Err(e) => Err(VcsError::ToolNotFound {
            operation: operation.to_string(),
            source: e.to_string(),
        }),
    }
}
