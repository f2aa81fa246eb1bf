//! VCS adapter error types.

use std::fmt;

/// Errors surfaced by the VCS adapter (C1).
///
/// Distinguishable as required by the capability-surface contract: tool
/// absence, timeout, and non-zero exit are three different failure modes
/// and callers need to tell them apart.
#[derive(Debug)]
pub enum VcsError {
    /// The workspace root is not under version control.
    NotARepository,
    /// The `git` binary could not be located or executed.
    ToolNotFound { operation: String, source: String },
    /// The operation exceeded its per-operation timeout.
    Timeout { operation: String },
    /// `git` exited non-zero; `stderr` is the captured output.
    CommandFailed {
        operation: String,
        stderr: String,
    },
    /// Output from `git` could not be parsed into the expected shape.
    ParseError { context: String },
}

impl fmt::Display for VcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VcsError::NotARepository => write!(f, "workspace is not a git repository"),
            VcsError::ToolNotFound { operation, source } => {
                write!(f, "git not found while running '{operation}': {source}")
            }
            VcsError::Timeout { operation } => {
                write!(f, "git operation '{operation}' timed out")
            }
            VcsError::CommandFailed { operation, stderr } => {
                write!(f, "git '{operation}' failed: {}", stderr.trim())
            }
            VcsError::ParseError { context } => {
                write!(f, "failed to parse git output: {context}")
            }
        }
    }
}

impl std::error::Error for VcsError {}

pub type VcsResult<T> = Result<T, VcsError>;
