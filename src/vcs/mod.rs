//! Thin capability surface over the `git` CLI (C1).
//!
//! [`VcsAdapter`] is the single logical capability set the rest of the
//! crate consumes, split internally into focused sub-modules the way the
//! corpus splits a `Repository` type into `working_tree` / `worktrees` /
//! `diff` files: `status`, `refs`, `stash`, `branch`, `worktree`.

mod branch;
pub mod error;
mod parse;
mod process;
mod refs;
mod stash;
mod status;
mod worktree;

use std::path::PathBuf;
use std::time::{Duration, Instant};

pub use error::{VcsError, VcsResult};
pub use parse::{StatusSummary, SubWorkspaceInfo};
pub use stash::StashEntry;
pub use status::DETACHED_SENTINEL;

use crate::observability::Observability;

/// A thin, stateless handle over a single working directory, scoped to
/// a fixed per-operation timeout.
///
/// Construction is infallible: the caller (the Manager) is responsible
/// for validating that `root` is absolute, since that's a configuration
/// error surfaced at a higher layer (spec §7).
#[derive(Clone)]
pub struct VcsAdapter {
    root: PathBuf,
    timeout: Duration,
    observability: Observability,
}

impl VcsAdapter {
    pub fn new(root: PathBuf, timeout: Duration, observability: Observability) -> Self {
        Self {
            root,
            timeout,
            observability,
        }
    }

    /// Construct an adapter scoped to a different directory within the
    /// same tree (e.g. a sub-workspace), reusing this adapter's timeout
    /// and observability handle.
    pub fn scoped_to(&self, path: PathBuf) -> Self {
        Self {
            root: path,
            timeout: self.timeout,
            observability: self.observability.clone(),
        }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Every git invocation funnels through here, so this is the one
    /// place a `transaction.vcs.<op>` span and its duration histogram
    /// need to be wired for the whole adapter surface to be covered.
    fn run(&self, args: &[&str], operation: &str) -> VcsResult<process::Output> {
        let span = self.observability.vcs_span(operation);
        let _enter = span.enter();
        let start = Instant::now();
        let result = process::run_git(&self.root, args, self.timeout, operation);
        self.observability
            .observe_vcs_duration_secs(operation, start.elapsed().as_secs_f64());
        result
    }

    fn run_ok(&self, args: &[&str], operation: &str) -> VcsResult<String> {
        let out = self.run(args, operation)?;
        if !out.success {
            return Err(VcsError::CommandFailed {
                operation: operation.to_string(),
                stderr: out.stderr,
            });
        }
        Ok(out.stdout)
    }

    pub fn is_repository(&self) -> bool {
        self.run(&["rev-parse", "--git-dir"], "rev-parse --git-dir")
            .map(|o| o.success)
            .unwrap_or(false)
    }
}
