//! Status queries: working-tree cleanliness, HEAD, and in-progress
//! operation markers.

use std::path::Path;

use super::parse::{parse_status_porcelain, StatusSummary};
use super::{VcsAdapter, VcsResult};

/// Marker files under `.git` that indicate an in-progress operation of
/// the underlying tool. Presence of any of these blocks transaction
/// admission (spec §6).
const REBASE_MARKERS: &[&str] = &["rebase-merge", "rebase-apply"];
const MERGE_MARKER: &str = "MERGE_HEAD";
const CHERRY_PICK_MARKER: &str = "CHERRY_PICK_HEAD";
const BISECT_MARKER: &str = "BISECT_LOG";

pub const DETACHED_SENTINEL: &str = "detached";

impl VcsAdapter {
    /// Resolve the `.git` metadata directory, following worktree
    /// `.git` files and `gitdir:` redirection. Falls back to
    /// `<root>/.git` if the query fails (marker probes then simply
    /// never find anything, which is the safe default).
    fn git_dir(&self) -> VcsResult<std::path::PathBuf> {
        match self.run_ok(&["rev-parse", "--git-dir"], "rev-parse --git-dir") {
            Ok(out) => {
                let trimmed = out.trim();
                let path = Path::new(trimmed);
                if path.is_absolute() {
                    Ok(path.to_path_buf())
                } else {
                    Ok(self.root.join(path))
                }
            }
            Err(e) => Err(e),
        }
    }

    fn marker_present(&self, name: &str) -> bool {
        self.git_dir()
            .map(|dir| dir.join(name).exists())
            .unwrap_or(false)
    }

    pub fn is_rebase_in_progress(&self) -> bool {
        REBASE_MARKERS.iter().any(|m| self.marker_present(m))
    }

    pub fn is_merge_in_progress(&self) -> bool {
        self.marker_present(MERGE_MARKER)
    }

    pub fn is_cherry_pick_in_progress(&self) -> bool {
        self.marker_present(CHERRY_PICK_MARKER)
    }

    pub fn is_bisect_in_progress(&self) -> bool {
        self.marker_present(BISECT_MARKER)
    }

    pub fn is_detached_head(&self) -> VcsResult<bool> {
        let out = self.run_ok(
            &["symbolic-ref", "-q", "HEAD"],
            "symbolic-ref -q HEAD",
        );
        Ok(out.is_err())
    }

    /// Current branch name, or [`DETACHED_SENTINEL`] when HEAD is detached.
    pub fn current_branch(&self) -> VcsResult<String> {
        let out = self.run(&["symbolic-ref", "-q", "--short", "HEAD"], "current branch")?;
        if out.success {
            Ok(out.stdout.trim().to_string())
        } else {
            Ok(DETACHED_SENTINEL.to_string())
        }
    }

    pub fn has_staged_changes(&self) -> VcsResult<bool> {
        let out = self.run(&["diff", "--cached", "--quiet"], "diff --cached --quiet")?;
        Ok(!out.success)
    }

    pub fn has_unstaged_changes(&self) -> VcsResult<bool> {
        let out = self.run(&["diff", "--quiet"], "diff --quiet")?;
        Ok(!out.success)
    }

    pub fn status(&self) -> VcsResult<StatusSummary> {
        let stdout = self.run_ok(&["status", "--porcelain"], "status --porcelain")?;
        Ok(parse_status_porcelain(&stdout))
    }
}
