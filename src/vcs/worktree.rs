//! Sub-workspace (git worktree) lifecycle.

use std::path::Path;

use super::parse::parse_worktree_list;
use super::{SubWorkspaceInfo, VcsAdapter, VcsError, VcsResult};

impl VcsAdapter {
    /// Materialize a detached working tree at `path` pointing at `at_ref`,
    /// independent of the primary working tree.
    pub fn create_sub_workspace(&self, path: &Path, at_ref: &str) -> VcsResult<()> {
        let path_str = path.to_string_lossy();
        self.run_ok(
            &["worktree", "add", "--detach", &path_str, at_ref],
            "worktree add",
        )?;
        Ok(())
    }

    /// Tear down a sub-workspace. Falls back to raw directory removal if
    /// the tool refuses (e.g. the directory was already damaged), but
    /// only reports success once `path` is confirmed gone — a caller
    /// relying on `Ok(())` meaning "no longer on disk" (commit/rollback
    /// finalization) would otherwise be lied to.
    pub fn remove_sub_workspace(&self, path: &Path, force: bool) -> VcsResult<()> {
        let path_str = path.to_string_lossy();
        let mut args = vec!["worktree", "remove"];
        if force {
            args.push("--force");
        }
        args.push(&path_str);
        let result = self.run(&args, "worktree remove")?;
        if !result.success && path.exists() {
            let _ = std::fs::remove_dir_all(path);
        }
        let _ = self.run(&["worktree", "prune"], "worktree prune");

        if path.exists() {
            return Err(VcsError::CommandFailed {
                operation: "worktree remove".to_string(),
                stderr: format!(
                    "sub-workspace directory still exists at {} after removal attempt",
                    path.display()
                ),
            });
        }
        Ok(())
    }

    pub fn list_sub_workspaces(&self) -> VcsResult<Vec<SubWorkspaceInfo>> {
        let out = self.run_ok(
            &["worktree", "list", "--porcelain"],
            "worktree list --porcelain",
        )?;
        parse_worktree_list(&out)
    }
}
