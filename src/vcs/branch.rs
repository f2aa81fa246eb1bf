//! Branch primitives.

use super::{VcsAdapter, VcsResult};

impl VcsAdapter {
    pub fn branch_exists(&self, name: &str) -> bool {
        self.run(
            &["show-ref", "--verify", "--quiet", &format!("refs/heads/{name}")],
            "branch_exists",
        )
        .map(|o| o.success)
        .unwrap_or(false)
    }

    /// Create `name` at `at` without checking it out.
    pub fn create_branch(&self, name: &str, at: &str) -> VcsResult<()> {
        self.run_ok(&["branch", name, at], "create_branch")?;
        Ok(())
    }

    pub fn delete_branch(&self, name: &str, force: bool) -> VcsResult<()> {
        let flag = if force { "-D" } else { "-d" };
        self.run_ok(&["branch", flag, name], "delete_branch")?;
        Ok(())
    }
}
