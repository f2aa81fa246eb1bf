//! Ref resolution and tree-mutating primitives: checkout, reset, clean,
//! add, commit.

use super::{VcsAdapter, VcsError, VcsResult};

impl VcsAdapter {
    pub fn resolve_ref(&self, reference: &str) -> VcsResult<String> {
        let out = self.run_ok(&["rev-parse", reference], "resolve_ref")?;
        let sha = out.trim();
        if sha.is_empty() {
            return Err(VcsError::ParseError {
                context: format!("rev-parse produced no output for '{reference}'"),
            });
        }
        Ok(sha.to_string())
    }

    pub fn ref_exists(&self, reference: &str) -> bool {
        self.run(&["rev-parse", "--verify", "--quiet", reference], "ref_exists")
            .map(|o| o.success)
            .unwrap_or(false)
    }

    pub fn checkout(&self, reference: &str) -> VcsResult<()> {
        self.run_ok(&["checkout", reference], "checkout")?;
        Ok(())
    }

    /// Discard all tracked changes and move tree + index to `reference`.
    pub fn reset_hard(&self, reference: &str) -> VcsResult<()> {
        self.run_ok(&["reset", "--hard", reference], "reset --hard")?;
        Ok(())
    }

    /// Remove untracked files and empty directories. Does NOT touch
    /// ignored files (no `-x`).
    pub fn clean_untracked(&self) -> VcsResult<()> {
        self.run_ok(&["clean", "-fd"], "clean -fd")?;
        Ok(())
    }

    pub fn add(&self, paths: &[String]) -> VcsResult<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let mut args: Vec<&str> = vec!["add", "--"];
        args.extend(paths.iter().map(String::as_str));
        self.run_ok(&args, "add")?;
        Ok(())
    }

    pub fn add_all(&self) -> VcsResult<()> {
        self.run_ok(&["add", "-A"], "add -A")?;
        Ok(())
    }

    pub fn commit(&self, message: &str) -> VcsResult<String> {
        self.run_ok(&["commit", "--message", message, "--no-verify"], "commit")?;
        self.resolve_ref("HEAD")
    }
}
