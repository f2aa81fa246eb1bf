//! Stash primitives. The core identifies its own stashes strictly by
//! message, never by index, since indices shift underneath concurrent
//! stash activity from the user (spec §5).

use super::{VcsAdapter, VcsError, VcsResult};

/// One entry from `stash list`, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StashEntry {
    pub index: usize,
    pub stash_ref: String,
    pub message: String,
}

impl VcsAdapter {
    /// Push a stash (including untracked files) with an explicit message,
    /// returning its stash ref (`stash@{0}` at the time of the call).
    pub fn stash_push(&self, message: &str) -> VcsResult<String> {
        self.run_ok(
            &["stash", "push", "--include-untracked", "--message", message],
            "stash push",
        )?;
        self.stash_list()?
            .into_iter()
            .find(|s| s.message == message)
            .map(|s| s.stash_ref)
            .ok_or_else(|| VcsError::ParseError {
                context: format!("stash push reported success but no stash matches '{message}'"),
            })
    }

    pub fn stash_pop(&self, stash_ref: &str) -> VcsResult<()> {
        self.run_ok(&["stash", "pop", stash_ref], "stash pop")?;
        Ok(())
    }

    pub fn stash_drop(&self, stash_ref: &str) -> VcsResult<()> {
        self.run_ok(&["stash", "drop", stash_ref], "stash drop")?;
        Ok(())
    }

    pub fn stash_list(&self) -> VcsResult<Vec<StashEntry>> {
        let out = self.run_ok(
            &["stash", "list", "--format=%gd\u{1f}%gs"],
            "stash list",
        )?;
        let mut entries = Vec::new();
        for (index, line) in out.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            let (stash_ref, rest) = line.split_once('\u{1f}').ok_or_else(|| VcsError::ParseError {
                context: format!("malformed stash list line: '{line}'"),
            })?;
            // `git stash list` prefixes the subject with "On <branch>: ";
            // the portion after the colon is what the core's message
            // prefixes (`aleutian-*`) actually land in.
            let message = rest.split_once(": ").map(|(_, m)| m).unwrap_or(rest);
            entries.push(StashEntry {
                index,
                stash_ref: stash_ref.to_string(),
                message: message.to_string(),
            });
        }
        Ok(entries)
    }

    /// Find a stash by exact message match, newest first.
    pub fn find_stash_by_message(&self, message: &str) -> VcsResult<Option<StashEntry>> {
        Ok(self
            .stash_list()?
            .into_iter()
            .find(|s| s.message == message))
    }
}
