//! Parsers for `git`'s porcelain output formats.

use std::path::PathBuf;

use super::error::VcsError;

/// One record from `git worktree list --porcelain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubWorkspaceInfo {
    pub path: PathBuf,
    pub head: String,
    pub branch: Option<String>,
    pub locked: bool,
    pub detached: bool,
}

/// Parse `git worktree list --porcelain` output.
///
/// Records are separated by blank lines; each record is a sequence of
/// `key value` lines. `worktree`, `HEAD`, `branch`, and the valueless
/// markers `locked` / `detached` are recognized; `branch` values of the
/// form `refs/heads/X` collapse to `X`. A record not terminated by a
/// trailing blank line is still emitted.
pub(crate) fn parse_worktree_list(output: &str) -> Result<Vec<SubWorkspaceInfo>, VcsError> {
    let mut records = Vec::new();
    let mut current: Option<SubWorkspaceInfo> = None;

    for line in output.lines() {
        if line.is_empty() {
            if let Some(wt) = current.take() {
                records.push(wt);
            }
            continue;
        }

        let (key, value) = match line.split_once(' ') {
            Some((k, v)) => (k, Some(v)),
            None => (line, None),
        };

        match key {
            "worktree" => {
                let path = value.ok_or_else(|| VcsError::ParseError {
                    context: "worktree line missing path".to_string(),
                })?;
                current = Some(SubWorkspaceInfo {
                    path: PathBuf::from(path),
                    head: String::new(),
                    branch: None,
                    locked: false,
                    detached: false,
                });
            }
            "HEAD" => {
                if let Some(wt) = current.as_mut() {
                    wt.head = value
                        .ok_or_else(|| VcsError::ParseError {
                            context: "HEAD line missing sha".to_string(),
                        })?
                        .to_string();
                }
            }
            "branch" => {
                if let Some(wt) = current.as_mut() {
                    let branch_ref = value.ok_or_else(|| VcsError::ParseError {
                        context: "branch line missing ref".to_string(),
                    })?;
                    let branch = branch_ref
                        .strip_prefix("refs/heads/")
                        .unwrap_or(branch_ref)
                        .to_string();
                    wt.branch = Some(branch);
                }
            }
            "locked" => {
                if let Some(wt) = current.as_mut() {
                    wt.locked = true;
                }
            }
            "detached" => {
                if let Some(wt) = current.as_mut() {
                    wt.detached = true;
                }
            }
            _ => {
                // Unknown key (e.g. "bare", "prunable") or attribute before
                // the first "worktree" line — ignored.
            }
        }
    }

    if let Some(wt) = current {
        records.push(wt);
    }

    Ok(records)
}

/// Parsed `git status --porcelain=v1 -z` / non-`-z` summary.
#[derive(Debug, Clone, Default)]
pub struct StatusSummary {
    pub staged: Vec<String>,
    pub modified: Vec<String>,
    pub untracked: Vec<String>,
}

impl StatusSummary {
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty() && self.modified.is_empty() && self.untracked.is_empty()
    }
}

/// Parse `git status --porcelain` (non-`-z`, one line per entry).
///
/// Each line is `XY path`, where `X` is the staged state and `Y` is the
/// unstaged state; `??` marks untracked files.
pub(crate) fn parse_status_porcelain(output: &str) -> StatusSummary {
    let mut summary = StatusSummary::default();

    for line in output.lines() {
        if line.len() < 3 {
            continue;
        }
        let (code, rest) = line.split_at(2);
        let path = rest.trim_start().to_string();

        if code == "??" {
            summary.untracked.push(path);
            continue;
        }

        let mut chars = code.chars();
        let x = chars.next().unwrap_or(' ');
        let y = chars.next().unwrap_or(' ');

        if x != ' ' {
            summary.staged.push(path.clone());
        }
        if y != ' ' {
            summary.modified.push(path);
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_worktree_list() {
        let result = parse_worktree_list("").unwrap();
        assert_eq!(result.len(), 0);
    }

    #[test]
    fn worktree_list_without_trailing_blank_line() {
        let output = "worktree /repo\nHEAD abc123\nbranch refs/heads/main";
        let result = parse_worktree_list(output).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].branch.as_deref(), Some("main"));
    }

    #[test]
    fn worktree_list_strips_refs_heads_prefix() {
        let output = "worktree /repo/feature\nHEAD def456\nbranch refs/heads/feature-x\n\n";
        let result = parse_worktree_list(output).unwrap();
        assert_eq!(result[0].branch.as_deref(), Some("feature-x"));
    }

    #[test]
    fn worktree_list_detached_and_locked_markers() {
        let output =
            "worktree /repo/sub\nHEAD abc123\ndetached\nlocked\n\nworktree /repo/main\nHEAD def456\nbranch refs/heads/main\n\n";
        let result = parse_worktree_list(output).unwrap();
        assert_eq!(result.len(), 2);
        assert!(result[0].detached);
        assert!(result[0].locked);
        assert!(result[0].branch.is_none());
    }

    #[test]
    fn status_porcelain_splits_staged_modified_untracked() {
        let output = "M  staged.txt\n M unstaged.txt\n?? new.txt\n";
        let summary = parse_status_porcelain(output);
        assert_eq!(summary.staged, vec!["staged.txt"]);
        assert_eq!(summary.modified, vec!["unstaged.txt"]);
        assert_eq!(summary.untracked, vec!["new.txt"]);
        assert!(!summary.is_clean());
    }

    #[test]
    fn status_porcelain_empty_is_clean() {
        assert!(parse_status_porcelain("").is_clean());
    }
}
