//! Manager configuration (spec §6 "Configuration").
//!
//! Loading these values from a file or environment is deliberately out
//! of scope for this crate; callers construct [`ManagerConfig`] directly.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Stash,
    Branch,
    SubWorkspace,
}

/// Pre-flight admission options (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreflightConfig {
    pub allow_detached: bool,
    pub force: bool,
    pub auto_stash: bool,
}

impl PreflightConfig {
    /// `force` and `auto_stash` are mutually exclusive; when both are
    /// set, `force` silently wins and `auto_stash` is cleared. This
    /// mirrors the source's asserted behavior (see DESIGN.md's Open
    /// Question resolution) rather than failing construction.
    pub fn normalized(mut self) -> Self {
        if self.force && self.auto_stash {
            self.auto_stash = false;
        }
        self
    }
}

/// Top-level configuration accepted by [`crate::Manager::new`].
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Must be absolute; checked at `Manager::new`.
    pub workspace_path: PathBuf,
    pub strategy: StrategyKind,
    pub transaction_ttl: Duration,
    pub vcs_timeout: Duration,
    pub max_tracked_files: usize,
    pub state_dir: Option<PathBuf>,
    pub cleanup_on_init: bool,
    pub tracing_enabled: bool,
    pub metrics_enabled: bool,
    pub preflight: PreflightConfig,
}

impl ManagerConfig {
    pub fn new(workspace_path: PathBuf) -> Self {
        Self {
            workspace_path,
            strategy: StrategyKind::SubWorkspace,
            transaction_ttl: Duration::from_secs(30 * 60),
            vcs_timeout: Duration::from_secs(30),
            max_tracked_files: 10_000,
            state_dir: None,
            cleanup_on_init: true,
            tracing_enabled: true,
            metrics_enabled: true,
            preflight: PreflightConfig::default(),
        }
    }

    /// Resolved state directory: `<workspace>/.aleutian/transactions`
    /// unless overridden.
    pub fn resolved_state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(|| self.workspace_path.join(".aleutian").join("transactions"))
    }

    /// Resolved sub-workspace parent: `<workspace>/.aleutian/subworkspaces`.
    pub fn sub_workspaces_dir(&self) -> PathBuf {
        self.workspace_path.join(".aleutian").join("subworkspaces")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn force_wins_over_auto_stash() {
        let cfg = PreflightConfig {
            allow_detached: false,
            force: true,
            auto_stash: true,
        }
        .normalized();
        assert!(cfg.force);
        assert!(!cfg.auto_stash);
    }

    #[test]
    fn normalize_is_noop_when_not_conflicting() {
        let cfg = PreflightConfig {
            allow_detached: true,
            force: false,
            auto_stash: true,
        }
        .normalized();
        assert!(cfg.auto_stash);
    }

    #[test]
    fn resolved_state_dir_defaults_under_workspace() {
        let cfg = ManagerConfig::new(PathBuf::from("/tmp/ws"));
        assert_eq!(
            cfg.resolved_state_dir(),
            PathBuf::from("/tmp/ws/.aleutian/transactions")
        );
    }

    #[test]
    fn resolved_state_dir_honors_override() {
        let mut cfg = ManagerConfig::new(PathBuf::from("/tmp/ws"));
        cfg.state_dir = Some(PathBuf::from("/var/lib/aleutian"));
        assert_eq!(cfg.resolved_state_dir(), PathBuf::from("/var/lib/aleutian"));
    }
}
