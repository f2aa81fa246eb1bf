//! Pre-Flight Guard (C2): decides whether a workspace is safe to open a
//! transaction in, and optionally mutates it (auto-stash) to make it so.

use crate::config::PreflightConfig;
use crate::vcs::{VcsAdapter, VcsResult};

/// The closed set of admission codes (spec §4.2). Variant order has no
/// meaning; severity is derived via [`AdmissionCode::severity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionCode {
    NotGitRepo,
    RebaseInProgress,
    MergeInProgress,
    CherryPickInProgress,
    BisectInProgress,
    DetachedHead,
    DirtyWorkingTree,
    DirtyForced,
    UntrackedFiles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl AdmissionCode {
    pub fn severity(self) -> Severity {
        match self {
            AdmissionCode::NotGitRepo
            | AdmissionCode::DirtyForced
            | AdmissionCode::UntrackedFiles => Severity::Warning,
            AdmissionCode::RebaseInProgress
            | AdmissionCode::MergeInProgress
            | AdmissionCode::CherryPickInProgress
            | AdmissionCode::BisectInProgress
            | AdmissionCode::DetachedHead
            | AdmissionCode::DirtyWorkingTree => Severity::Error,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AdmissionCode::NotGitRepo => "NOT_GIT_REPO",
            AdmissionCode::RebaseInProgress => "REBASE_IN_PROGRESS",
            AdmissionCode::MergeInProgress => "MERGE_IN_PROGRESS",
            AdmissionCode::CherryPickInProgress => "CHERRY_PICK_IN_PROGRESS",
            AdmissionCode::BisectInProgress => "BISECT_IN_PROGRESS",
            AdmissionCode::DetachedHead => "DETACHED_HEAD",
            AdmissionCode::DirtyWorkingTree => "DIRTY_WORKING_TREE",
            AdmissionCode::DirtyForced => "DIRTY_FORCED",
            AdmissionCode::UntrackedFiles => "UNTRACKED_FILES",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CheckIssue {
    pub code: AdmissionCode,
    pub severity: Severity,
    pub message: String,
    pub details: Option<String>,
}

impl CheckIssue {
    fn new(code: AdmissionCode, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: code.severity(),
            message: message.into(),
            details: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    pub passed: bool,
    pub errors: Vec<CheckIssue>,
    pub warnings: Vec<CheckIssue>,
    /// Ref of the auto-stash pushed during this check, if `auto_stash`
    /// applied and the tree was dirty.
    pub stash_ref: Option<String>,
}

/// Stateless; all inputs come from the adapter and the transaction id
/// being admitted.
pub struct Guard;

impl Guard {
    /// Evaluate every check without short-circuiting, so the caller sees
    /// every blocker at once, then optionally auto-stash.
    pub fn check(
        adapter: &VcsAdapter,
        tx_id: &str,
        cfg: &PreflightConfig,
    ) -> VcsResult<CheckReport> {
        let mut report = CheckReport::default();

        if !adapter.is_repository() {
            report
                .warnings
                .push(CheckIssue::new(AdmissionCode::NotGitRepo, "workspace is not a git repository"));
            // No other checks are meaningful without a repository.
            report.passed = true;
            return Ok(report);
        }

        if adapter.is_rebase_in_progress() {
            report.errors.push(CheckIssue::new(
                AdmissionCode::RebaseInProgress,
                "a rebase is in progress",
            ));
        }
        if adapter.is_merge_in_progress() {
            report.errors.push(CheckIssue::new(
                AdmissionCode::MergeInProgress,
                "a merge is in progress",
            ));
        }
        if adapter.is_cherry_pick_in_progress() {
            report.errors.push(CheckIssue::new(
                AdmissionCode::CherryPickInProgress,
                "a cherry-pick is in progress",
            ));
        }
        if adapter.is_bisect_in_progress() {
            report.errors.push(CheckIssue::new(
                AdmissionCode::BisectInProgress,
                "a bisect is in progress",
            ));
        }

        let detached = adapter.is_detached_head()?;
        if detached && !cfg.allow_detached {
            report.errors.push(CheckIssue::new(
                AdmissionCode::DetachedHead,
                "HEAD is detached",
            ));
        }

        let status = adapter.status()?;
        let dirty = !status.staged.is_empty() || !status.modified.is_empty();
        let only_untracked = !dirty && !status.untracked.is_empty();

        if dirty && cfg.force {
            report.warnings.push(CheckIssue::new(
                AdmissionCode::DirtyForced,
                "working tree is dirty; proceeding without a safety stash because force=true",
            ));
        } else if dirty && cfg.auto_stash {
            let message = format!("aleutian-wip-{tx_id}");
            let stash_ref = adapter.stash_push(&message)?;
            report.stash_ref = Some(stash_ref);
        } else if dirty {
            report.errors.push(CheckIssue::new(
                AdmissionCode::DirtyWorkingTree,
                "working tree has uncommitted changes",
            ));
        } else if only_untracked {
            report.warnings.push(CheckIssue::new(
                AdmissionCode::UntrackedFiles,
                "working tree has untracked files",
            ));
        }

        report.passed = report.errors.is_empty();
        Ok(report)
    }

    /// Best-effort: restore a stash pushed by `check`. A failure (e.g. a
    /// conflicting pop) is the caller's problem to log; it never
    /// escalates to an error here.
    pub fn cleanup(adapter: &VcsAdapter, stash_ref: &str) -> Result<(), String> {
        adapter.stash_pop(stash_ref).map_err(|e| e.to_string())
    }
}
