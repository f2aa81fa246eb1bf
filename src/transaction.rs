//! The Transaction record (spec §3) and its closed status state machine.

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::StrategyKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Idle,
    Active,
    Committing,
    RollingBack,
    Committed,
    RolledBack,
    Failed,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Committed | Status::RolledBack | Status::Failed)
    }
}

/// A single open-to-terminal transaction lifetime (spec §3).
///
/// Mutated only by the [`crate::Manager`] while holding its lock;
/// snapshots handed to callers via [`crate::Manager::active`] are deep
/// copies and do not alias manager state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub strategy: StrategyKind,
    pub status: Status,
    pub checkpoint_ref: String,
    pub original_branch: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub work_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sub_workspace_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub stash_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user_wip_stash_ref: Option<String>,
    #[serde(default)]
    pub modified_files: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rollback_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl Transaction {
    pub fn new(
        id: String,
        session_id: String,
        started_at: DateTime<Utc>,
        ttl: chrono::Duration,
        strategy: StrategyKind,
        checkpoint_ref: String,
        original_branch: String,
    ) -> Self {
        Self {
            id,
            session_id,
            started_at,
            expires_at: started_at + ttl,
            strategy,
            status: Status::Active,
            checkpoint_ref,
            original_branch,
            work_branch: None,
            sub_workspace_path: None,
            stash_ref: None,
            user_wip_stash_ref: None,
            modified_files: BTreeSet::new(),
            rollback_reason: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// First 8 characters of the id, used to name the branch strategy's
    /// work branch and the sub-workspace directory.
    pub fn short_id(&self) -> String {
        self.id.chars().take(8).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str) -> Transaction {
        Transaction::new(
            id.to_string(),
            "session".to_string(),
            Utc::now(),
            chrono::Duration::minutes(30),
            StrategyKind::Branch,
            "deadbeef".to_string(),
            "main".to_string(),
        )
    }

    #[test]
    fn short_id_takes_first_eight_chars() {
        let tx = sample("0123456789abcdef");
        assert_eq!(tx.short_id(), "01234567");
    }

    #[test]
    fn short_id_handles_ids_shorter_than_eight() {
        let tx = sample("abc");
        assert_eq!(tx.short_id(), "abc");
    }

    #[test]
    fn is_expired_compares_against_expires_at() {
        let tx = sample("tx1");
        assert!(!tx.is_expired(tx.started_at));
        assert!(tx.is_expired(tx.expires_at + chrono::Duration::seconds(1)));
    }

    #[test]
    fn status_terminality() {
        assert!(!Status::Active.is_terminal());
        assert!(!Status::Committing.is_terminal());
        assert!(Status::Committed.is_terminal());
        assert!(Status::RolledBack.is_terminal());
        assert!(Status::Failed.is_terminal());
    }

    #[test]
    fn journal_round_trip_preserves_fields() {
        let mut tx = sample("tx-roundtrip");
        tx.modified_files.insert("a.rs".to_string());
        tx.modified_files.insert("b.rs".to_string());
        tx.work_branch = Some("agent-work-tx-round".to_string());

        let json = serde_json::to_string(&tx).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, tx.id);
        assert_eq!(back.modified_files, tx.modified_files);
        assert_eq!(back.work_branch, tx.work_branch);
        assert_eq!(back.sub_workspace_path, None);
    }

    #[test]
    fn unknown_journal_fields_are_ignored() {
        let json = r#"{
            "id": "tx1", "session_id": "s", "started_at": "2026-01-01T00:00:00Z",
            "expires_at": "2026-01-01T00:30:00Z", "strategy": "branch", "status": "active",
            "checkpoint_ref": "deadbeef", "original_branch": "main",
            "modified_files": [], "from_the_future": true
        }"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.id, "tx1");
    }
}
