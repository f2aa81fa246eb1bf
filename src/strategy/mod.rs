//! Checkpoint Strategies (C4): three interchangeable mechanisms for
//! capturing, finalizing, or discarding a transaction's mutations.
//!
//! The set is closed (spec §9), so this is a tagged enum dispatching to
//! one shared trait rather than open-ended subclassing.

mod branch;
mod stash;
mod sub_workspace;

use std::fmt;
use std::path::Path;

use crate::config::StrategyKind;
use crate::transaction::Transaction;
use crate::vcs::{VcsAdapter, VcsError};

#[derive(Debug)]
pub enum StrategyError {
    Begin(VcsError),
    Commit(VcsError),
    Rollback(VcsError),
}

impl fmt::Display for StrategyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyError::Begin(e) => write!(f, "checkpoint strategy begin failed: {e}"),
            StrategyError::Commit(e) => write!(f, "checkpoint strategy commit failed: {e}"),
            StrategyError::Rollback(e) => write!(f, "checkpoint strategy rollback failed: {e}"),
        }
    }
}

impl std::error::Error for StrategyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StrategyError::Begin(e) | StrategyError::Commit(e) | StrategyError::Rollback(e) => {
                Some(e)
            }
        }
    }
}

pub type StrategyResult<T> = Result<T, StrategyError>;

/// Everything a strategy needs besides the transaction record itself.
pub struct StrategyContext<'a> {
    pub adapter: &'a VcsAdapter,
    pub sub_workspaces_dir: &'a Path,
}

/// Shared contract every checkpoint strategy implements (spec §4.4).
pub trait CheckpointStrategy {
    /// Capture checkpoint and auxiliary state; populate
    /// `tx.checkpoint_ref` and strategy-specific fields.
    fn begin(&self, ctx: &StrategyContext, tx: &mut Transaction) -> StrategyResult<()>;

    /// Finalize mutations into a single commit; restore user WIP (if the
    /// Guard stashed it). Returns the new commit id, or
    /// `tx.checkpoint_ref` if no mutations occurred.
    fn commit(
        &self,
        ctx: &StrategyContext,
        tx: &mut Transaction,
        message: &str,
    ) -> StrategyResult<String>;

    /// Restore the tree to `tx.checkpoint_ref`, clean untracked files,
    /// release strategy-specific auxiliaries, then restore user WIP.
    fn rollback(&self, ctx: &StrategyContext, tx: &mut Transaction) -> StrategyResult<()>;
}

/// Restore a stash identified by exact message match; a conflict during
/// pop is reported as a warning string rather than failing the caller
/// (spec: "conflicts produce only a warning").
fn restore_by_message(adapter: &VcsAdapter, message: &str) -> Option<String> {
    let found = match adapter.find_stash_by_message(message) {
        Ok(found) => found,
        Err(e) => return Some(format!("could not query stash list: {e}")),
    };
    let Some(entry) = found else {
        return None;
    };
    match adapter.stash_pop(&entry.stash_ref) {
        Ok(()) => None,
        Err(e) => Some(format!("stash pop conflict restoring '{message}': {e}")),
    }
}

pub fn dispatch(kind: StrategyKind) -> Box<dyn CheckpointStrategy> {
    match kind {
        StrategyKind::Stash => Box::new(stash::StashStrategy),
        StrategyKind::Branch => Box::new(branch::BranchStrategy),
        StrategyKind::SubWorkspace => Box::new(sub_workspace::SubWorkspaceStrategy),
    }
}
