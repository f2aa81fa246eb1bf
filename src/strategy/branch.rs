//! Branch strategy (spec §4.4.2): the default when sub-workspaces are
//! unavailable. The agent keeps working on the original branch; a
//! throwaway backup branch exists only as a handle, never checked out.

use super::{restore_by_message, CheckpointStrategy, StrategyContext, StrategyError, StrategyResult};
use crate::transaction::Transaction;

pub struct BranchStrategy;

fn user_wip_message(tx_id: &str) -> String {
    format!("aleutian-user-wip-{tx_id}")
}

fn work_branch_name(tx: &Transaction) -> String {
    format!("agent-work-{}", tx.short_id())
}

impl CheckpointStrategy for BranchStrategy {
    fn begin(&self, ctx: &StrategyContext, tx: &mut Transaction) -> StrategyResult<()> {
        let checkpoint_ref = ctx
            .adapter
            .resolve_ref("HEAD")
            .map_err(StrategyError::Begin)?;
        tx.checkpoint_ref = checkpoint_ref.clone();

        let status = ctx.adapter.status().map_err(StrategyError::Begin)?;
        if !status.is_clean() {
            let message = user_wip_message(&tx.id);
            let stash_ref = ctx
                .adapter
                .stash_push(&message)
                .map_err(StrategyError::Begin)?;
            tx.user_wip_stash_ref = Some(stash_ref);
        }

        let work_branch = work_branch_name(tx);
        ctx.adapter
            .create_branch(&work_branch, &checkpoint_ref)
            .map_err(StrategyError::Begin)?;
        tx.work_branch = Some(work_branch);
        Ok(())
    }

    fn commit(
        &self,
        ctx: &StrategyContext,
        tx: &mut Transaction,
        message: &str,
    ) -> StrategyResult<String> {
        if let Some(work_branch) = tx.work_branch.take() {
            let _ = ctx.adapter.delete_branch(&work_branch, true);
        }

        ctx.adapter.add_all().map_err(StrategyError::Commit)?;
        let has_staged = ctx
            .adapter
            .has_staged_changes()
            .map_err(StrategyError::Commit)?;

        let commit_id = if has_staged {
            ctx.adapter.commit(message).map_err(StrategyError::Commit)?
        } else {
            tx.checkpoint_ref.clone()
        };

        if tx.user_wip_stash_ref.take().is_some() {
            let message = user_wip_message(&tx.id);
            if let Some(warning) = restore_by_message(ctx.adapter, &message) {
                tracing::warn!(tx_id = %tx.id, %warning, "stash restore conflict during commit");
            }
        }

        Ok(commit_id)
    }

    fn rollback(&self, ctx: &StrategyContext, tx: &mut Transaction) -> StrategyResult<()> {
        ctx.adapter
            .reset_hard(&tx.checkpoint_ref)
            .map_err(StrategyError::Rollback)?;
        ctx.adapter
            .clean_untracked()
            .map_err(StrategyError::Rollback)?;

        if let Some(work_branch) = tx.work_branch.take() {
            let _ = ctx.adapter.delete_branch(&work_branch, true);
        }

        if tx.user_wip_stash_ref.take().is_some() {
            let message = user_wip_message(&tx.id);
            if let Some(warning) = restore_by_message(ctx.adapter, &message) {
                tracing::warn!(tx_id = %tx.id, %warning, "stash restore conflict during rollback");
            }
        }
        Ok(())
    }
}
