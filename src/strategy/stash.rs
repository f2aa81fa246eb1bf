//! Stash strategy (spec §4.4.1): the checkpoint itself never moves;
//! pending mutations are set aside in a stash and either dropped (commit)
//! or reapplied (rollback).

use super::{restore_by_message, CheckpointStrategy, StrategyContext, StrategyError, StrategyResult};
use crate::transaction::Transaction;

pub struct StashStrategy;

impl CheckpointStrategy for StashStrategy {
    fn begin(&self, ctx: &StrategyContext, tx: &mut Transaction) -> StrategyResult<()> {
        let checkpoint_ref = ctx
            .adapter
            .resolve_ref("HEAD")
            .map_err(StrategyError::Begin)?;
        tx.checkpoint_ref = checkpoint_ref;

        let status = ctx.adapter.status().map_err(StrategyError::Begin)?;
        if !status.is_clean() {
            let message = format!("aleutian-checkpoint-{}", tx.id);
            let stash_ref = ctx
                .adapter
                .stash_push(&message)
                .map_err(StrategyError::Begin)?;
            tx.stash_ref = Some(stash_ref);
        }
        Ok(())
    }

    fn commit(
        &self,
        ctx: &StrategyContext,
        tx: &mut Transaction,
        message: &str,
    ) -> StrategyResult<String> {
        if tx.stash_ref.is_some() {
            let checkpoint_message = format!("aleutian-checkpoint-{}", tx.id);
            if let Some(entry) = ctx
                .adapter
                .find_stash_by_message(&checkpoint_message)
                .map_err(StrategyError::Commit)?
            {
                ctx.adapter
                    .stash_drop(&entry.stash_ref)
                    .map_err(StrategyError::Commit)?;
            }
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
        Ok(commit_id)
    }

    fn rollback(&self, ctx: &StrategyContext, tx: &mut Transaction) -> StrategyResult<()> {
        ctx.adapter
            .reset_hard(&tx.checkpoint_ref)
            .map_err(StrategyError::Rollback)?;
        ctx.adapter
            .clean_untracked()
            .map_err(StrategyError::Rollback)?;

        if tx.stash_ref.is_some() {
            let message = format!("aleutian-checkpoint-{}", tx.id);
            if let Some(warning) = restore_by_message(ctx.adapter, &message) {
                tracing::warn!(tx_id = %tx.id, %warning, "stash restore conflict during rollback");
            }
        }
        Ok(())
    }
}
