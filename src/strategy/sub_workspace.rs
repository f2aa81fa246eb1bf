//! Sub-workspace strategy (spec §4.4.3), the preferred default: the
//! agent writes in a detached sub-tree, leaving the primary tree (and
//! anything watching it) untouched for the duration of the transaction.

use super::{CheckpointStrategy, StrategyContext, StrategyError, StrategyResult};
use crate::transaction::Transaction;

pub struct SubWorkspaceStrategy;

impl CheckpointStrategy for SubWorkspaceStrategy {
    fn begin(&self, ctx: &StrategyContext, tx: &mut Transaction) -> StrategyResult<()> {
        let path = ctx.sub_workspaces_dir.join(&tx.id);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StrategyError::Begin(crate::vcs::VcsError::ParseError {
                    context: format!("could not create sub-workspace parent directory: {e}"),
                })
            })?;
        }

        if path.exists() {
            // Leftover from a prior crash before this begin re-ran.
            ctx.adapter
                .remove_sub_workspace(&path, true)
                .map_err(StrategyError::Begin)?;
        }

        let checkpoint_ref = ctx
            .adapter
            .resolve_ref("HEAD")
            .map_err(StrategyError::Begin)?;
        tx.checkpoint_ref = checkpoint_ref.clone();

        ctx.adapter
            .create_sub_workspace(&path, &checkpoint_ref)
            .map_err(StrategyError::Begin)?;
        tx.sub_workspace_path = Some(path);
        Ok(())
    }

    fn commit(
        &self,
        ctx: &StrategyContext,
        tx: &mut Transaction,
        message: &str,
    ) -> StrategyResult<String> {
        let Some(path) = tx.sub_workspace_path.clone() else {
            return Ok(tx.checkpoint_ref.clone());
        };
        let sub_adapter = ctx.adapter.scoped_to(path.clone());

        let status = sub_adapter.status().map_err(StrategyError::Commit)?;
        if status.is_clean() {
            ctx.adapter
                .remove_sub_workspace(&path, true)
                .map_err(StrategyError::Commit)?;
            tx.sub_workspace_path = None;
            return Ok(tx.checkpoint_ref.clone());
        }

        sub_adapter.add_all().map_err(StrategyError::Commit)?;
        let commit_id = sub_adapter.commit(message).map_err(StrategyError::Commit)?;
        ctx.adapter
            .checkout(&commit_id)
            .map_err(StrategyError::Commit)?;

        ctx.adapter
            .remove_sub_workspace(&path, true)
            .map_err(StrategyError::Commit)?;
        tx.sub_workspace_path = None;
        Ok(commit_id)
    }

    fn rollback(&self, ctx: &StrategyContext, tx: &mut Transaction) -> StrategyResult<()> {
        if let Some(path) = tx.sub_workspace_path.take() {
            ctx.adapter
                .remove_sub_workspace(&path, true)
                .map_err(StrategyError::Rollback)?;
        }
        Ok(())
    }
}
