//! Manager (C5): owns the single active transaction and orchestrates
//! Guard -> Strategy.begin -> (workload) -> Strategy.commit|rollback.
//!
//! The Manager is single-threaded-by-mutex (spec §5): every public
//! method acquires `Inner::state` for its entire duration, so callers
//! from multiple threads are serialized and there is no internal
//! parallelism. Because every VCS call already blocks on a subprocess,
//! this crate has no async runtime and therefore no separate
//! cancellation-handle plumbing to thread through rollback — a call that
//! has started always runs to completion, which is what gives P7 for
//! free here (see DESIGN.md).

use std::panic;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use crate::config::ManagerConfig;
use crate::error::{ManagerError, ManagerResult};
use crate::guard::Guard;
use crate::journal::Journal;
use crate::observability::Observability;
use crate::strategy::{self, StrategyContext};
use crate::transaction::{Status, Transaction};
use crate::vcs::VcsAdapter;

struct ManagerState {
    active: Option<Transaction>,
    /// Ref of the stash the Guard pushed on the caller's behalf at
    /// Begin, if any. Lives on the manager, not the transaction: it is
    /// manager lifecycle state, not transaction state (spec §4.5).
    auto_stash_ref: Option<String>,
}

struct Inner {
    config: ManagerConfig,
    adapter: VcsAdapter,
    journal: Journal,
    observability: Observability,
    state: Mutex<ManagerState>,
}

/// Owns the single active transaction for one workspace.
#[derive(Clone)]
pub struct Manager {
    inner: Arc<Inner>,
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn lock(state: &Mutex<ManagerState>) -> MutexGuard<'_, ManagerState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Manager {
    /// Validates `config.workspace_path` is absolute, applies defaults,
    /// constructs the VCS adapter, ensures the state directory exists,
    /// wires observability, and — if `cleanup_on_init` — recovers any
    /// stale transactions left behind by a previous process.
    pub fn new(mut config: ManagerConfig) -> ManagerResult<Self> {
        if !config.workspace_path.is_absolute() {
            return Err(ManagerError::Configuration(
                "workspace_path must be absolute".to_string(),
            ));
        }
        config.preflight = config.preflight.normalized();

        let observability = Observability::new(config.tracing_enabled, config.metrics_enabled);
        let adapter = VcsAdapter::new(
            config.workspace_path.clone(),
            config.vcs_timeout,
            observability.clone(),
        );
        let journal = Journal::new(config.resolved_state_dir());
        journal.ensure_dir()?;

        let manager = Manager {
            inner: Arc::new(Inner {
                config,
                adapter,
                journal,
                observability,
                state: Mutex::new(ManagerState {
                    active: None,
                    auto_stash_ref: None,
                }),
            }),
        };

        if manager.inner.config.cleanup_on_init {
            manager.startup_recover();
        }

        Ok(manager)
    }

    fn startup_recover(&self) {
        let (records, bad) = match self.inner.journal.read_all() {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, "failed to read state directory during startup recovery");
                return;
            }
        };

        for record in bad {
            tracing::warn!(
                path = %record.path.display(),
                error = %record.error,
                "deleting unparseable journal record"
            );
            let _ = std::fs::remove_file(&record.path);
        }

        for mut tx in records {
            tracing::warn!(tx_id = %tx.id, "rolling back stale transaction found at startup");
            if let Err(e) = self.rollback_internal(&mut tx, "stale-cleanup") {
                tracing::error!(tx_id = %tx.id, error = %e, "stale-cleanup rollback failed");
            }
            // Unlike the normal terminal-state rule, a stale record is
            // deleted unconditionally here even if the rollback itself
            // failed — retrying the same unreachable checkpoint on every
            // future startup would never converge (P5).
            if let Err(e) = self.inner.journal.remove(&tx.id) {
                tracing::warn!(tx_id = %tx.id, error = %e, "journal remove failed during startup recovery");
            }
        }
    }

    /// Single point of strategy-rollback dispatch, reusable by the
    /// public `rollback`, expiration handling, startup recovery, and
    /// `close` — none of which re-enter `rollback` or try to reacquire
    /// the manager lock.
    fn rollback_internal(&self, tx: &mut Transaction, reason: &str) -> ManagerResult<()> {
        tx.status = Status::RollingBack;
        tx.rollback_reason = Some(reason.to_string());

        let sub_dir = self.inner.config.sub_workspaces_dir();
        let ctx = StrategyContext {
            adapter: &self.inner.adapter,
            sub_workspaces_dir: &sub_dir,
        };
        let strategy = strategy::dispatch(tx.strategy);
        let span = self.inner.observability.span("rollback");
        let _enter = span.enter();

        match strategy.rollback(&ctx, tx) {
            Ok(()) => {
                tx.status = Status::RolledBack;
                self.inner.observability.record_rollback(reason);
                Ok(())
            }
            Err(e) => {
                tx.status = Status::Failed;
                tx.error = Some(e.to_string());
                self.inner.observability.record_vcs_error("rollback");
                Err(ManagerError::RollbackFailed(e.to_string()))
            }
        }
    }

    /// Delete the journal record for a committed/rolled-back terminal
    /// transaction, or persist it for a failed one — the universal
    /// "remove record on terminal" rule is suspended for `failed` so
    /// operators can inspect it (spec §7).
    fn finalize_terminal(&self, tx: &Transaction) {
        let lifetime_secs = (Utc::now() - tx.started_at).num_milliseconds() as f64 / 1000.0;
        self.inner.observability.observe_duration_secs(lifetime_secs.max(0.0));

        match tx.status {
            Status::Committed | Status::RolledBack => {
                if let Err(e) = self.inner.journal.remove(&tx.id) {
                    tracing::warn!(tx_id = %tx.id, error = %e, "journal remove failed");
                }
            }
            Status::Failed => {
                if let Err(e) = self.inner.journal.write(tx) {
                    tracing::warn!(tx_id = %tx.id, error = %e, "journal write for failed transaction failed");
                }
            }
            _ => {}
        }
    }

    fn begin_locked(
        &self,
        state: &mut ManagerState,
        session_id: String,
    ) -> ManagerResult<Transaction> {
        if state.active.is_some() {
            return Err(ManagerError::TransactionActive);
        }

        let tx_id = Uuid::new_v4().to_string();
        let report = Guard::check(&self.inner.adapter, &tx_id, &self.inner.config.preflight)?;
        if !report.passed {
            self.inner
                .observability
                .record_begin(self.inner.config.strategy, "refused");
            return Err(ManagerError::AdmissionRefused(report));
        }
        state.auto_stash_ref = report.stash_ref;

        let original_branch = self.inner.adapter.current_branch()?;
        let ttl = chrono::Duration::from_std(self.inner.config.transaction_ttl)
            .unwrap_or_else(|_| chrono::Duration::minutes(30));
        let mut tx = Transaction::new(
            tx_id,
            session_id,
            Utc::now(),
            ttl,
            self.inner.config.strategy,
            String::new(),
            original_branch,
        );

        let sub_dir = self.inner.config.sub_workspaces_dir();
        let ctx = StrategyContext {
            adapter: &self.inner.adapter,
            sub_workspaces_dir: &sub_dir,
        };
        let strategy = strategy::dispatch(tx.strategy);
        let span = self.inner.observability.span("begin");
        let _enter = span.enter();

        if let Err(e) = strategy.begin(&ctx, &mut tx) {
            self.inner
                .observability
                .record_begin(tx.strategy, "error");
            return Err(ManagerError::Strategy(e));
        }
        drop(_enter);

        if let Err(e) = self.inner.journal.write(&tx) {
            // I4(a): a window between Strategy.begin and Journal.write
            // where the tree is ahead of the journal is tolerable
            // because startup recovery over-approximates.
            tracing::warn!(tx_id = %tx.id, error = %e, "journal write at begin failed");
        }

        self.inner
            .observability
            .record_begin(tx.strategy, "ok");
        self.inner.observability.set_active_count(true);

        let snapshot = tx.clone();
        state.active = Some(tx);
        Ok(snapshot)
    }

    pub fn begin(&self, session_id: impl Into<String>) -> ManagerResult<Transaction> {
        let session_id = session_id.into();
        let mut guard = lock(&self.inner.state);
        let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            self.begin_locked(&mut guard, session_id)
        }));
        match result {
            Ok(r) => r,
            Err(payload) => {
                let msg = panic_message(&payload);
                tracing::error!(error = %msg, "panic caught in begin");
                Err(ManagerError::Internal(msg))
            }
        }
    }

    fn commit_locked(&self, state: &mut ManagerState, message: &str) -> ManagerResult<String> {
        if state.active.is_none() {
            return Err(ManagerError::NoActiveTransaction);
        }

        if state.active.as_ref().is_some_and(|tx| tx.is_expired(Utc::now())) {
            let mut tx = state.active.take().expect("checked above");
            self.inner.observability.record_expired();
            let rollback_result = self.rollback_internal(&mut tx, "expired");
            self.finalize_terminal(&tx);
            self.inner.observability.set_active_count(false);
            self.release_auto_stash(state);
            if let Err(e) = rollback_result {
                tracing::error!(tx_id = %tx.id, error = %e, "rollback during expiration failed");
            }
            return Err(ManagerError::TransactionExpired);
        }

        let mut tx = state.active.take().expect("checked above");
        tx.status = Status::Committing;

        let sub_dir = self.inner.config.sub_workspaces_dir();
        let ctx = StrategyContext {
            adapter: &self.inner.adapter,
            sub_workspaces_dir: &sub_dir,
        };
        let strategy = strategy::dispatch(tx.strategy);
        let span = self.inner.observability.span("commit");
        let _enter = span.enter();
        let commit_result = strategy.commit(&ctx, &mut tx, message);
        drop(_enter);

        match commit_result {
            Ok(commit_id) => {
                tx.status = Status::Committed;
                self.inner.observability.record_commit("ok");
                self.inner
                    .observability
                    .observe_files_modified(tx.modified_files.len());
                self.finalize_terminal(&tx);
                self.inner.observability.set_active_count(false);
                self.release_auto_stash(state);
                Ok(commit_id)
            }
            Err(e) => {
                tx.status = Status::Failed;
                tx.error = Some(e.to_string());
                self.inner.observability.record_commit("failed");
                self.inner.observability.record_vcs_error("commit");
                self.finalize_terminal(&tx);
                self.inner.observability.set_active_count(false);
                Err(ManagerError::CommitFailed(e.to_string()))
            }
        }
    }

    pub fn commit(&self, message: &str) -> ManagerResult<String> {
        let mut guard = lock(&self.inner.state);
        let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            self.commit_locked(&mut guard, message)
        }));
        match result {
            Ok(r) => r,
            Err(payload) => {
                if let Some(tx) = guard.active.as_mut() {
                    tx.status = Status::Failed;
                    tx.error = Some("internal panic during commit".to_string());
                }
                let msg = panic_message(&payload);
                tracing::error!(error = %msg, "panic caught in commit");
                Err(ManagerError::Internal(msg))
            }
        }
    }

    fn rollback_locked(&self, state: &mut ManagerState, reason: &str) -> ManagerResult<()> {
        let Some(mut tx) = state.active.take() else {
            return Err(ManagerError::NoActiveTransaction);
        };
        let result = self.rollback_internal(&mut tx, reason);
        self.finalize_terminal(&tx);
        self.inner.observability.set_active_count(false);
        self.release_auto_stash(state);
        result
    }

    pub fn rollback(&self, reason: &str) -> ManagerResult<()> {
        let mut guard = lock(&self.inner.state);
        let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            self.rollback_locked(&mut guard, reason)
        }));
        match result {
            Ok(r) => r,
            Err(payload) => {
                if let Some(tx) = guard.active.as_mut() {
                    tx.status = Status::Failed;
                    tx.error = Some("internal panic during rollback".to_string());
                }
                let msg = panic_message(&payload);
                tracing::error!(error = %msg, "panic caught in rollback");
                Err(ManagerError::Internal(msg))
            }
        }
    }

    fn release_auto_stash(&self, state: &mut ManagerState) {
        if let Some(stash_ref) = state.auto_stash_ref.take() {
            if let Err(warning) = Guard::cleanup(&self.inner.adapter, &stash_ref) {
                // Best-effort; not part of the tracing-span story, so this
                // goes through the plain `log` facade rather than a span event.
                log::warn!("auto-stash cleanup failed: {warning}");
            }
        }
    }

    pub fn record_modification(&self, path: impl Into<String>) -> ManagerResult<()> {
        self.record_modifications(std::iter::once(path.into()))
    }

    pub fn record_modifications<I>(&self, paths: I) -> ManagerResult<()>
    where
        I: IntoIterator<Item = String>,
    {
        let mut guard = lock(&self.inner.state);
        let Some(tx) = guard.active.as_mut() else {
            // Silent no-op when no transaction is active (spec §4.5).
            return Ok(());
        };

        let max = self.inner.config.max_tracked_files;
        let mut additions = Vec::new();
        for path in paths {
            if !tx.modified_files.contains(&path) && !additions.contains(&path) {
                additions.push(path);
            }
        }

        if tx.modified_files.len() + additions.len() > max {
            return Err(ManagerError::MaxFilesExceeded { limit: max });
        }
        tx.modified_files.extend(additions);
        Ok(())
    }

    /// A deep-copy snapshot of the active transaction, if any. Mutating
    /// the returned value never affects manager state.
    pub fn active(&self) -> Option<Transaction> {
        lock(&self.inner.state).active.clone()
    }

    pub fn is_active(&self) -> bool {
        lock(&self.inner.state).active.is_some()
    }

    /// If a transaction is active, rolls it back with reason
    /// `"manager-closed"`. After `close` returns, no further operation
    /// on this Manager will find an active transaction.
    pub fn close(&self) {
        let mut guard = lock(&self.inner.state);
        let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            if let Some(mut tx) = guard.active.take() {
                let result = self.rollback_internal(&mut tx, "manager-closed");
                self.finalize_terminal(&tx);
                self.inner.observability.set_active_count(false);
                if let Err(e) = &result {
                    tracing::error!(tx_id = %tx.id, error = %e, "rollback during close failed");
                }
            }
            self.release_auto_stash(&mut guard);
        }));
        if let Err(payload) = result {
            let msg = panic_message(&payload);
            tracing::error!(error = %msg, "panic caught in close");
        }
    }
}
