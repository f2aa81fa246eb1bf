//! Top-level error taxonomy (spec §7). Every public entry point returns
//! `Result<_, ManagerError>`; lower-layer errors (VCS, journal, strategy)
//! are wrapped rather than flattened, so callers can still match on the
//! original kind via `source()`.

use std::fmt;

use crate::guard::CheckReport;
use crate::journal::JournalError;
use crate::strategy::StrategyError;
use crate::vcs::VcsError;

#[derive(Debug)]
pub enum ManagerError {
    /// `workspace_path` was not absolute, or other construction-time
    /// misconfiguration.
    Configuration(String),
    /// Pre-flight admission refused the transaction. Carries the full
    /// report so callers can inspect individual coded issues.
    AdmissionRefused(CheckReport),
    /// A transaction is already active.
    TransactionActive,
    /// No transaction is active.
    NoActiveTransaction,
    /// The active transaction's TTL elapsed; the Manager already
    /// converted this call into an internal rollback.
    TransactionExpired,
    /// `record_modification` would exceed `max_tracked_files`.
    MaxFilesExceeded { limit: usize },
    /// `Strategy::commit` failed; the transaction is now `failed`.
    CommitFailed(String),
    /// `Strategy::rollback` failed; the transaction is now `failed` and
    /// retained in the journal for operator inspection.
    RollbackFailed(String),
    Vcs(VcsError),
    Journal(JournalError),
    Strategy(StrategyError),
    /// An entry point caught an unexpected panic.
    Internal(String),
}

impl fmt::Display for ManagerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManagerError::Configuration(msg) => write!(f, "configuration error: {msg}"),
            ManagerError::AdmissionRefused(report) => {
                let codes: Vec<&str> = report.errors.iter().map(|e| e.code.as_str()).collect();
                write!(f, "transaction admission refused: {}", codes.join(", "))
            }
            ManagerError::TransactionActive => write!(f, "a transaction is already active"),
            ManagerError::NoActiveTransaction => write!(f, "no transaction is active"),
            ManagerError::TransactionExpired => write!(f, "transaction expired; rolled back"),
            ManagerError::MaxFilesExceeded { limit } => {
                write!(f, "modified_files would exceed the limit of {limit}")
            }
            ManagerError::CommitFailed(msg) => write!(f, "commit failed: {msg}"),
            ManagerError::RollbackFailed(msg) => write!(f, "rollback failed: {msg}"),
            ManagerError::Vcs(e) => write!(f, "{e}"),
            ManagerError::Journal(e) => write!(f, "{e}"),
            ManagerError::Strategy(e) => write!(f, "{e}"),
            ManagerError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for ManagerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ManagerError::Vcs(e) => Some(e),
            ManagerError::Journal(e) => Some(e),
            ManagerError::Strategy(e) => Some(e),
            _ => None,
        }
    }
}

impl From<VcsError> for ManagerError {
    fn from(e: VcsError) -> Self {
        ManagerError::Vcs(e)
    }
}

impl From<JournalError> for ManagerError {
    fn from(e: JournalError) -> Self {
        ManagerError::Journal(e)
    }
}

impl From<StrategyError> for ManagerError {
    fn from(e: StrategyError) -> Self {
        ManagerError::Strategy(e)
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;
