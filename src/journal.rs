//! State Journal (C3): durable, per-transaction records for crash
//! recovery, one JSON file per transaction under a configured directory.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::transaction::Transaction;

#[derive(Debug)]
pub enum JournalError {
    Io { path: PathBuf, source: std::io::Error },
    Serialize(serde_json::Error),
}

impl fmt::Display for JournalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JournalError::Io { path, source } => {
                write!(f, "journal I/O error at {}: {source}", path.display())
            }
            JournalError::Serialize(e) => write!(f, "journal serialization error: {e}"),
        }
    }
}

impl std::error::Error for JournalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            JournalError::Io { source, .. } => Some(source),
            JournalError::Serialize(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for JournalError {
    fn from(e: serde_json::Error) -> Self {
        JournalError::Serialize(e)
    }
}

pub type JournalResult<T> = Result<T, JournalError>;

/// A record recovered from disk that failed to parse; callers log a
/// warning and delete the file.
pub struct UnparseableRecord {
    pub path: PathBuf,
    pub error: JournalError,
}

pub struct Journal {
    dir: PathBuf,
}

impl Journal {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, tx_id: &str) -> PathBuf {
        self.dir.join(format!("{tx_id}.json"))
    }

    pub fn ensure_dir(&self) -> JournalResult<()> {
        fs::create_dir_all(&self.dir).map_err(|source| JournalError::Io {
            path: self.dir.clone(),
            source,
        })
    }

    /// Atomically materialize a complete record. Recreates the state
    /// directory if a prior `reset_hard` swept it away (I4(a) tolerance).
    pub fn write(&self, tx: &Transaction) -> JournalResult<()> {
        self.ensure_dir()?;
        let path = self.path_for(&tx.id);
        let tmp_path = self.dir.join(format!("{}.json.tmp", tx.id));
        let body = serde_json::to_vec_pretty(tx)?;
        fs::write(&tmp_path, &body).map_err(|source| JournalError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &path).map_err(|source| JournalError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(())
    }

    /// Delete the record; a missing file is not an error.
    pub fn remove(&self, tx_id: &str) -> JournalResult<()> {
        let path = self.path_for(tx_id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(JournalError::Io { path, source }),
        }
    }

    /// Read every record currently on disk. Unparseable files are
    /// reported via the second return value for the caller to log and
    /// delete; a missing directory is treated as "nothing to do".
    pub fn read_all(&self) -> JournalResult<(Vec<Transaction>, Vec<UnparseableRecord>)> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok((Vec::new(), Vec::new()));
            }
            Err(source) => {
                return Err(JournalError::Io {
                    path: self.dir.clone(),
                    source,
                });
            }
        };

        let mut records = Vec::new();
        let mut bad = Vec::new();

        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_record(&path) {
                Ok(tx) => records.push(tx),
                Err(error) => bad.push(UnparseableRecord { path, error }),
            }
        }

        Ok((records, bad))
    }
}

fn read_record(path: &Path) -> JournalResult<Transaction> {
    let body = fs::read(path).map_err(|source| JournalError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let tx: Transaction = serde_json::from_slice(&body)?;
    Ok(tx)
}
