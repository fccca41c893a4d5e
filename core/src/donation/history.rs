//! Donor-local donation history
//!
//! Append-only: records are added after submission and only their status
//! changes afterwards. Optionally mirrored to a JSON file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::donation::record::{TransactionRecord, TxStatus};
use crate::donation::signer::TxReference;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("history file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Default)]
pub struct DonationHistory {
    path: Option<PathBuf>,
    records: Vec<TransactionRecord>,
}

impl DonationHistory {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a history file, starting empty if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let path = path.into();
        let records = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        info!(path = %path.display(), records = records.len(), "Loaded donation history");
        Ok(Self {
            path: Some(path),
            records,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn get(&self, reference: &TxReference) -> Option<&TransactionRecord> {
        self.records.iter().find(|r| &r.reference == reference)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a record. A record with an already known reference only
    /// refreshes that entry's status.
    pub fn append(&mut self, record: TransactionRecord) -> Result<(), HistoryError> {
        match self.records.iter_mut().find(|r| r.reference == record.reference) {
            Some(existing) => existing.status = record.status,
            None => self.records.push(record),
        }
        self.persist()
    }

    /// Returns `false` if `reference` is unknown.
    pub fn update_status(
        &mut self,
        reference: &TxReference,
        status: TxStatus,
    ) -> Result<bool, HistoryError> {
        let Some(record) = self.records.iter_mut().find(|r| &r.reference == reference) else {
            return Ok(false);
        };
        record.status = status;
        self.persist()?;
        Ok(true)
    }

    fn persist(&self) -> Result<(), HistoryError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Atomic replace
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&self.records)?)?;
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), records = self.records.len(), "Persisted donation history");
        Ok(())
    }
}
