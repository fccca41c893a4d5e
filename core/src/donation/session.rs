//! Donor session
//!
//! Session-scoped state for one donor: the wallet session, the donation
//! pipeline and the local history. Concurrent donations share the session;
//! each gets its own orchestrator and witness.

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::donation::confirmation::ChainStatus;
use crate::donation::error::{DonationError, TransactionError};
use crate::donation::history::{DonationHistory, HistoryError};
use crate::donation::orchestrator::{DonationOrchestrator, DonationPipeline};
use crate::donation::record::{TransactionRecord, TxStatus};
use crate::donation::signer::{Address, SignerError};

pub struct DonorSession {
    pipeline: DonationPipeline,
    history: Mutex<DonationHistory>,
}

impl DonorSession {
    pub fn new(pipeline: DonationPipeline, history: DonationHistory) -> Self {
        Self {
            pipeline,
            history: Mutex::new(history),
        }
    }

    pub fn pipeline(&self) -> &DonationPipeline {
        &self.pipeline
    }

    pub async fn connect(&self) -> Result<Address, TransactionError> {
        self.pipeline.signer.connect().await.map_err(|e| match e {
            SignerError::NotConnected => TransactionError::SignerUnavailable,
            SignerError::Rejected(reason) => TransactionError::Rejected(reason),
            SignerError::Network(reason) => TransactionError::SubmissionFailed(reason),
            e @ SignerError::TimedOut(_) => TransactionError::SubmissionFailed(e.to_string()),
        })
    }

    pub async fn address(&self) -> Option<Address> {
        self.pipeline.signer.address().await
    }

    /// Run a new donation for `raw_amount`.
    pub async fn donate(
        &self,
        raw_amount: &str,
        cancel: &CancellationToken,
    ) -> (DonationOrchestrator, Result<TransactionRecord, DonationError>) {
        let mut orchestrator = DonationOrchestrator::new(raw_amount);
        let outcome = self.run(&mut orchestrator, cancel).await;
        (orchestrator, outcome)
    }

    /// Run `orchestrator` and file whatever it submitted into history,
    /// whether or not it confirmed.
    pub async fn run(
        &self,
        orchestrator: &mut DonationOrchestrator,
        cancel: &CancellationToken,
    ) -> Result<TransactionRecord, DonationError> {
        let outcome = orchestrator.run(&self.pipeline, cancel).await;

        if let Some(record) = orchestrator.record() {
            if let Err(e) = self.history.lock().await.append(record.clone()) {
                // Already on chain; the outcome stands.
                warn!(reference = %record.reference, error = %e, "Failed to record donation in history");
            }
        }

        match &outcome {
            Ok(record) => info!(reference = %record.reference, "Donation complete"),
            Err(e) => info!(error = %e, retryable = e.is_retryable(), "Donation ended without confirmation"),
        }
        outcome
    }

    /// Snapshot of every donation submitted from this session's history.
    pub async fn history(&self) -> Vec<TransactionRecord> {
        self.history.lock().await.records().to_vec()
    }

    /// Re-poll the chain for every still-pending record.
    pub async fn refresh_pending(&self) -> Result<usize, HistoryError> {
        let pending: Vec<_> = self
            .history()
            .await
            .into_iter()
            .filter(|r| r.status == TxStatus::Pending)
            .map(|r| r.reference)
            .collect();

        let mut updated = 0;
        for reference in pending {
            let status = match self.pipeline.feed.status(&reference).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(%reference, error = %e, "Status refresh failed");
                    continue;
                }
            };
            let status = match status {
                ChainStatus::Pending => continue,
                ChainStatus::Confirmed => TxStatus::Confirmed,
                ChainStatus::Failed => TxStatus::Failed,
            };
            if self.history.lock().await.update_status(&reference, status)? {
                updated += 1;
            }
        }
        Ok(updated)
    }
}
