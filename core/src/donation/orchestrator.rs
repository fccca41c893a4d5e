//! Donation orchestration
//!
//! One [`DonationOrchestrator`] drives exactly one donation attempt through
//! `Idle → Validating → Proving → Binding → Submitted → {Confirmed | Failed}`.
//! Terminal instances are never re-run: [`DonationOrchestrator::retry`]
//! hands out a fresh instance for the same raw input instead.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;
use zkfund_amount::AmountValidator;
use zkfund_privacy::{DonationIntent, Recipient};

use crate::donation::binder::TransactionBinder;
use crate::donation::confirmation::{
    ChainStatus, ConfirmationFeed, ConfirmationPolicy, await_final_status,
};
use crate::donation::error::{DonationError, TransactionError};
use crate::donation::prover::ProvingService;
use crate::donation::record::{TransactionRecord, TxStatus};
use crate::donation::signer::SignerSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DonationState {
    Idle,
    Validating,
    Proving,
    Binding,
    Submitted,
    Confirmed,
    Failed,
}

impl DonationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DonationState::Confirmed | DonationState::Failed)
    }
}

impl fmt::Display for DonationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Everything a donation run needs besides its own input.
pub struct DonationPipeline {
    pub validator: AmountValidator,
    pub recipient: Recipient,
    pub prover: ProvingService,
    pub binder: TransactionBinder,
    pub signer: Arc<SignerSession>,
    pub feed: Arc<dyn ConfirmationFeed>,
    pub confirmation: ConfirmationPolicy,
}

pub struct DonationOrchestrator {
    raw_input: Zeroizing<String>,
    state: DonationState,
    trace: Vec<DonationState>,
    record: Option<TransactionRecord>,
    error: Option<DonationError>,
}

impl DonationOrchestrator {
    pub fn new(raw_input: impl Into<String>) -> Self {
        Self {
            raw_input: Zeroizing::new(raw_input.into()),
            state: DonationState::Idle,
            trace: vec![DonationState::Idle],
            record: None,
            error: None,
        }
    }

    pub fn state(&self) -> DonationState {
        self.state
    }

    /// Every state this instance has been in, in order.
    pub fn trace(&self) -> &[DonationState] {
        &self.trace
    }

    /// The submitted transaction, once binding succeeded.
    pub fn record(&self) -> Option<&TransactionRecord> {
        self.record.as_ref()
    }

    pub fn error(&self) -> Option<&DonationError> {
        self.error.as_ref()
    }

    /// Drive the donation to a terminal state.
    ///
    /// Calling this on a terminal instance returns the recorded outcome
    /// without doing any work.
    pub async fn run(
        &mut self,
        pipeline: &DonationPipeline,
        cancel: &CancellationToken,
    ) -> Result<TransactionRecord, DonationError> {
        if !self.state.is_terminal() {
            if let Err(e) = self.drive(pipeline, cancel).await {
                self.fail(e);
            }
        }
        self.outcome()
    }

    /// A fresh instance for the same input, if the failure allows retrying.
    pub fn retry(&self) -> Option<DonationOrchestrator> {
        match (&self.state, &self.error) {
            (DonationState::Failed, Some(e)) if e.is_retryable() => {
                debug!(error = %e, "Retrying donation with a fresh orchestration");
                Some(DonationOrchestrator::new(self.raw_input.as_str()))
            }
            _ => None,
        }
    }

    fn outcome(&self) -> Result<TransactionRecord, DonationError> {
        match (&self.error, &self.record) {
            (Some(e), _) => Err(e.clone()),
            (None, Some(record)) if self.state == DonationState::Confirmed => Ok(record.clone()),
            _ => Err(DonationError::Cancelled),
        }
    }

    async fn drive(
        &mut self,
        pipeline: &DonationPipeline,
        cancel: &CancellationToken,
    ) -> Result<(), DonationError> {
        self.transition(DonationState::Validating);
        let amount = pipeline.validator.validate(&self.raw_input)?;

        self.transition(DonationState::Proving);
        let intent = DonationIntent::new(amount, pipeline.recipient);
        let proven = pipeline.prover.prove(intent, cancel).await?;

        self.transition(DonationState::Binding);
        if cancel.is_cancelled() {
            return Err(DonationError::Cancelled);
        }
        let record = pipeline
            .binder
            .bind(&proven, amount, &pipeline.signer, cancel)
            .await
            .map_err(|e| match e {
                TransactionError::Cancelled => DonationError::Cancelled,
                other => DonationError::Transaction(other),
            })?;
        let reference = record.reference.clone();
        self.record = Some(record);
        self.transition(DonationState::Submitted);

        // The transfer is out; cancellation no longer applies.
        let status =
            await_final_status(pipeline.feed.as_ref(), &reference, pipeline.confirmation).await;
        match status {
            Some(ChainStatus::Confirmed) => {
                self.set_record_status(TxStatus::Confirmed);
                self.transition(DonationState::Confirmed);
                info!(%reference, "Donation confirmed");
                Ok(())
            }
            Some(ChainStatus::Failed) => {
                self.set_record_status(TxStatus::Failed);
                Err(DonationError::Reverted { reference })
            }
            Some(ChainStatus::Pending) | None => {
                Err(DonationError::ConfirmationTimeout { reference })
            }
        }
    }

    fn set_record_status(&mut self, status: TxStatus) {
        if let Some(record) = self.record.as_mut() {
            record.status = status;
        }
    }

    fn transition(&mut self, next: DonationState) {
        debug!(from = %self.state, to = %next, "Donation state transition");
        self.state = next;
        self.trace.push(next);
    }

    fn fail(&mut self, error: DonationError) {
        warn!(stage = %self.state, error = %error, "Donation failed");
        self.error = Some(error);
        self.transition(DonationState::Failed);
    }
}

impl fmt::Debug for DonationOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DonationOrchestrator")
            .field("state", &self.state)
            .field("record", &self.record.as_ref().map(|r| &r.reference))
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}
