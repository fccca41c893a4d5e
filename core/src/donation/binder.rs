//! Transaction binding
//!
//! Ties a proven statement to the transfer that pays for it:
//!
//! 1. the proof must verify against the statement,
//! 2. the statement's commitment must open to the transfer value
//!    (checked through the generator's value binding, so the blinding
//!    factor is never needed here),
//! 3. the statement, not the amount, becomes the transaction payload.
//!
//! Only then is the transfer handed to the wallet. Transient submission
//! failures are retried with exponential backoff; cancelling during a
//! backoff stops the retries.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use zkfund_amount::Amount;
use zkfund_privacy::{ProofVerifier, ProvenDonation};

use crate::donation::error::TransactionError;
use crate::donation::record::TransactionRecord;
use crate::donation::signer::{SignerError, SignerSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionPolicy {
    /// Per-attempt timeout on the wallet call, not counting time queued
    /// behind other donations of the same session
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Backoff before retry `n` (1-based) is `retry_base * 2^(n-1)`
    pub retry_base: Duration,
}

impl Default for SubmissionPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            max_retries: 3,
            retry_base: Duration::from_millis(500),
        }
    }
}

impl SubmissionPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_base
            .saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransactionBinder {
    verifier: ProofVerifier,
    policy: SubmissionPolicy,
}

impl TransactionBinder {
    pub fn new(policy: SubmissionPolicy) -> Self {
        Self {
            verifier: ProofVerifier::new(),
            policy,
        }
    }

    pub fn policy(&self) -> &SubmissionPolicy {
        &self.policy
    }

    /// Check `proven` against the transfer of `amount`, then submit it.
    pub async fn bind(
        &self,
        proven: &ProvenDonation,
        amount: Amount,
        signer: &SignerSession,
        cancel: &CancellationToken,
    ) -> Result<TransactionRecord, TransactionError> {
        let statement = &proven.statement;

        if let Err(reason) = self.verifier.verify(&proven.proof, statement) {
            error!(%reason, "Refusing to bind a proof that does not verify");
            return Err(TransactionError::StatementMismatch);
        }
        if !proven.value_binding.verify(statement, amount) {
            error!(
                commitment = %statement.amount_commitment.to_hex(),
                "Transfer value differs from the committed amount"
            );
            return Err(TransactionError::StatementMismatch);
        }

        let payload = statement.to_payload();
        let mut attempt = 0u32;
        loop {
            let sent = signer
                .send_value(&statement.recipient, amount, &payload, self.policy.timeout)
                .await;

            let err = match sent {
                Ok(reference) => {
                    info!(
                        %reference,
                        commitment = %statement.amount_commitment.to_hex(),
                        attempts = attempt + 1,
                        "Donation submitted"
                    );
                    return Ok(TransactionRecord::pending(
                        reference,
                        *statement,
                        proven.proof.clone(),
                    ));
                }
                Err(SignerError::NotConnected) => TransactionError::SignerUnavailable,
                Err(SignerError::Rejected(reason)) => TransactionError::Rejected(reason),
                Err(SignerError::Network(reason)) => TransactionError::SubmissionFailed(reason),
                Err(e @ SignerError::TimedOut(_)) => {
                    TransactionError::SubmissionFailed(e.to_string())
                }
            };

            if !err.is_retryable() || attempt >= self.policy.max_retries {
                warn!(error = %err, attempts = attempt + 1, "Submission failed");
                return Err(err);
            }

            let delay = self.policy.backoff(attempt);
            attempt += 1;
            warn!(
                error = %err,
                retry = attempt,
                max_retries = self.policy.max_retries,
                delay_ms = delay.as_millis() as u64,
                "Submission failed, retrying"
            );
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(retry = attempt, "Donation cancelled during submission backoff");
                    return Err(TransactionError::Cancelled);
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
