//! Proving service
//!
//! Runs a [`ProofGenerator`] on the blocking pool under a timeout, racing it
//! against the donation's cancellation token. On cancellation or timeout the
//! generator's abort flag is raised; whatever it produces afterwards is
//! dropped with the join handle and never reaches the caller.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use zkfund_privacy::{DonationIntent, ProofError, ProofGenerator, ProvenDonation};

use crate::donation::error::DonationError;

#[derive(Clone)]
pub struct ProvingService {
    generator: Arc<dyn ProofGenerator>,
    timeout: Duration,
}

impl ProvingService {
    pub fn new(generator: Arc<dyn ProofGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Generate the proof for `intent`. The intent moves into the blocking
    /// task and is dropped there.
    pub async fn prove(
        &self,
        intent: DonationIntent,
        cancel: &CancellationToken,
    ) -> Result<ProvenDonation, DonationError> {
        let abort = Arc::new(AtomicBool::new(false));
        let generator = self.generator.clone();
        let flag = abort.clone();
        let started = Instant::now();

        debug!(recipient = %intent.recipient(), "Starting proof generation");
        let task = tokio::task::spawn_blocking(move || generator.generate(&intent, &flag));

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                abort.store(true, Ordering::Relaxed);
                warn!("Proof generation cancelled");
                return Err(DonationError::Cancelled);
            }
            joined = tokio::time::timeout(self.timeout, task) => joined,
        };

        match outcome {
            Ok(Ok(Ok(proven))) => {
                info!(
                    commitment = %proven.statement.amount_commitment.to_hex(),
                    proving_time_ms = started.elapsed().as_millis() as u64,
                    "Proof generated"
                );
                Ok(proven)
            }
            Ok(Ok(Err(ProofError::Cancelled))) => Err(DonationError::Cancelled),
            Ok(Ok(Err(e))) => {
                error!(error = %e, "Proof generation failed");
                Err(e.into())
            }
            Ok(Err(join_error)) => {
                error!(error = %join_error, "Prover task panicked");
                Err(ProofError::GenerationFailed(format!("prover task failed: {join_error}")).into())
            }
            Err(_) => {
                abort.store(true, Ordering::Relaxed);
                warn!(timeout_ms = self.timeout.as_millis() as u64, "Proof generation timed out");
                Err(ProofError::GenerationFailed(format!(
                    "timed out after {} ms",
                    self.timeout.as_millis()
                ))
                .into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zkfund_amount::Amount;
    use zkfund_privacy::{PedersenProofGenerator, ProofVerifier, Recipient};

    /// Spins until aborted, then reports how it ended.
    struct StallingGenerator {
        saw_abort: Arc<AtomicBool>,
    }

    impl ProofGenerator for StallingGenerator {
        fn generate(
            &self,
            _intent: &DonationIntent,
            abort: &AtomicBool,
        ) -> Result<ProvenDonation, ProofError> {
            while !abort.load(Ordering::Relaxed) {
                std::thread::sleep(Duration::from_millis(2));
            }
            self.saw_abort.store(true, Ordering::SeqCst);
            Err(ProofError::Cancelled)
        }
    }

    fn intent() -> DonationIntent {
        DonationIntent::new(
            Amount::from_base_units(7, 18).unwrap(),
            Recipient([4u8; 20]),
        )
    }

    async fn wait_for(flag: &AtomicBool) {
        for _ in 0..500 {
            if flag.load(Ordering::SeqCst) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("generator never observed the abort flag");
    }

    #[tokio::test]
    async fn test_proves_with_default_generator() {
        let service = ProvingService::new(
            Arc::new(PedersenProofGenerator::new()),
            Duration::from_secs(60),
        );
        let proven = service
            .prove(intent(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(ProofVerifier::new().is_valid(&proven.proof, &proven.statement));
    }

    #[tokio::test]
    async fn test_timeout_is_retryable_generation_failure() {
        let saw_abort = Arc::new(AtomicBool::new(false));
        let service = ProvingService::new(
            Arc::new(StallingGenerator {
                saw_abort: saw_abort.clone(),
            }),
            Duration::from_millis(20),
        );

        let err = service
            .prove(intent(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DonationError::Proof(ProofError::GenerationFailed(_))
        ));
        assert!(err.is_retryable());
        wait_for(&saw_abort).await;
    }

    #[tokio::test]
    async fn test_cancellation_aborts_generator() {
        let saw_abort = Arc::new(AtomicBool::new(false));
        let service = ProvingService::new(
            Arc::new(StallingGenerator {
                saw_abort: saw_abort.clone(),
            }),
            Duration::from_secs(60),
        );

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = service.prove(intent(), &cancel).await.unwrap_err();
        assert_eq!(err, DonationError::Cancelled);
        wait_for(&saw_abort).await;
    }
}
