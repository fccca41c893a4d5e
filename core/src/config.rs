//! Configuration Module
//!
//! Maps the TOML/env configuration from `zkfund-config` onto the typed
//! settings the donation pipeline runs with.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use zkfund_amount::{AmountError, AmountValidator};
use zkfund_config::ZkFundConfig;
use zkfund_privacy::{PedersenProofGenerator, ProofGenerator, Recipient, RecipientParseError};

use crate::donation::binder::{SubmissionPolicy, TransactionBinder};
use crate::donation::confirmation::{ConfirmationFeed, ConfirmationPolicy};
use crate::donation::history::{DonationHistory, HistoryError};
use crate::donation::orchestrator::DonationPipeline;
use crate::donation::prover::ProvingService;
use crate::donation::session::DonorSession;
use crate::donation::signer::{SignerSession, WalletSigner};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid donation.recipient: {0}")]
    Recipient(#[from] RecipientParseError),
    #[error("invalid asset.decimals: {0}")]
    Decimals(#[from] AmountError),
    #[error(transparent)]
    History(#[from] HistoryError),
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub validator: AmountValidator,
    pub recipient: Recipient,
    pub proof_timeout: Duration,
    pub submission: SubmissionPolicy,
    pub confirmation: ConfirmationPolicy,
}

impl TryFrom<&ZkFundConfig> for PipelineSettings {
    type Error = ConfigError;

    fn try_from(config: &ZkFundConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            validator: AmountValidator::new(config.asset.decimals)?,
            recipient: config.donation.recipient.parse()?,
            proof_timeout: Duration::from_millis(config.proving.timeout_ms),
            submission: SubmissionPolicy {
                timeout: Duration::from_millis(config.submission.timeout_ms),
                max_retries: config.submission.max_retries,
                retry_base: Duration::from_millis(config.submission.retry_base_ms),
            },
            confirmation: ConfirmationPolicy {
                poll_interval: Duration::from_millis(config.confirmation.poll_interval_ms),
                timeout: Duration::from_millis(config.confirmation.timeout_ms),
            },
        })
    }
}

impl PipelineSettings {
    /// Assemble a pipeline around the default Pedersen prover.
    pub fn into_pipeline(
        self,
        signer: Arc<dyn WalletSigner>,
        feed: Arc<dyn ConfirmationFeed>,
    ) -> DonationPipeline {
        self.into_pipeline_with(Arc::new(PedersenProofGenerator::new()), signer, feed)
    }

    pub fn into_pipeline_with(
        self,
        generator: Arc<dyn ProofGenerator>,
        signer: Arc<dyn WalletSigner>,
        feed: Arc<dyn ConfirmationFeed>,
    ) -> DonationPipeline {
        DonationPipeline {
            validator: self.validator,
            recipient: self.recipient,
            prover: ProvingService::new(generator, self.proof_timeout),
            binder: TransactionBinder::new(self.submission),
            signer: Arc::new(SignerSession::new(signer)),
            feed,
            confirmation: self.confirmation,
        }
    }
}

impl DonorSession {
    /// Build a session from loaded configuration, opening the configured
    /// history file (in-memory if no home directory is known).
    pub fn from_config(
        config: &ZkFundConfig,
        signer: Arc<dyn WalletSigner>,
        feed: Arc<dyn ConfirmationFeed>,
    ) -> Result<Self, ConfigError> {
        let pipeline = PipelineSettings::try_from(config)?.into_pipeline(signer, feed);
        let history = match config.history_path() {
            Some(path) => DonationHistory::open(path)?,
            None => DonationHistory::in_memory(),
        };
        Ok(Self::new(pipeline, history))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_map_to_settings() {
        let settings = PipelineSettings::try_from(&ZkFundConfig::default()).unwrap();
        assert_eq!(settings.validator.decimals(), 18);
        assert_eq!(
            settings.recipient.to_string(),
            "0x5a4b46756e64446f6e6174696f6e735661756c74"
        );
        assert_eq!(settings.submission.max_retries, 3);
        assert_eq!(settings.submission.retry_base, Duration::from_millis(500));
    }

    #[test]
    fn test_rejects_bad_recipient_and_precision() {
        let mut config = ZkFundConfig::default();
        config.donation.recipient = "not-an-address".into();
        assert!(matches!(
            PipelineSettings::try_from(&config),
            Err(ConfigError::Recipient(RecipientParseError::MissingPrefix))
        ));

        let mut config = ZkFundConfig::default();
        config.asset.decimals = 30;
        assert!(matches!(
            PipelineSettings::try_from(&config),
            Err(ConfigError::Decimals(AmountError::UnsupportedDecimals(30)))
        ));
    }
}
