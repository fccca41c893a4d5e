use thiserror::Error;
use zkfund_amount::AmountError;
use zkfund_privacy::{ProofError, VerifyError};

use crate::donation::signer::TxReference;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    /// The transfer value, the proof and the statement do not describe the
    /// same donation. Integrity fault: never retried.
    #[error("transfer does not match the proven statement")]
    StatementMismatch,
    #[error("no active wallet session")]
    SignerUnavailable,
    #[error("wallet declined the transaction: {0}")]
    Rejected(String),
    #[error("submission failed: {0}")]
    SubmissionFailed(String),
    /// Cancelled while waiting to retry a failed submission.
    #[error("cancelled between submission attempts")]
    Cancelled,
}

impl TransactionError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransactionError::SubmissionFailed(_) | TransactionError::Cancelled
        )
    }
}

/// Terminal failure of one donation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DonationError {
    #[error(transparent)]
    Amount(#[from] AmountError),
    #[error(transparent)]
    Proof(#[from] ProofError),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    #[error("donation was cancelled before submission")]
    Cancelled,
    #[error("transaction {reference} was not confirmed in time")]
    ConfirmationTimeout { reference: TxReference },
    #[error("transaction {reference} failed on chain")]
    Reverted { reference: TxReference },
}

impl From<VerifyError> for DonationError {
    fn from(e: VerifyError) -> Self {
        DonationError::Proof(ProofError::VerificationFailed(e))
    }
}

impl DonationError {
    /// Whether re-running the same raw input can succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            DonationError::Proof(e) => e.is_retryable(),
            DonationError::Transaction(e) => e.is_retryable(),
            DonationError::Cancelled => true,
            DonationError::Amount(_)
            | DonationError::ConfirmationTimeout { .. }
            | DonationError::Reverted { .. } => false,
        }
    }

    /// Donor-facing explanation, one per error kind.
    pub fn user_message(&self) -> String {
        match self {
            DonationError::Amount(AmountError::NotNumeric) => {
                "Enter the amount as a plain decimal number, for example 0.5.".into()
            }
            DonationError::Amount(AmountError::NonPositive) => {
                "The donation amount must be greater than zero.".into()
            }
            DonationError::Amount(AmountError::PrecisionOverflow { max_decimals }) => format!(
                "The amount has too many decimal places; use at most {max_decimals}."
            ),
            DonationError::Amount(AmountError::OutOfRange) => {
                "The amount is larger than a single donation can carry.".into()
            }
            DonationError::Amount(AmountError::UnsupportedDecimals(d)) => format!(
                "The configured asset precision ({d} decimals) is not supported."
            ),
            DonationError::Proof(ProofError::GenerationFailed(_)) => {
                "The privacy proof could not be generated. Please try again.".into()
            }
            DonationError::Proof(ProofError::VerificationFailed(reason)) => {
                format!("The privacy proof did not verify ({reason}). Nothing was sent.")
            }
            DonationError::Proof(ProofError::Cancelled)
            | DonationError::Cancelled
            | DonationError::Transaction(TransactionError::Cancelled) => {
                "The donation was cancelled. No funds were sent.".into()
            }
            DonationError::Transaction(TransactionError::StatementMismatch) => {
                "The transfer did not match the proven amount and was blocked. Nothing was sent."
                    .into()
            }
            DonationError::Transaction(TransactionError::SignerUnavailable) => {
                "Connect your wallet before donating.".into()
            }
            DonationError::Transaction(TransactionError::Rejected(_)) => {
                "The transaction was declined in your wallet.".into()
            }
            DonationError::Transaction(TransactionError::SubmissionFailed(_)) => {
                "The network did not accept the transaction. Please try again shortly.".into()
            }
            DonationError::ConfirmationTimeout { reference } => format!(
                "Transaction {reference} was sent but is not confirmed yet. Check its status later."
            ),
            DonationError::Reverted { reference } => {
                format!("Transaction {reference} failed on chain. Your funds were not transferred.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy() {
        assert!(DonationError::from(ProofError::GenerationFailed("busy".into())).is_retryable());
        assert!(
            DonationError::from(TransactionError::SubmissionFailed("503".into())).is_retryable()
        );
        assert!(DonationError::Cancelled.is_retryable());
        assert!(DonationError::from(TransactionError::Cancelled).is_retryable());

        assert!(!DonationError::from(AmountError::NonPositive).is_retryable());
        assert!(!DonationError::from(TransactionError::Rejected("user".into())).is_retryable());
        assert!(!DonationError::from(TransactionError::StatementMismatch).is_retryable());
        assert!(!DonationError::from(TransactionError::SignerUnavailable).is_retryable());
        assert!(!DonationError::from(VerifyError::PositivityInvalid).is_retryable());
        assert!(
            !DonationError::Reverted {
                reference: TxReference::new("0xab")
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_user_messages_are_specific() {
        let errors = [
            DonationError::from(AmountError::NotNumeric),
            DonationError::from(AmountError::NonPositive),
            DonationError::from(AmountError::PrecisionOverflow { max_decimals: 6 }),
            DonationError::from(AmountError::OutOfRange),
            DonationError::from(ProofError::GenerationFailed("x".into())),
            DonationError::from(VerifyError::OpeningInvalid),
            DonationError::Cancelled,
            DonationError::from(TransactionError::StatementMismatch),
            DonationError::from(TransactionError::SignerUnavailable),
            DonationError::from(TransactionError::Rejected("x".into())),
            DonationError::from(TransactionError::SubmissionFailed("x".into())),
            DonationError::ConfirmationTimeout {
                reference: TxReference::new("0x01"),
            },
            DonationError::Reverted {
                reference: TxReference::new("0x02"),
            },
        ];

        let messages: std::collections::HashSet<_> =
            errors.iter().map(DonationError::user_message).collect();
        assert_eq!(messages.len(), errors.len());
        assert!(
            DonationError::from(AmountError::PrecisionOverflow { max_decimals: 6 })
                .user_message()
                .contains('6')
        );
    }
}
