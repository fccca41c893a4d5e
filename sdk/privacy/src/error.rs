use thiserror::Error;

/// Why a proof was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("malformed proof: {0}")]
    Malformed(&'static str),
    #[error("proof was generated for a different recipient")]
    RecipientMismatch,
    #[error("proof was generated for a different amount commitment")]
    CommitmentMismatch,
    #[error("knowledge-of-opening proof does not verify")]
    OpeningInvalid,
    #[error("positivity proof does not verify")]
    PositivityInvalid,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProofError {
    /// The proving capability was unavailable or timed out. Retryable.
    #[error("proof generation failed: {0}")]
    GenerationFailed(String),
    #[error("proof verification failed: {0}")]
    VerificationFailed(#[from] VerifyError),
    #[error("proof generation was cancelled")]
    Cancelled,
}

impl ProofError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProofError::GenerationFailed(_))
    }
}
