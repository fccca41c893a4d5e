use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use zkfund_privacy::{DonationProof, DonationStatement, ProofVerifier, VerifyError};

use crate::donation::signer::TxReference;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
}

/// A submitted donation as the donor (and any auditor) sees it.
///
/// Holds only public data: the statement and proof are what the chain and
/// the proof verifier see. The amount and blinding factor are never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub reference: TxReference,
    pub statement: DonationStatement,
    pub proof: DonationProof,
    pub status: TxStatus,
    /// Unix seconds at submission
    pub submitted_at: u64,
}

impl TransactionRecord {
    pub fn pending(reference: TxReference, statement: DonationStatement, proof: DonationProof) -> Self {
        let submitted_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            reference,
            statement,
            proof,
            status: TxStatus::Pending,
            submitted_at,
        }
    }

    /// Re-check the stored proof against the stored statement.
    pub fn verify(&self) -> Result<(), VerifyError> {
        ProofVerifier::new().verify(&self.proof, &self.statement)
    }
}
