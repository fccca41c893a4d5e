//! Donation statements and their on-chain payload
//!
//! ```text
//! payload = amount_commitment (32) || recipient (20)      52 bytes, no framing
//! ```
//!
//! Third parties recover the statement from a transaction's call data and
//! re-verify the published proof against it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zkfund_amount::Amount;

use crate::commitment::AmountCommitment;
use crate::error::VerifyError;

pub const RECIPIENT_LEN: usize = 20;
pub const PAYLOAD_LEN: usize = 32 + RECIPIENT_LEN;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecipientParseError {
    #[error("recipient must start with 0x")]
    MissingPrefix,
    #[error("recipient must be {RECIPIENT_LEN} bytes of hex")]
    InvalidHex,
}

/// Fixed public address of the cause receiving donations.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Recipient(#[serde(with = "hex")] pub [u8; RECIPIENT_LEN]);

impl Recipient {
    pub fn as_bytes(&self) -> &[u8; RECIPIENT_LEN] {
        &self.0
    }
}

impl FromStr for Recipient {
    type Err = RecipientParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .trim()
            .strip_prefix("0x")
            .ok_or(RecipientParseError::MissingPrefix)?;
        let mut bytes = [0u8; RECIPIENT_LEN];
        hex::decode_to_slice(digits, &mut bytes).map_err(|_| RecipientParseError::InvalidHex)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Recipient({self})")
    }
}

/// What the donor wants to give. Lives only for the duration of one orchestration.
pub struct DonationIntent {
    amount: Amount,
    recipient: Recipient,
}

impl DonationIntent {
    pub fn new(amount: Amount, recipient: Recipient) -> Self {
        Self { amount, recipient }
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn recipient(&self) -> Recipient {
        self.recipient
    }
}

impl fmt::Debug for DonationIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DonationIntent")
            .field("recipient", &self.recipient)
            .finish_non_exhaustive()
    }
}

/// The public facts a donation proof attests to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DonationStatement {
    pub amount_commitment: AmountCommitment,
    pub recipient: Recipient,
}

impl DonationStatement {
    pub fn new(amount_commitment: AmountCommitment, recipient: Recipient) -> Self {
        Self {
            amount_commitment,
            recipient,
        }
    }

    /// Encode as transaction call data.
    pub fn to_payload(&self) -> [u8; PAYLOAD_LEN] {
        let mut out = [0u8; PAYLOAD_LEN];
        out[..32].copy_from_slice(self.amount_commitment.as_bytes());
        out[32..].copy_from_slice(self.recipient.as_bytes());
        out
    }

    /// Decode transaction call data. The commitment must be a canonical group element.
    pub fn from_payload(payload: &[u8]) -> Result<Self, VerifyError> {
        if payload.len() != PAYLOAD_LEN {
            return Err(VerifyError::Malformed("payload length"));
        }

        let mut commitment = [0u8; 32];
        commitment.copy_from_slice(&payload[..32]);
        let amount_commitment = AmountCommitment(commitment);
        if amount_commitment.to_point().is_none() {
            return Err(VerifyError::Malformed("payload commitment"));
        }

        let mut recipient = [0u8; RECIPIENT_LEN];
        recipient.copy_from_slice(&payload[32..]);

        Ok(Self::new(amount_commitment, Recipient(recipient)))
    }
}
