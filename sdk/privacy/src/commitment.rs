//! Amount Commitments
//!
//! ```text
//! Commitment = amount·G + blinding·H      (Pedersen over Ristretto255)
//! ```
//!
//! Perfectly hiding, computationally binding. A fresh blinding factor is
//! drawn per donation, so equal amounts never produce equal commitments.

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::generators::{pedersen_gens, random_scalar};

/// Compressed commitment (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AmountCommitment(#[serde(with = "hex")] pub [u8; 32]);

impl AmountCommitment {
    pub fn from_point(point: &RistrettoPoint) -> Self {
        Self(point.compress().to_bytes())
    }

    /// Decompress; `None` if the bytes are not a canonical group element.
    pub fn to_point(&self) -> Option<RistrettoPoint> {
        CompressedRistretto(self.0).decompress()
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for AmountCommitment {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Secret commitment randomness. Wiped on drop and never exposed outside the crate.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct BlindingFactor(Scalar);

impl BlindingFactor {
    pub(crate) fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self(random_scalar(rng))
    }

    pub(crate) fn scalar(&self) -> &Scalar {
        &self.0
    }

    /// Commit to `value` under this blinding factor.
    pub(crate) fn commit(&self, value: u64) -> RistrettoPoint {
        pedersen_gens().commit(Scalar::from(value), self.0)
    }
}

impl std::fmt::Debug for BlindingFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BlindingFactor(<redacted>)")
    }
}
