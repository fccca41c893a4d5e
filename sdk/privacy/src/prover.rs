//! Proof generation
//!
//! ```text
//! intent (amount v, recipient)
//!    │  r ← fresh blinding factor
//!    ▼
//! C = vG + rH ──▶ statement = (C, recipient)
//!    │
//!    ├── opening:    PoK{(v, r) : C = vG + rH}
//!    ├── positivity: C − G = Σ 2^i·B_i,  each B_i ∈ {rH, G + rH}
//!    └── value binding (local only): PoK{r : C − vG = rH}
//! ```
//!
//! `r` and every per-bit secret live in zeroizing containers and are wiped
//! before `generate` returns, on success, failure or abort alike.

use std::sync::atomic::{AtomicBool, Ordering};

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::Identity;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use zeroize::Zeroizing;
use zkfund_amount::Amount;

use crate::commitment::{AmountCommitment, BlindingFactor};
use crate::error::ProofError;
use crate::generators::{pedersen_gens, random_scalar};
use crate::proof::{BitProof, DonationProof, OpeningProof, ParsedProof, RANGE_BITS};
use crate::statement::{DonationIntent, DonationStatement};
use crate::transcript::{TranscriptProtocol, donation_transcript, value_binding_transcript};

/// Pluggable proving capability.
pub trait ProofGenerator: Send + Sync {
    /// Produce a statement and proof for `intent`. Implementations poll `abort`
    /// and return [`ProofError::Cancelled`] once it is set.
    fn generate(&self, intent: &DonationIntent, abort: &AtomicBool)
    -> Result<ProvenDonation, ProofError>;
}

/// Output of a successful generation.
#[derive(Debug, Clone)]
pub struct ProvenDonation {
    pub statement: DonationStatement,
    pub proof: DonationProof,
    pub value_binding: ValueBinding,
}

/// Proof that the statement's commitment opens to a given public value,
/// without revealing the blinding factor. Checked locally before submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueBinding {
    nonce_commitment: RistrettoPoint,
    response: Scalar,
}

impl ValueBinding {
    fn prove<R: RngCore + CryptoRng>(
        statement: &DonationStatement,
        value: u64,
        blinding: &BlindingFactor,
        rng: &mut R,
    ) -> Self {
        let gens = pedersen_gens();
        let k = Zeroizing::new(random_scalar(rng));
        let nonce_commitment = gens.h * *k;

        let mut transcript = value_binding_transcript(statement, value);
        transcript.append_point(b"R", &nonce_commitment.compress());
        let c = transcript.challenge_scalar(b"c");

        Self {
            nonce_commitment,
            response: *k + c * blinding.scalar(),
        }
    }

    /// True iff `statement`'s commitment opens to exactly `amount`.
    pub fn verify(&self, statement: &DonationStatement, amount: Amount) -> bool {
        let Some(commitment) = statement.amount_commitment.to_point() else {
            return false;
        };
        let gens = pedersen_gens();
        let value = amount.base_units();

        let mut transcript = value_binding_transcript(statement, value);
        transcript.append_point(b"R", &self.nonce_commitment.compress());
        let c = transcript.challenge_scalar(b"c");

        let blinded = commitment - gens.g * Scalar::from(value);
        gens.h * self.response == self.nonce_commitment + blinded * c
    }
}

/// Pedersen commitments over Ristretto255 with sigma-protocol proofs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PedersenProofGenerator;

impl PedersenProofGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate_with_rng<R: RngCore + CryptoRng>(
        &self,
        intent: &DonationIntent,
        rng: &mut R,
        abort: &AtomicBool,
    ) -> Result<ProvenDonation, ProofError> {
        let gens = pedersen_gens();
        let value = intent.amount().base_units();
        let v = Scalar::from(value);

        let blinding = BlindingFactor::random(rng);
        let commitment = blinding.commit(value);
        let statement =
            DonationStatement::new(AmountCommitment::from_point(&commitment), intent.recipient());

        let mut transcript = donation_transcript(&statement);

        // Knowledge of opening
        let a = Zeroizing::new(random_scalar(rng));
        let b = Zeroizing::new(random_scalar(rng));
        let t = gens.commit(*a, *b);
        transcript.append_point(b"opening-T", &t.compress());
        let c = transcript.challenge_scalar(b"opening-c");
        let opening = OpeningProof {
            t,
            s_value: *a + c * v,
            s_blinding: *b + c * blinding.scalar(),
        };

        // Positivity: bits of v - 1, blindings summing (weighted) to r
        let shifted = value - 1;
        let mut bit_blindings = Zeroizing::new(vec![Scalar::ZERO; RANGE_BITS]);
        let mut weighted = Scalar::ZERO;
        for (i, r_i) in bit_blindings.iter_mut().enumerate().skip(1) {
            *r_i = random_scalar(rng);
            weighted += Scalar::from(1u64 << i) * *r_i;
        }
        bit_blindings[0] = blinding.scalar() - weighted;

        transcript.append_u64(b"range-bits", RANGE_BITS as u64);
        let mut bits = Vec::with_capacity(RANGE_BITS);
        for (i, r_i) in bit_blindings.iter().enumerate() {
            if abort.load(Ordering::Relaxed) {
                return Err(ProofError::Cancelled);
            }

            let bit = ((shifted >> i) & 1) as usize;
            let bit_commitment = gens.commit(Scalar::from(bit as u64), *r_i);
            let branches = [bit_commitment, bit_commitment - gens.g];
            let real = bit;
            let fake = 1 - bit;

            let c_fake = random_scalar(rng);
            let s_fake = random_scalar(rng);
            let k = Zeroizing::new(random_scalar(rng));

            let mut r = [RistrettoPoint::identity(); 2];
            r[fake] = gens.h * s_fake - branches[fake] * c_fake;
            r[real] = gens.h * *k;

            transcript.append_point(b"bit-B", &bit_commitment.compress());
            transcript.append_point(b"bit-R0", &r[0].compress());
            transcript.append_point(b"bit-R1", &r[1].compress());
            let c = transcript.challenge_scalar(b"bit-c");

            let mut cs = [Scalar::ZERO; 2];
            let mut ss = [Scalar::ZERO; 2];
            cs[fake] = c_fake;
            ss[fake] = s_fake;
            cs[real] = c - c_fake;
            ss[real] = *k + cs[real] * r_i;

            bits.push(BitProof {
                commitment: bit_commitment,
                c: cs,
                s: ss,
            });
        }

        let proof = ParsedProof {
            statement,
            commitment,
            opening,
            bits,
        }
        .encode();
        let value_binding = ValueBinding::prove(&statement, value, &blinding, rng);

        Ok(ProvenDonation {
            statement,
            proof,
            value_binding,
        })
    }
}

impl ProofGenerator for PedersenProofGenerator {
    fn generate(
        &self,
        intent: &DonationIntent,
        abort: &AtomicBool,
    ) -> Result<ProvenDonation, ProofError> {
        self.generate_with_rng(intent, &mut OsRng, abort)
    }
}
