//! Proof verification
//!
//! Pure and deterministic; needs nothing but the proof bytes and the public
//! statement, so any third party can check a donation.
//!
//! Checks run in order and stop at the first failure:
//! 1. decode (length, version, canonical encodings)      → `Malformed`
//! 2. embedded statement vs. claimed statement           → `CommitmentMismatch` / `RecipientMismatch`
//! 3. opening proof                                      → `OpeningInvalid`
//! 4. bit decomposition + per-bit OR-proofs              → `PositivityInvalid`

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::{Identity, VartimeMultiscalarMul};

use crate::error::VerifyError;
use crate::generators::pedersen_gens;
use crate::proof::{DonationProof, ParsedProof, RANGE_BITS};
use crate::statement::DonationStatement;
use crate::transcript::{TranscriptProtocol, donation_transcript};

#[derive(Debug, Clone, Copy, Default)]
pub struct ProofVerifier;

impl ProofVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Verify `proof` against `statement`, reporting the first failed check.
    pub fn verify(
        &self,
        proof: &DonationProof,
        statement: &DonationStatement,
    ) -> Result<(), VerifyError> {
        let parsed = ParsedProof::decode(proof)?;

        if parsed.statement.amount_commitment != statement.amount_commitment {
            return Err(VerifyError::CommitmentMismatch);
        }
        if parsed.statement.recipient != statement.recipient {
            return Err(VerifyError::RecipientMismatch);
        }

        let gens = pedersen_gens();
        let mut transcript = donation_transcript(statement);

        // s_v·G + s_r·H == T + c·C
        let opening = &parsed.opening;
        transcript.append_point(b"opening-T", &opening.t.compress());
        let c = transcript.challenge_scalar(b"opening-c");
        let lhs = RistrettoPoint::vartime_multiscalar_mul(
            [opening.s_value, opening.s_blinding, -c],
            [gens.g, gens.h, parsed.commitment],
        );
        if lhs != opening.t {
            return Err(VerifyError::OpeningInvalid);
        }

        // Σ 2^i·B_i == C − G
        let recomposed = parsed
            .bits
            .iter()
            .rev()
            .fold(RistrettoPoint::identity(), |acc, bit| acc + acc + bit.commitment);
        if recomposed != parsed.commitment - gens.g {
            return Err(VerifyError::PositivityInvalid);
        }

        transcript.append_u64(b"range-bits", RANGE_BITS as u64);
        for bit in &parsed.bits {
            let branches = [bit.commitment, bit.commitment - gens.g];
            let r0 = RistrettoPoint::vartime_multiscalar_mul(
                [bit.s[0], -bit.c[0]],
                [gens.h, branches[0]],
            );
            let r1 = RistrettoPoint::vartime_multiscalar_mul(
                [bit.s[1], -bit.c[1]],
                [gens.h, branches[1]],
            );

            transcript.append_point(b"bit-B", &bit.commitment.compress());
            transcript.append_point(b"bit-R0", &r0.compress());
            transcript.append_point(b"bit-R1", &r1.compress());
            let c: Scalar = transcript.challenge_scalar(b"bit-c");

            if bit.c[0] + bit.c[1] != c {
                return Err(VerifyError::PositivityInvalid);
            }
        }

        Ok(())
    }

    pub fn is_valid(&self, proof: &DonationProof, statement: &DonationStatement) -> bool {
        self.verify(proof, statement).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;

    use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
    use rand::rngs::OsRng;
    use zkfund_amount::Amount;

    use super::*;
    use crate::commitment::{AmountCommitment, BlindingFactor};
    use crate::proof::{BitProof, OpeningProof, PROOF_LEN};
    use crate::prover::{PedersenProofGenerator, ProofGenerator, ProvenDonation};
    use crate::statement::{DonationIntent, Recipient};
    use crate::transcript::donation_transcript;

    fn prove(units: u64) -> ProvenDonation {
        let intent = DonationIntent::new(
            Amount::from_base_units(units, 18).unwrap(),
            Recipient([7u8; 20]),
        );
        PedersenProofGenerator::new()
            .generate(&intent, &AtomicBool::new(false))
            .unwrap()
    }

    #[test]
    fn test_generated_proofs_verify() {
        let verifier = ProofVerifier::new();
        for units in [1, 2, 3, 255, 500_000_000_000_000_000, u64::MAX] {
            let proven = prove(units);
            assert_eq!(verifier.verify(&proven.proof, &proven.statement), Ok(()));
        }
    }

    #[test]
    fn test_mismatched_recipient() {
        let proven = prove(10);
        let mut statement = proven.statement;
        statement.recipient = Recipient([8u8; 20]);
        assert_eq!(
            ProofVerifier::new().verify(&proven.proof, &statement),
            Err(VerifyError::RecipientMismatch)
        );
    }

    #[test]
    fn test_mismatched_commitment() {
        let proven = prove(10);
        let other = prove(10);
        let statement =
            DonationStatement::new(other.statement.amount_commitment, proven.statement.recipient);
        assert_eq!(
            ProofVerifier::new().verify(&proven.proof, &statement),
            Err(VerifyError::CommitmentMismatch)
        );
    }

    #[test]
    fn test_malformed_bytes() {
        let proven = prove(10);
        let verifier = ProofVerifier::new();

        let mut truncated = proven.proof.as_bytes().to_vec();
        truncated.pop();
        assert!(matches!(
            verifier.verify(&DonationProof::from_bytes(truncated), &proven.statement),
            Err(VerifyError::Malformed(_))
        ));

        let mut extended = proven.proof.as_bytes().to_vec();
        extended.push(0);
        assert!(matches!(
            verifier.verify(&DonationProof::from_bytes(extended), &proven.statement),
            Err(VerifyError::Malformed(_))
        ));

        // Last scalar of the last bit proof, top byte set: beyond the group order.
        let mut noncanonical = proven.proof.into_bytes();
        noncanonical[PROOF_LEN - 1] |= 0xf0;
        assert_eq!(
            verifier.verify(&DonationProof::from_bytes(noncanonical), &proven.statement),
            Err(VerifyError::Malformed("non-canonical scalar"))
        );
    }

    /// A commitment to zero cannot satisfy the positivity check even with a
    /// valid opening proof.
    #[test]
    fn test_zero_amount_fails_positivity() {
        let gens = pedersen_gens();
        let mut rng = OsRng;
        let blinding = BlindingFactor::random(&mut rng);
        let commitment = blinding.commit(0);
        let statement = DonationStatement::new(
            AmountCommitment::from_point(&commitment),
            Recipient([9u8; 20]),
        );

        let mut transcript = donation_transcript(&statement);
        let a = Scalar::from(5u64);
        let b = Scalar::from(6u64);
        let t = gens.commit(a, b);
        transcript.append_point(b"opening-T", &t.compress());
        let c = transcript.challenge_scalar(b"opening-c");
        let opening = OpeningProof {
            t,
            s_value: a,
            s_blinding: b + c * blinding.scalar(),
        };

        // All-zero bits: recompose to the identity, never to C − G.
        let bits = (0..RANGE_BITS)
            .map(|_| BitProof {
                commitment: RistrettoPoint::identity(),
                c: [Scalar::ZERO; 2],
                s: [Scalar::ZERO; 2],
            })
            .collect();

        let proof = ParsedProof {
            statement,
            commitment,
            opening,
            bits,
        }
        .encode();

        assert_eq!(
            ProofVerifier::new().verify(&proof, &statement),
            Err(VerifyError::PositivityInvalid)
        );
    }

    #[test]
    fn test_forged_opening_rejected() {
        let proven = prove(42);
        let mut bytes = proven.proof.into_bytes();
        // Replace T with the basepoint: still a valid encoding, wrong proof.
        let t_offset = 1 + 32 + 20;
        bytes[t_offset..t_offset + 32]
            .copy_from_slice(RISTRETTO_BASEPOINT_POINT.compress().as_bytes());
        assert_eq!(
            ProofVerifier::new().verify(&DonationProof::from_bytes(bytes), &proven.statement),
            Err(VerifyError::OpeningInvalid)
        );
    }

    #[test]
    fn test_swapping_proofs_between_statements_fails() {
        let a = prove(100);
        let b = prove(100);
        let verifier = ProofVerifier::new();
        assert!(!verifier.is_valid(&a.proof, &b.statement));
        assert!(!verifier.is_valid(&b.proof, &a.statement));
    }
}
