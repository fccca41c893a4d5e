//! End-to-end properties of the generate → verify pipeline.

use std::sync::atomic::AtomicBool;

use zkfund_amount::AmountValidator;
use zkfund_privacy::{
    DonationIntent, DonationProof, DonationStatement, PROOF_LEN, PedersenProofGenerator,
    ProofGenerator, ProofVerifier, Recipient, VerifyError,
};

fn cause() -> Recipient {
    "0x5a4b46756e64446f6e6174696f6e735661756c74".parse().unwrap()
}

fn intent(raw: &str) -> DonationIntent {
    let amount = AmountValidator::new(18).unwrap().validate(raw).unwrap();
    DonationIntent::new(amount, cause())
}

#[test]
fn every_generated_proof_verifies() {
    let generator = PedersenProofGenerator::new();
    let verifier = ProofVerifier::new();
    let abort = AtomicBool::new(false);

    for raw in ["0.5", "1", "0.000000000000000001", "18.446744073709551615", "3.14159"] {
        let proven = generator.generate(&intent(raw), &abort).unwrap();
        assert!(
            verifier.is_valid(&proven.proof, &proven.statement),
            "proof for {raw} did not verify"
        );
    }
}

#[test]
fn same_amount_yields_unlinkable_commitments() {
    let generator = PedersenProofGenerator::new();
    let abort = AtomicBool::new(false);

    let commitments: Vec<_> = (0..8)
        .map(|_| {
            generator
                .generate(&intent("0.5"), &abort)
                .unwrap()
                .statement
                .amount_commitment
        })
        .collect();

    for (i, a) in commitments.iter().enumerate() {
        for b in &commitments[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

/// Flip one byte at a spread of offsets covering every section of the proof.
#[test]
fn single_byte_flips_never_verify() {
    let proven = PedersenProofGenerator::new()
        .generate(&intent("0.5"), &AtomicBool::new(false))
        .unwrap();
    let verifier = ProofVerifier::new();

    let mut offsets: Vec<usize> = (0..160).collect();
    offsets.extend((160..PROOF_LEN).step_by(97));
    offsets.push(PROOF_LEN - 1);

    for offset in offsets {
        for mask in [0x01u8, 0x80] {
            let mut bytes = proven.proof.as_bytes().to_vec();
            bytes[offset] ^= mask;
            let tampered = DonationProof::from_bytes(bytes);
            assert!(
                verifier.verify(&tampered, &proven.statement).is_err(),
                "flipping byte {offset} with mask {mask:#04x} still verified"
            );
        }
    }
}

#[test]
fn statement_recovered_from_payload_verifies() {
    let proven = PedersenProofGenerator::new()
        .generate(&intent("2.5"), &AtomicBool::new(false))
        .unwrap();

    let payload = proven.statement.to_payload();
    let recovered = DonationStatement::from_payload(&payload).unwrap();
    assert_eq!(recovered, proven.statement);
    assert_eq!(ProofVerifier::new().verify(&proven.proof, &recovered), Ok(()));
}

#[test]
fn tampered_statement_reports_specific_reason() {
    let proven = PedersenProofGenerator::new()
        .generate(&intent("1"), &AtomicBool::new(false))
        .unwrap();
    let verifier = ProofVerifier::new();

    let mut payload = proven.statement.to_payload();
    payload[51] ^= 0x01;
    let redirected = DonationStatement::from_payload(&payload).unwrap();
    assert_eq!(
        verifier.verify(&proven.proof, &redirected),
        Err(VerifyError::RecipientMismatch)
    );

    let other = PedersenProofGenerator::new()
        .generate(&intent("1"), &AtomicBool::new(false))
        .unwrap();
    assert_eq!(
        verifier.verify(&proven.proof, &other.statement),
        Err(VerifyError::CommitmentMismatch)
    );
}
