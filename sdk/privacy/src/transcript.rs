use curve25519_dalek::ristretto::CompressedRistretto;
use curve25519_dalek::scalar::Scalar;
use merlin::Transcript;

use crate::statement::DonationStatement;

const DONATION_PROTOCOL: &[u8] = b"zkfund.donation.v1";
const VALUE_BINDING_PROTOCOL: &[u8] = b"zkfund.value-binding.v1";

pub(crate) trait TranscriptProtocol {
    fn append_statement(&mut self, statement: &DonationStatement);
    fn append_point(&mut self, label: &'static [u8], point: &CompressedRistretto);
    fn challenge_scalar(&mut self, label: &'static [u8]) -> Scalar;
}

impl TranscriptProtocol for Transcript {
    fn append_statement(&mut self, statement: &DonationStatement) {
        self.append_message(b"commitment", statement.amount_commitment.as_bytes());
        self.append_message(b"recipient", statement.recipient.as_bytes());
    }

    fn append_point(&mut self, label: &'static [u8], point: &CompressedRistretto) {
        self.append_message(label, point.as_bytes());
    }

    fn challenge_scalar(&mut self, label: &'static [u8]) -> Scalar {
        let mut buf = [0u8; 64];
        self.challenge_bytes(label, &mut buf);
        Scalar::from_bytes_mod_order_wide(&buf)
    }
}

/// Transcript shared by the opening and positivity proofs.
pub(crate) fn donation_transcript(statement: &DonationStatement) -> Transcript {
    let mut transcript = Transcript::new(DONATION_PROTOCOL);
    transcript.append_statement(statement);
    transcript
}

pub(crate) fn value_binding_transcript(statement: &DonationStatement, value: u64) -> Transcript {
    let mut transcript = Transcript::new(VALUE_BINDING_PROTOCOL);
    transcript.append_statement(statement);
    transcript.append_u64(b"value", value);
    transcript
}
