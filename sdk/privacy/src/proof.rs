//! Donation proof wire format
//!
//! ```text
//! ┌─────────┬────────────┬───────────┬─────────────────────┬──────────────────────────┐
//! │ version │ commitment │ recipient │ opening             │ range (× RANGE_BITS)     │
//! │   1     │    32      │    20     │ T(32) s_v(32) s_r(32)│ B(32) c0 c1 s0 s1 (4×32) │
//! └─────────┴────────────┴───────────┴─────────────────────┴──────────────────────────┘
//! ```
//!
//! Fixed length. Points and scalars must use their canonical encodings, so
//! any byte flip either fails to parse or changes a transcript input.

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use serde::{Deserialize, Serialize};

use crate::commitment::AmountCommitment;
use crate::error::VerifyError;
use crate::statement::{DonationStatement, RECIPIENT_LEN, Recipient};

pub const PROOF_VERSION: u8 = 1;
/// Bits in the positivity range proof: proves `amount - 1 ∈ [0, 2^RANGE_BITS)`.
pub const RANGE_BITS: usize = 64;

const HEADER_LEN: usize = 1 + 32 + RECIPIENT_LEN;
const OPENING_LEN: usize = 3 * 32;
const BIT_PROOF_LEN: usize = 5 * 32;
pub const PROOF_LEN: usize = HEADER_LEN + OPENING_LEN + RANGE_BITS * BIT_PROOF_LEN;

/// Opaque proof bytes, as published next to the transaction.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationProof(#[serde(with = "hex")] Vec<u8>);

impl DonationProof {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        hex::decode(s.trim().trim_start_matches("0x")).map(Self)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for DonationProof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = &self.0[..self.0.len().min(8)];
        write!(f, "DonationProof({} bytes, {}..)", self.0.len(), hex::encode(prefix))
    }
}

/// Schnorr proof of knowledge of `(v, r)` with `C = vG + rH`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OpeningProof {
    pub t: RistrettoPoint,
    pub s_value: Scalar,
    pub s_blinding: Scalar,
}

/// CDS OR-proof that `commitment` opens to 0 or 1.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BitProof {
    pub commitment: RistrettoPoint,
    pub c: [Scalar; 2],
    pub s: [Scalar; 2],
}

#[derive(Debug, Clone)]
pub(crate) struct ParsedProof {
    pub statement: DonationStatement,
    pub commitment: RistrettoPoint,
    pub opening: OpeningProof,
    pub bits: Vec<BitProof>,
}

impl ParsedProof {
    pub fn encode(&self) -> DonationProof {
        let mut out = Vec::with_capacity(PROOF_LEN);
        out.push(PROOF_VERSION);
        out.extend_from_slice(self.statement.amount_commitment.as_bytes());
        out.extend_from_slice(self.statement.recipient.as_bytes());

        out.extend_from_slice(self.opening.t.compress().as_bytes());
        out.extend_from_slice(self.opening.s_value.as_bytes());
        out.extend_from_slice(self.opening.s_blinding.as_bytes());

        for bit in &self.bits {
            out.extend_from_slice(bit.commitment.compress().as_bytes());
            for scalar in bit.c.iter().chain(bit.s.iter()) {
                out.extend_from_slice(scalar.as_bytes());
            }
        }

        DonationProof(out)
    }

    pub fn decode(proof: &DonationProof) -> Result<Self, VerifyError> {
        let bytes = proof.as_bytes();
        if bytes.len() != PROOF_LEN {
            return Err(VerifyError::Malformed("proof length"));
        }

        let mut reader = Reader { bytes, pos: 0 };
        if reader.array::<1>()?[0] != PROOF_VERSION {
            return Err(VerifyError::Malformed("unknown proof version"));
        }

        let commitment_bytes = reader.array::<32>()?;
        let commitment = CompressedRistretto(commitment_bytes)
            .decompress()
            .ok_or(VerifyError::Malformed("commitment is not a group element"))?;
        let recipient = Recipient(reader.array::<RECIPIENT_LEN>()?);

        let opening = OpeningProof {
            t: reader.point()?,
            s_value: reader.scalar()?,
            s_blinding: reader.scalar()?,
        };

        let mut bits = Vec::with_capacity(RANGE_BITS);
        for _ in 0..RANGE_BITS {
            let commitment = reader.point()?;
            let c = [reader.scalar()?, reader.scalar()?];
            let s = [reader.scalar()?, reader.scalar()?];
            bits.push(BitProof { commitment, c, s });
        }

        Ok(Self {
            statement: DonationStatement::new(AmountCommitment(commitment_bytes), recipient),
            commitment,
            opening,
            bits,
        })
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn array<const N: usize>(&mut self) -> Result<[u8; N], VerifyError> {
        let end = self.pos + N;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or(VerifyError::Malformed("truncated proof"))?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        self.pos = end;
        Ok(out)
    }

    fn point(&mut self) -> Result<RistrettoPoint, VerifyError> {
        CompressedRistretto(self.array::<32>()?)
            .decompress()
            .ok_or(VerifyError::Malformed("invalid group element"))
    }

    fn scalar(&mut self) -> Result<Scalar, VerifyError> {
        Option::from(Scalar::from_canonical_bytes(self.array::<32>()?))
            .ok_or(VerifyError::Malformed("non-canonical scalar"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_constants() {
        assert_eq!(HEADER_LEN, 53);
        assert_eq!(PROOF_LEN, 53 + 96 + 64 * 160);
    }

    #[test]
    fn rejects_wrong_length() {
        let short = DonationProof::from_bytes(vec![PROOF_VERSION; PROOF_LEN - 1]);
        assert_eq!(
            ParsedProof::decode(&short).unwrap_err(),
            VerifyError::Malformed("proof length")
        );
        assert_eq!(
            ParsedProof::decode(&DonationProof::from_bytes(Vec::new())).unwrap_err(),
            VerifyError::Malformed("proof length")
        );
    }

    #[test]
    fn rejects_unknown_version() {
        let mut bytes = vec![0u8; PROOF_LEN];
        bytes[0] = 2;
        assert_eq!(
            ParsedProof::decode(&DonationProof::from_bytes(bytes)).unwrap_err(),
            VerifyError::Malformed("unknown proof version")
        );
    }

    #[test]
    fn hex_roundtrip_accepts_prefix() {
        let proof = DonationProof::from_bytes(vec![1, 2, 3]);
        assert_eq!(DonationProof::from_hex("0x010203").unwrap(), proof);
        assert_eq!(proof.to_hex(), "010203");
        assert!(DonationProof::from_hex("zz").is_err());
    }
}
