//! zkFund Privacy SDK
//!
//! Commitment and proof primitives for anonymous donations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Donation Proof                            │
//! │  ┌──────────────┐  ┌──────────────┐  ┌───────────────────────┐  │
//! │  │  Commitment  │  │  Recipient   │  │   Value Binding       │  │
//! │  │  vG + rH     │  │  (20 bytes)  │  │   (local, binder)     │  │
//! │  └──────────────┘  └──────────────┘  └───────────────────────┘  │
//! │         │                 │                     │               │
//! │         ▼                 ▼                     ▼               │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │            Sigma proofs (Merlin transcript)             │    │
//! │  │  • Knowledge of opening (v, r)                          │    │
//! │  │  • v - 1 ∈ [0, 2^64) via 64 bit OR-proofs               │    │
//! │  │  • Every challenge absorbs the statement first          │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod commitment;
pub mod error;
pub mod generators;
pub mod proof;
pub mod prover;
pub mod statement;
mod transcript;
pub mod verifier;

pub use commitment::{AmountCommitment, BlindingFactor};
pub use error::{ProofError, VerifyError};
pub use generators::{PedersenGens, pedersen_gens};
pub use proof::{DonationProof, PROOF_LEN, RANGE_BITS};
pub use prover::{PedersenProofGenerator, ProofGenerator, ProvenDonation, ValueBinding};
pub use statement::{DonationIntent, DonationStatement, PAYLOAD_LEN, Recipient, RecipientParseError};
pub use verifier::ProofVerifier;
