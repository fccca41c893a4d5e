//! zkFund Core
//!
//! Runs a donation end to end: validate the raw amount, prove it, bind the
//! proof to a wallet transfer, then watch the chain for the outcome.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                          DonationOrchestrator                            │
//! │                                                                          │
//! │  ┌──────────┐   ┌────────────┐   ┌─────────┐   ┌─────────┐   ┌─────────┐ │
//! │  │   Idle   │──▶│ Validating │──▶│ Proving │──▶│ Binding │──▶│Submitted│ │
//! │  └──────────┘   └────────────┘   └─────────┘   └─────────┘   └─────────┘ │
//! │                       │               │             │          │     │   │
//! │                       ▼               ▼             ▼          ▼     ▼   │
//! │                 ┌──────────────────────────────────────┐  ┌───────────┐  │
//! │                 │                Failed                │  │ Confirmed │  │
//! │                 └──────────────────────────────────────┘  └───────────┘  │
//! └──────────────────────────────────────────────────────────────────────────┘
//!            │                     │                    │
//!            ▼                     ▼                    ▼
//!     AmountValidator      ProofGenerator        WalletSigner / ConfirmationFeed
//!     (zkfund-amount)      (zkfund-privacy)      (external, see `donation::signer`)
//! ```

pub mod config;
pub mod donation;

pub use config::{ConfigError, PipelineSettings};
pub use donation::*;
