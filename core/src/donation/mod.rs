pub mod binder;
pub mod confirmation;
pub mod dev_chain;
pub mod error;
pub mod history;
pub mod orchestrator;
pub mod prover;
pub mod record;
pub mod session;
pub mod signer;

pub use binder::{SubmissionPolicy, TransactionBinder};
pub use confirmation::{
    ChainStatus, ConfirmationFeed, ConfirmationPolicy, FeedError, await_final_status,
};
pub use dev_chain::{DevChain, SubmittedTx};
pub use error::{DonationError, TransactionError};
pub use history::{DonationHistory, HistoryError};
pub use orchestrator::{DonationOrchestrator, DonationPipeline, DonationState};
pub use prover::ProvingService;
pub use record::{TransactionRecord, TxStatus};
pub use session::DonorSession;
pub use signer::{Address, SignerError, SignerSession, TxReference, WalletSigner};
