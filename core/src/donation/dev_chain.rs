//! In-memory wallet and chain for local runs and tests.
//!
//! Implements both external seams. Every accepted transfer is kept with its
//! raw call data so that auditors can recover statements exactly as a chain
//! indexer would.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};
use zkfund_amount::Amount;
use zkfund_privacy::Recipient;

use crate::donation::confirmation::{ChainStatus, ConfirmationFeed, FeedError};
use crate::donation::signer::{Address, SignerError, TxReference, WalletSigner};

/// A transfer as the chain recorded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTx {
    pub reference: TxReference,
    pub from: Address,
    pub to: Recipient,
    pub value: Amount,
    pub payload: Vec<u8>,
}

#[derive(Default)]
struct Ledger {
    nonce: u64,
    order: Vec<TxReference>,
    txs: HashMap<TxReference, (SubmittedTx, u32)>,
}

pub struct DevChain {
    address: Address,
    latency: Duration,
    confirm_after: u32,
    rejecting: AtomicBool,
    disconnected: AtomicBool,
    reverting: AtomicBool,
    transient_failures: AtomicU32,
    send_attempts: AtomicU32,
    in_flight: AtomicU32,
    max_in_flight: AtomicU32,
    ledger: Mutex<Ledger>,
}

impl Default for DevChain {
    fn default() -> Self {
        Self::new()
    }
}

impl DevChain {
    pub fn new() -> Self {
        let digest = blake3::hash(b"zkfund.dev.wallet");
        let mut address = [0u8; 20];
        address.copy_from_slice(&digest.as_bytes()[..20]);

        Self {
            address: Address(address),
            latency: Duration::ZERO,
            confirm_after: 1,
            rejecting: AtomicBool::new(false),
            disconnected: AtomicBool::new(false),
            reverting: AtomicBool::new(false),
            transient_failures: AtomicU32::new(0),
            send_attempts: AtomicU32::new(0),
            in_flight: AtomicU32::new(0),
            max_in_flight: AtomicU32::new(0),
            ledger: Mutex::new(Ledger::default()),
        }
    }

    /// Simulated round-trip time for every wallet call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Status polls a transaction stays pending before it confirms.
    pub fn with_confirmations_after(mut self, polls: u32) -> Self {
        self.confirm_after = polls;
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Decline every transfer, as a donor pressing "reject" would.
    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }

    pub fn set_disconnected(&self, disconnected: bool) {
        self.disconnected.store(disconnected, Ordering::SeqCst);
    }

    /// Report every transaction as failed on chain.
    pub fn set_reverting(&self, reverting: bool) {
        self.reverting.store(reverting, Ordering::SeqCst);
    }

    /// Fail the next `n` transfers with a network error.
    pub fn fail_next_submissions(&self, n: u32) {
        self.transient_failures.store(n, Ordering::SeqCst);
    }

    pub fn send_attempts(&self) -> u32 {
        self.send_attempts.load(Ordering::SeqCst)
    }

    /// Highest number of transfers the wallet was handling at once.
    pub fn max_concurrent_sends(&self) -> u32 {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Accepted transfers, in submission order.
    pub async fn submitted(&self) -> Vec<SubmittedTx> {
        let ledger = self.ledger.lock().await;
        ledger
            .order
            .iter()
            .filter_map(|r| ledger.txs.get(r).map(|(tx, _)| tx.clone()))
            .collect()
    }

    pub async fn transaction(&self, reference: &TxReference) -> Option<SubmittedTx> {
        self.ledger
            .lock()
            .await
            .txs
            .get(reference)
            .map(|(tx, _)| tx.clone())
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    async fn accept(&self, to: &Recipient, amount: Amount, payload: &[u8]) -> TxReference {
        let mut ledger = self.ledger.lock().await;
        ledger.nonce += 1;

        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.address.0);
        hasher.update(to.as_bytes());
        hasher.update(&amount.base_units().to_le_bytes());
        hasher.update(&ledger.nonce.to_le_bytes());
        hasher.update(payload);
        let reference = TxReference::new(format!("0x{}", hasher.finalize().to_hex()));

        let tx = SubmittedTx {
            reference: reference.clone(),
            from: self.address,
            to: *to,
            value: amount,
            payload: payload.to_vec(),
        };
        ledger.order.push(reference.clone());
        ledger.txs.insert(reference.clone(), (tx, 0));
        info!(%reference, nonce = ledger.nonce, "Dev chain accepted transfer");
        reference
    }
}

/// Counts one wallet call as in flight until dropped, including when the
/// caller abandons the call midway.
struct InFlight<'a>(&'a AtomicU32);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicU32, max: &AtomicU32) -> Self {
        let current = counter.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(current, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl WalletSigner for DevChain {
    async fn connect(&self) -> Result<Address, SignerError> {
        self.simulate_latency().await;
        if self.disconnected.load(Ordering::SeqCst) {
            return Err(SignerError::NotConnected);
        }
        Ok(self.address)
    }

    async fn send_value(
        &self,
        to: &Recipient,
        amount: Amount,
        payload: &[u8],
    ) -> Result<TxReference, SignerError> {
        self.send_attempts.fetch_add(1, Ordering::SeqCst);
        let _in_flight = InFlight::enter(&self.in_flight, &self.max_in_flight);

        self.simulate_latency().await;
        if self.disconnected.load(Ordering::SeqCst) {
            Err(SignerError::NotConnected)
        } else if self.rejecting.load(Ordering::SeqCst) {
            Err(SignerError::Rejected("donor declined in wallet".into()))
        } else if self
            .transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            Err(SignerError::Network("node unavailable".into()))
        } else {
            Ok(self.accept(to, amount, payload).await)
        }
    }
}

#[async_trait]
impl ConfirmationFeed for DevChain {
    async fn status(&self, reference: &TxReference) -> Result<ChainStatus, FeedError> {
        let mut ledger = self.ledger.lock().await;
        let Some((_, polls)) = ledger.txs.get_mut(reference) else {
            return Err(FeedError(format!("unknown transaction {reference}")));
        };
        *polls += 1;

        let status = if self.reverting.load(Ordering::SeqCst) {
            ChainStatus::Failed
        } else if *polls >= self.confirm_after {
            ChainStatus::Confirmed
        } else {
            ChainStatus::Pending
        };
        debug!(%reference, polls = *polls, ?status, "Dev chain status");
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eth(units: u64) -> Amount {
        Amount::from_base_units(units, 18).unwrap()
    }

    #[tokio::test]
    async fn test_transfers_get_distinct_references() {
        let chain = DevChain::new();
        let to = Recipient([1u8; 20]);
        let a = chain.send_value(&to, eth(1), b"same").await.unwrap();
        let b = chain.send_value(&to, eth(1), b"same").await.unwrap();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("0x"));
        assert_eq!(a.as_str().len(), 2 + 64);

        let submitted = chain.submitted().await;
        assert_eq!(submitted.len(), 2);
        assert_eq!(submitted[0].reference, a);
        assert_eq!(submitted[0].payload, b"same");
        assert_eq!(submitted[0].from, chain.address());
    }

    #[tokio::test]
    async fn test_confirms_after_configured_polls() {
        let chain = DevChain::new().with_confirmations_after(3);
        let reference = chain
            .send_value(&Recipient([1u8; 20]), eth(1), &[])
            .await
            .unwrap();

        assert_eq!(chain.status(&reference).await, Ok(ChainStatus::Pending));
        assert_eq!(chain.status(&reference).await, Ok(ChainStatus::Pending));
        assert_eq!(chain.status(&reference).await, Ok(ChainStatus::Confirmed));
        assert!(chain.status(&TxReference::new("0x00")).await.is_err());
    }

    #[tokio::test]
    async fn test_failure_knobs() {
        let chain = DevChain::new();
        let to = Recipient([1u8; 20]);

        chain.fail_next_submissions(2);
        for _ in 0..2 {
            assert!(matches!(
                chain.send_value(&to, eth(1), &[]).await,
                Err(SignerError::Network(_))
            ));
        }
        let reference = chain.send_value(&to, eth(1), &[]).await.unwrap();

        chain.set_reverting(true);
        assert_eq!(chain.status(&reference).await, Ok(ChainStatus::Failed));

        chain.set_rejecting(true);
        assert!(matches!(
            chain.send_value(&to, eth(1), &[]).await,
            Err(SignerError::Rejected(_))
        ));

        chain.set_disconnected(true);
        assert_eq!(chain.connect().await, Err(SignerError::NotConnected));
        assert_eq!(chain.send_attempts(), 5);
        assert_eq!(chain.submitted().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_send_leaves_no_call_in_flight() {
        let chain = DevChain::new().with_latency(Duration::from_millis(200));
        let to = Recipient([1u8; 20]);

        let abandoned =
            tokio::time::timeout(Duration::from_millis(50), chain.send_value(&to, eth(1), &[]))
                .await;
        assert!(abandoned.is_err());

        chain.send_value(&to, eth(1), &[]).await.unwrap();
        assert_eq!(chain.send_attempts(), 2);
        assert_eq!(chain.max_concurrent_sends(), 1);
        assert_eq!(chain.submitted().await.len(), 1);
    }
}
