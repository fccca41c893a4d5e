//! Wallet signer seam
//!
//! The core never signs anything itself. A [`WalletSigner`] owns the donor's
//! keys and broadcasts transfers; [`SignerSession`] is the single owner of one
//! signer and serializes every call made through it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use zkfund_amount::Amount;
use zkfund_privacy::Recipient;

/// The donor's wallet address. Never embedded in the payload.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(#[serde(with = "hex")] pub [u8; 20]);

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

/// Chain-assigned transaction identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxReference(String);

impl TxReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    #[error("wallet is not connected")]
    NotConnected,
    #[error("wallet rejected the request: {0}")]
    Rejected(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("no response within {} ms", .0.as_millis())]
    TimedOut(Duration),
}

#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Open (or resume) a wallet session.
    async fn connect(&self) -> Result<Address, SignerError>;

    /// Sign and broadcast a transfer of `amount` to `to` carrying `payload`
    /// as call data.
    async fn send_value(
        &self,
        to: &Recipient,
        amount: Amount,
        payload: &[u8],
    ) -> Result<TxReference, SignerError>;
}

/// One wallet session shared by every donation of a donor.
///
/// The inner lock is held across each signer call, so concurrent donations
/// reach the wallet strictly one at a time.
pub struct SignerSession {
    signer: Arc<dyn WalletSigner>,
    address: Mutex<Option<Address>>,
}

impl SignerSession {
    pub fn new(signer: Arc<dyn WalletSigner>) -> Self {
        Self {
            signer,
            address: Mutex::new(None),
        }
    }

    pub async fn connect(&self) -> Result<Address, SignerError> {
        let mut address = self.address.lock().await;
        let connected = self.signer.connect().await?;
        info!(address = %connected, "Wallet connected");
        *address = Some(connected);
        Ok(connected)
    }

    pub async fn address(&self) -> Option<Address> {
        *self.address.lock().await
    }

    pub async fn is_connected(&self) -> bool {
        self.address().await.is_some()
    }

    /// Forward a transfer to the wallet. Fails fast with `NotConnected` when
    /// no session is active; a wallet that reports itself disconnected ends
    /// the session.
    ///
    /// `timeout` bounds the wallet call alone. Time spent queued behind
    /// another donation's call does not count against it.
    pub async fn send_value(
        &self,
        to: &Recipient,
        amount: Amount,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<TxReference, SignerError> {
        let mut address = self.address.lock().await;
        if address.is_none() {
            return Err(SignerError::NotConnected);
        }

        debug!(recipient = %to, payload_len = payload.len(), "Sending transfer to wallet");
        let result = tokio::time::timeout(timeout, self.signer.send_value(to, amount, payload))
            .await
            .unwrap_or(Err(SignerError::TimedOut(timeout)));
        if matches!(result, Err(SignerError::NotConnected)) {
            warn!("Wallet reported the session as disconnected");
            *address = None;
        }
        result
    }
}
