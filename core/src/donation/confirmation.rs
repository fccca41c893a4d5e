//! Chain confirmation feed

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::donation::signer::TxReference;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainStatus {
    Pending,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("confirmation feed unavailable: {0}")]
pub struct FeedError(pub String);

#[async_trait]
pub trait ConfirmationFeed: Send + Sync {
    async fn status(&self, reference: &TxReference) -> Result<ChainStatus, FeedError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Poll `feed` until the transaction leaves `Pending`.
///
/// Feed errors are treated as transient. Returns `None` if no final status
/// arrived within the policy timeout.
pub async fn await_final_status(
    feed: &dyn ConfirmationFeed,
    reference: &TxReference,
    policy: ConfirmationPolicy,
) -> Option<ChainStatus> {
    let poll = async {
        loop {
            match feed.status(reference).await {
                Ok(ChainStatus::Pending) => {
                    debug!(%reference, "Transaction pending");
                }
                Ok(status) => return status,
                Err(e) => {
                    warn!(%reference, error = %e, "Confirmation poll failed");
                }
            }
            sleep(policy.poll_interval).await;
        }
    };

    timeout(policy.timeout, poll).await.ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Errors once, stays pending for `pending` polls, then reports `outcome`.
    struct ScriptedFeed {
        polls: AtomicU32,
        pending: u32,
        outcome: ChainStatus,
    }

    #[async_trait]
    impl ConfirmationFeed for ScriptedFeed {
        async fn status(&self, _reference: &TxReference) -> Result<ChainStatus, FeedError> {
            let n = self.polls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                return Err(FeedError("node warming up".into()));
            }
            if n <= self.pending {
                Ok(ChainStatus::Pending)
            } else {
                Ok(self.outcome)
            }
        }
    }

    fn policy(timeout_ms: u64) -> ConfirmationPolicy {
        ConfirmationPolicy {
            poll_interval: Duration::from_millis(100),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_through_errors_until_final() {
        let feed = ScriptedFeed {
            polls: AtomicU32::new(0),
            pending: 3,
            outcome: ChainStatus::Confirmed,
        };
        let status = await_final_status(&feed, &TxReference::new("0x01"), policy(10_000)).await;
        assert_eq!(status, Some(ChainStatus::Confirmed));
        assert_eq!(feed.polls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reports_chain_failure() {
        let feed = ScriptedFeed {
            polls: AtomicU32::new(0),
            pending: 0,
            outcome: ChainStatus::Failed,
        };
        let status = await_final_status(&feed, &TxReference::new("0x02"), policy(10_000)).await;
        assert_eq!(status, Some(ChainStatus::Failed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_while_pending() {
        let feed = ScriptedFeed {
            polls: AtomicU32::new(0),
            pending: u32::MAX,
            outcome: ChainStatus::Confirmed,
        };
        let status = await_final_status(&feed, &TxReference::new("0x03"), policy(1_000)).await;
        assert_eq!(status, None);
    }
}
