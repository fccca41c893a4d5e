use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use tokio_util::sync::CancellationToken;
use zkfund_config::ZkFundConfig;
use zkfund_core::{DevChain, DonationHistory, DonorSession, TransactionRecord, TxStatus};
use zkfund_privacy::{DonationProof, DonationStatement, ProofVerifier};

/// Knobs for the in-memory dev chain the CLI donates against.
#[derive(Args, Debug, Clone)]
pub struct DevChainArgs {
    /// Decline the transfer in the wallet
    #[arg(long)]
    reject: bool,

    /// Fail this many submissions with a network error first
    #[arg(long, default_value_t = 0)]
    fail_submissions: u32,

    /// Status polls before the transaction confirms
    #[arg(long, default_value_t = 1)]
    confirm_after: u32,

    /// Simulated wallet round-trip time
    #[arg(long, default_value_t = 0)]
    latency_ms: u64,
}

impl Default for DevChainArgs {
    fn default() -> Self {
        Self {
            reject: false,
            fail_submissions: 0,
            confirm_after: 1,
            latency_ms: 0,
        }
    }
}

impl DevChainArgs {
    fn build(&self) -> Arc<DevChain> {
        let chain = DevChain::new()
            .with_confirmations_after(self.confirm_after)
            .with_latency(Duration::from_millis(self.latency_ms));
        chain.set_rejecting(self.reject);
        chain.fail_next_submissions(self.fail_submissions);
        Arc::new(chain)
    }
}

fn load_config(path: Option<&Path>) -> Result<ZkFundConfig> {
    match path {
        Some(path) => ZkFundConfig::load_from(path),
        None => ZkFundConfig::load(),
    }
}

fn open_session(config: &ZkFundConfig, chain: Arc<DevChain>) -> Result<DonorSession> {
    DonorSession::from_config(config, chain.clone(), chain).context("failed to set up donor session")
}

pub async fn connect(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let session = open_session(&config, DevChainArgs::default().build())?;

    let address = session
        .connect()
        .await
        .map_err(|e| anyhow!("could not connect wallet: {e}"))?;
    println!("🔗 Wallet connected: {address}");
    println!("   Donations go to {}", config.donation.recipient);
    Ok(())
}

pub async fn donate(config_path: Option<&Path>, amount: &str, chain: DevChainArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let session = open_session(&config, chain.build())?;
    session
        .connect()
        .await
        .map_err(|e| anyhow!("could not connect wallet: {e}"))?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    println!("🔐 Generating donation proof...");
    let (orchestrator, outcome) = session.donate(amount, &cancel).await;
    log::debug!("Donation trace: {:?}", orchestrator.trace());

    match outcome {
        Ok(record) => {
            println!("✅ Donation of {amount} {} confirmed", config.asset.symbol);
            print_record(&record);
            Ok(())
        }
        Err(e) => {
            log::debug!("Donation failed: {e}");
            if let Some(record) = orchestrator.record() {
                print_record(record);
            }
            if orchestrator.retry().is_some() {
                bail!("{} (you can retry the same amount)", e.user_message());
            }
            bail!("{}", e.user_message())
        }
    }
}

pub fn history(config_path: Option<&Path>, verify: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let Some(path) = config.history_path() else {
        bail!("no history path configured and no home directory found");
    };
    let history = DonationHistory::open(&path)
        .with_context(|| format!("failed to open history at {}", path.display()))?;

    if history.is_empty() {
        println!("No donations yet.");
        return Ok(());
    }

    println!("📜 {} donation(s) in {}", history.len(), path.display());
    for record in history.records() {
        let status = match record.status {
            TxStatus::Pending => "pending",
            TxStatus::Confirmed => "confirmed",
            TxStatus::Failed => "failed",
        };
        let check = match (verify, record.verify()) {
            (false, _) => String::new(),
            (true, Ok(())) => "  proof ✓".to_string(),
            (true, Err(reason)) => format!("  proof ✗ ({reason})"),
        };
        println!(
            "  {:<9} {}  commitment {}{}",
            status,
            record.reference,
            record.statement.amount_commitment.to_hex(),
            check
        );
    }
    Ok(())
}

pub fn verify(payload_hex: &str, proof_hex: &str) -> Result<()> {
    let payload = hex::decode(payload_hex.trim().trim_start_matches("0x"))
        .context("payload is not valid hex")?;
    let statement = DonationStatement::from_payload(&payload)
        .map_err(|e| anyhow!("payload is not a donation statement: {e}"))?;
    let proof = DonationProof::from_hex(proof_hex).context("proof is not valid hex")?;

    match ProofVerifier::new().verify(&proof, &statement) {
        Ok(()) => {
            println!("✅ Proof is valid");
            println!("   recipient  {}", statement.recipient);
            println!("   commitment {}", statement.amount_commitment.to_hex());
            Ok(())
        }
        Err(reason) => bail!("proof is invalid: {reason}"),
    }
}

fn print_record(record: &TransactionRecord) {
    println!("   reference  {}", record.reference);
    println!("   payload    0x{}", hex::encode(record.statement.to_payload()));
    println!("   proof      0x{}", record.proof.to_hex());
}
