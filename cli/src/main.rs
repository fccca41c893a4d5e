mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// zkFund - anonymous donations with verifiable amount proofs
#[derive(Parser, Debug)]
#[command(name = "zkfund", version)]
#[command(about = "Donate privately; let anyone verify the proof", long_about = None)]
struct Cli {
    /// Config file (default lookup: ./zkfund.toml, ~/.zkfund/config.toml)
    #[arg(long, global = true, env = "ZKF_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect the wallet and show the donor address
    Connect,

    /// Donate an amount of the configured asset to the cause
    Donate {
        /// Decimal amount, e.g. 0.5
        amount: String,

        #[command(flatten)]
        chain: commands::DevChainArgs,
    },

    /// List past donations
    History {
        /// Re-verify every stored proof
        #[arg(long)]
        verify: bool,
    },

    /// Verify a published proof against on-chain call data
    Verify {
        /// Transaction call data (hex): commitment || recipient
        #[arg(long)]
        payload: String,

        /// Proof bytes (hex)
        #[arg(long)]
        proof: String,
    },

    /// Print a sample configuration file
    InitConfig,
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Connect => commands::connect(cli.config.as_deref()).await,
        Command::Donate { amount, chain } => {
            commands::donate(cli.config.as_deref(), &amount, chain).await
        }
        Command::History { verify } => commands::history(cli.config.as_deref(), verify),
        Command::Verify { payload, proof } => commands::verify(&payload, &proof),
        Command::InitConfig => {
            print!("{}", zkfund_config::ZkFundConfig::generate_sample());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("❌ {e:#}");
        std::process::exit(1);
    }
}
