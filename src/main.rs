use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ancient_monad::Config;

mod cli;

#[derive(Parser)]
#[command(name = "monad-xp")]
#[command(about = "AncientMonad XP tracker - levels, daily claims and transaction cycles")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.ancient-monad/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show XP, level and cycle progress for a wallet
    Status {
        #[arg(short, long)]
        wallet: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,

        /// Keep running and report when the daily claim opens
        #[arg(long)]
        watch: bool,
    },

    /// Claim the daily XP reward
    Claim {
        #[arg(short, long)]
        wallet: String,
    },

    /// Record a confirmed transaction
    Tx {
        #[arg(short, long)]
        wallet: String,

        /// Send a test transfer through the configured JSON-RPC node first
        #[arg(long)]
        send: bool,
    },

    /// Get or create the wallet's referral code
    Referral {
        #[arg(short, long)]
        wallet: String,

        /// Code of the wallet that referred this one
        #[arg(long)]
        referrer: Option<String>,
    },

    /// Link a Twitter account
    Twitter {
        #[arg(short, long)]
        wallet: String,

        #[arg(long)]
        token: String,
    },

    /// Show the cycle descriptor for a transaction count
    Cycle {
        count: u64,

        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    if let Commands::Init { force } = cli.command {
        let path = cli.config.unwrap_or_else(Config::global_config_path);
        return cli::init::init_command(&path, force).await;
    }

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Init { .. } => {}
        Commands::Status {
            wallet,
            json,
            watch,
        } => {
            cli::status::status_command(&config, &wallet, json, watch).await?;
        }
        Commands::Claim { wallet } => {
            cli::claim::claim_command(&config, &wallet).await?;
        }
        Commands::Tx { wallet, send } => {
            cli::tx::tx_command(&config, &wallet, send).await?;
        }
        Commands::Referral { wallet, referrer } => {
            cli::referral::referral_command(&config, &wallet, referrer.as_deref()).await?;
        }
        Commands::Twitter { wallet, token } => {
            cli::twitter::twitter_command(&config, &wallet, &token).await?;
        }
        Commands::Cycle { count, json } => {
            cli::cycle::cycle_command(count, json).await?;
        }
    }

    Ok(())
}
