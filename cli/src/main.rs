//! stakegov: off-chain governance voting for staking wallets.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use stakegov_governance::GovernanceConfig;
use stakegov_types::NetworkId;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "stakegov", version, about = "Vote on funding proposals with your staking weight")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, env = "STAKEGOV_CONFIG")]
    config: Option<PathBuf>,

    /// Network: "main", "test" or "regtest".
    #[arg(long, env = "STAKEGOV_NETWORK")]
    network: Option<NetworkId>,

    /// Base URL of the coordination service.
    #[arg(long, env = "STAKEGOV_SERVICE_URL")]
    service_url: Option<String>,

    /// Directory holding the governance ledger.
    #[arg(long, env = "STAKEGOV_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Wallet file.
    #[arg(long, env = "STAKEGOV_WALLET")]
    wallet: Option<PathBuf>,

    /// JSON-RPC URL of a full node used for the sync check.
    #[arg(long, env = "STAKEGOV_NODE_URL")]
    node_url: Option<String>,

    /// Seconds to wait for each coordination service exchange.
    #[arg(long, env = "STAKEGOV_TIMEOUT")]
    timeout: Option<u64>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "STAKEGOV_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "STAKEGOV_LOG_FORMAT")]
    log_format: Option<String>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List proposals published by the coordination service.
    Proposals {
        /// Only show proposals whose name or id contains this text.
        #[arg(long)]
        filter: Option<String>,

        /// Include proposals whose voting period has ended.
        #[arg(long)]
        all: bool,
    },

    /// Keep the proposal list fresh. Type on stdin to change the filter;
    /// an empty line forces a refresh.
    Browse {
        #[arg(long)]
        filter: Option<String>,
    },

    /// Vote on a proposal with every eligible staking address.
    Vote {
        vote_id: String,

        /// "for"/"yes"/"1" or "against"/"no"/"0".
        decision: String,

        /// Wallet password used to unlock the signing keys.
        #[arg(long, env = "STAKEGOV_WALLET_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Show whether this wallet has a recorded vote for a proposal.
    HasVoted { vote_id: String },

    /// List every locally recorded vote.
    Ledger,

    /// Forget every locally recorded vote.
    EraseVotes {
        /// Confirm the erase.
        #[arg(long)]
        yes: bool,
    },

    /// Estimate the voting weight staked in a time range.
    VoteWeight {
        /// Range start, unix seconds (default: now minus the eligibility window).
        #[arg(long)]
        start: Option<u64>,

        /// Range end, unix seconds (default: now).
        #[arg(long)]
        end: Option<u64>,
    },

    /// Manage the wallet file.
    Wallet {
        #[command(subcommand)]
        action: WalletAction,
    },
}

#[derive(Subcommand, Debug)]
enum WalletAction {
    /// Create a new, empty wallet file.
    Init {
        #[arg(long, env = "STAKEGOV_WALLET_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Generate a key and print its address.
    NewAddress {
        #[arg(long, env = "STAKEGOV_WALLET_PASSWORD", hide_env_values = true)]
        password: String,

        /// Hand the key out as a legacy pubkey-hash address.
        #[arg(long)]
        legacy: bool,

        #[arg(long, default_value = "")]
        label: String,
    },

    /// List the addresses of held keys.
    Addresses,

    /// Record wallet transactions from a JSON file (an array of transactions).
    ImportTxs { file: PathBuf },
}

/// Merge the optional config file with CLI overrides.
fn resolve_config(cli: &Cli) -> anyhow::Result<GovernanceConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let path_str = path.to_string_lossy();
            GovernanceConfig::from_toml_file(&path_str)
                .with_context(|| format!("loading config from {}", path.display()))?
        }
        None => GovernanceConfig::default(),
    };

    if let Some(network) = cli.network {
        config.network = network;
    }
    if let Some(url) = &cli.service_url {
        config.service_url = url.clone();
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(wallet) = &cli.wallet {
        config.wallet_file = wallet.clone();
    }
    if let Some(url) = &cli.node_url {
        config.node_url = Some(url.clone());
    }
    if let Some(secs) = cli.timeout {
        config.request_timeout_secs = secs;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    stakegov_utils::init_tracing(
        &config.log_level,
        stakegov_utils::LogFormat::from_config(&config.log_format),
    );
    tracing::debug!(
        network = config.network.as_str(),
        service = %config.service_url,
        data_dir = %config.data_dir.display(),
        "configuration resolved"
    );

    let out = commands::Output { json: cli.json };

    match cli.command {
        Command::Proposals { filter, all } => {
            commands::proposals(&config, out, filter.as_deref(), all).await
        }
        Command::Browse { filter } => commands::browse(&config, filter.as_deref()).await,
        Command::Vote {
            vote_id,
            decision,
            password,
        } => commands::vote(&config, out, &vote_id, &decision, password.as_deref()).await,
        Command::HasVoted { vote_id } => commands::has_voted(&config, out, &vote_id),
        Command::Ledger => commands::ledger(&config, out),
        Command::EraseVotes { yes } => commands::erase_votes(&config, out, yes),
        Command::VoteWeight { start, end } => commands::vote_weight(&config, out, start, end),
        Command::Wallet { action } => match action {
            WalletAction::Init { password } => commands::wallet_init(&config, &password),
            WalletAction::NewAddress {
                password,
                legacy,
                label,
            } => commands::wallet_new_address(&config, &password, legacy, &label),
            WalletAction::Addresses => commands::wallet_addresses(&config, out),
            WalletAction::ImportTxs { file } => commands::wallet_import_txs(&config, &file),
        },
    }
}
