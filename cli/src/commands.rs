//! Command implementations.

use anyhow::{anyhow, bail, Context};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use stakegov_governance::{
    matches_filter, GovernanceClient, GovernanceConfig, GovernanceError, GovernanceLedger,
    HttpTransport, ProposalCache, StakeWallet, Tick, VotingService,
};
use stakegov_store_lmdb::LmdbEnvironment;
use stakegov_types::{
    Amount, Clock, Decision, GovernanceEntry, Proposal, SystemClock, Timestamp, VoteId, WalletTx,
};
use stakegov_wallet_core::{KdfParams, KeyKind, NodeClient, Wallet};

#[derive(Clone, Copy)]
pub struct Output {
    pub json: bool,
}

impl Output {
    fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce()) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            human();
        }
        Ok(())
    }
}

fn open_ledger(config: &GovernanceConfig) -> anyhow::Result<GovernanceLedger> {
    let dir = config.ledger_dir();
    let env = LmdbEnvironment::open_default(&dir)
        .with_context(|| format!("opening governance ledger at {}", dir.display()))?;
    Ok(GovernanceLedger::new(Arc::new(env.governance_store())))
}

fn open_client(config: &GovernanceConfig) -> anyhow::Result<GovernanceClient> {
    let transport = HttpTransport::new(&config.service_url, config.request_timeout())?;
    Ok(GovernanceClient::new(Arc::new(transport)))
}

fn open_wallet(config: &GovernanceConfig) -> anyhow::Result<Wallet> {
    Wallet::open(&config.wallet_file, config.network)
        .with_context(|| format!("opening wallet {}", config.wallet_file.display()))
}

/// Update the wallet's sync gate from the configured node.
async fn check_sync(config: &GovernanceConfig, wallet: &Wallet) {
    match &config.node_url {
        Some(url) => match NodeClient::new(url.clone()) {
            Ok(node) => {
                if let Ok(false) = wallet.refresh_sync(&node).await {
                    warn!(node = %url, "node is still syncing");
                }
            }
            Err(e) => warn!(error = %e, "cannot create node client"),
        },
        None => {
            warn!("no node_url configured; assuming the wallet's history is current");
            wallet.set_synced(true);
        }
    }
}

fn build_service(
    config: &GovernanceConfig,
    wallet: Arc<Wallet>,
) -> anyhow::Result<VotingService> {
    Ok(VotingService::new(
        wallet,
        open_client(config)?,
        open_ledger(config)?,
        Arc::new(SystemClock),
        config,
    ))
}

/// Cancel `token` on Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            child.cancel();
        }
    });
    token
}

fn print_proposal(p: &Proposal, now: Timestamp) {
    let status = if p.is_expired(now) {
        "ended".to_string()
    } else {
        format!(
            "ends in {}",
            stakegov_utils::format_duration(p.end_time.as_secs().saturating_sub(now.as_secs()))
        )
    };
    println!(
        "{:<24} {:<32} {:>14} coins  for {:>6}  against {:>6}  {}",
        p.vote_id,
        p.name,
        p.amount.to_coin_string(),
        p.votes_affirm,
        p.votes_oppose,
        status
    );
}

pub async fn proposals(
    config: &GovernanceConfig,
    out: Output,
    filter: Option<&str>,
    all: bool,
) -> anyhow::Result<()> {
    let client = open_client(config)?;
    let cancel = cancel_on_ctrl_c();
    let now = SystemClock.now();
    let list: Vec<Proposal> = client
        .fetch_proposals(config.request_timeout(), &cancel)
        .await?
        .into_iter()
        .filter(|p| all || !p.is_expired(now))
        .filter(|p| matches_filter(p, filter.unwrap_or("")))
        .collect();

    out.emit(&list, || {
        if list.is_empty() {
            println!("no proposals");
        }
        for p in &list {
            print_proposal(p, now);
        }
    })
}

pub async fn browse(config: &GovernanceConfig, filter: Option<&str>) -> anyhow::Result<()> {
    let client = open_client(config)?;
    let cancel = cancel_on_ctrl_c();
    let clock = SystemClock;
    let mut cache = ProposalCache::new(config.refresh_interval_secs, config.filter_cooldown_secs);
    if let Some(text) = filter {
        cache.on_filter_changed(text, clock.now());
        cache.force_refresh();
    }

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let mut last_label = String::new();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            line = stdin.next_line(), if stdin_open => match line? {
                Some(text) if text.trim().is_empty() => cache.force_refresh(),
                Some(text) => cache.on_filter_changed(&text, clock.now()),
                None => stdin_open = false,
            },
            _ = ticker.tick() => {
                let now = clock.now();
                match cache
                    .refresh_if_due(&client, now, config.request_timeout(), &cancel)
                    .await
                {
                    Tick::Refreshed { .. } => {
                        println!("--- {} (filter: {:?})", now, cache.filter());
                        for p in cache.matching() {
                            print_proposal(p, now);
                        }
                    }
                    Tick::Failed(GovernanceError::Cancelled) => break,
                    Tick::Failed(e) => eprintln!("refresh failed: {e}"),
                    Tick::NotDue { .. } => {}
                }
                let label = cache.countdown_label(clock.now());
                if label != last_label {
                    eprintln!("[{label}]");
                    last_label = label;
                }
            }
        }
    }
    Ok(())
}

pub async fn vote(
    config: &GovernanceConfig,
    out: Output,
    vote_id: &str,
    decision: &str,
    password: Option<&str>,
) -> anyhow::Result<()> {
    let vote_id = VoteId::new(vote_id)?;
    let decision: Decision = decision.parse()?;
    let password = password
        .ok_or_else(|| anyhow!("wallet password required (--password or STAKEGOV_WALLET_PASSWORD)"))?;

    let wallet = open_wallet(config)?;
    check_sync(config, &wallet).await;
    if !wallet.is_synced() {
        bail!(GovernanceError::NotSynced);
    }
    wallet.unlock(password)?;
    let wallet = Arc::new(wallet);
    let service = build_service(config, wallet.clone())?;

    if let Some(entry) = service.recorded_vote(&vote_id)? {
        bail!(GovernanceError::AlreadyVoted {
            vote_id: entry.vote_id,
            weight: entry.weight,
        });
    }

    let cancel = cancel_on_ctrl_c();
    let proposal = service
        .list_proposals(&cancel)
        .await?
        .into_iter()
        .find(|p| p.vote_id == vote_id || p.id == vote_id.as_str())
        .ok_or_else(|| anyhow!("proposal {vote_id} not found"))?;
    if proposal.is_expired(SystemClock.now()) {
        bail!("voting on {} has ended", proposal.vote_id);
    }

    let result = service.cast_vote(&proposal, decision, &cancel).await;
    wallet.lock();
    let receipt = result?;
    info!(vote_id = %receipt.vote_id, weight = %receipt.weight, "vote recorded");

    out.emit(&receipt, || {
        let choice = match receipt.decision {
            Decision::For => "for",
            Decision::Against => "against",
        };
        println!(
            "voted {choice} on {}: {} coins counted from {} of {} addresses",
            receipt.vote_id,
            receipt.weight.to_coin_string(),
            receipt.counted.len(),
            receipt.ballots_submitted
        );
        for address in &receipt.uncounted {
            println!("  not counted: {address}");
        }
    })
}

pub fn has_voted(config: &GovernanceConfig, out: Output, vote_id: &str) -> anyhow::Result<()> {
    let vote_id = VoteId::new(vote_id)?;
    let entry = open_ledger(config)?.get(&vote_id)?;
    out.emit(&entry, || match &entry {
        Some(e) => println!(
            "voted on {} with {} coins at {}",
            e.vote_id,
            e.weight.to_coin_string(),
            e.recorded_at
        ),
        None => println!("no vote recorded for {vote_id}"),
    })
}

pub fn ledger(config: &GovernanceConfig, out: Output) -> anyhow::Result<()> {
    let entries: Vec<GovernanceEntry> = open_ledger(config)?.list()?;
    out.emit(&entries, || {
        if entries.is_empty() {
            println!("no votes recorded");
        }
        for e in &entries {
            println!(
                "{:<24} {:>14} coins  {}",
                e.vote_id,
                e.weight.to_coin_string(),
                e.recorded_at
            );
        }
    })
}

pub fn erase_votes(config: &GovernanceConfig, out: Output, yes: bool) -> anyhow::Result<()> {
    if !yes {
        bail!("refusing to erase the vote ledger without --yes");
    }
    let erased = open_ledger(config)?.erase_all()?;
    warn!(erased, "erased local vote ledger");
    out.emit(&serde_json::json!({ "erased": erased }), || {
        println!("erased {erased} recorded votes")
    })
}

#[derive(Serialize)]
struct WeightReport {
    start: Timestamp,
    end: Timestamp,
    weight: Amount,
    coins: String,
}

pub fn vote_weight(
    config: &GovernanceConfig,
    out: Output,
    start: Option<u64>,
    end: Option<u64>,
) -> anyhow::Result<()> {
    let wallet = open_wallet(config)?;
    let end = end.map(Timestamp::new).unwrap_or_else(|| SystemClock.now());
    let start = start
        .map(Timestamp::new)
        .unwrap_or_else(|| end.saturating_sub_secs(config.eligibility_window_secs()));
    if start > end {
        bail!("range start {start} is after end {end}");
    }

    let weight = stakegov_governance::eligibility::estimate_weight(&wallet, start, end);
    let report = WeightReport {
        start,
        end,
        weight,
        coins: weight.to_coin_string(),
    };
    out.emit(&report, || {
        println!(
            "estimated vote weight: {} coins ({} raw) between {} and {}",
            report.coins, report.weight, report.start, report.end
        )
    })
}

pub fn wallet_init(config: &GovernanceConfig, password: &str) -> anyhow::Result<()> {
    let path = &config.wallet_file;
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Wallet::create(config.network, password, KdfParams::default())?.save(path)?;
    println!("created {} wallet at {}", config.network.as_str(), path.display());
    Ok(())
}

pub fn wallet_new_address(
    config: &GovernanceConfig,
    password: &str,
    legacy: bool,
    label: &str,
) -> anyhow::Result<()> {
    let mut wallet = open_wallet(config)?;
    let kind = if legacy { KeyKind::Legacy } else { KeyKind::Witness };
    let address = wallet.generate_key(password, kind, label)?;
    wallet.save(&config.wallet_file)?;
    println!("{address}");
    Ok(())
}

pub fn wallet_addresses(config: &GovernanceConfig, out: Output) -> anyhow::Result<()> {
    let wallet = open_wallet(config)?;
    let addresses = wallet.addresses()?;
    out.emit(&addresses, || {
        for address in &addresses {
            println!("{address}");
        }
    })
}

pub fn wallet_import_txs(config: &GovernanceConfig, file: &Path) -> anyhow::Result<()> {
    let mut wallet = open_wallet(config)?;
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let txs: Vec<WalletTx> = serde_json::from_str(&json).context("parsing transactions")?;
    let count = txs.len();
    for tx in txs {
        wallet.record_transaction(tx);
    }
    wallet.save(&config.wallet_file)?;
    println!(
        "recorded {count} transactions ({} tracked)",
        wallet.transactions().len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_commands_use_configured_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = GovernanceConfig {
            data_dir: dir.path().to_path_buf(),
            ..GovernanceConfig::default()
        };
        let out = Output { json: true };

        ledger(&config, out).unwrap();
        has_voted(&config, out, "prop-1").unwrap();
        assert!(erase_votes(&config, out, false).is_err());
        erase_votes(&config, out, true).unwrap();
        assert!(config.ledger_dir().exists());
    }

    #[test]
    fn wallet_lifecycle_through_commands() {
        let dir = tempfile::tempdir().unwrap();
        let config = GovernanceConfig {
            data_dir: dir.path().to_path_buf(),
            wallet_file: dir.path().join("wallets").join("wallet.json"),
            ..GovernanceConfig::default()
        };
        // Keep the test fast: create with cheap KDF parameters directly.
        std::fs::create_dir_all(dir.path().join("wallets")).unwrap();
        Wallet::create(config.network, "pw", KdfParams::insecure_fast())
            .unwrap()
            .save(&config.wallet_file)
            .unwrap();
        assert!(wallet_init(&config, "pw").is_err());

        wallet_new_address(&config, "pw", false, "first").unwrap();
        wallet_new_address(&config, "pw", true, "second").unwrap();
        assert_eq!(open_wallet(&config).unwrap().addresses().unwrap().len(), 2);

        let txs = dir.path().join("txs.json");
        std::fs::write(&txs, "[]").unwrap();
        wallet_import_txs(&config, &txs).unwrap();
        vote_weight(&config, Output { json: false }, Some(0), Some(10)).unwrap();
        assert!(vote_weight(&config, Output { json: false }, Some(10), Some(0)).is_err());
    }

    #[tokio::test]
    async fn vote_checks_sync_before_contacting_the_service() {
        let dir = tempfile::tempdir().unwrap();
        let config = GovernanceConfig {
            data_dir: dir.path().to_path_buf(),
            wallet_file: dir.path().join("wallet.json"),
            node_url: Some("http://127.0.0.1:1/".into()),
            service_url: "http://127.0.0.1:1/api".into(),
            ..GovernanceConfig::default()
        };
        Wallet::create(config.network, "pw", KdfParams::insecure_fast())
            .unwrap()
            .save(&config.wallet_file)
            .unwrap();

        let err = vote(&config, Output { json: true }, "prop-1", "yes", Some("pw"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GovernanceError>(),
            Some(GovernanceError::NotSynced)
        ));
    }
}
