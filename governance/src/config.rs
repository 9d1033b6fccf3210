//! Voting client configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use stakegov_types::NetworkId;

use crate::GovernanceError;

const SECS_PER_DAY: u64 = 86_400;

/// Configuration for the governance voting client.
///
/// Can be loaded from a TOML file via [`GovernanceConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Base URL of the coordination service.
    #[serde(default = "default_service_url")]
    pub service_url: String,

    #[serde(default = "default_network")]
    pub network: NetworkId,

    /// Directory holding the governance ledger.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Wallet file with keys and transaction history.
    #[serde(default = "default_wallet_file")]
    pub wallet_file: PathBuf,

    /// JSON-RPC endpoint of a full node, used to check sync state.
    #[serde(default)]
    pub node_url: Option<String>,

    /// Upper bound on each wait for the coordination service.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// How far back staking transactions count towards eligibility.
    #[serde(default = "default_eligibility_window_days")]
    pub eligibility_window_days: u64,

    /// Minimum time between automatic proposal refreshes.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Quiet period after a filter change before refreshing.
    #[serde(default = "default_filter_cooldown_secs")]
    pub filter_cooldown_secs: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_service_url() -> String {
    "https://governance.stakegov.org/api".to_string()
}

fn default_network() -> NetworkId {
    NetworkId::Main
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./stakegov_data")
}

fn default_wallet_file() -> PathBuf {
    PathBuf::from("./stakegov_data/wallet.json")
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// 30 days of eligibility, 15 days of voting, 1 day of slack.
fn default_eligibility_window_days() -> u64 {
    46
}

fn default_refresh_interval_secs() -> u64 {
    60
}

fn default_filter_cooldown_secs() -> u64 {
    3
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl GovernanceConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, GovernanceError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| GovernanceError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, GovernanceError> {
        let config: Self = toml::from_str(s).map_err(|e| GovernanceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, GovernanceError> {
        toml::to_string_pretty(self).map_err(|e| GovernanceError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), GovernanceError> {
        if self.service_url.trim().is_empty() {
            return Err(GovernanceError::Config("service_url must not be empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(GovernanceError::Config(
                "request_timeout_secs must be positive".into(),
            ));
        }
        if self.eligibility_window_days == 0 {
            return Err(GovernanceError::Config(
                "eligibility_window_days must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn eligibility_window_secs(&self) -> u64 {
        self.eligibility_window_days.saturating_mul(SECS_PER_DAY)
    }

    pub fn ledger_dir(&self) -> PathBuf {
        self.data_dir.join("governance")
    }
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            network: default_network(),
            data_dir: default_data_dir(),
            wallet_file: default_wallet_file(),
            node_url: None,
            request_timeout_secs: default_request_timeout_secs(),
            eligibility_window_days: default_eligibility_window_days(),
            refresh_interval_secs: default_refresh_interval_secs(),
            filter_cooldown_secs: default_filter_cooldown_secs(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
