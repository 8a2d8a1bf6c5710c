//! Configuration sections

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_API_URL;
use crate::retry::RetryPolicy;
use crate::tracker::DEFAULT_TWITTER_ATTEMPTS;
use crate::wallet::{DEFAULT_MAX_AMOUNT_WEI, DEFAULT_MIN_AMOUNT_WEI, MONAD_TESTNET_CHAIN_ID};

/// XP service connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_read_timeout_secs() -> u64 {
    30
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
        }
    }
}

impl ApiSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

/// Backoff for XP service calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Retry `n` waits `base_delay_ms * n`
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.base_delay_ms))
    }
}

/// Local ledger storage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSettings {
    /// Defaults to `ledger.db` in the config directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Chain used for test transfers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSettings {
    #[serde(default = "default_chain_id")]
    pub chain_id: String,

    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Sending account; the node's first account when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,

    #[serde(default = "default_recipients")]
    pub recipients: Vec<String>,

    /// Decimal wei, kept as a string since TOML integers are 64-bit signed
    #[serde(default = "default_min_amount_wei")]
    pub min_amount_wei: String,

    #[serde(default = "default_max_amount_wei")]
    pub max_amount_wei: String,
}

fn default_chain_id() -> String {
    MONAD_TESTNET_CHAIN_ID.to_string()
}

fn default_rpc_url() -> String {
    "https://testnet-rpc.monad.xyz".to_string()
}

fn default_recipients() -> Vec<String> {
    [
        "0xc7d2a5f7ebfccbc5f08d33f3e5475fa9f1a85fa8",
        "0xe5351328caa8fe63d81957d005ec31776cc0a765",
        "0x44f61141cd96f2adab4be5c9ee791b9a126f0b56",
        "0x49b827f34804e447378c19af8a03d53c5eeb1d5a",
        "0x72cf7257d0c7402c7d37f26414e76348b54be898",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_min_amount_wei() -> String {
    DEFAULT_MIN_AMOUNT_WEI.to_string()
}

fn default_max_amount_wei() -> String {
    DEFAULT_MAX_AMOUNT_WEI.to_string()
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            rpc_url: default_rpc_url(),
            account: None,
            recipients: default_recipients(),
            min_amount_wei: default_min_amount_wei(),
            max_amount_wei: default_max_amount_wei(),
        }
    }
}

impl ChainSettings {
    /// `(min, max)` transfer amount in wei
    pub fn amount_range(&self) -> Result<(u128, u128)> {
        let min: u128 = self
            .min_amount_wei
            .trim()
            .parse()
            .with_context(|| format!("Invalid min_amount_wei: {}", self.min_amount_wei))?;
        let max: u128 = self
            .max_amount_wei
            .trim()
            .parse()
            .with_context(|| format!("Invalid max_amount_wei: {}", self.max_amount_wei))?;
        Ok((min.min(max), min.max(max)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwitterSettings {
    /// Attempts before the link settles into the fallback state
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,
}

fn default_connect_attempts() -> u32 {
    DEFAULT_TWITTER_ATTEMPTS
}

impl Default for TwitterSettings {
    fn default() -> Self {
        Self {
            connect_attempts: default_connect_attempts(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSettings {
    /// How often to check whether the claim cooldown has passed
    #[serde(default = "default_watch_interval_secs")]
    pub watch_interval_secs: u64,
}

fn default_watch_interval_secs() -> u64 {
    60
}

impl Default for ClaimSettings {
    fn default() -> Self {
        Self {
            watch_interval_secs: default_watch_interval_secs(),
        }
    }
}

impl ClaimSettings {
    pub fn watch_interval(&self) -> Duration {
        Duration::from_secs(self.watch_interval_secs.max(1))
    }
}
