//! Configuration loading and management

mod io;
mod settings;

pub use settings::{
    ApiSettings, ChainSettings, ClaimSettings, LedgerSettings, RetrySettings, TwitterSettings,
};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::api::XpApiClient;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// XP service connection
    #[serde(default)]
    pub api: ApiSettings,

    /// Backoff for XP service calls
    #[serde(default)]
    pub retry: RetrySettings,

    /// Local ledger storage
    #[serde(default)]
    pub ledger: LedgerSettings,

    /// Chain used for test transfers
    #[serde(default)]
    pub chain: ChainSettings,

    #[serde(default)]
    pub twitter: TwitterSettings,

    #[serde(default)]
    pub claims: ClaimSettings,
}

impl Config {
    /// Ledger database location, `~/.ancient-monad/ledger.db` unless set
    pub fn ledger_path(&self) -> PathBuf {
        self.ledger
            .path
            .clone()
            .unwrap_or_else(|| Self::global_config_dir().join("ledger.db"))
    }

    /// HTTP client for the configured XP service
    pub fn api_client(&self) -> XpApiClient {
        XpApiClient::with_timeouts(
            self.api.base_url.clone(),
            self.api.connect_timeout(),
            self.api.read_timeout(),
        )
    }
}
