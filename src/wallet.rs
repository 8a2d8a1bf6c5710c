//! Wallet capability and test transfers
//!
//! The tracker never touches a chain itself. A [`WalletCapability`] reports
//! which chain it is on and sends native transfers; network selection stays
//! with whoever configured the wallet.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::entropy;
use crate::tracker::{TrackerError, XpData, XpTracker};

/// Monad testnet, 10143
pub const MONAD_TESTNET_CHAIN_ID: &str = "0x279f";

/// 0.001 MON
pub const DEFAULT_MIN_AMOUNT_WEI: u128 = 1_000_000_000_000_000;
/// 0.01 MON
pub const DEFAULT_MAX_AMOUNT_WEI: u128 = 10_000_000_000_000_000;

static ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^0x[0-9a-fA-F]{40}$").unwrap_or_else(|e| panic!("invalid address regex: {}", e))
});

/// `0x` followed by 40 hex digits
pub fn is_valid_address(address: &str) -> bool {
    ADDRESS_RE.is_match(address)
}

/// Parse a chain id given as `0x`-hex or decimal
pub fn parse_chain_id(chain_id: &str) -> Option<u64> {
    let chain_id = chain_id.trim();
    match chain_id
        .strip_prefix("0x")
        .or_else(|| chain_id.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => chain_id.parse().ok(),
    }
}

fn same_chain(a: &str, b: &str) -> bool {
    match (parse_chain_id(a), parse_chain_id(b)) {
        (Some(a), Some(b)) => a == b,
        _ => a.trim().eq_ignore_ascii_case(b.trim()),
    }
}

/// Error type for wallet operations
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("Wallet is on chain {actual}, expected {expected}")]
    WrongNetwork { expected: String, actual: String },

    #[error("No recipients configured for test transfers")]
    NoRecipients,

    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),

    #[error("Node has no unlocked account")]
    NoAccount,

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("RPC transport error: {0}")]
    Transport(String),

    #[error("Malformed RPC response: {0}")]
    Malformed(String),

    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

/// What the core needs from a wallet
#[async_trait]
pub trait WalletCapability: Send + Sync {
    /// Current chain id, e.g. `0x279f`
    async fn chain_id(&self) -> Result<String, WalletError>;

    /// Send `amount_wei` of the native currency to `to`, returns the
    /// transaction hash
    async fn sign_and_send_native_transfer(
        &self,
        to: &str,
        amount_wei: u128,
    ) -> Result<String, WalletError>;
}

/// A sent test transfer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    pub tx_hash: String,
    pub recipient: String,
    pub amount_wei: u128,
    /// Tracker state after the transaction was recorded
    pub xp: XpData,
}

/// Sends a small transfer to a random recipient and records it with the
/// tracker
pub struct TestTransfer {
    wallet: Arc<dyn WalletCapability>,
    tracker: Arc<XpTracker>,
    chain_id: String,
    recipients: Vec<String>,
    min_amount_wei: u128,
    max_amount_wei: u128,
}

impl TestTransfer {
    pub fn new(
        wallet: Arc<dyn WalletCapability>,
        tracker: Arc<XpTracker>,
        chain_id: impl Into<String>,
        recipients: Vec<String>,
    ) -> Self {
        Self {
            wallet,
            tracker,
            chain_id: chain_id.into(),
            recipients,
            min_amount_wei: DEFAULT_MIN_AMOUNT_WEI,
            max_amount_wei: DEFAULT_MAX_AMOUNT_WEI,
        }
    }

    pub fn with_amount_range(mut self, min_wei: u128, max_wei: u128) -> Self {
        self.min_amount_wei = min_wei.min(max_wei);
        self.max_amount_wei = min_wei.max(max_wei);
        self
    }

    pub async fn send(&self) -> Result<TransferReceipt, WalletError> {
        if self.recipients.is_empty() {
            return Err(WalletError::NoRecipients);
        }

        let actual = self.wallet.chain_id().await?;
        if !same_chain(&actual, &self.chain_id) {
            return Err(WalletError::WrongNetwork {
                expected: self.chain_id.clone(),
                actual,
            });
        }

        let recipient = self.recipients[entropy::random_index(self.recipients.len())].clone();
        if !is_valid_address(&recipient) {
            return Err(WalletError::InvalidRecipient(recipient));
        }
        let amount_wei = entropy::random_in_range(self.min_amount_wei, self.max_amount_wei);

        tracing::debug!("Sending {} wei to {}", amount_wei, recipient);
        let tx_hash = self
            .wallet
            .sign_and_send_native_transfer(&recipient, amount_wei)
            .await?;
        tracing::info!("Test transaction sent: {}", tx_hash);

        let xp = self.tracker.update_xp()?;

        Ok(TransferReceipt {
            tx_hash,
            recipient,
            amount_wei,
            xp,
        })
    }
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// [`WalletCapability`] over Ethereum JSON-RPC against a node that holds an
/// unlocked account
#[derive(Clone)]
pub struct RpcWallet {
    url: String,
    account: Option<String>,
    agent: ureq::Agent,
}

impl RpcWallet {
    pub fn new(url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(30))
            .build();

        Self {
            url: url.into(),
            account: None,
            agent,
        }
    }

    /// Send from `account` instead of the node's first account
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    fn call<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> Result<T, WalletError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };

        let response: RpcResponse<T> = match self.agent.post(&self.url).send_json(&request) {
            Ok(response) => response
                .into_json()
                .map_err(|e| WalletError::Malformed(e.to_string()))?,
            Err(ureq::Error::Status(status, _)) => {
                return Err(WalletError::Transport(format!(
                    "RPC returned status {}",
                    status
                )));
            }
            Err(e) => return Err(WalletError::Transport(e.to_string())),
        };

        if let Some(error) = response.error {
            return Err(WalletError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        response
            .result
            .ok_or_else(|| WalletError::Malformed(format!("{} returned no result", method)))
    }

    fn sender(&self) -> Result<String, WalletError> {
        if let Some(account) = &self.account {
            return Ok(account.clone());
        }
        let accounts: Vec<String> = self.call("eth_accounts", Vec::new())?;
        accounts.into_iter().next().ok_or(WalletError::NoAccount)
    }

    async fn run<T, F>(&self, f: F) -> Result<T, WalletError>
    where
        F: FnOnce(&RpcWallet) -> Result<T, WalletError> + Send + 'static,
        T: Send + 'static,
    {
        let wallet = self.clone();
        tokio::task::spawn_blocking(move || f(&wallet))
            .await
            .map_err(|e| WalletError::Transport(format!("RPC task failed: {}", e)))?
    }
}

#[async_trait]
impl WalletCapability for RpcWallet {
    async fn chain_id(&self) -> Result<String, WalletError> {
        self.run(|wallet| wallet.call("eth_chainId", Vec::new()))
            .await
    }

    async fn sign_and_send_native_transfer(
        &self,
        to: &str,
        amount_wei: u128,
    ) -> Result<String, WalletError> {
        let to = to.to_string();
        self.run(move |wallet| {
            let from = wallet.sender()?;
            let tx = json!({
                "from": from,
                "to": to,
                "value": format!("0x{:x}", amount_wei),
            });
            wallet.call("eth_sendTransaction", vec![tx])
        })
        .await
    }
}
