//! Local XP ledger
//!
//! Durable per-wallet counters (transaction count and locally earned XP)
//! used when the XP service is unreachable and to reflect transactions
//! before the service has seen them. The service stays authoritative: a
//! successful fetch overwrites whatever is stored here.
//!
//! Storage is injected through [`LedgerStore`] so tests can run on
//! [`MemoryStore`] while the app uses [`SqliteStore`].

mod db;

pub use db::SqliteStore;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Error type for ledger storage
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Ledger database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Failed to prepare ledger storage: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ledger value for '{key}' is out of range: {value}")]
    OutOfRange { key: String, value: i64 },
}

/// Key-value storage for ledger counters
pub trait LedgerStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<u64>, LedgerError>;
    fn set(&self, key: &str, value: u64) -> Result<(), LedgerError>;
    fn remove(&self, key: &str) -> Result<(), LedgerError>;
}

/// Process-local store, mostly for tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, u64>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<u64>, LedgerError> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).copied())
    }

    fn set(&self, key: &str, value: u64) -> Result<(), LedgerError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), LedgerError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.remove(key);
        Ok(())
    }
}

const TX_COUNT_KEY: &str = "txCount";
const LOCAL_XP_KEY: &str = "localXp";

/// Ledger counters for one wallet
#[derive(Clone)]
pub struct LocalLedger {
    store: Arc<dyn LedgerStore>,
    namespace: String,
}

impl LocalLedger {
    /// Open the ledger for `wallet`. Addresses are compared case-insensitively.
    pub fn new(store: Arc<dyn LedgerStore>, wallet: &str) -> Self {
        Self {
            store,
            namespace: wallet.trim().to_ascii_lowercase(),
        }
    }

    fn key(&self, name: &str) -> String {
        format!("{}:{}", self.namespace, name)
    }

    fn read(&self, name: &str) -> Result<u64, LedgerError> {
        Ok(self.store.get(&self.key(name))?.unwrap_or(0))
    }

    pub fn tx_count(&self) -> Result<u64, LedgerError> {
        self.read(TX_COUNT_KEY)
    }

    pub fn local_xp(&self) -> Result<u64, LedgerError> {
        self.read(LOCAL_XP_KEY)
    }

    pub fn set_tx_count(&self, count: u64) -> Result<(), LedgerError> {
        self.store.set(&self.key(TX_COUNT_KEY), count)
    }

    pub fn set_local_xp(&self, xp: u64) -> Result<(), LedgerError> {
        self.store.set(&self.key(LOCAL_XP_KEY), xp)
    }

    /// Returns the new count
    pub fn increment_tx_count(&self) -> Result<u64, LedgerError> {
        let count = self.tx_count()?.saturating_add(1);
        self.set_tx_count(count)?;
        Ok(count)
    }

    /// Returns the new XP amount
    pub fn add_local_xp(&self, amount: u64) -> Result<u64, LedgerError> {
        let xp = self.local_xp()?.saturating_add(amount);
        self.set_local_xp(xp)?;
        Ok(xp)
    }

    /// Forget both counters for this wallet
    pub fn reset(&self) -> Result<(), LedgerError> {
        self.store.remove(&self.key(TX_COUNT_KEY))?;
        self.store.remove(&self.key(LOCAL_XP_KEY))
    }

    pub fn wallet(&self) -> &str {
        &self.namespace
    }
}

impl std::fmt::Debug for LocalLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalLedger")
            .field("wallet", &self.namespace)
            .finish()
    }
}
