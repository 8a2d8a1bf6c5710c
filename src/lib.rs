//! AncientMonad - XP and transaction-cycle progress engine
//!
//! Tracks experience points for a connected wallet against a remote XP
//! service, with a local ledger that keeps the numbers moving when the
//! service is down. Confirmed transactions advance a repeating set of
//! cycles (3, 7, 15, 40, 70 and 100 transactions); closing a cycle triggers
//! a celebration and a progress reset.
//!
//! ## Pieces
//!
//! - [`tracker::XpTracker`] owns the wallet's [`tracker::XpData`] and runs
//!   fetch, claim, Twitter-link and referral operations with retry and
//!   fallback.
//! - [`progress`] holds the pure bookkeeping: level derivation, the cycle
//!   calculator and the celebration coordinator.
//! - [`ledger`] persists per-wallet counters locally.
//! - [`api`] speaks the XP service's JSON contract.
//! - [`wallet`] abstracts the chain wallet and sends test transfers.

pub mod api;
pub mod config;
pub mod entropy;
pub mod ledger;
pub mod progress;
pub mod referral;
pub mod retry;
pub mod tracker;
pub mod wallet;

pub use api::{ApiError, HttpXpService, XpApiClient, XpService};
pub use config::Config;
pub use ledger::{LedgerError, LedgerStore, LocalLedger, MemoryStore, SqliteStore};
pub use progress::{CelebrationCoordinator, CycleInfo, LevelProgress, CYCLE_LENGTHS};
pub use retry::{RetryHandle, RetryPolicy};
pub use tracker::{ClaimOutcome, Settled, TrackerError, XpData, XpTracker};
pub use wallet::{RpcWallet, TestTransfer, WalletCapability, WalletError};
