//! XP tracker
//!
//! Owns the [`XpData`] record of the connected wallet and keeps it in sync
//! with the XP service, falling back to the [`LocalLedger`] when the service
//! cannot be reached. Every mutation republishes a fresh snapshot on a watch
//! channel, with derived fields recomputed.
//!
//! Operations that talk to the service are serialized per tracker, so a
//! fetch and a claim never interleave their writes. Each wallet connection
//! is a session with its own [`RetryHandle`]; switching or disconnecting the
//! wallet cancels it, and anything still in flight for the old session is
//! dropped instead of written.
//!
//! Remote failures never come back as `Err`. They are recorded in
//! `XpData.error` and reflected in the returned outcome. `Err` is reserved
//! for input that was refused outright and for stale sessions.

mod claim_watch;
mod data;
mod outcome;

pub use claim_watch::ClaimWatch;
pub use data::XpData;
pub use outcome::{ClaimOutcome, Settled};

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::watch;

use crate::api::{ApiError, XpService};
use crate::ledger::{LedgerStore, LocalLedger};
use crate::progress::XpRewards;
use crate::referral::{generate_referral_code, is_valid_referral_code};
use crate::retry::{retry, RetryError, RetryHandle, RetryPolicy};
use crate::wallet::is_valid_address;

/// Shown whenever local data stands in for the service
pub const CONNECTION_FALLBACK_MESSAGE: &str = "Using local data due to connection issues";

pub const DEFAULT_TWITTER_ATTEMPTS: u32 = 2;

const CLAIM_COOLDOWN_HOURS: i64 = 24;

/// Error type for tracker operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    #[error("No wallet connected")]
    NoWallet,

    #[error("Invalid wallet address: {0}")]
    InvalidWallet(String),

    #[error("Invalid referrer code format")]
    InvalidReferrerCode,

    #[error("Twitter token is required")]
    MissingTwitterToken,

    #[error("Wallet changed while the operation was in flight")]
    SessionChanged,

    /// The service refused the request
    #[error("{0}")]
    Rejected(String),
}

#[derive(Debug, Clone)]
struct Session {
    wallet: String,
    ledger: LocalLedger,
    handle: RetryHandle,
}

impl Session {
    fn new(store: &Arc<dyn LedgerStore>, wallet: &str) -> Self {
        Self {
            wallet: wallet.to_string(),
            ledger: LocalLedger::new(Arc::clone(store), wallet),
            handle: RetryHandle::new(),
        }
    }
}

/// Single source of truth for the connected wallet's XP
pub struct XpTracker {
    service: Arc<dyn XpService>,
    store: Arc<dyn LedgerStore>,
    policy: RetryPolicy,
    twitter_attempts: u32,
    state: watch::Sender<XpData>,
    session: Mutex<Option<Session>>,
    op_lock: tokio::sync::Mutex<()>,
}

impl XpTracker {
    pub fn new(service: Arc<dyn XpService>, store: Arc<dyn LedgerStore>) -> Self {
        let (state, _) = watch::channel(XpData::default());
        Self {
            service,
            store,
            policy: RetryPolicy::default(),
            twitter_attempts: DEFAULT_TWITTER_ATTEMPTS,
            state,
            session: Mutex::new(None),
            op_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Total attempts for a Twitter link before settling on the fallback
    pub fn with_twitter_attempts(mut self, attempts: u32) -> Self {
        self.twitter_attempts = attempts.max(1);
        self
    }

    /// Receiver that sees every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<XpData> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> XpData {
        self.state.borrow().clone()
    }

    pub fn wallet(&self) -> Option<String> {
        self.lock_session().as_ref().map(|s| s.wallet.clone())
    }

    /// Start a session for `address` and load its data
    pub async fn connect_wallet(&self, address: &str) -> Result<Settled<XpData>, TrackerError> {
        let address = address.trim();
        if !is_valid_address(address) {
            return Err(TrackerError::InvalidWallet(address.to_string()));
        }

        {
            let mut current = self.lock_session();
            if let Some(old) = current.take() {
                old.handle.cancel();
            }
            *current = Some(Session::new(&self.store, address));
            self.state.send_replace(XpData::default());
        }

        tracing::info!("Connected wallet {}", address);
        self.fetch_xp_data().await
    }

    /// End the session and reset to defaults
    pub fn disconnect_wallet(&self) {
        let mut current = self.lock_session();
        if let Some(old) = current.take() {
            old.handle.cancel();
            tracing::info!("Disconnected wallet {}", old.wallet);
        }
        self.state.send_replace(XpData::default());
    }

    /// Reload XP and referral data from the service.
    ///
    /// Transient failures are retried with backoff while `error` shows the
    /// attempt number. Once retries run out the ledger values are used.
    pub async fn fetch_xp_data(&self) -> Result<Settled<XpData>, TrackerError> {
        let Some(session) = self.current_session() else {
            self.state.send_replace(XpData::default());
            return Err(TrackerError::NoWallet);
        };

        let _op = self.op_lock.lock().await;
        self.fetch_locked(&session).await
    }

    async fn fetch_locked(&self, session: &Session) -> Result<Settled<XpData>, TrackerError> {
        self.commit(session, |d| {
            d.is_loading = true;
            d.error = None;
        })?;

        let service = self.service.as_ref();
        let wallet = session.wallet.as_str();
        let max_retries = self.policy.max_retries;

        let result = retry(
            &self.policy,
            &session.handle,
            move |_| service.fetch_xp(wallet),
            |n, _| {
                let _ = self.commit(session, |d| {
                    d.is_loading = true;
                    d.error = Some(format!("Retrying... ({}/{})", n, max_retries));
                });
            },
        )
        .await;

        match result {
            Ok(record) => {
                let referral = match service.fetch_referral(wallet).await {
                    Ok(referral) => Some(referral),
                    Err(e) => {
                        tracing::warn!("Failed to fetch referral data: {}", e);
                        None
                    }
                };

                let degraded = record.is_fallback();
                let tx_count = if degraded {
                    self.ledger_tx_count(session)
                } else {
                    if let Err(e) = session.ledger.set_local_xp(record.xp_total) {
                        tracing::warn!("Failed to store XP in ledger: {}", e);
                    }
                    self.reconcile_tx_count(session, record.tx_count)
                };

                let reason = record
                    .note
                    .clone()
                    .unwrap_or_else(|| "Service returned fallback data".to_string());

                self.commit(session, |d| {
                    d.xp_total = record.xp_total;
                    d.claim_count = record.claim_count;
                    d.last_claimed_at = record.last_claimed_at;
                    d.next_claim_time = record.next_claim_time;
                    d.tx_count = tx_count;

                    let referral = referral.unwrap_or_default();
                    d.referral_xp = referral.xp;
                    d.referral_code = referral.referral_code;
                    d.referrer_code = referral.referrer_code;
                    d.twitter_connected = referral.twitter_connected;

                    d.using_fallback_data = degraded;
                    d.is_loading = false;
                    d.error = degraded.then(|| reason.clone());
                })?;

                let data = self.snapshot();
                if degraded {
                    tracing::warn!("XP service answered with fallback data: {}", reason);
                    Ok(Settled::Fallback { value: data, reason })
                } else {
                    tracing::debug!("Loaded XP for {}: {} XP", wallet, data.total_xp);
                    Ok(Settled::Confirmed { value: data })
                }
            }
            Err(RetryError::Exhausted { last, .. }) => {
                tracing::warn!("XP fetch failed, using local ledger: {}", last);
                let tx_count = self.ledger_tx_count(session);
                let local_xp = session.ledger.local_xp().unwrap_or_else(|e| {
                    tracing::warn!("Failed to read XP from ledger: {}", e);
                    0
                });

                self.commit(session, |d| {
                    d.xp_total = local_xp;
                    d.tx_count = tx_count;
                    d.referral_xp = 0;
                    d.referral_code = None;
                    d.referrer_code = None;
                    d.twitter_connected = false;
                    d.using_fallback_data = true;
                    d.is_loading = false;
                    d.error = Some(CONNECTION_FALLBACK_MESSAGE.to_string());
                })?;

                Ok(Settled::Fallback {
                    value: self.snapshot(),
                    reason: last.to_string(),
                })
            }
            Err(RetryError::Fatal(e)) => Err(self.record_rejection(session, &e)),
            Err(RetryError::Cancelled) => Err(TrackerError::SessionChanged),
        }
    }

    /// Claim the daily reward.
    ///
    /// Resolves to a claimed outcome even when the service is unreachable,
    /// in which case the default reward is recorded locally. Only a claim
    /// refused for cooldown is reported as [`ClaimOutcome::Blocked`].
    pub async fn claim_daily_reward(&self) -> Result<ClaimOutcome, TrackerError> {
        let session = self.current_session().ok_or(TrackerError::NoWallet)?;
        let _op = self.op_lock.lock().await;

        self.commit(&session, |d| {
            d.is_loading = true;
            d.error = None;
        })?;

        let service = self.service.as_ref();
        let wallet = session.wallet.as_str();
        let max_retries = self.policy.max_retries;

        let result = retry(
            &self.policy,
            &session.handle,
            move |_| service.claim_daily(wallet),
            |n, _| {
                let _ = self.commit(&session, |d| {
                    d.is_loading = true;
                    d.error = Some(format!("Retrying claim... ({}/{})", n, max_retries));
                });
            },
        )
        .await;

        match result {
            Ok(record) if record.is_fallback() => {
                let reason = record
                    .note
                    .unwrap_or_else(|| "Service returned fallback data".to_string());
                tracing::warn!("Claim answered with fallback data, recording locally");
                self.apply_local_claim(&session, None)?;
                Ok(ClaimOutcome::Fallback { reason })
            }
            Ok(_) => {
                tracing::info!("Daily reward claimed for {}", wallet);
                if let Err(TrackerError::SessionChanged) = self.fetch_locked(&session).await {
                    return Err(TrackerError::SessionChanged);
                }
                Ok(ClaimOutcome::Confirmed)
            }
            Err(RetryError::Fatal(ApiError::ClaimNotReady { next_claim_time })) => {
                tracing::info!("Claim refused, next claim at {:?}", next_claim_time);
                self.commit(&session, |d| {
                    d.is_loading = false;
                    d.error = Some("Cannot claim yet".to_string());
                    if next_claim_time.is_some() {
                        d.next_claim_time = next_claim_time;
                    }
                })?;
                Ok(ClaimOutcome::Blocked { next_claim_time })
            }
            Err(RetryError::Fatal(e)) => Err(self.record_rejection(&session, &e)),
            Err(RetryError::Exhausted { last, .. }) => {
                tracing::warn!("Claim failed after retries, recording locally: {}", last);
                self.apply_local_claim(&session, Some(CONNECTION_FALLBACK_MESSAGE))?;
                Ok(ClaimOutcome::Fallback {
                    reason: last.to_string(),
                })
            }
            Err(RetryError::Cancelled) => Err(TrackerError::SessionChanged),
        }
    }

    fn apply_local_claim(&self, session: &Session, error: Option<&str>) -> Result<(), TrackerError> {
        let now = Utc::now();
        self.commit(session, |d| {
            d.xp_total = d.xp_total.saturating_add(XpRewards::DAILY_CLAIM);
            d.claim_count = d.claim_count.saturating_add(1);
            d.last_claimed_at = Some(now);
            d.next_claim_time = Some(now + ChronoDuration::hours(CLAIM_COOLDOWN_HOURS));
            d.using_fallback_data = true;
            d.is_loading = false;
            d.error = error.map(str::to_string);
        })?;

        if let Err(e) = session.ledger.add_local_xp(XpRewards::DAILY_CLAIM) {
            tracing::warn!("Failed to store claim XP in ledger: {}", e);
        }
        Ok(())
    }

    /// Record a confirmed on-chain transaction: one more transaction and the
    /// transaction reward. Purely local; the service catches up on the next
    /// fetch.
    pub fn update_xp(&self) -> Result<XpData, TrackerError> {
        let guard = self.lock_session();
        let session = guard.as_ref().ok_or(TrackerError::NoWallet)?;

        self.update(|d| {
            d.tx_count = d.tx_count.saturating_add(1);
            d.xp_total = d.xp_total.saturating_add(XpRewards::TRANSACTION);
        });
        let data = self.snapshot();

        if let Err(e) = session.ledger.set_tx_count(data.tx_count) {
            tracing::warn!("Failed to store transaction count in ledger: {}", e);
        }
        if let Err(e) = session.ledger.set_local_xp(data.xp_total) {
            tracing::warn!("Failed to store XP in ledger: {}", e);
        }

        tracing::debug!("Transaction recorded: {} total", data.tx_count);
        Ok(data)
    }

    /// Link a Twitter account.
    ///
    /// Always ends with `twitter_connected` set; a failed link is reported
    /// as [`Settled::Fallback`].
    pub async fn connect_twitter(&self, twitter_token: &str) -> Result<Settled<()>, TrackerError> {
        let twitter_token = twitter_token.trim();
        if twitter_token.is_empty() {
            return Err(TrackerError::MissingTwitterToken);
        }
        let session = self.current_session().ok_or(TrackerError::NoWallet)?;
        let _op = self.op_lock.lock().await;

        let service = self.service.as_ref();
        let wallet = session.wallet.as_str();
        let policy = RetryPolicy::new(
            self.twitter_attempts.saturating_sub(1),
            self.policy.base_delay,
        );

        let result = retry(
            &policy,
            &session.handle,
            move |_| service.connect_twitter(wallet, twitter_token),
            |_, _| {},
        )
        .await;

        match result {
            Ok(connection) => {
                let degraded = connection.is_fallback();
                if let Err(TrackerError::SessionChanged) = self.fetch_locked(&session).await {
                    return Err(TrackerError::SessionChanged);
                }
                // The refetch may predate the link on a degraded service
                self.commit(&session, |d| {
                    d.twitter_connected = true;
                    d.using_fallback_data |= degraded;
                })?;

                tracing::info!("Twitter linked for {}", wallet);
                if degraded {
                    Ok(Settled::Fallback {
                        value: (),
                        reason: connection
                            .note
                            .unwrap_or_else(|| "Service returned fallback data".to_string()),
                    })
                } else {
                    Ok(Settled::Confirmed { value: () })
                }
            }
            Err(RetryError::Fatal(e)) | Err(RetryError::Exhausted { last: e, .. }) => {
                tracing::warn!("Twitter link failed, marking connected locally: {}", e);
                self.commit(&session, |d| {
                    d.twitter_connected = true;
                    d.using_fallback_data = true;
                    d.is_loading = false;
                    d.error = Some(e.to_string());
                })?;
                Ok(Settled::Fallback {
                    value: (),
                    reason: e.to_string(),
                })
            }
            Err(RetryError::Cancelled) => Err(TrackerError::SessionChanged),
        }
    }

    /// Get the wallet's referral code, optionally registering who referred
    /// it. When the service is unreachable a display-only code is generated.
    pub async fn create_referral(
        &self,
        referrer_code: Option<&str>,
    ) -> Result<Settled<String>, TrackerError> {
        let referrer_code = referrer_code.map(str::trim).filter(|c| !c.is_empty());
        if let Some(code) = referrer_code {
            if !is_valid_referral_code(code) {
                return Err(TrackerError::InvalidReferrerCode);
            }
        }

        let session = self.current_session().ok_or(TrackerError::NoWallet)?;
        let _op = self.op_lock.lock().await;

        let service = self.service.as_ref();
        let wallet = session.wallet.as_str();

        let result = retry(
            &self.policy,
            &session.handle,
            move |_| service.create_referral(wallet, referrer_code),
            |_, _| {},
        )
        .await;

        match result {
            Ok(code) => {
                tracing::info!("Referral code for {}: {}", wallet, code);
                if let Err(TrackerError::SessionChanged) = self.fetch_locked(&session).await {
                    return Err(TrackerError::SessionChanged);
                }
                self.commit(&session, |d| d.referral_code = Some(code.clone()))?;
                Ok(Settled::Confirmed { value: code })
            }
            Err(RetryError::Exhausted { last, .. }) => {
                let code = generate_referral_code();
                tracing::warn!("Referral creation failed, using local code {}: {}", code, last);
                self.commit(&session, |d| {
                    d.referral_code = Some(code.clone());
                    d.using_fallback_data = true;
                    d.error = Some(CONNECTION_FALLBACK_MESSAGE.to_string());
                })?;
                Ok(Settled::Fallback {
                    value: code,
                    reason: last.to_string(),
                })
            }
            Err(RetryError::Fatal(e)) => Err(self.record_rejection(&session, &e)),
            Err(RetryError::Cancelled) => Err(TrackerError::SessionChanged),
        }
    }

    /// Whether a refetch is due because the claim cooldown has passed
    pub fn claim_window_open(&self, now: chrono::DateTime<Utc>) -> bool {
        if self.lock_session().is_none() {
            return false;
        }
        let data = self.state.borrow();
        !data.is_loading && data.next_claim_time.is_some_and(|t| now >= t)
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn current_session(&self) -> Option<Session> {
        self.lock_session().clone()
    }

    /// Apply `f` and recompute derived fields
    fn update(&self, f: impl FnOnce(&mut XpData)) {
        self.state.send_modify(|d| {
            f(d);
            d.refresh_derived(Utc::now());
        });
    }

    /// [`Self::update`], unless `session` is no longer the active one
    fn commit(&self, session: &Session, f: impl FnOnce(&mut XpData)) -> Result<(), TrackerError> {
        let _guard = self.lock_session();
        if session.handle.is_cancelled() {
            tracing::debug!("Dropping update for stale session {}", session.wallet);
            return Err(TrackerError::SessionChanged);
        }
        self.update(f);
        Ok(())
    }

    fn record_rejection(&self, session: &Session, error: &ApiError) -> TrackerError {
        let message = error.to_string();
        tracing::warn!("Request rejected: {}", message);
        if let Err(e) = self.commit(session, |d| {
            d.is_loading = false;
            d.error = Some(message.clone());
        }) {
            return e;
        }
        TrackerError::Rejected(message)
    }

    fn ledger_tx_count(&self, session: &Session) -> u64 {
        session.ledger.tx_count().unwrap_or_else(|e| {
            tracing::warn!("Failed to read transaction count from ledger: {}", e);
            self.state.borrow().tx_count
        })
    }

    /// Local count stays canonical; a strictly lower server count wins
    fn reconcile_tx_count(&self, session: &Session, server_count: Option<u64>) -> u64 {
        let local = self.ledger_tx_count(session);
        match server_count {
            Some(server) if server < local => {
                tracing::info!(
                    "Server reports {} transactions, local ledger has {}; using server count",
                    server,
                    local
                );
                if let Err(e) = session.ledger.set_tx_count(server) {
                    tracing::warn!("Failed to store transaction count in ledger: {}", e);
                }
                server
            }
            _ => local,
        }
    }
}

impl std::fmt::Debug for XpTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XpTracker")
            .field("wallet", &self.wallet())
            .field("policy", &self.policy)
            .finish()
    }
}
