//! Async seam over the XP service
//!
//! The tracker only talks to [`XpService`]; [`HttpXpService`] runs the
//! blocking [`XpApiClient`] on tokio's blocking pool.

use async_trait::async_trait;

use super::client::XpApiClient;
use super::types::{ReferralRecord, TwitterConnection, XpRecord};
use super::ApiError;

/// Operations the tracker needs from the XP service
#[async_trait]
pub trait XpService: Send + Sync {
    async fn fetch_xp(&self, wallet: &str) -> Result<XpRecord, ApiError>;

    async fn claim_daily(&self, wallet: &str) -> Result<XpRecord, ApiError>;

    async fn fetch_referral(&self, wallet: &str) -> Result<ReferralRecord, ApiError>;

    /// Returns the wallet's referral code
    async fn create_referral(
        &self,
        wallet: &str,
        referrer_code: Option<&str>,
    ) -> Result<String, ApiError>;

    async fn connect_twitter(
        &self,
        wallet: &str,
        twitter_token: &str,
    ) -> Result<TwitterConnection, ApiError>;
}

/// [`XpService`] over HTTP
#[derive(Clone, Default)]
pub struct HttpXpService {
    client: XpApiClient,
}

impl HttpXpService {
    pub fn new(client: XpApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &XpApiClient {
        &self.client
    }

    async fn run<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&XpApiClient) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let client = self.client.clone();
        tokio::task::spawn_blocking(move || f(&client))
            .await
            .map_err(|e| ApiError::Transport(format!("Request task failed: {}", e)))?
    }
}

#[async_trait]
impl XpService for HttpXpService {
    async fn fetch_xp(&self, wallet: &str) -> Result<XpRecord, ApiError> {
        let wallet = wallet.to_string();
        self.run(move |client| client.fetch_xp(&wallet)).await
    }

    async fn claim_daily(&self, wallet: &str) -> Result<XpRecord, ApiError> {
        let wallet = wallet.to_string();
        self.run(move |client| client.claim_daily(&wallet)).await
    }

    async fn fetch_referral(&self, wallet: &str) -> Result<ReferralRecord, ApiError> {
        let wallet = wallet.to_string();
        self.run(move |client| client.fetch_referral(&wallet)).await
    }

    async fn create_referral(
        &self,
        wallet: &str,
        referrer_code: Option<&str>,
    ) -> Result<String, ApiError> {
        let wallet = wallet.to_string();
        let referrer_code = referrer_code.map(str::to_string);
        self.run(move |client| client.create_referral(&wallet, referrer_code.as_deref()))
            .await
    }

    async fn connect_twitter(
        &self,
        wallet: &str,
        twitter_token: &str,
    ) -> Result<TwitterConnection, ApiError> {
        let wallet = wallet.to_string();
        let twitter_token = twitter_token.to_string();
        self.run(move |client| client.connect_twitter(&wallet, &twitter_token))
            .await
    }
}
