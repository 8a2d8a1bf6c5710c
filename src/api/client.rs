//! Blocking HTTP client for the XP service

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::types::*;
use super::ApiError;

/// Default XP service URL
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

const CANNOT_CLAIM_YET: &str = "Cannot claim yet";

/// Client for the XP service endpoints
#[derive(Clone)]
pub struct XpApiClient {
    base_url: String,
    agent: ureq::Agent,
}

impl XpApiClient {
    /// Create a new client with the default URL
    pub fn new() -> Self {
        Self::with_url(DEFAULT_API_URL)
    }

    /// Create a new client with a custom URL
    pub fn with_url(base_url: impl Into<String>) -> Self {
        Self::with_timeouts(base_url, Duration::from_secs(5), Duration::from_secs(30))
    }

    pub fn with_timeouts(
        base_url: impl Into<String>,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(connect_timeout)
            .timeout_read(read_timeout)
            .build();

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// `GET xp?walletAddress=`
    pub fn fetch_xp(&self, wallet: &str) -> Result<XpRecord, ApiError> {
        let result = self
            .agent
            .get(&self.url("xp"))
            .query("walletAddress", wallet)
            .call();
        read_data(result)
    }

    /// `POST xp`: claim the daily reward
    pub fn claim_daily(&self, wallet: &str) -> Result<XpRecord, ApiError> {
        let result = self.agent.post(&self.url("xp")).send_json(ClaimRequest {
            wallet_address: wallet,
        });
        read_data(result)
    }

    /// `GET referral?userWallet=`
    pub fn fetch_referral(&self, wallet: &str) -> Result<ReferralRecord, ApiError> {
        let result = self
            .agent
            .get(&self.url("referral"))
            .query("userWallet", wallet)
            .call();
        read_data(result)
    }

    /// `POST referral`, returns the wallet's referral code
    pub fn create_referral(
        &self,
        wallet: &str,
        referrer_code: Option<&str>,
    ) -> Result<String, ApiError> {
        let result = self
            .agent
            .post(&self.url("referral"))
            .send_json(ReferralRequest {
                user_wallet: wallet,
                referrer_code,
            });
        let created: CreatedReferral = read_data(result)?;
        Ok(created.referral_code)
    }

    /// `POST twitter/connect`
    pub fn connect_twitter(
        &self,
        wallet: &str,
        twitter_token: &str,
    ) -> Result<TwitterConnection, ApiError> {
        let result = self
            .agent
            .post(&self.url("twitter/connect"))
            .send_json(TwitterConnectRequest {
                user_wallet: wallet,
                twitter_token,
            });
        read_data(result)
    }
}

impl Default for XpApiClient {
    fn default() -> Self {
        Self::new()
    }
}

fn read_data<T: DeserializeOwned>(
    result: Result<ureq::Response, ureq::Error>,
) -> Result<T, ApiError> {
    match result {
        Ok(response) => {
            let status = response.status();
            let envelope: ApiEnvelope<T> = response
                .into_json()
                .map_err(|e| ApiError::Malformed(e.to_string()))?;

            if !envelope.success {
                return Err(ApiError::Rejected {
                    status,
                    message: envelope
                        .error
                        .unwrap_or_else(|| "Request was not successful".to_string()),
                });
            }

            envelope
                .data
                .ok_or_else(|| ApiError::Malformed("response has no data".to_string()))
        }
        Err(ureq::Error::Status(status, response)) => {
            let envelope = response.into_json::<ApiEnvelope<Value>>().ok();
            Err(classify_status(status, envelope))
        }
        Err(ureq::Error::Transport(e)) => Err(ApiError::Transport(e.to_string())),
    }
}

fn classify_status(status: u16, envelope: Option<ApiEnvelope<Value>>) -> ApiError {
    let (message, next_claim_time) = match envelope {
        Some(env) => (env.error, env.next_claim_time),
        None => (None, None),
    };
    let message = message.unwrap_or_else(|| format!("API returned status {}", status));

    if next_claim_time.is_some() || message == CANNOT_CLAIM_YET {
        return ApiError::ClaimNotReady { next_claim_time };
    }

    match status {
        408 | 429 | 500.. => ApiError::Server { status, message },
        _ => ApiError::Rejected { status, message },
    }
}
