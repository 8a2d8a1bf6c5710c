//! Remote XP / referral service
//!
//! JSON endpoints under a common base URL:
//!
//! | Operation             | Request                                         |
//! |-----------------------|-------------------------------------------------|
//! | fetch XP              | `GET  xp?walletAddress=<addr>`                  |
//! | daily claim           | `POST xp { walletAddress }`                     |
//! | fetch referral info   | `GET  referral?userWallet=<addr>`               |
//! | create referral       | `POST referral { userWallet, referrerCode? }`   |
//! | link Twitter          | `POST twitter/connect { userWallet, twitterToken }` |
//!
//! Every response is wrapped in `{ success, data, error? }`.

mod client;
mod service;
mod types;

pub use client::{XpApiClient, DEFAULT_API_URL};
pub use service::{HttpXpService, XpService};
pub use types::{
    ApiEnvelope, ClaimRequest, CreatedReferral, ReferralRecord, ReferralRequest,
    TwitterConnectRequest, TwitterConnection, XpRecord,
};

use chrono::{DateTime, Utc};

use crate::retry::Transient;

/// Error type for XP service calls
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// Connection refused, DNS failure, timeout
    #[error("Network error: {0}")]
    Transport(String),

    /// 5xx, 408 or 429
    #[error("API returned status {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The request itself was refused (missing wallet, bad referrer code)
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// Daily claim attempted before the cooldown ended
    #[error("Cannot claim yet")]
    ClaimNotReady {
        next_claim_time: Option<DateTime<Utc>>,
    },
}

impl Transient for ApiError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Server { .. } | Self::Malformed(_)
        )
    }
}

/// Server-side "degraded data" marker: the structured flag, or the legacy
/// free-text note mentioning a fallback.
pub(crate) fn flags_fallback(flag: bool, note: Option<&str>) -> bool {
    flag || note.is_some_and(|n| n.to_ascii_lowercase().contains("fallback"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ApiError::Transport("refused".into()).is_transient());
        assert!(
            ApiError::Server {
                status: 500,
                message: "boom".into()
            }
            .is_transient()
        );
        assert!(ApiError::Malformed("eof".into()).is_transient());
        assert!(
            !ApiError::Rejected {
                status: 400,
                message: "Wallet address is required".into()
            }
            .is_transient()
        );
        assert!(
            !ApiError::ClaimNotReady {
                next_claim_time: None
            }
            .is_transient()
        );
    }

    #[test]
    fn test_fallback_flag() {
        assert!(flags_fallback(true, None));
        assert!(flags_fallback(
            false,
            Some("Using fallback data due to database issues")
        ));
        assert!(flags_fallback(false, Some("FALLBACK")));
        assert!(!flags_fallback(false, Some("all good")));
        assert!(!flags_fallback(false, None));
    }
}
