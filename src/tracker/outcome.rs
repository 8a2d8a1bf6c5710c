use chrono::{DateTime, Utc};
use serde::Serialize;

/// Result of an operation that degrades instead of failing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Settled<T> {
    /// The service confirmed the operation
    Confirmed { value: T },
    /// The service could not be reached or answered from degraded data;
    /// `value` was produced locally
    Fallback { value: T, reason: String },
}

impl<T> Settled<T> {
    pub fn value(&self) -> &T {
        match self {
            Self::Confirmed { value } | Self::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Confirmed { value } | Self::Fallback { value, .. } => value,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }
}

/// Result of a daily claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ClaimOutcome {
    Confirmed,
    /// Claim recorded locally with the default reward
    Fallback { reason: String },
    /// Cooldown has not ended; nothing was recorded
    #[serde(rename_all = "camelCase")]
    Blocked {
        next_claim_time: Option<DateTime<Utc>>,
    },
}

impl ClaimOutcome {
    /// Whether the caller should show the claim as done
    pub fn is_claimed(&self) -> bool {
        !matches!(self, Self::Blocked { .. })
    }
}
