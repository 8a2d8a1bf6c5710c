//! Wire types for the XP service
//!
//! The service is backed by loosely typed SQL results, so numeric fields may
//! arrive as numbers, numeric strings, `null` or garbage. Counts are decoded
//! leniently: anything that is not a finite non-negative number becomes 0.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::flags_fallback;
use crate::progress::sanitize_count;

/// `{ success, data, error?, nextClaimTime? }`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    /// Only present on a refused daily claim
    #[serde(default, rename = "nextClaimTime", deserialize_with = "lenient_time")]
    pub next_claim_time: Option<DateTime<Utc>>,
}

/// Payload of `GET xp` and `POST xp`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XpRecord {
    #[serde(default, deserialize_with = "lenient_count")]
    pub xp_total: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub claim_count: u64,
    #[serde(default, deserialize_with = "lenient_time")]
    pub last_claimed_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "canClaim", deserialize_with = "lenient_opt_bool")]
    pub can_claim: Option<bool>,
    #[serde(default, rename = "nextClaimTime", deserialize_with = "lenient_time")]
    pub next_claim_time: Option<DateTime<Utc>>,
    /// Server-confirmed transaction count, when the service tracks one
    #[serde(
        default,
        rename = "txCount",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_opt_count"
    )]
    pub tx_count: Option<u64>,
    #[serde(default)]
    pub fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl XpRecord {
    /// The server answered from degraded data
    pub fn is_fallback(&self) -> bool {
        flags_fallback(self.fallback, self.note.as_deref())
    }
}

/// Payload of `GET referral`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferralRecord {
    pub referral_code: Option<String>,
    pub referrer_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub twitter_connected: bool,
    /// XP earned through referrals
    #[serde(default, deserialize_with = "lenient_count")]
    pub xp: u64,
}

/// Payload of `POST referral`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedReferral {
    pub referral_code: String,
}

/// Payload of `POST twitter/connect`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwitterConnection {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub twitter_connected: bool,
    #[serde(default)]
    pub referral_info: Option<Value>,
    #[serde(default)]
    pub fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TwitterConnection {
    pub fn is_fallback(&self) -> bool {
        flags_fallback(self.fallback, self.note.as_deref())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest<'a> {
    pub wallet_address: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralRequest<'a> {
    pub user_wallet: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer_code: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TwitterConnectRequest<'a> {
    pub user_wallet: &'a str,
    pub twitter_token: &'a str,
}

fn count_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_f64().map(sanitize_count),
        Value::String(s) => s.trim().parse::<f64>().ok().map(sanitize_count),
        _ => None,
    }
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(lenient_opt_count(deserializer)?.unwrap_or(0))
}

fn lenient_opt_count<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(count_from_value))
}

fn lenient_opt_bool<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<bool>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" => Some(true),
            "false" | "f" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(lenient_opt_bool(deserializer)?.unwrap_or(false))
}

/// RFC 3339 strings or epoch milliseconds; anything else is treated as absent
fn lenient_time<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Some(Value::Number(n)) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    })
}
