use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::progress::{CycleInfo, LevelProgress, XpRewards};

/// XP state for the connected wallet
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct XpData {
    /// Self-earned XP, referral XP excluded
    pub xp_total: u64,
    /// Always `xp_total + referral_xp`
    pub total_xp: u64,
    pub referral_xp: u64,
    /// Lifetime transactions attributed to the wallet
    pub tx_count: u64,
    pub claim_count: u64,
    pub last_claimed_at: Option<DateTime<Utc>>,
    pub next_claim_time: Option<DateTime<Utc>>,
    pub can_claim: bool,
    pub level: u64,
    /// Percent of the way to the next level
    pub progress: u8,
    pub xp_reward: u64,
    pub referral_code: Option<String>,
    pub referrer_code: Option<String>,
    pub twitter_connected: bool,
    /// Some field came from the local ledger or from a degraded server answer
    pub using_fallback_data: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Default for XpData {
    fn default() -> Self {
        Self {
            xp_total: 0,
            total_xp: 0,
            referral_xp: 0,
            tx_count: 0,
            claim_count: 0,
            last_claimed_at: None,
            next_claim_time: None,
            can_claim: true,
            level: 1,
            progress: 0,
            xp_reward: XpRewards::BASE,
            referral_code: None,
            referrer_code: None,
            twitter_connected: false,
            using_fallback_data: false,
            is_loading: false,
            error: None,
        }
    }
}

impl XpData {
    /// Recompute every derived field from the stored counters.
    ///
    /// Called after each mutation so `total_xp`, the level fields and
    /// `can_claim` never drift from their inputs.
    pub fn refresh_derived(&mut self, now: DateTime<Utc>) {
        let derived = LevelProgress::derive(self.xp_total, self.tx_count, self.referral_xp);
        self.level = derived.level;
        self.progress = derived.progress;
        self.xp_reward = derived.xp_reward;
        self.total_xp = self.xp_total.saturating_add(self.referral_xp);
        self.can_claim = self.next_claim_time.is_none_or(|t| now >= t);
    }

    /// Cycle descriptor for the current transaction count
    pub fn cycle(&self) -> CycleInfo {
        CycleInfo::for_tx_count(self.tx_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_defaults() {
        let data = XpData::default();
        assert_eq!(data.level, 1);
        assert_eq!(data.xp_reward, 10);
        assert!(data.can_claim);
        assert!(!data.using_fallback_data);
        assert_eq!(data.cycle().cycle_index, 0);
    }

    #[test]
    fn test_refresh_derived() {
        let now = Utc::now();
        let mut data = XpData {
            xp_total: 250,
            referral_xp: 40,
            next_claim_time: Some(now + Duration::hours(3)),
            ..Default::default()
        };
        data.refresh_derived(now);

        assert_eq!(data.total_xp, 290);
        assert_eq!(data.level, 3);
        assert_eq!(data.progress, 50);
        assert_eq!(data.xp_reward, 11);
        assert!(!data.can_claim);

        data.refresh_derived(now + Duration::hours(3));
        assert!(data.can_claim);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(XpData::default()).unwrap();
        assert_eq!(json["xpTotal"], 0);
        assert_eq!(json["canClaim"], true);
        assert_eq!(json["usingFallbackData"], false);
        assert!(json["nextClaimTime"].is_null());
    }
}
