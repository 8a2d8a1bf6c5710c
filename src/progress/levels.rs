//! XP and level derivation
//!
//! Levels are flat 100 XP bands: level 1 covers 0-99 XP, level 2 covers
//! 100-199 XP and so on. Only self-earned XP counts towards the level;
//! referral XP is added to the displayed total but never levels you up.

use serde::Serialize;

/// XP width of every level band
pub const XP_PER_LEVEL: u64 = 100;

/// Level, progress and next reward derived from an XP total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelProgress {
    pub level: u64,
    /// Percent of the way to the next level, 0 - 100
    pub progress: u8,
    /// XP granted for the next claim
    pub xp_reward: u64,
}

impl LevelProgress {
    /// Derive level values from self-earned XP. `tx_count` and
    /// `referral_xp` are ignored.
    pub fn derive(xp_total: u64, _tx_count: u64, _referral_xp: u64) -> Self {
        let level = 1 + xp_total / XP_PER_LEVEL;
        let into_level = xp_total % XP_PER_LEVEL;
        let progress = (100 * into_level / XP_PER_LEVEL) as u8;

        Self {
            level,
            progress,
            xp_reward: XpRewards::BASE.saturating_add(level / 2),
        }
    }

    /// Derive from raw numbers that may be NaN, negative or infinite
    pub fn derive_lenient(xp_total: f64, tx_count: f64, referral_xp: f64) -> Self {
        Self::derive(
            sanitize_count(xp_total),
            sanitize_count(tx_count),
            sanitize_count(referral_xp),
        )
    }
}

impl Default for LevelProgress {
    fn default() -> Self {
        Self::derive(0, 0, 0)
    }
}

/// Coerce a raw number to a non-negative count. NaN, infinities and
/// negative values become 0; fractions are floored.
pub fn sanitize_count(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.floor() as u64
    } else {
        0
    }
}

/// XP rewards for various actions
pub struct XpRewards;

impl XpRewards {
    /// XP for a confirmed on-chain transaction
    pub const TRANSACTION: u64 = 5;

    /// XP assumed for a daily claim the server could not confirm
    pub const DAILY_CLAIM: u64 = 10;

    /// Base of the per-level claim reward
    pub const BASE: u64 = 10;
}
