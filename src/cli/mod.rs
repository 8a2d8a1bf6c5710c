//! CLI command implementations

pub mod claim;
pub mod cycle;
pub mod init;
pub mod referral;
pub mod status;
pub mod twitter;
pub mod tx;

use std::sync::Arc;

use anyhow::{Context, Result};

use ancient_monad::tracker::{Settled, XpData, XpTracker};
use ancient_monad::{Config, HttpXpService, SqliteStore};

/// Tracker wired to the configured service and on-disk ledger
pub fn build_tracker(config: &Config) -> Result<Arc<XpTracker>> {
    let ledger_path = config.ledger_path();
    let store = SqliteStore::open(&ledger_path)
        .with_context(|| format!("Failed to open ledger: {}", ledger_path.display()))?;
    let service = HttpXpService::new(config.api_client());

    let tracker = XpTracker::new(Arc::new(service), Arc::new(store))
        .with_retry_policy(config.retry.policy())
        .with_twitter_attempts(config.twitter.connect_attempts);

    Ok(Arc::new(tracker))
}

/// Build a tracker and connect `wallet`, printing any fallback notice
pub async fn connect(config: &Config, wallet: &str) -> Result<Arc<XpTracker>> {
    let tracker = build_tracker(config)?;
    let loaded = tracker
        .connect_wallet(wallet)
        .await
        .with_context(|| format!("Failed to connect wallet {}", wallet))?;

    if let Settled::Fallback { reason, .. } = &loaded {
        eprintln!("Note: using local data ({})", reason);
    }
    Ok(tracker)
}

pub fn print_xp(data: &XpData) {
    println!("  Level:        {} ({}% to next)", data.level, data.progress);
    println!(
        "  XP:           {} total ({} earned + {} referral)",
        data.total_xp, data.xp_total, data.referral_xp
    );
    println!("  Next reward:  {} XP", data.xp_reward);
    println!("  Transactions: {}", data.tx_count);
    println!("  Claims:       {}", data.claim_count);

    if data.can_claim {
        println!("  Daily claim:  available");
    } else if let Some(next) = data.next_claim_time {
        println!("  Daily claim:  available at {}", next.to_rfc3339());
    }

    if let Some(code) = &data.referral_code {
        println!("  Referral:     {}", code);
    }
    if let Some(code) = &data.referrer_code {
        println!("  Referred by:  {}", code);
    }
    println!(
        "  Twitter:      {}",
        if data.twitter_connected {
            "connected"
        } else {
            "not connected"
        }
    );

    if data.using_fallback_data {
        println!("  (showing cached data)");
    }
    if let Some(error) = &data.error {
        println!("  Note: {}", error);
    }
}
