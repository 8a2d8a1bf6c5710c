//! Claim command implementation

use anyhow::Result;

use ancient_monad::tracker::ClaimOutcome;
use ancient_monad::Config;

use super::{connect, print_xp};

/// Claim the daily XP reward
pub async fn claim_command(config: &Config, wallet: &str) -> Result<()> {
    let tracker = connect(config, wallet).await?;

    match tracker.claim_daily_reward().await? {
        ClaimOutcome::Confirmed => println!("Daily reward claimed."),
        ClaimOutcome::Fallback { reason } => {
            println!("Daily reward recorded locally; the XP service will catch up.");
            println!("  Reason: {}", reason);
        }
        ClaimOutcome::Blocked { next_claim_time } => {
            match next_claim_time {
                Some(next) => println!("Cannot claim yet. Next claim at {}", next.to_rfc3339()),
                None => println!("Cannot claim yet."),
            }
            return Ok(());
        }
    }

    println!();
    print_xp(&tracker.snapshot());
    Ok(())
}
