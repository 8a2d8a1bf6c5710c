//! Referral command implementation

use anyhow::Result;

use ancient_monad::tracker::Settled;
use ancient_monad::Config;

use super::connect;

/// Get or create the wallet's referral code
pub async fn referral_command(config: &Config, wallet: &str, referrer: Option<&str>) -> Result<()> {
    let tracker = connect(config, wallet).await?;

    match tracker.create_referral(referrer).await? {
        Settled::Confirmed { value } => println!("Referral code: {}", value),
        Settled::Fallback { value, reason } => {
            println!("Referral code: {} (local only, not registered)", value);
            println!("  Reason: {}", reason);
        }
    }

    Ok(())
}
