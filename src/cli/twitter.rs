//! Twitter command implementation

use anyhow::Result;

use ancient_monad::tracker::Settled;
use ancient_monad::Config;

use super::connect;

/// Link a Twitter account to the wallet
pub async fn twitter_command(config: &Config, wallet: &str, token: &str) -> Result<()> {
    let tracker = connect(config, wallet).await?;

    match tracker.connect_twitter(token).await? {
        Settled::Confirmed { .. } => println!("Twitter account linked."),
        Settled::Fallback { reason, .. } => {
            println!("Twitter marked as linked locally; the XP service did not confirm.");
            println!("  Reason: {}", reason);
        }
    }

    Ok(())
}
