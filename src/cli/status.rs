//! Status command implementation

use anyhow::{Context, Result};
use serde_json::json;

use ancient_monad::tracker::ClaimWatch;
use ancient_monad::Config;

use super::{connect, print_xp};

/// Show XP and cycle progress for a wallet
pub async fn status_command(config: &Config, wallet: &str, as_json: bool, watch: bool) -> Result<()> {
    let tracker = connect(config, wallet).await?;
    let data = tracker.snapshot();
    let cycle = data.cycle();

    if as_json {
        let output = json!({ "xp": data, "cycle": cycle });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialize status")?
        );
    } else {
        println!("Wallet {}\n", wallet);
        print_xp(&data);
        println!(
            "\n  {}: {}/{} transactions ({:.0}%)",
            cycle.name(),
            cycle.tx_in_current_cycle,
            cycle.cycle_length,
            cycle.progress_percentage
        );
        if cycle.completed_full_cycle_sets > 0 {
            println!("  Completed cycle sets: {}", cycle.completed_full_cycle_sets);
        }
    }

    if !watch {
        return Ok(());
    }

    println!("\nWatching for the claim window (Ctrl-C to stop)...");
    let _watch = ClaimWatch::spawn(&tracker, config.claims.watch_interval());
    let mut updates = tracker.subscribe();
    let mut could_claim = data.can_claim;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let can_claim = updates.borrow_and_update().can_claim;
                if can_claim && !could_claim {
                    println!("Daily claim is available.");
                }
                could_claim = can_claim;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}
