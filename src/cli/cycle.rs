//! Cycle command implementation

use anyhow::{Context, Result};

use ancient_monad::CycleInfo;

/// Print the cycle descriptor for a transaction count
pub async fn cycle_command(tx_count: u64, as_json: bool) -> Result<()> {
    let info = CycleInfo::for_tx_count(tx_count);

    if as_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&info).context("Failed to serialize cycle")?
        );
        return Ok(());
    }

    println!("{} transactions:", tx_count);
    println!("  {} of {}", info.name(), ancient_monad::CYCLE_LENGTHS.len());
    println!(
        "  Progress:  {}/{} ({:.1}%)",
        info.tx_in_current_cycle, info.cycle_length, info.progress_percentage
    );
    println!("  Full sets: {}", info.completed_full_cycle_sets);
    if info.is_last_tx_in_cycle {
        println!("  This transaction closes the cycle.");
    }

    Ok(())
}
