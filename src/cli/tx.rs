//! Transaction command implementation

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};

use ancient_monad::progress::XpRewards;
use ancient_monad::{CelebrationCoordinator, Config, RpcWallet, TestTransfer};

use super::connect;

/// Record a confirmed transaction, optionally sending a test transfer first
pub async fn tx_command(config: &Config, wallet: &str, send: bool) -> Result<()> {
    let tracker = connect(config, wallet).await?;
    let mut coordinator = CelebrationCoordinator::with_baseline(tracker.snapshot().tx_count);

    let data = if send {
        let mut rpc = RpcWallet::new(config.chain.rpc_url.clone());
        if let Some(account) = &config.chain.account {
            rpc = rpc.with_account(account.clone());
        }
        let (min_wei, max_wei) = config.chain.amount_range()?;

        let transfer = TestTransfer::new(
            Arc::new(rpc),
            Arc::clone(&tracker),
            config.chain.chain_id.clone(),
            config.chain.recipients.clone(),
        )
        .with_amount_range(min_wei, max_wei);

        let receipt = transfer.send().await.context("Test transfer failed")?;
        println!(
            "Sent {} wei to {} (tx {})",
            receipt.amount_wei, receipt.recipient, receipt.tx_hash
        );
        receipt.xp
    } else {
        tracker.update_xp()?
    };

    let event = coordinator.observe(data.tx_count, Instant::now());
    let cycle = data.cycle();

    println!(
        "+{} XP, {} transactions, level {} ({}%)",
        XpRewards::TRANSACTION,
        data.tx_count,
        data.level,
        data.progress
    );

    match event.celebration {
        Some(celebration) if celebration.is_major_milestone => println!(
            "Cycle set complete! {} full sets so far.",
            celebration.completed_full_cycle_sets
        ),
        Some(celebration) => println!(
            "Cycle {} complete ({} transactions)!",
            celebration.cycle_index + 1,
            celebration.cycle_length
        ),
        None => println!(
            "{}: {}/{} ({:.0}%)",
            cycle.name(),
            cycle.tx_in_current_cycle,
            cycle.cycle_length,
            cycle.progress_percentage
        ),
    }

    Ok(())
}
