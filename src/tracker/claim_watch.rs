//! Background refresh once the claim cooldown ends

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;

use super::XpTracker;

/// Periodic check that refetches XP data when `next_claim_time` has passed,
/// so `can_claim` flips without user action. Stops when dropped or when the
/// tracker goes away.
#[derive(Debug)]
pub struct ClaimWatch {
    task: JoinHandle<()>,
}

impl ClaimWatch {
    pub fn spawn(tracker: &Arc<XpTracker>, interval: Duration) -> Self {
        let tracker = Arc::downgrade(tracker);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(tracker) = tracker.upgrade() else {
                    break;
                };

                if tracker.claim_window_open(Utc::now()) {
                    tracing::debug!("Claim cooldown passed, refreshing XP data");
                    if let Err(e) = tracker.fetch_xp_data().await {
                        tracing::debug!("Claim window refresh skipped: {}", e);
                    }
                }
            }
        });

        Self { task }
    }

    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ClaimWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}
