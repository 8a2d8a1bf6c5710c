//! Cycle completion celebrations
//!
//! Watches the transaction count, fires a short pulse on every increase and
//! runs the fill-then-drain reset sequence when a cycle closes:
//!
//! ```text
//!  Idle ──cycle closed──► Filling (100%) ──600ms──► Draining (0%) ──800ms──► Idle
//!    ▲                                                                        │
//!    └──────────────────── cancel_reset() / count decreased ◄─────────────────┘
//! ```
//!
//! While the sequence runs the displayed progress is frozen, so a second
//! transaction landing mid-reset only updates the count that is shown once
//! the guard releases. Time is passed in explicitly; nothing here spawns
//! timers.

use std::time::{Duration, Instant};

use serde::Serialize;

use super::cycle::{CycleInfo, CYCLE_LENGTHS, CYCLE_SET_LENGTH};

/// How long the pulse cue stays visible
pub const PULSE_DURATION: Duration = Duration::from_millis(800);

/// How long progress is pinned at 100% before draining
pub const FILL_HOLD: Duration = Duration::from_millis(600);

/// Length of the drain animation back to 0%
pub const RESET_DURATION: Duration = Duration::from_millis(800);

/// State of the progress reset sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetPhase {
    Idle,
    /// Progress pinned at 100% until the deadline
    Filling { until: Instant },
    /// Progress animating to 0% until the deadline
    Draining { until: Instant },
}

/// A completed cycle waiting to be celebrated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Celebration {
    pub cycle_index: usize,
    pub cycle_length: u64,
    /// The longest cycle closed, finishing a whole set
    pub is_major_milestone: bool,
    pub completed_full_cycle_sets: u64,
}

/// What a single count observation triggered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorEvent {
    pub pulse: bool,
    pub celebration: Option<Celebration>,
    /// The count went down and was taken as a new baseline
    pub rebaselined: bool,
}

#[derive(Debug)]
pub struct CelebrationCoordinator {
    last_tx_count: u64,
    phase: ResetPhase,
    pulse_until: Option<Instant>,
    celebration: Option<Celebration>,
}

impl CelebrationCoordinator {
    pub fn new() -> Self {
        Self::with_baseline(0)
    }

    /// Start from a known count so it is not replayed as an increase
    pub fn with_baseline(tx_count: u64) -> Self {
        Self {
            last_tx_count: tx_count,
            phase: ResetPhase::Idle,
            pulse_until: None,
            celebration: None,
        }
    }

    /// Feed the latest transaction count
    pub fn observe(&mut self, tx_count: u64, now: Instant) -> CoordinatorEvent {
        self.tick(now);
        let mut event = CoordinatorEvent::default();

        if tx_count < self.last_tx_count {
            tracing::debug!(
                "Transaction count dropped {} -> {}, rebaselining",
                self.last_tx_count,
                tx_count
            );
            self.rebaseline(tx_count);
            event.rebaselined = true;
            return event;
        }

        if tx_count == self.last_tx_count {
            return event;
        }

        self.last_tx_count = tx_count;
        self.pulse_until = Some(now + PULSE_DURATION);
        event.pulse = true;

        if let Some(celebration) = Self::completed_cycle(tx_count) {
            tracing::info!(
                "Cycle {} completed! ({} transactions)",
                celebration.cycle_index + 1,
                celebration.cycle_length
            );
            self.celebration = Some(celebration);
            self.phase = ResetPhase::Filling {
                until: now + FILL_HOLD,
            };
            event.celebration = Some(celebration);
        }

        event
    }

    fn completed_cycle(tx_count: u64) -> Option<Celebration> {
        let info = CycleInfo::for_tx_count(tx_count);

        if info.is_last_tx_in_cycle {
            return Some(Celebration {
                cycle_index: info.cycle_index,
                cycle_length: info.cycle_length,
                is_major_milestone: info.is_major_milestone(),
                completed_full_cycle_sets: info.completed_full_cycle_sets,
            });
        }

        // The last transaction of a set wraps to the start of the next one,
        // so the longest cycle never reports itself as closed.
        if tx_count > 0 && tx_count % CYCLE_SET_LENGTH == 0 {
            let last = CYCLE_LENGTHS.len() - 1;
            return Some(Celebration {
                cycle_index: last,
                cycle_length: CYCLE_LENGTHS[last],
                is_major_milestone: true,
                completed_full_cycle_sets: info.completed_full_cycle_sets,
            });
        }

        None
    }

    /// Advance the reset sequence to `now`
    pub fn tick(&mut self, now: Instant) {
        if let Some(until) = self.pulse_until {
            if now >= until {
                self.pulse_until = None;
            }
        }

        if let ResetPhase::Filling { until } = self.phase {
            if now >= until {
                self.phase = ResetPhase::Draining {
                    until: until + RESET_DURATION,
                };
            }
        }

        if let ResetPhase::Draining { until } = self.phase {
            if now >= until {
                self.phase = ResetPhase::Idle;
            }
        }
    }

    /// Abort a running reset (wallet switch, unmount)
    pub fn cancel_reset(&mut self) {
        self.phase = ResetPhase::Idle;
    }

    /// Drop all transient state and start over from `tx_count`
    pub fn rebaseline(&mut self, tx_count: u64) {
        self.last_tx_count = tx_count;
        self.pulse_until = None;
        self.celebration = None;
        self.cancel_reset();
    }

    pub fn phase(&self) -> ResetPhase {
        self.phase
    }

    /// The reset guard: displayed progress is frozen while this is true
    pub fn is_resetting(&self) -> bool {
        self.phase != ResetPhase::Idle
    }

    pub fn pulse_active(&self, now: Instant) -> bool {
        self.pulse_until.is_some_and(|until| now < until)
    }

    /// Progress the ring should show right now (0.0 - 100.0)
    pub fn display_progress(&mut self, now: Instant) -> f64 {
        self.tick(now);
        match self.phase {
            ResetPhase::Filling { .. } => 100.0,
            ResetPhase::Draining { .. } => 0.0,
            ResetPhase::Idle => {
                let info = CycleInfo::for_tx_count(self.last_tx_count);
                // A closed cycle has already drained; show the next one empty
                if info.is_last_tx_in_cycle {
                    0.0
                } else {
                    info.progress_percentage
                }
            }
        }
    }

    pub fn active_celebration(&self) -> Option<&Celebration> {
        self.celebration.as_ref()
    }

    /// Called once the celebration has finished playing
    pub fn acknowledge_celebration(&mut self) -> Option<Celebration> {
        self.celebration.take()
    }

    pub fn last_tx_count(&self) -> u64 {
        self.last_tx_count
    }
}

impl Default for CelebrationCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_celebrates_once_on_first_cycle() {
        let start = Instant::now();
        let mut coordinator = CelebrationCoordinator::new();
        let mut celebrations = Vec::new();

        for (i, count) in (1..=3).enumerate() {
            let now = start + Duration::from_secs(i as u64 * 5);
            let event = coordinator.observe(count, now);
            assert!(event.pulse);
            if let Some(c) = event.celebration {
                celebrations.push((count, c));
            }
        }

        assert_eq!(celebrations.len(), 1);
        let (count, celebration) = celebrations[0];
        assert_eq!(count, 3);
        assert_eq!(celebration.cycle_index, 0);
        assert!(!celebration.is_major_milestone);
    }

    #[test]
    fn test_reset_sequence() {
        let start = Instant::now();
        let mut coordinator = CelebrationCoordinator::with_baseline(2);

        coordinator.observe(3, start);
        assert!(coordinator.is_resetting());
        assert_eq!(coordinator.display_progress(start), 100.0);

        let draining = start + FILL_HOLD;
        assert_eq!(coordinator.display_progress(draining), 0.0);
        assert!(matches!(coordinator.phase(), ResetPhase::Draining { .. }));

        let done = draining + RESET_DURATION;
        coordinator.tick(done);
        assert!(!coordinator.is_resetting());
        assert_eq!(coordinator.display_progress(done), 0.0);
    }

    #[test]
    fn test_guard_holds_during_second_transaction() {
        let start = Instant::now();
        let mut coordinator = CelebrationCoordinator::with_baseline(2);
        coordinator.observe(3, start);

        // Second transaction arrives mid-drain
        let mid = start + FILL_HOLD + Duration::from_millis(100);
        let event = coordinator.observe(4, mid);
        assert!(event.pulse);
        assert!(event.celebration.is_none());
        assert!(coordinator.is_resetting());
        assert_eq!(coordinator.display_progress(mid), 0.0);

        // Guard releases by itself, then the new count shows
        let after = start + FILL_HOLD + RESET_DURATION;
        let shown = coordinator.display_progress(after);
        assert!(!coordinator.is_resetting());
        assert!((shown - 100.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_decrease_rebaselines_and_clears_guard() {
        let start = Instant::now();
        let mut coordinator = CelebrationCoordinator::with_baseline(9);
        coordinator.observe(10, start);
        assert!(coordinator.is_resetting());
        assert!(coordinator.active_celebration().is_some());

        let event = coordinator.observe(0, start + Duration::from_millis(50));
        assert!(event.rebaselined);
        assert!(!event.pulse);
        assert!(!coordinator.is_resetting());
        assert!(coordinator.active_celebration().is_none());
        assert_eq!(coordinator.last_tx_count(), 0);

        // Climbing again from the new baseline works normally
        let event = coordinator.observe(1, start + Duration::from_secs(1));
        assert!(event.pulse);
    }

    #[test]
    fn test_no_event_without_change() {
        let now = Instant::now();
        let mut coordinator = CelebrationCoordinator::with_baseline(5);
        assert_eq!(coordinator.observe(5, now), CoordinatorEvent::default());
        assert!(!coordinator.pulse_active(now));
    }

    #[test]
    fn test_pulse_expires() {
        let now = Instant::now();
        let mut coordinator = CelebrationCoordinator::new();
        coordinator.observe(1, now);
        assert!(coordinator.pulse_active(now));
        coordinator.tick(now + PULSE_DURATION);
        assert!(!coordinator.pulse_active(now + PULSE_DURATION));
    }

    #[test]
    fn test_full_set_is_major_milestone() {
        let now = Instant::now();
        let mut coordinator = CelebrationCoordinator::with_baseline(CYCLE_SET_LENGTH - 1);
        let event = coordinator.observe(CYCLE_SET_LENGTH, now);

        let celebration = event.celebration.expect("set completion celebrates");
        assert!(celebration.is_major_milestone);
        assert_eq!(celebration.cycle_index, CYCLE_LENGTHS.len() - 1);
        assert_eq!(celebration.completed_full_cycle_sets, 1);
    }

    #[test]
    fn test_cancel_and_acknowledge() {
        let now = Instant::now();
        let mut coordinator = CelebrationCoordinator::with_baseline(2);
        coordinator.observe(3, now);

        coordinator.cancel_reset();
        assert!(!coordinator.is_resetting());
        assert!(coordinator.active_celebration().is_some());
        assert!(coordinator.acknowledge_celebration().is_some());
        assert!(coordinator.active_celebration().is_none());
    }
}
