//! Transaction cycles
//!
//! Lifetime transaction counts are split into cycles of increasing length.
//! One pass through every cycle is a "set"; sets repeat indefinitely.

use serde::Serialize;

/// Cycle lengths in transactions (must stay non-empty and non-zero)
pub const CYCLE_LENGTHS: [u64; 6] = [3, 7, 15, 40, 70, 100];

/// Transactions in one full set of cycles
pub const CYCLE_SET_LENGTH: u64 = cycle_set_length();

const fn cycle_set_length() -> u64 {
    let mut total = 0;
    let mut i = 0;
    while i < CYCLE_LENGTHS.len() {
        total += CYCLE_LENGTHS[i];
        i += 1;
    }
    total
}

/// Where a lifetime transaction count sits within the cycle sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CycleInfo {
    pub cycle_index: usize,
    pub cycle_length: u64,
    pub tx_in_current_cycle: u64,
    /// 0.0 - 100.0
    pub progress_percentage: f64,
    pub total_tx_count: u64,
    pub completed_full_cycle_sets: u64,
    /// The latest transaction closed the current cycle
    pub is_last_tx_in_cycle: bool,
}

impl CycleInfo {
    /// Compute the cycle descriptor for a lifetime transaction count
    pub fn for_tx_count(total_tx_count: u64) -> Self {
        let adjusted = total_tx_count % CYCLE_SET_LENGTH;

        let mut tx_in_previous_cycles = 0;
        let mut cycle_index = CYCLE_LENGTHS.len() - 1;
        for (i, &length) in CYCLE_LENGTHS.iter().enumerate() {
            if adjusted <= tx_in_previous_cycles + length {
                cycle_index = i;
                break;
            }
            tx_in_previous_cycles += length;
        }

        let cycle_length = CYCLE_LENGTHS[cycle_index];
        let tx_in_current_cycle = adjusted - tx_in_previous_cycles;

        Self {
            cycle_index,
            cycle_length,
            tx_in_current_cycle,
            progress_percentage: 100.0 * tx_in_current_cycle as f64 / cycle_length as f64,
            total_tx_count,
            completed_full_cycle_sets: total_tx_count / CYCLE_SET_LENGTH,
            is_last_tx_in_cycle: total_tx_count > 0 && tx_in_current_cycle == cycle_length,
        }
    }

    /// Display name, 1-based
    pub fn name(&self) -> String {
        format!("Cycle {}", self.cycle_index + 1)
    }

    /// Closing the longest cycle finishes a whole set
    pub fn is_major_milestone(&self) -> bool {
        self.is_last_tx_in_cycle && self.cycle_index == CYCLE_LENGTHS.len() - 1
    }
}
