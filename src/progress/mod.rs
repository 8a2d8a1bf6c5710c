//! Progress system: transaction cycles, XP levels and cycle celebrations
//!
//! Everything in here is pure bookkeeping. The tracker feeds it counts and
//! the UI layer reads back descriptors and display values.

mod celebration;
mod cycle;
mod levels;

pub use celebration::{
    Celebration, CelebrationCoordinator, CoordinatorEvent, ResetPhase, FILL_HOLD, PULSE_DURATION,
    RESET_DURATION,
};
pub use cycle::{CycleInfo, CYCLE_LENGTHS, CYCLE_SET_LENGTH};
pub use levels::{sanitize_count, LevelProgress, XpRewards, XP_PER_LEVEL};
