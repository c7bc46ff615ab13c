//! Observable cover state and movement results.

use std::fmt;
use std::time::Duration;

/// Motion state of a cover. Opening and Closing are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Idle,
    Opening,
    Closing,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Idle => "idle",
            Direction::Opening => "opening",
            Direction::Closing => "closing",
        })
    }
}

/// Snapshot sent to observers after every estimate change or stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverState {
    pub id: String,
    /// `None` until the persisted estimate has been restored.
    pub position: Option<u8>,
    pub direction: Direction,
}

impl CoverState {
    pub fn is_closed(&self) -> bool {
        self.position == Some(0)
    }
}

/// Why a movement request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The estimate reached the requested target before the travel time ran out.
    TargetReached,
    /// The full travel time for the direction elapsed.
    TimeBudgetElapsed,
    /// Stopped or preempted while sampling.
    Interrupted,
    /// Cancelled while still waiting for the exclusive section; never moved.
    Superseded,
    /// Calibration sequence completed; estimate re-anchored at 0.
    Calibrated,
}

impl fmt::Display for MoveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MoveOutcome::TargetReached => "target_reached",
            MoveOutcome::TimeBudgetElapsed => "time_budget_elapsed",
            MoveOutcome::Interrupted => "interrupted",
            MoveOutcome::Superseded => "superseded",
            MoveOutcome::Calibrated => "calibrated",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveReport {
    pub outcome: MoveOutcome,
    /// Estimate when the request finished.
    pub position: u8,
    /// Time spent holding the exclusive section.
    pub elapsed: Duration,
}
