//! Time-based position estimation.
//!
//! The relays report nothing, so position is derived from elapsed time under
//! a constant-speed assumption: full travel takes the configured opening or
//! closing time, and partial travel scales linearly.

use std::time::Duration;

use crate::state::Direction;

pub const MIN_POSITION: u8 = 0;
pub const MAX_POSITION: u8 = 100;
const MAX_PERCENT: f64 = 100.0;

/// Clamp a requested target into `[0, 100]`.
#[inline]
pub fn clamp_target(target: i32) -> u8 {
    target.clamp(i32::from(MIN_POSITION), i32::from(MAX_POSITION)) as u8
}

/// Opening when the target lies above the current estimate, otherwise Closing
/// (including the equal case).
#[inline]
pub fn direction_for(initial: u8, target: u8) -> Direction {
    if target > initial {
        Direction::Opening
    } else {
        Direction::Closing
    }
}

/// Percent of full travel covered after `elapsed`. A zero budget counts as
/// complete travel.
#[inline]
pub fn progress_percent(elapsed: Duration, budget: Duration) -> f64 {
    if budget.is_zero() {
        return MAX_PERCENT;
    }
    elapsed.as_secs_f64() / budget.as_secs_f64() * MAX_PERCENT
}

/// Exact position after `progress` percent of travel from `initial`,
/// never overshooting `target`. Non-finite progress counts as full travel.
#[inline]
pub fn travelled(initial: u8, target: u8, direction: Direction, progress: f64) -> f64 {
    let progress = if progress.is_finite() {
        progress.max(0.0)
    } else {
        MAX_PERCENT
    };
    let start = f64::from(initial);
    let raw = match direction {
        Direction::Opening => (start + progress).min(f64::from(target)),
        Direction::Closing => (start - progress).max(f64::from(target)),
        Direction::Idle => start,
    };
    raw.clamp(f64::from(MIN_POSITION), f64::from(MAX_POSITION))
}

/// Round an exact position to the whole percent that is published and stored.
#[inline]
pub fn to_percent(exact: f64) -> u8 {
    exact
        .round()
        .clamp(f64::from(MIN_POSITION), f64::from(MAX_POSITION)) as u8
}

/// [`travelled`] rounded to a whole percent.
#[inline]
pub fn estimate(initial: u8, target: u8, direction: Direction, progress: f64) -> u8 {
    to_percent(travelled(initial, target, direction, progress))
}

/// Whether the exact `position` has reached `target` for the active
/// direction. Compare unrounded values: 49.5 has not reached 50.
#[inline]
pub fn reached(position: f64, target: u8, direction: Direction) -> bool {
    match direction {
        Direction::Opening => position >= f64::from(target),
        Direction::Closing => position <= f64::from(target),
        Direction::Idle => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(-20, 0)]
    #[case(0, 0)]
    #[case(55, 55)]
    #[case(100, 100)]
    #[case(250, 100)]
    fn clamps_targets(#[case] input: i32, #[case] expected: u8) {
        assert_eq!(clamp_target(input), expected);
    }

    #[test]
    fn equal_target_closes() {
        assert_eq!(direction_for(40, 40), Direction::Closing);
        assert_eq!(direction_for(40, 41), Direction::Opening);
        assert_eq!(direction_for(40, 39), Direction::Closing);
    }

    #[test]
    fn progress_scales_linearly() {
        let budget = Duration::from_secs(10);
        assert_eq!(progress_percent(Duration::ZERO, budget), 0.0);
        assert!((progress_percent(Duration::from_secs(4), budget) - 40.0).abs() < 1e-9);
        assert_eq!(progress_percent(Duration::from_secs(3), Duration::ZERO), 100.0);
    }

    #[test]
    fn estimate_stops_at_target() {
        assert_eq!(estimate(20, 50, Direction::Opening, 10.0), 30);
        assert_eq!(estimate(20, 50, Direction::Opening, 90.0), 50);
        assert_eq!(estimate(80, 30, Direction::Closing, 25.0), 55);
        assert_eq!(estimate(80, 30, Direction::Closing, 75.0), 30);
        assert_eq!(estimate(80, 30, Direction::Idle, 75.0), 80);
    }

    #[test]
    fn half_percent_short_is_not_reached() {
        let exact = travelled(0, 50, Direction::Opening, 49.5);
        assert_eq!(to_percent(exact), 50);
        assert!(!reached(exact, 50, Direction::Opening));
        assert!(reached(travelled(0, 50, Direction::Opening, 50.0), 50, Direction::Opening));

        let exact = travelled(80, 30, Direction::Closing, 49.6);
        assert_eq!(to_percent(exact), 30);
        assert!(!reached(exact, 30, Direction::Closing));
    }

    #[test]
    fn estimate_tolerates_non_finite_progress() {
        assert_eq!(estimate(0, 100, Direction::Opening, f64::NAN), 100);
        assert_eq!(estimate(60, 0, Direction::Closing, f64::INFINITY), 0);
    }

    proptest! {
        #[test]
        fn estimate_stays_between_initial_and_target(
            initial in 0u8..=100,
            target in 0u8..=100,
            progress in 0.0f64..300.0,
        ) {
            let dir = direction_for(initial, target);
            let p = estimate(initial, target, dir, progress);
            prop_assert!(p <= MAX_POSITION);
            let (lo, hi) = if initial <= target { (initial, target) } else { (target, initial) };
            prop_assert!((lo..=hi).contains(&p));
        }

        #[test]
        fn estimate_is_monotonic_in_progress(
            initial in 0u8..=100,
            target in 0u8..=100,
            a in 0.0f64..150.0,
            b in 0.0f64..150.0,
        ) {
            let dir = direction_for(initial, target);
            let (early, late) = if a <= b { (a, b) } else { (b, a) };
            let p0 = estimate(initial, target, dir, early);
            let p1 = estimate(initial, target, dir, late);
            match dir {
                Direction::Opening => prop_assert!(p0 <= p1),
                _ => prop_assert!(p0 >= p1),
            }
        }
    }
}
