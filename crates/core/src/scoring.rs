//! Scoring module - score, level, multiplier and countdown rules
//!
//! All rules are pure functions so the engine and its tests share one source of truth:
//! - A clear scores `lines * blocks * 10 * multiplier`, where `lines` counts every
//!   full row and every full column and `blocks` counts unique cleared cells.
//! - The multiplier climbs by one per clearing placement and drops to 1 on any miss.
//! - The level is `score / 1000`.
//! - The countdown is `max(2500, 12000 - 500 * level)` milliseconds.

use crate::types::{
    BASE_MULTIPLIER, POINTS_PER_BLOCK, POINTS_PER_LEVEL, TIMER_BASE_MS, TIMER_FLOOR_MS,
    TIMER_STEP_MS,
};

/// Score calculation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreResult {
    /// Points awarded for this placement
    pub points: u32,
    /// Multiplier to use for the next placement
    pub next_multiplier: u32,
}

/// Points for a clear
/// lines: full rows plus full columns
/// blocks: unique cells cleared
pub fn line_clear_points(lines: u32, blocks: u32, multiplier: u32) -> u32 {
    lines
        .saturating_mul(blocks)
        .saturating_mul(POINTS_PER_BLOCK)
        .saturating_mul(multiplier)
}

/// Multiplier after a placement (or timeout) that cleared `lines` lines
pub fn next_multiplier(multiplier: u32, lines: u32) -> u32 {
    if lines >= 1 {
        multiplier.saturating_add(1)
    } else {
        BASE_MULTIPLIER
    }
}

/// Level reached at `score`
pub fn level_for_score(score: u32) -> u32 {
    score / POINTS_PER_LEVEL
}

/// Countdown length in milliseconds for `level`
pub fn timer_delay_ms(level: u32) -> u32 {
    TIMER_BASE_MS
        .saturating_sub(TIMER_STEP_MS.saturating_mul(level))
        .max(TIMER_FLOOR_MS)
}

/// Calculate complete score for a placement
pub fn calculate_score(lines: u32, blocks: u32, multiplier: u32) -> ScoreResult {
    ScoreResult {
        points: line_clear_points(lines, blocks, multiplier),
        next_multiplier: next_multiplier(multiplier, lines),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_row_on_five_by_five() {
        assert_eq!(line_clear_points(1, 5, 1), 50);
        assert_eq!(line_clear_points(1, 5, 3), 150);
    }

    #[test]
    fn test_row_and_column_counts_lines_twice_blocks_once() {
        assert_eq!(line_clear_points(2, 9, 1), 180);
    }

    #[test]
    fn test_no_lines_no_points() {
        assert_eq!(line_clear_points(0, 0, 7), 0);
    }

    #[test]
    fn test_multiplier_law() {
        assert_eq!(next_multiplier(1, 0), 1);
        assert_eq!(next_multiplier(5, 0), 1);
        assert_eq!(next_multiplier(1, 1), 2);
        assert_eq!(next_multiplier(4, 2), 5);
    }

    #[test]
    fn test_level_law() {
        assert_eq!(level_for_score(0), 0);
        assert_eq!(level_for_score(999), 0);
        assert_eq!(level_for_score(1000), 1);
        assert_eq!(level_for_score(1999), 1);
        assert_eq!(level_for_score(25_300), 25);
    }

    #[test]
    fn test_timer_law() {
        for level in 0..25u32 {
            let expected = 12000i64 - 500 * level as i64;
            assert_eq!(timer_delay_ms(level) as i64, expected.max(2500));
        }
        assert_eq!(timer_delay_ms(0), 12000);
        assert_eq!(timer_delay_ms(19), 2500);
        assert_eq!(timer_delay_ms(30), 2500);
        assert_eq!(timer_delay_ms(u32::MAX), 2500);
    }

    #[test]
    fn test_calculate_score() {
        let r = calculate_score(1, 5, 2);
        assert_eq!(r.points, 100);
        assert_eq!(r.next_multiplier, 3);

        let miss = calculate_score(0, 0, 3);
        assert_eq!(miss, ScoreResult { points: 0, next_multiplier: 1 });
    }
}
