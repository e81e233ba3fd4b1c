//! Scoring - match points, cascade multiplier and activation points

use crate::matcher::{MatchResult, MIN_RUN};
use crate::types::{
    LevelConfig, BONUS_PIECE_POINTS, BONUS_SPECIAL_CLEAR_POINTS, CASCADE_DENOMINATOR,
    CASCADE_NUMERATOR_BASE, SCORE_EXTRA_PIECE, SCORE_L_SHAPE, SCORE_RUN_3, SCORE_RUN_4,
    SCORE_RUN_5, SPECIAL_CLEAR_POINTS,
};

/// Points for a match before the cascade multiplier
pub fn base_match_score(m: &MatchResult) -> u32 {
    let shape = if m.is_l_shape {
        SCORE_L_SHAPE
    } else {
        match m.length {
            0..=3 => SCORE_RUN_3,
            4 => SCORE_RUN_4,
            _ => SCORE_RUN_5,
        }
    };
    let extra = m.size().saturating_sub(MIN_RUN) as u32;
    shape + extra * SCORE_EXTRA_PIECE
}

/// Points for a match cleared at cascade `depth` (0 = the player's own move).
///
/// The multiplier is `1 + depth / 2`, truncated.
///
/// # Examples
///
/// ```
/// use match_three_core::{find_matches, calculate_match_score, Board};
///
/// let board = Board::from_layout(&["GGGG", "RBYB", "BYRY"]).unwrap();
/// let m = &find_matches(&board)[0];
/// assert_eq!(calculate_match_score(m, 0), 250);
/// assert_eq!(calculate_match_score(m, 2), 500);
/// ```
pub fn calculate_match_score(m: &MatchResult, depth: u32) -> u32 {
    base_match_score(m) * (CASCADE_NUMERATOR_BASE + depth) / CASCADE_DENOMINATOR
}

/// Flat points for cells cleared by special activations, combos or power-ups
pub fn special_clear_score(cells: usize, bonus: bool) -> u32 {
    let per_cell = if bonus {
        BONUS_SPECIAL_CLEAR_POINTS
    } else {
        SPECIAL_CLEAR_POINTS
    };
    cells as u32 * per_cell
}

/// Points for a plain piece destroyed by a bonus move
pub fn bonus_piece_score() -> u32 {
    BONUS_PIECE_POINTS
}

/// Star rating (0-3) for a final score
pub fn star_rating(config: &LevelConfig, score: u32) -> u8 {
    config.stars(score)
}
