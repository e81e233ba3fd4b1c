//! Deadlock detection, hints and reshuffling
//!
//! A board is deadlocked when no swap of two adjacent swappable cells would be
//! accepted by the session. The checks here mirror the session's swap rules, so a
//! hint is always a move the session takes.

use crate::board::Board;
use crate::matcher::{find_matches, MatchResult};
use crate::rng::SimpleRng;
use crate::types::{Position, SpecialKind};

/// How a reshuffle went
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReshuffleOutcome {
    pub attempts: u32,
    /// False when the attempt bound ran out; the best arrangement is kept
    pub success: bool,
}

/// Pieces of one color in a straight line through `pos`, counting `pos` itself
fn line_length(board: &Board, pos: Position, dr: i32, dc: i32) -> usize {
    let Some(color) = board.piece(pos).map(|p| p.color) else {
        return 0;
    };
    let same = |p: Position| board.piece(p).is_some_and(|q| q.color == color);

    let mut count = 1;
    let mut p = pos.offset(dr, dc);
    while same(p) {
        count += 1;
        p = p.offset(dr, dc);
    }
    let mut p = pos.offset(-dr, -dc);
    while same(p) {
        count += 1;
        p = p.offset(-dr, -dc);
    }
    count
}

fn completes_run(board: &Board, pos: Position) -> bool {
    line_length(board, pos, 0, 1) >= 3 || line_length(board, pos, 1, 0) >= 3
}

/// Swap validity on a scratch board (restored before returning)
fn check_swap(scratch: &mut Board, a: Position, b: Position) -> bool {
    if !a.is_adjacent(b) || !scratch.is_swappable(a) || !scratch.is_swappable(b) {
        return false;
    }
    let (Some(pa), Some(pb)) = (scratch.piece(a), scratch.piece(b)) else {
        return false;
    };
    if pa.is_special() && pb.is_special() {
        return true;
    }
    if pa.special == Some(SpecialKind::ColorClear) || pb.special == Some(SpecialKind::ColorClear) {
        return true;
    }

    scratch.swap(a, b);
    let matched = completes_run(scratch, a) || completes_run(scratch, b);
    scratch.swap(a, b);
    matched
}

/// Swapping `a` and `b` would be accepted on a settled board
pub fn is_valid_move(board: &Board, a: Position, b: Position) -> bool {
    let mut scratch = board.clone();
    check_swap(&mut scratch, a, b)
}

/// First valid move scanning left-to-right, top-to-bottom, trying right then down
///
/// # Examples
///
/// ```
/// use match_three_core::{find_valid_move, Board};
/// use match_three_core::types::Position;
///
/// let board = Board::from_layout(&["RRGR", "GBYB", "BYGY"]).unwrap();
/// assert_eq!(
///     find_valid_move(&board),
///     Some((Position::new(0, 2), Position::new(0, 3)))
/// );
/// ```
pub fn find_valid_move(board: &Board) -> Option<(Position, Position)> {
    let mut scratch = board.clone();
    let positions: Vec<Position> = board.positions().collect();
    for pos in positions {
        for next in [pos.offset(0, 1), pos.offset(1, 0)] {
            if check_swap(&mut scratch, pos, next) {
                return Some((pos, next));
            }
        }
    }
    None
}

pub fn has_valid_moves(board: &Board) -> bool {
    find_valid_move(board).is_some()
}

/// Cells covered by any current match
fn matched_cells(matches: &[MatchResult]) -> usize {
    matches.iter().map(|m| m.size()).sum()
}

/// Permute the pieces over their cells until the board has no match and at least
/// one valid move, trying at most `max_attempts` arrangements.
///
/// Walls, ice, locks and bombs stay where they are; only pieces move.
pub fn reshuffle(board: &mut Board, rng: &mut SimpleRng, max_attempts: u32) -> ReshuffleOutcome {
    let slots: Vec<Position> = board.pieces().map(|(pos, _)| pos).collect();
    let mut pieces: Vec<_> = board.pieces().map(|(_, piece)| piece).collect();
    if slots.is_empty() {
        return ReshuffleOutcome {
            attempts: 0,
            success: false,
        };
    }

    // (has a move, fewest matched cells) ranks the fallback arrangement
    let mut best: Option<(bool, usize, Vec<_>)> = None;

    for attempt in 1..=max_attempts {
        rng.shuffle(&mut pieces);
        for (&pos, &piece) in slots.iter().zip(&pieces) {
            board.set(pos, Some(piece));
        }

        let matched = matched_cells(&find_matches(board));
        let playable = has_valid_moves(board);
        if matched == 0 && playable {
            return ReshuffleOutcome {
                attempts: attempt,
                success: true,
            };
        }

        let better = match &best {
            None => true,
            Some((best_playable, best_matched, _)) => {
                (playable, std::cmp::Reverse(matched))
                    > (*best_playable, std::cmp::Reverse(*best_matched))
            }
        };
        if better {
            best = Some((playable, matched, pieces.clone()));
        }
    }

    if let Some((_, _, arrangement)) = best {
        for (&pos, &piece) in slots.iter().zip(&arrangement) {
            board.set(pos, Some(piece));
        }
    }
    ReshuffleOutcome {
        attempts: max_attempts,
        success: false,
    }
}
