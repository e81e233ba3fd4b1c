//! Gravity - compaction within wall-delimited column segments, then refill
//!
//! Walls split each column into independent segments. Inside a segment pieces fall
//! toward its bottom edge without passing each other, and every vacated cell above
//! them receives a fresh piece. A locked piece that would land on ice holds its cell
//! instead, and the gap below it is refilled like the top of a segment. Movement
//! records let a presentation layer animate the step; the synthetic origin rows of
//! new pieces sit above their gap and carry no gameplay meaning.

use std::collections::BTreeMap;

use crate::board::{Board, OverlayDiff};
use crate::rng::PieceFactory;
use crate::types::{Piece, Position};

/// One piece moving (or entering) during a gravity pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Movement {
    pub piece_id: u32,
    pub col: i32,
    pub from_row: i32,
    pub to_row: i32,
    /// Spawned by the refill; `from_row` is synthetic
    pub is_new: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GravityResult {
    pub movements: Vec<Movement>,
    pub new_pieces: Vec<(Position, Piece)>,
}

/// Inclusive `(top, bottom)` row ranges of a column between walls, top to bottom
pub fn column_segments(board: &Board, col: i32) -> Vec<(i32, i32)> {
    let mut segments = Vec::new();
    let mut start: Option<i32> = None;
    for row in 0..board.rows() {
        if board.is_wall(Position::new(row, col)) {
            if let Some(top) = start.take() {
                segments.push((top, row - 1));
            }
        } else if start.is_none() {
            start = Some(row);
        }
    }
    if let Some(top) = start {
        segments.push((top, board.rows() - 1));
    }
    segments
}

/// Let pieces fall, refill the board and carry locks and bombs along.
pub fn apply_gravity(board: &mut Board, factory: &mut PieceFactory) -> GravityResult {
    // Bombs on cells that are already empty lost their piece.
    let orphaned: Vec<Position> = board
        .bombs()
        .keys()
        .copied()
        .filter(|&p| board.piece(p).is_none())
        .collect();
    if !orphaned.is_empty() {
        board.apply_overlay_diff(&OverlayDiff {
            defused: orphaned,
            ..OverlayDiff::default()
        });
    }

    let mut result = GravityResult::default();
    let mut moved: BTreeMap<Position, Position> = BTreeMap::new();

    for col in 0..board.cols() {
        for (top, bottom) in column_segments(board, col).into_iter().rev() {
            let mut gaps = Vec::new();
            let mut write = bottom;
            for row in (top..=bottom).rev() {
                let from = Position::new(row, col);
                if board.piece(from).is_none() {
                    continue;
                }
                let to = Position::new(write, col);
                // A cell carries one overlay, so a lock cannot come to rest on ice.
                let onto_ice = board.obstacle(to).is_some_and(|o| o.is_ice());
                if write != row && board.is_locked(from) && onto_ice {
                    gaps.push((row + 1, write));
                    write = row - 1;
                    continue;
                }
                let Some(piece) = board.take(from) else {
                    continue;
                };
                board.set(to, Some(piece));
                if write != row {
                    moved.insert(from, to);
                    result.movements.push(Movement {
                        piece_id: piece.id,
                        col,
                        from_row: row,
                        to_row: write,
                        is_new: false,
                    });
                }
                write -= 1;
            }
            gaps.push((top, write));

            for (gap_top, gap_bottom) in gaps {
                let vacated = gap_bottom - gap_top + 1;
                for row in (gap_top..=gap_bottom).rev() {
                    let pos = Position::new(row, col);
                    let piece = factory.spawn();
                    board.set(pos, Some(piece));
                    result.movements.push(Movement {
                        piece_id: piece.id,
                        col,
                        from_row: row - vacated,
                        to_row: row,
                        is_new: true,
                    });
                    result.new_pieces.push((pos, piece));
                }
            }
        }
    }

    board.follow_moved_pieces(&moved);
    result
}
