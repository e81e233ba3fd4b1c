//! Special piece effects - clear sets for activations and two-special combos
//!
//! Every clear set only contains cells that currently hold a piece; walls and empty
//! cells are never part of one.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::board::Board;
use crate::types::{Color, Position, SpecialKind};

/// One special piece going off
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Activation {
    pub position: Position,
    pub kind: SpecialKind,
    /// Color targeted by a color-clear
    pub target_color: Option<Color>,
    /// Cells this activation covers (sorted)
    pub area: Vec<Position>,
}

fn occupied_in(board: &Board, cells: impl Iterator<Item = Position>) -> BTreeSet<Position> {
    cells.filter(|&p| board.piece(p).is_some()).collect()
}

fn row_cells(board: &Board, row: i32) -> BTreeSet<Position> {
    occupied_in(board, (0..board.cols()).map(|c| Position::new(row, c)))
}

fn col_cells(board: &Board, col: i32) -> BTreeSet<Position> {
    occupied_in(board, (0..board.rows()).map(|r| Position::new(r, col)))
}

/// Square of side `2 * radius + 1` centered on `center`, clipped to the board
fn square_cells(board: &Board, center: Position, radius: i32) -> BTreeSet<Position> {
    let cells = (-radius..=radius)
        .flat_map(|dr| (-radius..=radius).map(move |dc| center.offset(dr, dc)))
        .filter(|&p| board.in_bounds(p));
    occupied_in(board, cells)
}

fn color_cells(board: &Board, color: Color) -> BTreeSet<Position> {
    board
        .pieces()
        .filter(|(_, piece)| piece.color == color)
        .map(|(pos, _)| pos)
        .collect()
}

/// Cells cleared when the special `kind` at `pos` activates on its own.
///
/// `target_color` is only read by a color-clear.
pub fn activation_area(
    board: &Board,
    pos: Position,
    kind: SpecialKind,
    target_color: Color,
) -> BTreeSet<Position> {
    let mut area = match kind {
        SpecialKind::RowClear => row_cells(board, pos.row),
        SpecialKind::ColumnClear => col_cells(board, pos.col),
        SpecialKind::AreaClear => square_cells(board, pos, 1),
        SpecialKind::ColorClear => color_cells(board, target_color),
    };
    if board.piece(pos).is_some() {
        area.insert(pos);
    }
    area
}

/// Cells cleared by swapping two specials together, centered on `to`.
///
/// Returns `None` unless both cells hold special pieces.
pub fn combo_area(board: &Board, from: Position, to: Position) -> Option<BTreeSet<Position>> {
    let a = board.piece(from)?;
    let b = board.piece(to)?;
    let (ka, kb) = (a.special?, b.special?);

    let mut area = match (ka, kb) {
        (SpecialKind::ColorClear, SpecialKind::ColorClear) => {
            board.pieces().map(|(pos, _)| pos).collect()
        }
        (SpecialKind::ColorClear, other) => color_combo(board, b.color, other),
        (other, SpecialKind::ColorClear) => color_combo(board, a.color, other),
        (SpecialKind::AreaClear, SpecialKind::AreaClear) => square_cells(board, to, 2),
        (SpecialKind::AreaClear, _) | (_, SpecialKind::AreaClear) => {
            let mut cells = BTreeSet::new();
            for d in -1..=1 {
                cells.extend(row_cells(board, to.row + d));
                cells.extend(col_cells(board, to.col + d));
            }
            cells
        }
        // Two line clears: full cross through the swap position.
        _ => {
            let mut cells = row_cells(board, to.row);
            cells.extend(col_cells(board, to.col));
            cells
        }
    };
    area.insert(from);
    area.insert(to);
    Some(area)
}

/// Every piece of `color` goes off as if it were a `kind` special
fn color_combo(board: &Board, color: Color, kind: SpecialKind) -> BTreeSet<Position> {
    let mut cells = BTreeSet::new();
    for pos in color_cells(board, color) {
        cells.extend(activation_area(board, pos, kind, color));
    }
    cells
}

/// Grow `targets` with the areas of every special caught inside it, until no new
/// special is reached.
///
/// Specials in `consumed` have already been resolved and do not go off again. A
/// color-clear targets the color in `color_targets` for its cell, else its own color.
pub fn expand_chain(
    board: &Board,
    targets: &BTreeSet<Position>,
    consumed: &BTreeSet<Position>,
    color_targets: &BTreeMap<Position, Color>,
) -> (BTreeSet<Position>, Vec<Activation>) {
    let mut cleared = targets.clone();
    let mut activated: BTreeSet<Position> = consumed.clone();
    let mut activations = Vec::new();
    let mut queue: VecDeque<Position> = targets.iter().copied().collect();

    while let Some(pos) = queue.pop_front() {
        let Some(piece) = board.piece(pos) else {
            continue;
        };
        let Some(kind) = piece.special else {
            continue;
        };
        if !activated.insert(pos) {
            continue;
        }

        let target = color_targets.get(&pos).copied().unwrap_or(piece.color);
        let area = activation_area(board, pos, kind, target);
        for &p in &area {
            if cleared.insert(p) {
                queue.push_back(p);
            }
        }
        activations.push(Activation {
            position: pos,
            kind,
            target_color: (kind == SpecialKind::ColorClear).then_some(target),
            area: area.into_iter().collect(),
        });
    }

    (cleared, activations)
}
