//! Match detection - runs of three or more, merged into shapes
//!
//! Every row and every column is scanned for maximal runs of at least three pieces of
//! one color. Runs that share a cell are merged (transitively) into one group, which
//! is how L and T shapes arise from a horizontal and a vertical run meeting.
//!
//! Output order is stable: groups are ordered by their first run, and rows are
//! scanned before columns, top-left first.

use std::collections::BTreeSet;

use arrayvec::ArrayVec;

use crate::board::Board;
use crate::types::{Color, Orientation, Position};

/// Minimum run length that counts as a match
pub const MIN_RUN: usize = 3;

/// One classified match group
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchResult {
    /// Cells cleared together, sorted by (row, col)
    pub positions: Vec<Position>,
    pub color: Color,
    /// Longest straight run in the group
    pub length: usize,
    /// Group has both a horizontal and a vertical run
    pub is_l_shape: bool,
    /// Orientation of the longest run (horizontal on ties)
    pub orientation: Orientation,
    /// Placement anchor for a special piece earned by this match
    pub pivot: Position,
}

impl MatchResult {
    pub fn contains(&self, pos: Position) -> bool {
        self.positions.binary_search(&pos).is_ok()
    }

    pub fn size(&self) -> usize {
        self.positions.len()
    }
}

#[derive(Debug, Clone)]
struct Run {
    color: Color,
    orientation: Orientation,
    positions: Vec<Position>,
}

fn collect_line(
    board: &Board,
    cells: impl Iterator<Item = Position>,
    orientation: Orientation,
    runs: &mut Vec<Run>,
) {
    let mut current: Vec<Position> = Vec::new();
    let mut current_color: Option<Color> = None;

    let flush = |current: &mut Vec<Position>, color: Option<Color>, runs: &mut Vec<Run>| {
        if let Some(color) = color {
            if current.len() >= MIN_RUN {
                runs.push(Run {
                    color,
                    orientation,
                    positions: std::mem::take(current),
                });
            }
        }
        current.clear();
    };

    for pos in cells {
        let color = board.piece(pos).map(|p| p.color);
        if color.is_some() && color == current_color {
            current.push(pos);
            continue;
        }
        flush(&mut current, current_color, runs);
        current_color = color;
        if color.is_some() {
            current.push(pos);
        }
    }
    flush(&mut current, current_color, runs);
}

fn find_runs(board: &Board) -> Vec<Run> {
    let mut runs = Vec::new();
    let (rows, cols) = (board.rows(), board.cols());
    for r in 0..rows {
        collect_line(
            board,
            (0..cols).map(|c| Position::new(r, c)),
            Orientation::Horizontal,
            &mut runs,
        );
    }
    for c in 0..cols {
        collect_line(
            board,
            (0..rows).map(|r| Position::new(r, c)),
            Orientation::Vertical,
            &mut runs,
        );
    }
    runs
}

fn find_root(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Detect and classify every match on the board
pub fn find_matches(board: &Board) -> Vec<MatchResult> {
    let runs = find_runs(board);
    if runs.is_empty() {
        return Vec::new();
    }

    // Union runs that share a cell.
    let mut parent: Vec<usize> = (0..runs.len()).collect();
    let mut owner = std::collections::HashMap::new();
    for (i, run) in runs.iter().enumerate() {
        for &pos in &run.positions {
            if let Some(&j) = owner.get(&pos) {
                let (a, b) = (find_root(&mut parent, i), find_root(&mut parent, j));
                if a != b {
                    parent[a.max(b)] = a.min(b);
                }
            } else {
                owner.insert(pos, i);
            }
        }
    }

    let mut group_order: Vec<usize> = Vec::new();
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); runs.len()];
    for i in 0..runs.len() {
        let root = find_root(&mut parent, i);
        if members[root].is_empty() {
            group_order.push(root);
        }
        members[root].push(i);
    }

    group_order
        .into_iter()
        .map(|root| classify(&runs, &members[root]))
        .collect()
}

fn classify(runs: &[Run], member_runs: &[usize]) -> MatchResult {
    let cells: BTreeSet<Position> = member_runs
        .iter()
        .flat_map(|&i| runs[i].positions.iter().copied())
        .collect();
    let positions: Vec<Position> = cells.iter().copied().collect();

    let mut longest = &runs[member_runs[0]];
    for &i in member_runs {
        if runs[i].positions.len() > longest.positions.len() {
            longest = &runs[i];
        }
    }

    let has_h = member_runs
        .iter()
        .any(|&i| runs[i].orientation == Orientation::Horizontal);
    let has_v = member_runs
        .iter()
        .any(|&i| runs[i].orientation == Orientation::Vertical);
    let is_l_shape = has_h && has_v;

    let pivot = if is_l_shape {
        positions
            .iter()
            .copied()
            .find(|p| {
                let horizontal: ArrayVec<Position, 2> = [p.offset(0, -1), p.offset(0, 1)]
                    .into_iter()
                    .filter(|n| cells.contains(n))
                    .collect();
                let vertical: ArrayVec<Position, 2> = [p.offset(-1, 0), p.offset(1, 0)]
                    .into_iter()
                    .filter(|n| cells.contains(n))
                    .collect();
                !horizontal.is_empty() && !vertical.is_empty()
            })
            .unwrap_or(positions[positions.len() / 2])
    } else {
        positions[positions.len() / 2]
    };

    MatchResult {
        color: longest.color,
        length: longest.positions.len(),
        is_l_shape,
        orientation: longest.orientation,
        pivot,
        positions,
    }
}

/// Board has at least one match
pub fn has_matches(board: &Board) -> bool {
    !find_runs(board).is_empty()
}
