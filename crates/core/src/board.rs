//! Board module - the grid of pieces plus its obstacle and bomb overlays
//!
//! Cells are stored in a flat row-major vector. Overlays are sparse ordered maps so
//! iteration (and therefore every derived result) is deterministic.
//!
//! Overlays are never edited in place while a step is resolving: a step computes an
//! [`OverlayDiff`] from the cells it clears, then [`Board::apply_overlay_diff`] derives
//! the next overlay maps from the current ones in a single replacement.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{
    Cell, Color, ConfigError, LevelConfig, Obstacle, Piece, Position, MIN_BOARD_EDGE,
};

/// Overlay changes caused by clearing a set of cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayDiff {
    /// Ice removed entirely (single-layer ice hit)
    pub broken_ice: Vec<Position>,
    /// Reinforced ice reduced to single-layer ice
    pub cracked_ice: Vec<Position>,
    /// Locks broken by a clear on or next to them
    pub unlocked: Vec<Position>,
    /// Bombs whose piece was cleared
    pub defused: Vec<Position>,
}

impl OverlayDiff {
    pub fn is_empty(&self) -> bool {
        self.broken_ice.is_empty()
            && self.cracked_ice.is_empty()
            && self.unlocked.is_empty()
            && self.defused.is_empty()
    }
}

/// Result of splitting a clear set against the board's locks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearPlan {
    /// Positions whose pieces are actually removed
    pub removed: BTreeSet<Position>,
    pub diff: OverlayDiff,
}

/// The game board - `rows x cols` cells with obstacle and bomb overlays
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    rows: i32,
    cols: i32,
    /// Flat array of cells, row-major order (row * cols + col)
    cells: Vec<Cell>,
    obstacles: BTreeMap<Position, Obstacle>,
    bombs: BTreeMap<Position, u32>,
}

impl Board {
    /// Create an empty board without overlays
    pub fn new(rows: i32, cols: i32) -> Self {
        let rows = rows.max(0);
        let cols = cols.max(0);
        Self {
            rows,
            cols,
            cells: vec![None; (rows * cols) as usize],
            obstacles: BTreeMap::new(),
            bombs: BTreeMap::new(),
        }
    }

    /// Empty board carrying the level's obstacle and bomb layout
    pub fn from_config(config: &LevelConfig) -> Self {
        let mut board = Self::new(config.rows, config.cols);
        for placement in &config.obstacles {
            board.set_obstacle(placement.position, Some(placement.obstacle));
        }
        for bomb in &config.bombs {
            board.place_bomb(bomb.position, bomb.timer);
        }
        board
    }

    /// Parse an ASCII layout: a color letter is a plain piece, `.` an empty cell and
    /// `#` a wall. Piece ids are assigned in reading order starting at 1.
    ///
    /// # Examples
    ///
    /// ```
    /// use match_three_core::Board;
    /// use match_three_core::types::{Color, Position};
    ///
    /// let board = Board::from_layout(&["RGB", "#.Y", "RRB"]).unwrap();
    /// assert_eq!(board.piece(Position::new(0, 1)).map(|p| p.color), Some(Color::Green));
    /// assert!(board.is_wall(Position::new(1, 0)));
    /// assert_eq!(board.get(Position::new(1, 1)), Some(None));
    /// ```
    pub fn from_layout(rows: &[&str]) -> Result<Self, ConfigError> {
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        if width == 0 || rows.iter().any(|r| r.chars().count() != width) {
            return Err(ConfigError::LayoutShape);
        }

        let mut board = Self::new(rows.len() as i32, width as i32);
        let mut next_id = 1u32;
        for (r, line) in rows.iter().enumerate() {
            for (c, ch) in line.chars().enumerate() {
                let pos = Position::new(r as i32, c as i32);
                match ch {
                    '.' => {}
                    '#' => {
                        board.set_obstacle(pos, Some(Obstacle::Wall));
                    }
                    _ => {
                        let color = Color::from_char(ch).ok_or(ConfigError::Layout {
                            row: pos.row,
                            col: pos.col,
                            ch,
                        })?;
                        board.set(pos, Some(Piece::new(color, next_id)));
                        next_id += 1;
                    }
                }
            }
        }
        Ok(board)
    }

    /// Render the board as ASCII: uppercase for plain pieces, lowercase for specials
    pub fn to_layout(&self) -> Vec<String> {
        (0..self.rows)
            .map(|r| {
                (0..self.cols)
                    .map(|c| {
                        let pos = Position::new(r, c);
                        if self.is_wall(pos) {
                            return '#';
                        }
                        match self.piece(pos) {
                            Some(p) if p.is_special() => p.color.as_char().to_ascii_lowercase(),
                            Some(p) => p.color.as_char(),
                            None => '.',
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// Calculate flat index from a position
    #[inline(always)]
    fn index(&self, pos: Position) -> Option<usize> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some((pos.row * self.cols + pos.col) as usize)
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.row >= 0 && pos.row < self.rows && pos.col >= 0 && pos.col < self.cols
    }

    /// Get cell at position
    /// Returns None if out of bounds
    pub fn get(&self, pos: Position) -> Option<Cell> {
        self.index(pos).map(|idx| self.cells[idx])
    }

    /// Piece at position, if any
    pub fn piece(&self, pos: Position) -> Option<Piece> {
        self.get(pos).flatten()
    }

    /// Set cell at position
    /// Returns false if out of bounds, or if a piece would be put on a wall
    pub fn set(&mut self, pos: Position, cell: Cell) -> bool {
        if cell.is_some() && self.is_wall(pos) {
            return false;
        }
        match self.index(pos) {
            Some(idx) => {
                self.cells[idx] = cell;
                true
            }
            None => false,
        }
    }

    /// Remove and return the piece at position
    pub fn take(&mut self, pos: Position) -> Option<Piece> {
        let idx = self.index(pos)?;
        self.cells[idx].take()
    }

    /// Exchange the contents of two cells
    /// Returns false if either is out of bounds or a wall
    pub fn swap(&mut self, a: Position, b: Position) -> bool {
        if self.is_wall(a) || self.is_wall(b) {
            return false;
        }
        match (self.index(a), self.index(b)) {
            (Some(ia), Some(ib)) => {
                self.cells.swap(ia, ib);
                true
            }
            _ => false,
        }
    }

    pub fn obstacle(&self, pos: Position) -> Option<Obstacle> {
        self.obstacles.get(&pos).copied()
    }

    pub fn is_wall(&self, pos: Position) -> bool {
        self.obstacle(pos) == Some(Obstacle::Wall)
    }

    pub fn is_locked(&self, pos: Position) -> bool {
        self.obstacle(pos) == Some(Obstacle::Locked)
    }

    /// Holds a piece that the player may move
    pub fn is_swappable(&self, pos: Position) -> bool {
        self.piece(pos).is_some() && !self.is_locked(pos)
    }

    /// Place or remove an obstacle (level setup and tests)
    ///
    /// Placing a wall evicts any piece on that cell.
    pub fn set_obstacle(&mut self, pos: Position, obstacle: Option<Obstacle>) -> bool {
        let Some(idx) = self.index(pos) else {
            return false;
        };
        match obstacle {
            Some(kind) => {
                if kind == Obstacle::Wall {
                    self.cells[idx] = None;
                    self.bombs.remove(&pos);
                }
                self.obstacles.insert(pos, kind);
            }
            None => {
                self.obstacles.remove(&pos);
            }
        }
        true
    }

    pub fn obstacles(&self) -> &BTreeMap<Position, Obstacle> {
        &self.obstacles
    }

    /// Cells still covered by ice of either strength
    pub fn ice_count(&self) -> usize {
        self.obstacles.values().filter(|o| o.is_ice()).count()
    }

    /// Arm a bomb on a non-wall cell
    pub fn place_bomb(&mut self, pos: Position, timer: u32) -> bool {
        if !self.in_bounds(pos) || self.is_wall(pos) || timer == 0 {
            return false;
        }
        self.bombs.insert(pos, timer);
        true
    }

    pub fn bomb(&self, pos: Position) -> Option<u32> {
        self.bombs.get(&pos).copied()
    }

    pub fn bombs(&self) -> &BTreeMap<Position, u32> {
        &self.bombs
    }

    /// Count every bomb down by one move
    /// Returns true if any bomb reached zero
    pub fn tick_bombs(&mut self) -> bool {
        let next: BTreeMap<Position, u32> = self
            .bombs
            .iter()
            .map(|(&pos, &timer)| (pos, timer.saturating_sub(1)))
            .collect();
        let expired = next.values().any(|&t| t == 0);
        self.bombs = next;
        expired
    }

    /// Row-major iterator over every position
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        let cols = self.cols;
        (0..self.rows).flat_map(move |r| (0..cols).map(move |c| Position::new(r, c)))
    }

    /// Row-major iterator over occupied cells
    pub fn pieces(&self) -> impl Iterator<Item = (Position, Piece)> + '_ {
        self.positions()
            .filter_map(move |pos| self.piece(pos).map(|piece| (pos, piece)))
    }

    /// Number of cells that can hold a piece
    pub fn playable_cells(&self) -> usize {
        self.positions().filter(|&p| !self.is_wall(p)).count()
    }

    /// Every non-wall cell holds a piece
    pub fn is_full(&self) -> bool {
        self.positions()
            .all(|p| self.is_wall(p) || self.piece(p).is_some())
    }

    /// Split a clear set into removed cells and the overlay changes it causes.
    ///
    /// A lock absorbs a clear aimed at its own cell (the piece survives, unlocked).
    /// Locks orthogonally next to a removed cell break as well. Ice breaks and bombs
    /// are defused only where a piece is actually removed.
    pub fn plan_clear(&self, targets: &BTreeSet<Position>) -> ClearPlan {
        let mut plan = ClearPlan::default();
        let mut unlocked = BTreeSet::new();

        for &pos in targets {
            if self.piece(pos).is_none() {
                continue;
            }
            if self.is_locked(pos) {
                unlocked.insert(pos);
            } else {
                plan.removed.insert(pos);
            }
        }

        for &pos in &plan.removed {
            for n in pos.neighbors() {
                if self.is_locked(n) {
                    unlocked.insert(n);
                }
            }
            match self.obstacle(pos) {
                Some(Obstacle::Ice) => plan.diff.broken_ice.push(pos),
                Some(Obstacle::ReinforcedIce) => plan.diff.cracked_ice.push(pos),
                _ => {}
            }
            if self.bombs.contains_key(&pos) {
                plan.diff.defused.push(pos);
            }
        }

        plan.diff.unlocked = unlocked.into_iter().collect();
        plan
    }

    /// Replace the overlays with the ones derived from `diff`
    pub fn apply_overlay_diff(&mut self, diff: &OverlayDiff) {
        if diff.is_empty() {
            return;
        }
        let obstacles = self
            .obstacles
            .iter()
            .filter_map(|(&pos, &kind)| {
                let next = if diff.broken_ice.contains(&pos) || diff.unlocked.contains(&pos) {
                    None
                } else if diff.cracked_ice.contains(&pos) {
                    Some(Obstacle::Ice)
                } else {
                    Some(kind)
                };
                next.map(|k| (pos, k))
            })
            .collect();
        let bombs = self
            .bombs
            .iter()
            .filter(|(pos, _)| !diff.defused.contains(pos))
            .map(|(&pos, &timer)| (pos, timer))
            .collect();
        self.obstacles = obstacles;
        self.bombs = bombs;
    }

    /// Move piece-bound overlays (locks and bombs) along with their pieces.
    ///
    /// `moves` maps origin to destination for every piece that changed cell. Bombs
    /// whose cell is empty afterwards and did not move are dropped.
    pub fn follow_moved_pieces(&mut self, moves: &BTreeMap<Position, Position>) {
        let mut obstacles = BTreeMap::new();
        for (&pos, &kind) in &self.obstacles {
            if kind == Obstacle::Locked {
                continue;
            }
            obstacles.insert(pos, kind);
        }
        for (&pos, &kind) in &self.obstacles {
            if kind != Obstacle::Locked {
                continue;
            }
            let dest = moves.get(&pos).copied().unwrap_or(pos);
            // Gravity never moves a lock onto ice, so `dest` is free.
            if !obstacles.contains_key(&dest) {
                obstacles.insert(dest, kind);
            }
        }

        let bombs = self
            .bombs
            .iter()
            .filter_map(|(&pos, &timer)| {
                let dest = moves.get(&pos).copied().unwrap_or(pos);
                self.piece(dest).map(|_| (dest, timer))
            })
            .collect();

        self.obstacles = obstacles;
        self.bombs = bombs;
    }

    /// Get a reference to the internal cells array
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Remove every piece (overlays untouched)
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            *cell = None;
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(MIN_BOARD_EDGE, MIN_BOARD_EDGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_index_calculation() {
        let board = Board::new(7, 8);
        assert_eq!(board.index(Position::new(0, 0)), Some(0));
        assert_eq!(board.index(Position::new(0, 7)), Some(7));
        assert_eq!(board.index(Position::new(1, 0)), Some(8));
        assert_eq!(board.index(Position::new(6, 7)), Some(55));
        assert_eq!(board.index(Position::new(-1, 0)), None);
        assert_eq!(board.index(Position::new(0, 8)), None);
        assert_eq!(board.index(Position::new(7, 0)), None);
    }

    #[test]
    fn test_wall_refuses_piece() {
        let mut board = Board::new(3, 3);
        let pos = Position::new(1, 1);
        board.set(pos, Some(Piece::new(Color::Red, 1)));
        board.set_obstacle(pos, Some(Obstacle::Wall));

        assert_eq!(board.get(pos), Some(None));
        assert!(!board.set(pos, Some(Piece::new(Color::Red, 2))));
        assert!(!board.swap(pos, Position::new(0, 1)));
    }

    #[test]
    fn test_layout_roundtrip() {
        let rows = ["RGB", "#.Y", "RRB"];
        let board = Board::from_layout(&rows).unwrap();
        assert_eq!(board.to_layout(), vec!["RGB", "#.Y", "RRB"]);
        assert_eq!(board.piece(Position::new(2, 2)).map(|p| p.id), Some(7));
    }

    #[test]
    fn test_layout_rejects_ragged_rows() {
        assert_eq!(
            Board::from_layout(&["RGB", "RG"]),
            Err(ConfigError::LayoutShape)
        );
        assert!(matches!(
            Board::from_layout(&["RGX"]),
            Err(ConfigError::Layout { ch: 'X', .. })
        ));
    }

    #[test]
    fn test_plan_clear_lock_absorbs_hit() {
        let mut board = Board::from_layout(&["RRR", "GGB", "BYG"]).unwrap();
        board.set_obstacle(Position::new(0, 1), Some(Obstacle::Locked));
        board.set_obstacle(Position::new(1, 2), Some(Obstacle::Locked));
        board.set_obstacle(Position::new(0, 0), Some(Obstacle::ReinforcedIce));
        board.place_bomb(Position::new(0, 2), 4);

        let targets: BTreeSet<_> = (0..3).map(|c| Position::new(0, c)).collect();
        let plan = board.plan_clear(&targets);

        assert!(!plan.removed.contains(&Position::new(0, 1)));
        assert_eq!(plan.removed.len(), 2);
        assert_eq!(
            plan.diff.unlocked,
            vec![Position::new(0, 1), Position::new(1, 2)]
        );
        assert_eq!(plan.diff.cracked_ice, vec![Position::new(0, 0)]);
        assert_eq!(plan.diff.defused, vec![Position::new(0, 2)]);

        board.apply_overlay_diff(&plan.diff);
        assert_eq!(board.obstacle(Position::new(0, 0)), Some(Obstacle::Ice));
        assert!(!board.is_locked(Position::new(0, 1)));
        assert!(!board.is_locked(Position::new(1, 2)));
        assert!(board.bombs().is_empty());
    }

    #[test]
    fn test_tick_bombs_reports_expiry() {
        let mut board = Board::new(3, 3);
        board.place_bomb(Position::new(0, 0), 2);
        board.place_bomb(Position::new(1, 1), 1);

        assert!(board.tick_bombs());
        assert_eq!(board.bomb(Position::new(0, 0)), Some(1));
        assert_eq!(board.bomb(Position::new(1, 1)), Some(0));
    }

    #[test]
    fn test_follow_moved_pieces_moves_bomb_and_lock() {
        let mut board = Board::from_layout(&["R..", "G..", "B.."]).unwrap();
        board.place_bomb(Position::new(0, 0), 3);
        board.set_obstacle(Position::new(1, 0), Some(Obstacle::Locked));

        // Pretend gravity dropped the top two pieces by one after the bottom cleared.
        board.take(Position::new(2, 0));
        let red = board.take(Position::new(0, 0));
        let green = board.take(Position::new(1, 0));
        board.set(Position::new(1, 0), red);
        board.set(Position::new(2, 0), green);

        let moves: BTreeMap<_, _> = [
            (Position::new(0, 0), Position::new(1, 0)),
            (Position::new(1, 0), Position::new(2, 0)),
        ]
        .into_iter()
        .collect();
        board.follow_moved_pieces(&moves);

        assert_eq!(board.bomb(Position::new(1, 0)), Some(3));
        assert!(board.is_locked(Position::new(2, 0)));
        assert!(!board.is_locked(Position::new(1, 0)));
    }
}
