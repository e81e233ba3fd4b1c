//! Core types module - shared data structures and constants
//!
//! This crate defines the value types used throughout the engine: pieces, positions,
//! obstacles, objectives and the level configuration a driver hands to a session.
//! Everything here is plain data with structural equality, so boards and snapshots
//! can be compared directly in tests.
//!
//! # Coordinates
//!
//! Positions are `(row, col)` with `row` increasing downward. Two positions are
//! adjacent iff they differ by exactly one step along exactly one axis.
//!
//! # Scoring Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `SCORE_RUN_3` | 100 | Straight run of three |
//! | `SCORE_RUN_4` | 200 | Straight run of four |
//! | `SCORE_L_SHAPE` | 300 | L or T shaped group |
//! | `SCORE_RUN_5` | 500 | Straight run of five or more |
//! | `SCORE_EXTRA_PIECE` | 50 | Per piece beyond the third in a group |
//! | `SPECIAL_CLEAR_POINTS` | 60 | Per position cleared by an activation |
//! | `BONUS_SPECIAL_CLEAR_POINTS` | 80 | Same, during bonus moves |
//! | `BONUS_PIECE_POINTS` | 50 | Bonus-move destruction of a plain piece |
//!
//! The cascade multiplier is `1 + 0.5 × depth`, applied as the exact integer ratio
//! `(CASCADE_NUMERATOR_BASE + depth) / CASCADE_DENOMINATOR`.
//!
//! # Examples
//!
//! ```
//! use match_three_types::{Color, Position, SpecialKind, Piece};
//!
//! let a = Position::new(2, 3);
//! assert!(a.is_adjacent(Position::new(2, 4)));
//! assert!(!a.is_adjacent(Position::new(3, 4)));
//!
//! let piece = Piece::new(Color::Red, 7).with_special(SpecialKind::AreaClear);
//! assert!(piece.is_special());
//! assert_eq!(Color::from_str("red"), Some(Color::Red));
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fewest active colors a level may use
pub const MIN_COLORS: u8 = 3;

/// Most active colors a level may use
pub const MAX_COLORS: u8 = 6;

/// Smallest board edge on which a run of three fits
pub const MIN_BOARD_EDGE: i32 = 3;

/// Base points for a straight run of three
pub const SCORE_RUN_3: u32 = 100;

/// Base points for a straight run of four
pub const SCORE_RUN_4: u32 = 200;

/// Base points for an L/T shaped group
pub const SCORE_L_SHAPE: u32 = 300;

/// Base points for a straight run of five or more
pub const SCORE_RUN_5: u32 = 500;

/// Points per piece beyond the third in a matched group
pub const SCORE_EXTRA_PIECE: u32 = 50;

/// Cascade multiplier numerator base (`(2 + depth) / 2` = `1 + 0.5 × depth`)
pub const CASCADE_NUMERATOR_BASE: u32 = 2;

/// Cascade multiplier denominator
pub const CASCADE_DENOMINATOR: u32 = 2;

/// Flat points per position cleared by a special activation or combo
pub const SPECIAL_CLEAR_POINTS: u32 = 60;

/// Flat points per position cleared by a special during bonus moves
pub const BONUS_SPECIAL_CLEAR_POINTS: u32 = 80;

/// Points for destroying a plain piece during bonus moves
pub const BONUS_PIECE_POINTS: u32 = 50;

/// Reshuffle attempts before giving up on a deadlocked board
pub const DEFAULT_RESHUFFLE_ATTEMPTS: u32 = 100;

/// Moves granted by the add-moves power-up
pub const EXTRA_MOVES_POWER_UP: u32 = 5;

/// Piece colors
///
/// A level activates the first `color_count` entries of [`Color::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
}

impl Color {
    pub const ALL: [Color; 6] = [
        Color::Red,
        Color::Orange,
        Color::Yellow,
        Color::Green,
        Color::Blue,
        Color::Purple,
    ];

    /// Active palette for a level using `count` colors (clamped to 1..=6)
    ///
    /// # Examples
    ///
    /// ```
    /// use match_three_types::Color;
    ///
    /// assert_eq!(Color::palette(3), &[Color::Red, Color::Orange, Color::Yellow]);
    /// assert_eq!(Color::palette(9).len(), 6);
    /// ```
    pub fn palette(count: u8) -> &'static [Color] {
        let n = (count as usize).clamp(1, Self::ALL.len());
        &Self::ALL[..n]
    }

    /// Parse color from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "red" | "r" => Some(Color::Red),
            "orange" | "o" => Some(Color::Orange),
            "yellow" | "y" => Some(Color::Yellow),
            "green" | "g" => Some(Color::Green),
            "blue" | "b" => Some(Color::Blue),
            "purple" | "p" => Some(Color::Purple),
            _ => None,
        }
    }

    /// Convert to lowercase string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Orange => "orange",
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Purple => "purple",
        }
    }

    /// Single-letter code used by ASCII board layouts
    pub fn as_char(&self) -> char {
        match self {
            Color::Red => 'R',
            Color::Orange => 'O',
            Color::Yellow => 'Y',
            Color::Green => 'G',
            Color::Blue => 'B',
            Color::Purple => 'P',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'R' => Some(Color::Red),
            'O' => Some(Color::Orange),
            'Y' => Some(Color::Yellow),
            'G' => Some(Color::Green),
            'B' => Some(Color::Blue),
            'P' => Some(Color::Purple),
            _ => None,
        }
    }
}

/// Special piece kinds
///
/// - **RowClear**: clears the entire row through the piece
/// - **ColumnClear**: clears the entire column through the piece
/// - **AreaClear**: clears the 3x3 block centered on the piece
/// - **ColorClear**: clears every piece of a target color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialKind {
    RowClear,
    ColumnClear,
    AreaClear,
    ColorClear,
}

impl SpecialKind {
    /// Row or column clear
    pub fn is_line(&self) -> bool {
        matches!(self, SpecialKind::RowClear | SpecialKind::ColumnClear)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialKind::RowClear => "row_clear",
            SpecialKind::ColumnClear => "column_clear",
            SpecialKind::AreaClear => "area_clear",
            SpecialKind::ColorClear => "color_clear",
        }
    }
}

/// A piece on the board
///
/// `id` only correlates a piece across a gravity step for animation. Gameplay never
/// reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    pub special: Option<SpecialKind>,
    pub id: u32,
}

impl Piece {
    pub fn new(color: Color, id: u32) -> Self {
        Self {
            color,
            special: None,
            id,
        }
    }

    /// Same piece carrying a special kind
    pub fn with_special(self, kind: SpecialKind) -> Self {
        Self {
            special: Some(kind),
            ..self
        }
    }

    pub fn is_special(&self) -> bool {
        self.special.is_some()
    }
}

/// A cell on the board
///
/// - `None`: empty (transient during cascades, or permanent under a wall)
/// - `Some(Piece)`: occupied
pub type Cell = Option<Piece>;

/// Board coordinate, `row` grows downward
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Exactly one step apart along exactly one axis
    pub fn is_adjacent(&self, other: Position) -> bool {
        let dr = (self.row - other.row).abs();
        let dc = (self.col - other.col).abs();
        dr + dc == 1
    }

    pub fn offset(&self, dr: i32, dc: i32) -> Position {
        Position::new(self.row + dr, self.col + dc)
    }

    /// Orthogonal neighbors: up, down, left, right (may be out of bounds)
    pub fn neighbors(&self) -> [Position; 4] {
        [
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(0, -1),
            self.offset(0, 1),
        ]
    }
}

/// Direction of a straight run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Obstacle overlay kinds
///
/// - **Wall**: permanent, never holds a piece, splits gravity segments
/// - **Ice**: breaks when the piece above it is cleared
/// - **ReinforcedIce**: takes two clears (becomes `Ice` after the first)
/// - **Locked**: the piece cannot be swapped; a clear on or next to it breaks the lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Obstacle {
    Wall,
    Ice,
    ReinforcedIce,
    Locked,
}

impl Obstacle {
    pub fn is_ice(&self) -> bool {
        matches!(self, Obstacle::Ice | Obstacle::ReinforcedIce)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Obstacle::Wall => "wall",
            Obstacle::Ice => "ice",
            Obstacle::ReinforcedIce => "reinforced_ice",
            Obstacle::Locked => "locked",
        }
    }
}

/// Level win condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Objective {
    /// Reach the pass score (completes once moves run out)
    ReachScore,
    /// Break every ice layer on the board
    BreakAllIce,
    /// Clear `count` pieces of `color`
    ClearColor { color: Color, count: u32 },
}

impl Objective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Objective::ReachScore => "reach_score",
            Objective::BreakAllIce => "break_all_ice",
            Objective::ClearColor { .. } => "clear_color",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObstaclePlacement {
    pub position: Position,
    pub obstacle: Obstacle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BombPlacement {
    pub position: Position,
    pub timer: u32,
}

/// Immutable description of one level
///
/// Produced once per level entry, either handcrafted (JSON) or by the level generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub rows: i32,
    pub cols: i32,
    pub moves: u32,
    /// Pass threshold (one star)
    pub target_score: u32,
    pub two_star_score: u32,
    pub three_star_score: u32,
    pub color_count: u8,
    #[serde(default)]
    pub obstacles: Vec<ObstaclePlacement>,
    #[serde(default)]
    pub bombs: Vec<BombPlacement>,
    pub objective: Objective,
}

impl LevelConfig {
    /// Plain level with no obstacles or bombs and the standard 1.5x/2x star tiers
    pub fn simple(rows: i32, cols: i32, color_count: u8, moves: u32, target_score: u32) -> Self {
        Self {
            rows,
            cols,
            moves,
            target_score,
            two_star_score: target_score.saturating_add(target_score / 2),
            three_star_score: target_score.saturating_mul(2),
            color_count,
            obstacles: Vec::new(),
            bombs: Vec::new(),
            objective: Objective::ReachScore,
        }
    }

    pub fn palette(&self) -> &'static [Color] {
        Color::palette(self.color_count)
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.row >= 0 && pos.row < self.rows && pos.col >= 0 && pos.col < self.cols
    }

    /// Star rating for a score: 0 below target, then 1..=3 by threshold
    ///
    /// # Examples
    ///
    /// ```
    /// use match_three_types::LevelConfig;
    ///
    /// let cfg = LevelConfig::simple(7, 7, 4, 30, 800);
    /// assert_eq!(cfg.stars(0), 0);
    /// assert_eq!(cfg.stars(800), 1);
    /// assert_eq!(cfg.stars(1200), 2);
    /// assert_eq!(cfg.stars(1600), 3);
    /// ```
    pub fn stars(&self, score: u32) -> u8 {
        if score >= self.three_star_score {
            3
        } else if score >= self.two_star_score {
            2
        } else if score >= self.target_score {
            1
        } else {
            0
        }
    }

    /// Check structural consistency of the level
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows < MIN_BOARD_EDGE || self.cols < MIN_BOARD_EDGE {
            return Err(ConfigError::Dimensions {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if !(MIN_COLORS..=MAX_COLORS).contains(&self.color_count) {
            return Err(ConfigError::ColorCount(self.color_count));
        }
        if self.moves == 0 {
            return Err(ConfigError::NoMoves);
        }
        if self.target_score == 0
            || self.target_score >= self.two_star_score
            || self.two_star_score >= self.three_star_score
        {
            return Err(ConfigError::Thresholds {
                target: self.target_score,
                two_star: self.two_star_score,
                three_star: self.three_star_score,
            });
        }

        for (i, placement) in self.obstacles.iter().enumerate() {
            if !self.in_bounds(placement.position) {
                return Err(ConfigError::OutOfBounds(placement.position));
            }
            if self.obstacles[..i]
                .iter()
                .any(|p| p.position == placement.position)
            {
                return Err(ConfigError::DuplicateObstacle(placement.position));
            }
        }

        for bomb in &self.bombs {
            if !self.in_bounds(bomb.position) {
                return Err(ConfigError::OutOfBounds(bomb.position));
            }
            if bomb.timer == 0 {
                return Err(ConfigError::BombTimer(bomb.position));
            }
            let on_wall = self
                .obstacles
                .iter()
                .any(|p| p.position == bomb.position && p.obstacle == Obstacle::Wall);
            if on_wall {
                return Err(ConfigError::BombOnWall(bomb.position));
            }
        }

        if let Objective::ClearColor { color, count } = self.objective {
            if count == 0 || !self.palette().contains(&color) {
                return Err(ConfigError::ObjectiveColor(color));
            }
        }

        Ok(())
    }
}

/// Session phase
///
/// `Idle` accepts input; `Matching`/`Cascading` block it until the driver has stepped
/// the cascade out; `Settled` is re-evaluated immediately into one of the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Matching,
    Cascading,
    Settled,
    BonusMoves,
    LevelComplete,
    GameOver,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::LevelComplete | Phase::GameOver)
    }

    /// A cascade step is pending
    pub fn is_resolving(&self) -> bool {
        matches!(self, Phase::Matching | Phase::Cascading)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Matching => "matching",
            Phase::Cascading => "cascading",
            Phase::Settled => "settled",
            Phase::BonusMoves => "bonus_moves",
            Phase::LevelComplete => "level_complete",
            Phase::GameOver => "game_over",
        }
    }
}

/// Player power-ups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    /// Destroy the single piece at the target
    Hammer,
    /// Clear every piece sharing the target piece's color
    ColorBlast,
    /// Grant [`EXTRA_MOVES_POWER_UP`] moves
    ExtraMoves,
}

impl PowerUpKind {
    pub fn needs_target(&self) -> bool {
        !matches!(self, PowerUpKind::ExtraMoves)
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "hammer" => Some(PowerUpKind::Hammer),
            "colorblast" | "color_blast" => Some(PowerUpKind::ColorBlast),
            "extramoves" | "extra_moves" => Some(PowerUpKind::ExtraMoves),
            _ => None,
        }
    }
}

/// Level configuration problems
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("board must be at least 3x3, got {rows}x{cols}")]
    Dimensions { rows: i32, cols: i32 },
    #[error("color count must be within 3..=6, got {0}")]
    ColorCount(u8),
    #[error("move budget must be positive")]
    NoMoves,
    #[error("score thresholds must be positive and ascending, got {target}/{two_star}/{three_star}")]
    Thresholds {
        target: u32,
        two_star: u32,
        three_star: u32,
    },
    #[error("position ({}, {}) is outside the board", .0.row, .0.col)]
    OutOfBounds(Position),
    #[error("more than one obstacle at ({}, {})", .0.row, .0.col)]
    DuplicateObstacle(Position),
    #[error("bomb at ({}, {}) sits on a wall", .0.row, .0.col)]
    BombOnWall(Position),
    #[error("bomb at ({}, {}) has a zero timer", .0.row, .0.col)]
    BombTimer(Position),
    #[error("clear-color objective needs a positive count of an active color, got {}", .0.as_str())]
    ObjectiveColor(Color),
    #[error("invalid layout character {ch:?} at ({row}, {col})")]
    Layout { row: i32, col: i32, ch: char },
    #[error("layout rows must be non-empty and equally long")]
    LayoutShape,
}
