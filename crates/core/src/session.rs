//! Session - the per-level state machine
//!
//! A session owns the board, the piece factory and every counter of one playthrough.
//! The driver feeds it intents (`apply_swap`, `apply_power_up`, `play_bonus_move`) and
//! then calls [`Session::step_cascade`] until it returns `None`, relaying each
//! [`CascadeStep`] to whatever presents the game.
//!
//! Phases:
//!
//! - `Idle`: accepts swaps, power-ups and undo
//! - `Matching` / `Cascading`: a clear is pending, input is rejected
//! - `Settled`: never observed from outside; resolved inside the last cascade step
//! - `BonusMoves`: objective met with moves left, driven by `play_bonus_move`
//! - `LevelComplete` / `GameOver`: terminal
//!
//! Every entry point is total. Bad input comes back as a rejected outcome and leaves
//! the session untouched.

use std::collections::{BTreeMap, BTreeSet};

use crate::board::{Board, OverlayDiff};
use crate::effects::{activation_area, combo_area, expand_chain, Activation};
use crate::gravity::{apply_gravity, Movement};
use crate::matcher::{find_matches, MatchResult};
use crate::objective::{ObjectiveProgress, ObjectiveTracker};
use crate::rng::PieceFactory;
use crate::scoring::{bonus_piece_score, calculate_match_score, special_clear_score};
use crate::shuffle::{find_valid_move, has_valid_moves, reshuffle, ReshuffleOutcome};
use crate::snapshot::SessionSnapshot;
use crate::specials::{resolve_special, SpecialSpawn};
use crate::types::{
    Color, LevelConfig, Objective, Phase, Piece, Position, PowerUpKind, SpecialKind,
    DEFAULT_RESHUFFLE_ATTEMPTS, EXTRA_MOVES_POWER_UP,
};

/// Why a swap was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwapRejection {
    NotIdle,
    NoMovesLeft,
    OutOfBounds,
    NotAdjacent,
    EmptyCell,
    Locked,
    NoMatch,
}

impl SwapRejection {
    pub fn code(&self) -> &'static str {
        match self {
            SwapRejection::NotIdle => "not_idle",
            SwapRejection::NoMovesLeft => "no_moves_left",
            SwapRejection::OutOfBounds => "out_of_bounds",
            SwapRejection::NotAdjacent => "not_adjacent",
            SwapRejection::EmptyCell => "empty_cell",
            SwapRejection::Locked => "locked",
            SwapRejection::NoMatch => "no_match",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            SwapRejection::NotIdle => "the session is not accepting moves",
            SwapRejection::NoMovesLeft => "no moves left",
            SwapRejection::OutOfBounds => "position is outside the board",
            SwapRejection::NotAdjacent => "cells are not adjacent",
            SwapRejection::EmptyCell => "cell holds no piece",
            SwapRejection::Locked => "piece is locked",
            SwapRejection::NoMatch => "swap makes no match",
        }
    }
}

/// Result of [`Session::apply_swap`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapOutcome {
    Rejected(SwapRejection),
    /// Regular swap; these matches clear on the next step
    Matched { matches: Vec<MatchResult> },
    /// Two specials swapped together; this area clears on the next step
    Combo { positions: Vec<Position> },
    /// A color-clear swapped onto a plain piece without forming a match
    ColorBurst { positions: Vec<Position> },
}

impl SwapOutcome {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, SwapOutcome::Rejected(_))
    }
}

/// Why a power-up was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerUpRejection {
    NotIdle,
    MissingTarget,
    OutOfBounds,
    EmptyCell,
}

impl PowerUpRejection {
    pub fn code(&self) -> &'static str {
        match self {
            PowerUpRejection::NotIdle => "not_idle",
            PowerUpRejection::MissingTarget => "missing_target",
            PowerUpRejection::OutOfBounds => "out_of_bounds",
            PowerUpRejection::EmptyCell => "empty_cell",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            PowerUpRejection::NotIdle => "the session is not accepting power-ups",
            PowerUpRejection::MissingTarget => "this power-up needs a target cell",
            PowerUpRejection::OutOfBounds => "target is outside the board",
            PowerUpRejection::EmptyCell => "target cell holds no piece",
        }
    }
}

/// Result of [`Session::apply_power_up`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PowerUpOutcome {
    Rejected(PowerUpRejection),
    /// These cells clear on the next step
    Cleared { positions: Vec<Position> },
    /// Moves granted; no step is pending
    MovesAdded { moves_left: u32 },
}

impl PowerUpOutcome {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, PowerUpOutcome::Rejected(_))
    }
}

/// Everything one call to [`Session::step_cascade`] did, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeStep {
    /// Combo depth the clear was scored at
    pub depth: u32,
    pub matches: Vec<MatchResult>,
    /// Cells hit by the clear, sorted (locked cells absorb the hit and keep their piece)
    pub cleared_positions: Vec<Position>,
    pub special_activations: Vec<Activation>,
    pub overlay: OverlayDiff,
    pub spawned_specials: Vec<SpecialSpawn>,
    pub gravity_movements: Vec<Movement>,
    pub new_pieces: Vec<(Position, Piece)>,
    pub score_gained: u32,
    /// Another step is pending
    pub has_more: bool,
    /// Set when the settled board was deadlocked and got reshuffled
    pub reshuffle: Option<ReshuffleOutcome>,
    /// Phase after this step
    pub phase: Phase,
}

/// Clear work waiting for the next step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct PendingClear {
    pub(crate) matches: Vec<MatchResult>,
    /// Cleared regardless of matches (combos, power-ups, bonus moves)
    pub(crate) forced: BTreeSet<Position>,
    /// Specials already resolved by the action itself
    pub(crate) consumed: BTreeSet<Position>,
    pub(crate) color_targets: BTreeMap<Position, Color>,
    pub(crate) swap: Option<(Position, Position)>,
    pub(crate) bonus: bool,
}

/// One playthrough of one level
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) config: LevelConfig,
    pub(crate) board: Board,
    pub(crate) factory: PieceFactory,
    pub(crate) score: u32,
    pub(crate) moves_left: u32,
    pub(crate) depth: u32,
    pub(crate) phase: Phase,
    pub(crate) pending: Option<PendingClear>,
    pub(crate) tracker: ObjectiveTracker,
    /// A consumed move still has to count the bombs down when it settles
    pub(crate) tick_pending: bool,
    pub(crate) bomb_expired: bool,
    pub(crate) undo_slot: Option<Box<SessionSnapshot>>,
    initial_reshuffle: Option<ReshuffleOutcome>,
}

impl Session {
    /// Start a level. The config is expected to have passed
    /// [`LevelConfig::validate`].
    ///
    /// The board is filled left-to-right, top-to-bottom, never picking a color that
    /// would complete a run with the two cells to the left or above. A filled board
    /// without a valid move is reshuffled.
    pub fn new(config: LevelConfig, seed: u32) -> Self {
        let mut board = Board::from_config(&config);
        let mut factory = PieceFactory::new(config.palette(), seed);

        for pos in board.positions().collect::<Vec<_>>() {
            if board.is_wall(pos) {
                continue;
            }
            let mut excluded: Vec<Color> = Vec::with_capacity(2);
            let lines = [
                (pos.offset(0, -1), pos.offset(0, -2)),
                (pos.offset(-1, 0), pos.offset(-2, 0)),
            ];
            for (d1, d2) in lines {
                if let (Some(a), Some(b)) = (board.piece(d1), board.piece(d2)) {
                    if a.color == b.color {
                        excluded.push(a.color);
                    }
                }
            }
            let piece = factory.spawn_excluding(&excluded);
            board.set(pos, Some(piece));
        }

        let initial_reshuffle = if has_valid_moves(&board) {
            None
        } else {
            Some(reshuffle(
                &mut board,
                factory.rng_mut(),
                DEFAULT_RESHUFFLE_ATTEMPTS,
            ))
        };

        Self::assemble(config, board, factory, initial_reshuffle)
    }

    /// Start a level on a prepared board (handcrafted layouts, puzzles, tests).
    ///
    /// The board is used as is, overlays included: the level's obstacle and bomb
    /// lists are not applied and nothing is reshuffled. Piece ids for refills
    /// continue after the largest id on the board.
    pub fn from_board(config: LevelConfig, board: Board, seed: u32) -> Self {
        let mut factory = PieceFactory::new(config.palette(), seed);
        factory.reserve_ids(board.pieces().map(|(_, p)| p.id).max().unwrap_or(0));
        Self::assemble(config, board, factory, None)
    }

    fn assemble(
        config: LevelConfig,
        board: Board,
        factory: PieceFactory,
        initial_reshuffle: Option<ReshuffleOutcome>,
    ) -> Self {
        Self {
            tracker: ObjectiveTracker::new(config.objective),
            moves_left: config.moves,
            config,
            board,
            factory,
            score: 0,
            depth: 0,
            phase: Phase::Idle,
            pending: None,
            tick_pending: false,
            bomb_expired: false,
            undo_slot: None,
            initial_reshuffle,
        }
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn moves_left(&self) -> u32 {
        self.moves_left
    }

    /// Current combo depth (0 while the player's own clear resolves)
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn progress(&self) -> ObjectiveProgress {
        self.tracker.progress()
    }

    pub fn objective_met(&self) -> bool {
        self.tracker.is_met(&self.config, self.score, &self.board)
    }

    pub fn stars(&self) -> u8 {
        self.config.stars(self.score)
    }

    /// Reshuffle done while filling the first board, if one was needed
    pub fn initial_reshuffle(&self) -> Option<ReshuffleOutcome> {
        self.initial_reshuffle
    }

    pub fn can_undo(&self) -> bool {
        self.phase == Phase::Idle && self.undo_slot.is_some()
    }

    /// First valid move in scan order, while the session accepts input
    pub fn hint(&self) -> Option<(Position, Position)> {
        if self.phase != Phase::Idle {
            return None;
        }
        find_valid_move(&self.board)
    }

    /// Try to swap two adjacent pieces.
    ///
    /// Two specials go down the combo path, and a color-clear swapped with a plain
    /// piece always goes off. Anything else must form a match or it is reverted.
    pub fn apply_swap(&mut self, from: Position, to: Position) -> SwapOutcome {
        if let Err(reason) = self.check_swap(from, to) {
            return SwapOutcome::Rejected(reason);
        }
        let (Some(a), Some(b)) = (self.board.piece(from), self.board.piece(to)) else {
            return SwapOutcome::Rejected(SwapRejection::EmptyCell);
        };

        if a.is_special() && b.is_special() {
            let Some(area) = combo_area(&self.board, from, to) else {
                return SwapOutcome::Rejected(SwapRejection::NoMatch);
            };
            self.commit_move(PendingClear {
                forced: area.clone(),
                consumed: [from, to].into_iter().collect(),
                swap: Some((from, to)),
                ..PendingClear::default()
            });
            return SwapOutcome::Combo {
                positions: area.into_iter().collect(),
            };
        }

        let snapshot = self.snapshot();
        self.board.swap(from, to);
        let matches = find_matches(&self.board);

        if matches.is_empty() {
            self.board.swap(from, to);
            let burst = match (a.special, b.special) {
                (Some(SpecialKind::ColorClear), _) => Some((from, b.color)),
                (_, Some(SpecialKind::ColorClear)) => Some((to, a.color)),
                _ => None,
            };
            let Some((center, color)) = burst else {
                return SwapOutcome::Rejected(SwapRejection::NoMatch);
            };
            let area = activation_area(&self.board, center, SpecialKind::ColorClear, color);
            self.commit_move_from(
                snapshot,
                PendingClear {
                    forced: [center].into_iter().collect(),
                    color_targets: [(center, color)].into_iter().collect(),
                    swap: Some((from, to)),
                    ..PendingClear::default()
                },
            );
            return SwapOutcome::ColorBurst {
                positions: area.into_iter().collect(),
            };
        }

        // A color-clear inside the match targets the color it was swapped with.
        // The board is already swapped: `a` now sits at `to` and `b` at `from`.
        let mut color_targets = BTreeMap::new();
        for (pos, partner) in [(to, b), (from, a)] {
            if self.board.piece(pos).and_then(|p| p.special) == Some(SpecialKind::ColorClear) {
                color_targets.insert(pos, partner.color);
            }
        }

        self.commit_move_from(
            snapshot,
            PendingClear {
                matches: matches.clone(),
                color_targets,
                swap: Some((from, to)),
                ..PendingClear::default()
            },
        );
        SwapOutcome::Matched { matches }
    }

    fn check_swap(&self, from: Position, to: Position) -> Result<(), SwapRejection> {
        if self.phase != Phase::Idle {
            return Err(SwapRejection::NotIdle);
        }
        if self.moves_left == 0 {
            return Err(SwapRejection::NoMovesLeft);
        }
        if !self.board.in_bounds(from) || !self.board.in_bounds(to) {
            return Err(SwapRejection::OutOfBounds);
        }
        if !from.is_adjacent(to) {
            return Err(SwapRejection::NotAdjacent);
        }
        if self.board.piece(from).is_none() || self.board.piece(to).is_none() {
            return Err(SwapRejection::EmptyCell);
        }
        if self.board.is_locked(from) || self.board.is_locked(to) {
            return Err(SwapRejection::Locked);
        }
        Ok(())
    }

    fn commit_move(&mut self, pending: PendingClear) {
        let snapshot = self.snapshot();
        self.commit_move_from(snapshot, pending);
    }

    /// Consume a move and queue its clear. `snapshot` is the pre-move state.
    fn commit_move_from(&mut self, snapshot: SessionSnapshot, pending: PendingClear) {
        self.undo_slot = Some(Box::new(snapshot));
        self.moves_left -= 1;
        self.depth = 0;
        self.tick_pending = true;
        self.pending = Some(pending);
        self.phase = Phase::Matching;
    }

    /// Use a power-up. Power-ups never consume a move.
    pub fn apply_power_up(
        &mut self,
        kind: PowerUpKind,
        target: Option<Position>,
    ) -> PowerUpOutcome {
        if self.phase != Phase::Idle {
            return PowerUpOutcome::Rejected(PowerUpRejection::NotIdle);
        }

        if kind == PowerUpKind::ExtraMoves {
            self.undo_slot = Some(Box::new(self.snapshot()));
            self.moves_left = self.moves_left.saturating_add(EXTRA_MOVES_POWER_UP);
            return PowerUpOutcome::MovesAdded {
                moves_left: self.moves_left,
            };
        }

        let Some(target) = target else {
            return PowerUpOutcome::Rejected(PowerUpRejection::MissingTarget);
        };
        if !self.board.in_bounds(target) {
            return PowerUpOutcome::Rejected(PowerUpRejection::OutOfBounds);
        }
        let Some(piece) = self.board.piece(target) else {
            return PowerUpOutcome::Rejected(PowerUpRejection::EmptyCell);
        };

        let forced: BTreeSet<Position> = match kind {
            PowerUpKind::ColorBlast => self
                .board
                .pieces()
                .filter(|(_, p)| p.color == piece.color)
                .map(|(pos, _)| pos)
                .collect(),
            _ => [target].into_iter().collect(),
        };

        self.undo_slot = Some(Box::new(self.snapshot()));
        self.depth = 0;
        self.pending = Some(PendingClear {
            forced: forced.clone(),
            ..PendingClear::default()
        });
        self.phase = Phase::Matching;
        PowerUpOutcome::Cleared {
            positions: forced.into_iter().collect(),
        }
    }

    /// Spend one bonus move destroying a random piece.
    ///
    /// Returns the chosen cell, or `None` when the session is not in `BonusMoves`.
    pub fn play_bonus_move(&mut self) -> Option<Position> {
        if self.phase != Phase::BonusMoves {
            return None;
        }
        let cells: Vec<Position> = self.board.pieces().map(|(pos, _)| pos).collect();
        let Some(&target) = self.factory.rng_mut().pick(&cells) else {
            self.moves_left = 0;
            self.phase = Phase::LevelComplete;
            return None;
        };

        self.moves_left = self.moves_left.saturating_sub(1);
        self.depth = 0;
        self.pending = Some(PendingClear {
            forced: [target].into_iter().collect(),
            bonus: true,
            ..PendingClear::default()
        });
        self.phase = Phase::Matching;
        Some(target)
    }

    /// Resolve one clear: activations, overlays, special placement, gravity and the
    /// re-scan. Returns `None` when no step is pending.
    pub fn step_cascade(&mut self) -> Option<CascadeStep> {
        let pending = self.pending.take()?;
        let depth = self.depth;

        let mut targets = pending.forced.clone();
        for m in &pending.matches {
            targets.extend(m.positions.iter().copied());
        }
        let (cleared, activations) = expand_chain(
            &self.board,
            &targets,
            &pending.consumed,
            &pending.color_targets,
        );

        let plan = self.board.plan_clear(&cleared);
        let score_gained = self.score_clear(&pending, &plan.removed, depth);

        self.tracker.record_clear(&self.board, &plan);
        for &pos in &plan.removed {
            self.board.take(pos);
        }
        self.board.apply_overlay_diff(&plan.diff);

        let spawned_specials = self.place_specials(&pending);
        let gravity = apply_gravity(&mut self.board, &mut self.factory);
        self.score = self.score.saturating_add(score_gained);

        let matches = find_matches(&self.board);
        let has_more = !matches.is_empty();
        let mut reshuffle_outcome = None;
        if has_more {
            self.depth += 1;
            self.pending = Some(PendingClear {
                matches,
                bonus: pending.bonus,
                ..PendingClear::default()
            });
            self.phase = Phase::Cascading;
        } else {
            self.phase = Phase::Settled;
            reshuffle_outcome = self.settle(pending.bonus);
        }

        Some(CascadeStep {
            depth,
            matches: pending.matches,
            cleared_positions: cleared.into_iter().collect(),
            special_activations: activations,
            overlay: plan.diff,
            spawned_specials,
            gravity_movements: gravity.movements,
            new_pieces: gravity.new_pieces,
            score_gained,
            has_more,
            reshuffle: reshuffle_outcome,
            phase: self.phase,
        })
    }

    /// Match points at `depth`, plus flat points for every other removed piece.
    ///
    /// A hit that only breaks a lock removes nothing and scores nothing.
    fn score_clear(&self, pending: &PendingClear, removed: &BTreeSet<Position>, depth: u32) -> u32 {
        let mut score: u32 = pending
            .matches
            .iter()
            .map(|m| calculate_match_score(m, depth))
            .sum();

        let mut extra = 0usize;
        for &pos in removed {
            if pending.matches.iter().any(|m| m.contains(pos)) {
                continue;
            }
            let plain_bonus_target = pending.bonus
                && pending.forced.contains(&pos)
                && self.board.piece(pos).is_some_and(|p| !p.is_special());
            if plain_bonus_target {
                score += bonus_piece_score();
            } else {
                extra += 1;
            }
        }
        score + special_clear_score(extra, pending.bonus)
    }

    /// Put earned specials on the board: preferred cell, else the pivot, else any
    /// freed cell of the match
    fn place_specials(&mut self, pending: &PendingClear) -> Vec<SpecialSpawn> {
        let mut placed = Vec::new();
        for m in &pending.matches {
            let Some(spawn) = resolve_special(m, pending.swap) else {
                continue;
            };
            let free = |board: &Board, p: Position| board.get(p) == Some(None) && !board.is_wall(p);
            let cell = [spawn.position, m.pivot]
                .into_iter()
                .chain(m.positions.iter().copied())
                .find(|&p| free(&self.board, p));
            let Some(position) = cell else {
                continue;
            };
            let piece = Piece::new(spawn.color, self.factory.next_id()).with_special(spawn.kind);
            self.board.set(position, Some(piece));
            placed.push(SpecialSpawn { position, ..spawn });
        }
        placed
    }

    /// Resolve `Settled` into the next phase, reshuffling a deadlocked board
    fn settle(&mut self, bonus: bool) -> Option<ReshuffleOutcome> {
        self.depth = 0;
        if bonus {
            self.phase = if self.moves_left > 0 {
                Phase::BonusMoves
            } else {
                Phase::LevelComplete
            };
            return None;
        }

        if std::mem::take(&mut self.tick_pending) && self.board.tick_bombs() {
            self.bomb_expired = true;
        }
        self.phase = self.end_phase();
        if self.phase != Phase::Idle || has_valid_moves(&self.board) {
            return None;
        }
        Some(reshuffle(
            &mut self.board,
            self.factory.rng_mut(),
            DEFAULT_RESHUFFLE_ATTEMPTS,
        ))
    }

    fn end_phase(&self) -> Phase {
        if self.bomb_expired {
            return Phase::GameOver;
        }
        let met = self.objective_met();
        match self.config.objective {
            Objective::ReachScore => match (self.moves_left, met) {
                (0, true) => Phase::LevelComplete,
                (0, false) => Phase::GameOver,
                _ => Phase::Idle,
            },
            Objective::BreakAllIce | Objective::ClearColor { .. } => match (self.moves_left, met) {
                (0, true) => Phase::LevelComplete,
                (_, true) => Phase::BonusMoves,
                (0, false) => Phase::GameOver,
                _ => Phase::Idle,
            },
        }
    }

    /// Re-evaluate the end conditions of a settled session.
    ///
    /// Only `Idle` and `Settled` are re-evaluated; every other phase is returned as is.
    pub fn evaluate_end(&mut self) -> Phase {
        if matches!(self.phase, Phase::Idle | Phase::Settled) {
            self.phase = self.end_phase();
        }
        self.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::has_matches;
    use crate::types::{Obstacle, ObstaclePlacement};

    /// Session on a hand-placed board carrying the config's overlays
    fn session_with(rows: &[&str], config: LevelConfig) -> Session {
        let mut board = Board::from_layout(rows).unwrap();
        for placement in &config.obstacles {
            board.set_obstacle(placement.position, Some(placement.obstacle));
        }
        for bomb in &config.bombs {
            board.place_bomb(bomb.position, bomb.timer);
        }
        Session::from_board(config, board, 7)
    }

    fn settle(session: &mut Session) -> Vec<CascadeStep> {
        let mut steps = Vec::new();
        while let Some(step) = session.step_cascade() {
            steps.push(step);
        }
        steps
    }

    const QUIET: [&str; 5] = ["RGBYR", "GBYRG", "BYRGB", "YRGBY", "RGBYR"];

    #[test]
    fn test_new_session_has_no_matches_and_a_move() {
        for seed in 0..20 {
            let session = Session::new(LevelConfig::simple(7, 7, 4, 30, 800), seed);
            assert!(!has_matches(session.board()));
            assert!(session.board().is_full());
            assert!(session.hint().is_some());
            assert_eq!(session.phase(), Phase::Idle);
        }
    }

    #[test]
    fn test_walls_stay_empty_at_start() {
        let mut config = LevelConfig::simple(5, 5, 4, 10, 500);
        config.obstacles.push(ObstaclePlacement {
            position: Position::new(2, 2),
            obstacle: Obstacle::Wall,
        });
        let session = Session::new(config, 3);
        assert_eq!(session.board().get(Position::new(2, 2)), Some(None));
    }

    #[test]
    fn test_rejections_leave_state_untouched() {
        let mut session = session_with(&QUIET, LevelConfig::simple(5, 5, 4, 10, 500));
        let before = session.snapshot();

        let cases = [
            (Position::new(0, 0), Position::new(0, 5), SwapRejection::OutOfBounds),
            (Position::new(0, 0), Position::new(1, 1), SwapRejection::NotAdjacent),
            (Position::new(0, 0), Position::new(0, 1), SwapRejection::NoMatch),
        ];
        for (from, to, reason) in cases {
            assert_eq!(session.apply_swap(from, to), SwapOutcome::Rejected(reason));
            assert_eq!(session.snapshot(), before);
        }
        assert_eq!(session.step_cascade(), None);
    }

    #[test]
    fn test_locked_and_busy_rejections() {
        let mut config = LevelConfig::simple(5, 5, 4, 10, 500);
        config.obstacles.push(ObstaclePlacement {
            position: Position::new(0, 0),
            obstacle: Obstacle::Locked,
        });
        let mut session = session_with(&QUIET, config);
        assert_eq!(
            session.apply_swap(Position::new(0, 0), Position::new(0, 1)),
            SwapOutcome::Rejected(SwapRejection::Locked)
        );

        session.phase = Phase::Cascading;
        assert_eq!(
            session.apply_swap(Position::new(1, 1), Position::new(1, 2)),
            SwapOutcome::Rejected(SwapRejection::NotIdle)
        );
        assert_eq!(
            session.apply_power_up(PowerUpKind::ExtraMoves, None),
            PowerUpOutcome::Rejected(PowerUpRejection::NotIdle)
        );
    }

    #[test]
    fn test_three_match_scores_and_consumes_a_move() {
        // Swapping (1,2) Y up into (0,2) makes Y Y Y across row 0.
        let rows = ["YYBGR", "GBYRG", "BRGBY", "RGBYR", "GBRGB"];
        let mut session = session_with(&rows, LevelConfig::simple(5, 5, 4, 10, 500));

        let outcome = session.apply_swap(Position::new(1, 2), Position::new(0, 2));
        let SwapOutcome::Matched { matches } = outcome else {
            panic!("expected a match, got {outcome:?}");
        };
        assert_eq!(matches, find_matches(session.board()));
        assert_eq!(session.moves_left(), 9);
        assert_eq!(session.phase(), Phase::Matching);

        let first = session.step_cascade().unwrap();
        assert_eq!(first.depth, 0);
        assert_eq!(first.score_gained, 100);
        assert_eq!(first.cleared_positions.len(), 3);
        settle(&mut session);
        assert!(!session.phase().is_resolving());
        assert!(session.score() >= 100);
    }

    #[test]
    fn test_four_in_a_row_spawns_line_clear_on_swapped_cell() {
        let rows = ["RRGRB", "GBRYG", "BYBGY", "YGYBR", "GBGYB"];
        let mut session = session_with(&rows, LevelConfig::simple(5, 5, 4, 10, 500));

        let outcome = session.apply_swap(Position::new(1, 2), Position::new(0, 2));
        assert!(outcome.is_accepted());
        let step = session.step_cascade().unwrap();
        assert_eq!(step.spawned_specials.len(), 1);
        let spawn = step.spawned_specials[0];
        assert_eq!(spawn.kind, SpecialKind::ColumnClear);
        assert_eq!(spawn.color, Color::Red);
        assert_eq!(spawn.position.col, 2);
    }

    #[test]
    fn test_combo_of_two_line_clears_is_a_cross() {
        let mut session = session_with(&QUIET, LevelConfig::simple(5, 5, 4, 10, 500));
        for (pos, kind) in [
            (Position::new(2, 1), SpecialKind::RowClear),
            (Position::new(2, 2), SpecialKind::ColumnClear),
        ] {
            let p = session.board.piece(pos).unwrap().with_special(kind);
            session.board.set(pos, Some(p));
        }

        let outcome = session.apply_swap(Position::new(2, 1), Position::new(2, 2));
        let SwapOutcome::Combo { positions } = outcome else {
            panic!("expected a combo, got {outcome:?}");
        };
        assert_eq!(positions.len(), 5 + 5 - 1);
        assert_eq!(session.moves_left(), 9);

        let step = session.step_cascade().unwrap();
        assert_eq!(step.cleared_positions.len(), 9);
        assert_eq!(step.score_gained, 9 * 60);
        assert!(step.special_activations.is_empty());
    }

    #[test]
    fn test_color_burst_without_match() {
        let mut session = session_with(&QUIET, LevelConfig::simple(5, 5, 4, 10, 500));
        let pos = Position::new(0, 0);
        let p = session.board.piece(pos).unwrap().with_special(SpecialKind::ColorClear);
        session.board.set(pos, Some(p));

        // (0,1) is green: every green piece goes.
        let outcome = session.apply_swap(pos, Position::new(0, 1));
        let SwapOutcome::ColorBurst { positions } = outcome else {
            panic!("expected a color burst, got {outcome:?}");
        };
        let greens = QUIET
            .iter()
            .map(|r| r.chars().filter(|&c| c == 'G').count())
            .sum::<usize>();
        assert_eq!(positions.len(), greens + 1);

        let step = session.step_cascade().unwrap();
        assert_eq!(step.special_activations.len(), 1);
        assert_eq!(step.special_activations[0].target_color, Some(Color::Green));
    }

    #[test]
    fn test_hammer_and_color_blast() {
        let mut session = session_with(&QUIET, LevelConfig::simple(5, 5, 4, 10, 500));
        assert_eq!(
            session.apply_power_up(PowerUpKind::Hammer, None),
            PowerUpOutcome::Rejected(PowerUpRejection::MissingTarget)
        );
        let outcome = session.apply_power_up(PowerUpKind::Hammer, Some(Position::new(4, 4)));
        assert_eq!(
            outcome,
            PowerUpOutcome::Cleared {
                positions: vec![Position::new(4, 4)]
            }
        );
        let step = session.step_cascade().unwrap();
        assert_eq!(step.score_gained, 60);
        settle(&mut session);
        assert_eq!(session.moves_left(), 10);

        if session.phase() == Phase::Idle {
            let color = session.board.piece(Position::new(0, 0)).unwrap().color;
            let count = session.board.pieces().filter(|(_, p)| p.color == color).count();
            let outcome =
                session.apply_power_up(PowerUpKind::ColorBlast, Some(Position::new(0, 0)));
            let PowerUpOutcome::Cleared { positions } = outcome else {
                panic!("expected a clear");
            };
            assert_eq!(positions.len(), count);
        }
    }

    #[test]
    fn test_extra_moves_power_up() {
        let mut session = session_with(&QUIET, LevelConfig::simple(5, 5, 4, 10, 500));
        assert_eq!(
            session.apply_power_up(PowerUpKind::ExtraMoves, None),
            PowerUpOutcome::MovesAdded { moves_left: 15 }
        );
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.step_cascade(), None);
    }

    #[test]
    fn test_end_rules_for_reach_score() {
        let mut session = session_with(&QUIET, LevelConfig::simple(5, 5, 4, 10, 500));
        session.score = 600;
        assert_eq!(session.evaluate_end(), Phase::Idle);
        session.moves_left = 0;
        assert_eq!(session.evaluate_end(), Phase::LevelComplete);

        let mut losing = session_with(&QUIET, LevelConfig::simple(5, 5, 4, 10, 500));
        losing.moves_left = 0;
        assert_eq!(losing.evaluate_end(), Phase::GameOver);
    }

    #[test]
    fn test_end_rules_for_ice() {
        let mut config = LevelConfig::simple(5, 5, 4, 10, 500);
        config.objective = Objective::BreakAllIce;
        let mut session = session_with(&QUIET, config);
        assert_eq!(session.evaluate_end(), Phase::BonusMoves);

        session.phase = Phase::Idle;
        session.moves_left = 0;
        assert_eq!(session.evaluate_end(), Phase::LevelComplete);
    }

    #[test]
    fn test_reinforced_ice_does_not_hold_back_break_all_ice() {
        let mut config = LevelConfig::simple(5, 5, 4, 10, 500);
        config.objective = Objective::BreakAllIce;
        config.obstacles.push(ObstaclePlacement {
            position: Position::new(1, 1),
            obstacle: Obstacle::ReinforcedIce,
        });
        let mut session = session_with(&QUIET, config);
        assert_eq!(session.evaluate_end(), Phase::BonusMoves);

        session.phase = Phase::Idle;
        session.board.set_obstacle(Position::new(1, 1), Some(Obstacle::Ice));
        assert_eq!(session.evaluate_end(), Phase::Idle);
    }

    #[test]
    fn test_bomb_expiry_ends_after_the_clear_is_credited() {
        let mut config = LevelConfig::simple(5, 5, 4, 10, 500);
        config.bombs.push(crate::types::BombPlacement {
            position: Position::new(4, 4),
            timer: 1,
        });
        // Walls fence the bomb's piece in, so no run can reach it.
        let rows = ["YYBGR", "GBYRG", "BRGBY", "RGBY#", "GBR#B"];
        let mut session = session_with(&rows, config);

        assert!(session.apply_swap(Position::new(1, 2), Position::new(0, 2)).is_accepted());
        let steps = settle(&mut session);
        assert_eq!(session.phase(), Phase::GameOver);
        let credited: u32 = steps.iter().map(|s| s.score_gained).sum();
        assert_eq!(session.score(), credited);
        assert!(credited >= 100);
    }

    #[test]
    fn test_bonus_moves_run_out_into_level_complete() {
        let mut session = session_with(&QUIET, LevelConfig::simple(5, 5, 4, 10, 500));
        session.phase = Phase::BonusMoves;
        session.moves_left = 2;

        let mut played = 0;
        while session.phase() == Phase::BonusMoves {
            assert!(session.play_bonus_move().is_some());
            settle(&mut session);
            played += 1;
        }
        assert_eq!(played, 2);
        assert_eq!(session.moves_left(), 0);
        assert_eq!(session.phase(), Phase::LevelComplete);
        assert!(session.score() >= 100);
    }

    #[test]
    fn test_undo_restores_pre_move_state() {
        let rows = ["YYBGR", "GBYRG", "BRGBY", "RGBYR", "GBRGB"];
        let mut session = session_with(&rows, LevelConfig::simple(5, 5, 4, 10, 500));
        let before = session.snapshot();
        assert!(!session.can_undo());

        assert!(session.apply_swap(Position::new(1, 2), Position::new(0, 2)).is_accepted());
        assert!(!session.undo());
        settle(&mut session);
        if session.phase() == Phase::Idle {
            assert!(session.undo());
            assert_eq!(session.snapshot(), before);
            assert!(!session.can_undo());
        }
    }

    #[test]
    fn test_color_clear_swapped_into_a_match_targets_its_partner() {
        let rows = ["GGBYR", "RYGRB", "BRYGY", "YBRBG", "RGYRB"];
        let mut session = session_with(&rows, LevelConfig::simple(5, 5, 4, 10, 500));
        let from = Position::new(1, 2);
        let to = Position::new(0, 2);
        let p = session.board.piece(from).unwrap().with_special(SpecialKind::ColorClear);
        session.board.set(from, Some(p));
        assert_eq!(session.board.piece(to).unwrap().color, Color::Blue);

        // The green color-clear completes the top row; its partner is blue.
        let outcome = session.apply_swap(from, to);
        assert!(matches!(outcome, SwapOutcome::Matched { .. }), "{outcome:?}");
        let blues: Vec<Position> = session
            .board
            .pieces()
            .filter(|(_, p)| p.color == Color::Blue)
            .map(|(pos, _)| pos)
            .collect();

        let step = session.step_cascade().unwrap();
        let activation = step
            .special_activations
            .iter()
            .find(|a| a.kind == SpecialKind::ColorClear)
            .unwrap();
        assert_eq!(activation.position, to);
        assert_eq!(activation.target_color, Some(Color::Blue));
        for pos in blues {
            assert!(step.cleared_positions.contains(&pos), "{pos:?} survived");
        }
    }

    #[test]
    fn test_hammer_on_a_locked_piece_only_breaks_the_lock() {
        let mut config = LevelConfig::simple(5, 5, 4, 10, 500);
        config.obstacles.push(ObstaclePlacement {
            position: Position::new(2, 2),
            obstacle: Obstacle::Locked,
        });
        let mut session = session_with(&QUIET, config);
        let before = session.board.piece(Position::new(2, 2)).unwrap();

        let outcome = session.apply_power_up(PowerUpKind::Hammer, Some(Position::new(2, 2)));
        assert!(matches!(outcome, PowerUpOutcome::Cleared { .. }));
        let step = session.step_cascade().unwrap();

        assert_eq!(step.score_gained, 0);
        assert_eq!(step.overlay.unlocked, vec![Position::new(2, 2)]);
        assert!(!session.board.is_locked(Position::new(2, 2)));
        assert_eq!(session.board.piece(Position::new(2, 2)), Some(before));
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn test_last_move_at_950_completes_with_one_star() {
        // After the bottom row clears, no refill colors can line up again.
        let config = LevelConfig::simple(3, 3, 4, 1, 800);
        let mut session = session_with(&["Y#B", "GBR", "RRG"], config);
        session.score = 850;

        let outcome = session.apply_swap(Position::new(1, 2), Position::new(2, 2));
        assert!(outcome.is_accepted());
        let steps = settle(&mut session);

        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].score_gained, 100);
        assert_eq!(session.score(), 950);
        assert_eq!(session.moves_left(), 0);
        assert_eq!(session.phase(), Phase::LevelComplete);
        assert_eq!(session.stars(), 1);
    }
}
