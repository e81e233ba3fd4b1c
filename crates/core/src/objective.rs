//! Objective tracking - progress counters for one playthrough

use crate::board::{Board, ClearPlan};
use crate::types::{LevelConfig, Objective, Obstacle};

/// Counter values, copied in and out of snapshots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ObjectiveProgress {
    /// Ice cells fully removed (a cracked reinforced layer does not count)
    pub ice_broken: u32,
    /// Pieces of the objective color cleared
    pub color_cleared: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectiveTracker {
    objective: Objective,
    progress: ObjectiveProgress,
}

impl ObjectiveTracker {
    pub fn new(objective: Objective) -> Self {
        Self {
            objective,
            progress: ObjectiveProgress::default(),
        }
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    pub fn progress(&self) -> ObjectiveProgress {
        self.progress
    }

    /// Count a clear. Must run before the planned cells are emptied.
    pub fn record_clear(&mut self, board: &Board, plan: &ClearPlan) {
        self.progress.ice_broken += plan.diff.broken_ice.len() as u32;
        if let Objective::ClearColor { color, .. } = self.objective {
            let cleared = plan
                .removed
                .iter()
                .filter(|&&pos| board.piece(pos).is_some_and(|p| p.color == color))
                .count() as u32;
            self.progress.color_cleared += cleared;
        }
    }

    pub fn is_met(&self, config: &LevelConfig, score: u32, board: &Board) -> bool {
        match self.objective {
            Objective::ReachScore => score >= config.target_score,
            // Reinforced ice still needs its first hit; only plain ice blocks the objective.
            Objective::BreakAllIce => !board.obstacles().values().any(|&o| o == Obstacle::Ice),
            Objective::ClearColor { count, .. } => self.progress.color_cleared >= count,
        }
    }

    pub fn reset(&mut self) {
        self.progress = ObjectiveProgress::default();
    }

    pub fn restore(&mut self, progress: ObjectiveProgress) {
        self.progress = progress;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Color, Obstacle, Position};
    use std::collections::BTreeSet;

    fn row_targets(row: i32, cols: i32) -> BTreeSet<Position> {
        (0..cols).map(|c| Position::new(row, c)).collect()
    }

    #[test]
    fn test_counts_ice_and_color_before_removal() {
        let mut board = Board::from_layout(&["RRR", "GBY", "BYG"]).unwrap();
        board.set_obstacle(Position::new(0, 0), Some(Obstacle::Ice));
        board.set_obstacle(Position::new(0, 1), Some(Obstacle::ReinforcedIce));

        let mut tracker = ObjectiveTracker::new(Objective::ClearColor {
            color: Color::Red,
            count: 3,
        });
        let plan = board.plan_clear(&row_targets(0, 3));
        tracker.record_clear(&board, &plan);

        assert_eq!(
            tracker.progress(),
            ObjectiveProgress {
                ice_broken: 1,
                color_cleared: 3
            }
        );
        let cfg = LevelConfig::simple(3, 3, 4, 10, 100);
        assert!(tracker.is_met(&cfg, 0, &board));
    }

    #[test]
    fn test_break_all_ice_reads_the_board() {
        let mut board = Board::from_layout(&["RGB", "GBY", "BYG"]).unwrap();
        let tracker = ObjectiveTracker::new(Objective::BreakAllIce);
        let cfg = LevelConfig::simple(3, 3, 4, 10, 100);
        assert!(tracker.is_met(&cfg, 0, &board));

        board.set_obstacle(Position::new(2, 2), Some(Obstacle::Ice));
        assert!(!tracker.is_met(&cfg, 0, &board));
    }

    #[test]
    fn test_reinforced_ice_alone_does_not_block_break_all_ice() {
        let mut board = Board::from_layout(&["RGB", "GBY", "BYG"]).unwrap();
        board.set_obstacle(Position::new(1, 1), Some(Obstacle::ReinforcedIce));
        let tracker = ObjectiveTracker::new(Objective::BreakAllIce);
        let cfg = LevelConfig::simple(3, 3, 4, 10, 100);
        assert!(tracker.is_met(&cfg, 0, &board));

        // Cracking it leaves plain ice behind, which does block.
        let plan = board.plan_clear(&[Position::new(1, 1)].into_iter().collect());
        board.apply_overlay_diff(&plan.diff);
        assert_eq!(board.obstacle(Position::new(1, 1)), Some(Obstacle::Ice));
        assert!(!tracker.is_met(&cfg, 0, &board));
    }

    #[test]
    fn test_reach_score_and_reset_restore() {
        let board = Board::new(3, 3);
        let cfg = LevelConfig::simple(3, 3, 4, 10, 100);
        let mut tracker = ObjectiveTracker::new(Objective::ReachScore);
        assert!(!tracker.is_met(&cfg, 99, &board));
        assert!(tracker.is_met(&cfg, 100, &board));

        let saved = ObjectiveProgress {
            ice_broken: 2,
            color_cleared: 5,
        };
        tracker.restore(saved);
        assert_eq!(tracker.progress(), saved);
        tracker.reset();
        assert_eq!(tracker.progress(), ObjectiveProgress::default());
    }
}
