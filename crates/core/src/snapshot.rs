//! Session snapshots - deep copies for one-level undo and replay checks

use crate::board::Board;
use crate::objective::ObjectiveProgress;
use crate::rng::PieceFactory;
use crate::session::{PendingClear, Session};
use crate::types::Phase;

/// Full copy of a session's mutable state.
///
/// Two sessions that received the same seed and inputs produce equal snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub(crate) board: Board,
    pub(crate) factory: PieceFactory,
    pub(crate) score: u32,
    pub(crate) moves_left: u32,
    pub(crate) depth: u32,
    pub(crate) phase: Phase,
    pub(crate) pending: Option<PendingClear>,
    pub(crate) progress: ObjectiveProgress,
    pub(crate) tick_pending: bool,
    pub(crate) bomb_expired: bool,
}

impl SessionSnapshot {
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn moves_left(&self) -> u32 {
        self.moves_left
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn progress(&self) -> ObjectiveProgress {
        self.progress
    }
}

impl Session {
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            board: self.board.clone(),
            factory: self.factory.clone(),
            score: self.score,
            moves_left: self.moves_left,
            depth: self.depth,
            phase: self.phase,
            pending: self.pending.clone(),
            progress: self.tracker.progress(),
            tick_pending: self.tick_pending,
            bomb_expired: self.bomb_expired,
        }
    }

    /// Overwrite the session state with `snapshot`. The undo slot is left alone.
    pub fn restore(&mut self, snapshot: &SessionSnapshot) {
        self.board = snapshot.board.clone();
        self.factory = snapshot.factory.clone();
        self.score = snapshot.score;
        self.moves_left = snapshot.moves_left;
        self.depth = snapshot.depth;
        self.phase = snapshot.phase;
        self.pending = snapshot.pending.clone();
        self.tracker.restore(snapshot.progress);
        self.tick_pending = snapshot.tick_pending;
        self.bomb_expired = snapshot.bomb_expired;
    }

    /// Roll back the last committed move or power-up.
    ///
    /// Only from `Idle` and only one level deep; returns false when there is nothing
    /// to undo.
    pub fn undo(&mut self) -> bool {
        if self.phase != Phase::Idle {
            return false;
        }
        match self.undo_slot.take() {
            Some(snapshot) => {
                self.restore(&snapshot);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LevelConfig, PowerUpKind};

    #[test]
    fn test_restore_roundtrips_state() {
        let mut session = Session::new(LevelConfig::simple(6, 6, 4, 20, 1000), 11);
        let saved = session.snapshot();

        session.apply_power_up(PowerUpKind::ExtraMoves, None);
        assert_ne!(session.snapshot(), saved);

        session.restore(&saved);
        assert_eq!(session.snapshot(), saved);
        assert_eq!(saved.moves_left(), 20);
        assert_eq!(saved.phase(), Phase::Idle);
    }

    #[test]
    fn test_undo_is_one_level_deep() {
        let mut session = Session::new(LevelConfig::simple(6, 6, 4, 20, 1000), 11);
        assert!(!session.undo());

        session.apply_power_up(PowerUpKind::ExtraMoves, None);
        session.apply_power_up(PowerUpKind::ExtraMoves, None);
        assert_eq!(session.moves_left(), 30);

        assert!(session.undo());
        assert_eq!(session.moves_left(), 25);
        assert!(!session.undo());
    }

    #[test]
    fn test_same_seed_same_snapshot() {
        let a = Session::new(LevelConfig::simple(8, 8, 5, 20, 1000), 99);
        let b = Session::new(LevelConfig::simple(8, 8, 5, 20, 1000), 99);
        assert_eq!(a.snapshot(), b.snapshot());
        let c = Session::new(LevelConfig::simple(8, 8, 5, 20, 1000), 100);
        assert_ne!(a.snapshot(), c.snapshot());
    }
}
