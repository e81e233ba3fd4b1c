use match_three_core::{
    CascadeStep, PowerUpOutcome, PowerUpRejection, Session, SwapOutcome, SwapRejection,
};
use match_three_types::{Phase, Position, PowerUpKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnError {
    NotPlayable,
    Busy,
    Swap(SwapRejection),
    PowerUp(PowerUpRejection),
    NoMoveAvailable,
}

impl TurnError {
    pub fn code(self) -> &'static str {
        match self {
            TurnError::NotPlayable | TurnError::Busy => "not_playable",
            TurnError::Swap(_) => "invalid_swap",
            TurnError::PowerUp(_) => "invalid_power_up",
            TurnError::NoMoveAvailable => "no_move",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            TurnError::NotPlayable => "session has ended",
            TurnError::Busy => "a cascade is still resolving",
            TurnError::Swap(reason) => reason.message(),
            TurnError::PowerUp(reason) => reason.message(),
            TurnError::NoMoveAvailable => "board has no valid move",
        }
    }
}

/// One player (or bonus) action together with everything it set off
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    /// The swap played, if the turn was a swap
    pub swap: Option<(Position, Position)>,
    /// Cell destroyed by a bonus move
    pub bonus_target: Option<Position>,
    pub steps: Vec<CascadeStep>,
    pub score_gained: u32,
    pub moves_left: u32,
    pub phase: Phase,
}

impl TurnReport {
    fn collect(session: &mut Session, steps: Vec<CascadeStep>) -> Self {
        let phase = session.evaluate_end();
        Self {
            swap: None,
            bonus_target: None,
            score_gained: steps.iter().map(|s| s.score_gained).sum(),
            steps,
            moves_left: session.moves_left(),
            phase,
        }
    }

    /// Deepest cascade level reached (0 when only the action's own clear ran)
    pub fn max_depth(&self) -> u32 {
        self.steps.iter().map(|s| s.depth).max().unwrap_or(0)
    }

    pub fn cleared(&self) -> usize {
        self.steps.iter().map(|s| s.cleared_positions.len()).sum()
    }

    /// A settled board had to be reshuffled and the attempt bound ran out
    pub fn reshuffle_failed(&self) -> bool {
        self.steps
            .iter()
            .filter_map(|s| s.reshuffle)
            .any(|r| !r.success)
    }
}

fn check_ready(session: &Session) -> Result<(), TurnError> {
    if session.phase().is_terminal() {
        return Err(TurnError::NotPlayable);
    }
    if session.phase().is_resolving() {
        return Err(TurnError::Busy);
    }
    Ok(())
}

/// Step the pending cascade out
pub fn settle(session: &mut Session) -> Vec<CascadeStep> {
    let mut steps = Vec::new();
    while let Some(step) = session.step_cascade() {
        steps.push(step);
    }
    steps
}

/// Swap, resolve the cascade and evaluate the end conditions.
pub fn play_swap(
    session: &mut Session,
    from: Position,
    to: Position,
) -> Result<TurnReport, TurnError> {
    check_ready(session)?;
    if let SwapOutcome::Rejected(reason) = session.apply_swap(from, to) {
        return Err(TurnError::Swap(reason));
    }
    let steps = settle(session);
    let mut report = TurnReport::collect(session, steps);
    report.swap = Some((from, to));
    Ok(report)
}

pub fn play_power_up(
    session: &mut Session,
    kind: PowerUpKind,
    target: Option<Position>,
) -> Result<TurnReport, TurnError> {
    check_ready(session)?;
    if let PowerUpOutcome::Rejected(reason) = session.apply_power_up(kind, target) {
        return Err(TurnError::PowerUp(reason));
    }
    let steps = settle(session);
    Ok(TurnReport::collect(session, steps))
}

/// Play one bonus move and resolve it
pub fn play_bonus_move(session: &mut Session) -> Result<TurnReport, TurnError> {
    check_ready(session)?;
    let Some(target) = session.play_bonus_move() else {
        return Err(TurnError::NotPlayable);
    };
    let steps = settle(session);
    let mut report = TurnReport::collect(session, steps);
    report.bonus_target = Some(target);
    Ok(report)
}

/// Spend every remaining bonus move
pub fn finish_bonus_moves(session: &mut Session) -> Vec<TurnReport> {
    let mut reports = Vec::new();
    while session.phase() == Phase::BonusMoves {
        match play_bonus_move(session) {
            Ok(report) => reports.push(report),
            Err(_) => break,
        }
    }
    reports
}

/// Play the hinted move, or a bonus move while those are running
pub fn autoplay_turn(session: &mut Session) -> Result<TurnReport, TurnError> {
    check_ready(session)?;
    if session.phase() == Phase::BonusMoves {
        return play_bonus_move(session);
    }
    let Some((from, to)) = session.hint() else {
        return Err(TurnError::NoMoveAvailable);
    };
    play_swap(session, from, to)
}
