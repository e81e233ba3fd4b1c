//! JSON lines printed by the headless runner.

use serde::Serialize;

use crate::core::{CascadeStep, ObjectiveProgress, ReshuffleOutcome, Session};
use crate::engine::TurnReport;
use crate::types::{Objective, Phase, Position, SpecialKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReshuffleLine {
    pub attempts: u32,
    pub success: bool,
}

impl From<ReshuffleOutcome> for ReshuffleLine {
    fn from(outcome: ReshuffleOutcome) -> Self {
        Self {
            attempts: outcome.attempts,
            success: outcome.success,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpawnLine {
    pub kind: SpecialKind,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepLine {
    pub depth: u32,
    pub matches: usize,
    pub cleared: usize,
    pub activations: Vec<SpecialKind>,
    pub spawned: Vec<SpawnLine>,
    pub moved: usize,
    pub new_pieces: usize,
    pub ice_broken: usize,
    pub score_gained: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reshuffle: Option<ReshuffleLine>,
}

impl From<&CascadeStep> for StepLine {
    fn from(step: &CascadeStep) -> Self {
        Self {
            depth: step.depth,
            matches: step.matches.len(),
            cleared: step.cleared_positions.len(),
            activations: step.special_activations.iter().map(|a| a.kind).collect(),
            spawned: step
                .spawned_specials
                .iter()
                .map(|s| SpawnLine {
                    kind: s.kind,
                    position: s.position,
                })
                .collect(),
            moved: step.gravity_movements.iter().filter(|m| !m.is_new).count(),
            new_pieces: step.new_pieces.len(),
            ice_broken: step.overlay.broken_ice.len(),
            score_gained: step.score_gained,
            reshuffle: step.reshuffle.map(ReshuffleLine::from),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    Swap,
    Bonus,
    PowerUp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnLine {
    pub turn: u32,
    pub kind: TurnKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Position>,
    pub steps: Vec<StepLine>,
    pub score_gained: u32,
    pub score: u32,
    pub moves_left: u32,
    pub phase: Phase,
}

impl TurnLine {
    pub fn new(turn: u32, report: &TurnReport, score: u32) -> Self {
        let kind = match (report.swap, report.bonus_target) {
            (Some(_), _) => TurnKind::Swap,
            (None, Some(_)) => TurnKind::Bonus,
            (None, None) => TurnKind::PowerUp,
        };
        Self {
            turn,
            kind,
            from: report.swap.map(|(from, _)| from),
            to: report.swap.map(|(_, to)| to),
            target: report.bonus_target,
            steps: report.steps.iter().map(StepLine::from).collect(),
            score_gained: report.score_gained,
            score,
            moves_left: report.moves_left,
            phase: report.phase,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressLine {
    pub ice_broken: u32,
    pub color_cleared: u32,
    pub ice_remaining: usize,
}

impl ProgressLine {
    fn new(progress: ObjectiveProgress, ice_remaining: usize) -> Self {
        Self {
            ice_broken: progress.ice_broken,
            color_cleared: progress.color_cleared,
            ice_remaining,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryLine {
    pub seed: u32,
    pub rows: i32,
    pub cols: i32,
    pub objective: Objective,
    pub turns: u32,
    pub score: u32,
    pub target_score: u32,
    pub stars: u8,
    pub moves_left: u32,
    pub phase: Phase,
    pub objective_met: bool,
    pub progress: ProgressLine,
}

impl SummaryLine {
    pub fn new(session: &Session, seed: u32, turns: u32) -> Self {
        let config = session.config();
        Self {
            seed,
            rows: config.rows,
            cols: config.cols,
            objective: config.objective,
            turns,
            score: session.score(),
            target_score: config.target_score,
            stars: session.stars(),
            moves_left: session.moves_left(),
            phase: session.phase(),
            objective_met: session.objective_met(),
            progress: ProgressLine::new(session.progress(), session.board().ice_count()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::autoplay_turn;
    use crate::types::LevelConfig;

    #[test]
    fn turn_line_serializes_swap_fields() {
        let mut session = Session::new(LevelConfig::simple(7, 7, 4, 30, 800), 3);
        let report = autoplay_turn(&mut session).unwrap();
        let line = TurnLine::new(1, &report, session.score());

        let json: serde_json::Value = serde_json::to_value(&line).unwrap();
        assert_eq!(json["kind"], "swap");
        assert_eq!(json["phase"], "idle");
        assert_eq!(json["moves_left"], 29);
        assert!(json["from"]["row"].is_number());
        assert!(json.get("target").is_none());
        assert_eq!(json["steps"].as_array().unwrap().len(), report.steps.len());
    }

    #[test]
    fn summary_line_reports_objective() {
        let session = Session::new(LevelConfig::simple(7, 7, 4, 30, 800), 3);
        let line = SummaryLine::new(&session, 3, 0);
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["objective"]["kind"], "reach_score");
        assert_eq!(json["stars"], 0);
        assert_eq!(json["progress"]["ice_remaining"], 0);
    }
}
