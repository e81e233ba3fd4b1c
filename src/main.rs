//! Headless match-three runner (default binary).
//!
//! Loads a level (generated from an index or read from JSON), autoplays it with the
//! engine's hints and prints a human summary, or JSON lines with `--json`.

use anyhow::{anyhow, Result};

use match_three::cli::{load_level, parse_runner_args, RunnerConfig, USAGE};
use match_three::core::Session;
use match_three::engine::{autoplay_turn, TurnError};
use match_three::report::{StepLine, SummaryLine, TurnLine};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match parse_runner_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", USAGE);
            return Err(e);
        }
    };
    run(&config)
}

fn run(config: &RunnerConfig) -> Result<()> {
    let level = load_level(&config.level)?;
    let mut session = Session::new(level, config.seed);

    if let Some(outcome) = session.initial_reshuffle() {
        if !outcome.success {
            eprintln!(
                "[runner] initial board stayed deadlocked after {} reshuffles",
                outcome.attempts
            );
        } else if config.verbose {
            eprintln!("[runner] initial board reshuffled ({} attempts)", outcome.attempts);
        }
    }

    let mut turns = 0u32;
    while !session.phase().is_terminal() {
        if config.max_turns.is_some_and(|max| turns >= max) {
            if config.verbose {
                eprintln!("[runner] stopping after {} turns", turns);
            }
            break;
        }

        let report = match autoplay_turn(&mut session) {
            Ok(report) => report,
            Err(TurnError::NoMoveAvailable) => {
                eprintln!("[runner] no valid move left on turn {}", turns + 1);
                break;
            }
            Err(e) => {
                return Err(anyhow!(
                    "turn {} failed: {} ({})",
                    turns + 1,
                    e.message(),
                    e.code()
                ))
            }
        };
        turns += 1;

        if report.reshuffle_failed() {
            eprintln!("[runner] reshuffle exhausted its attempts on turn {}", turns);
        }
        if config.verbose {
            for step in &report.steps {
                let line = StepLine::from(step);
                eprintln!(
                    "[runner] turn {} depth {}: cleared {} (+{}), {} new pieces",
                    turns, line.depth, line.cleared, line.score_gained, line.new_pieces
                );
            }
        }

        if config.json {
            let line = TurnLine::new(turns, &report, session.score());
            println!("{}", serde_json::to_string(&line)?);
        }
    }

    let summary = SummaryLine::new(&session, config.seed, turns);
    if config.json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!(
            "{}x{} {} level: {} after {} turns",
            summary.rows,
            summary.cols,
            summary.objective.as_str(),
            summary.phase.as_str(),
            summary.turns
        );
        println!(
            "score {} / {} ({} stars), {} moves left",
            summary.score, summary.target_score, summary.stars, summary.moves_left
        );
    }
    Ok(())
}
