//! Headless runner arguments and level loading.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use crate::core::generate_level;
use crate::types::LevelConfig;

pub const USAGE: &str =
    "usage: match-three [--level N | --config FILE] [--seed S] [--max-turns T] [--json] [--verbose]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelSource {
    Generated(u32),
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    pub level: LevelSource,
    pub seed: u32,
    /// Stop after this many turns even if the level has not ended
    pub max_turns: Option<u32>,
    pub json: bool,
    pub verbose: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            level: LevelSource::Generated(0),
            seed: 1,
            max_turns: None,
            json: false,
            verbose: false,
        }
    }
}

fn parse_number(flag: &str, value: Option<&String>) -> Result<u32> {
    let v = value.ok_or_else(|| anyhow!("missing value for {}", flag))?;
    v.parse::<u32>()
        .map_err(|_| anyhow!("invalid {} value: {}", flag, v))
}

/// Parse arguments (without the program name)
pub fn parse_runner_args(args: &[String]) -> Result<RunnerConfig> {
    let mut config = RunnerConfig::default();
    let mut level_given = false;
    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--level" => {
                i += 1;
                if level_given {
                    return Err(anyhow!("--level and --config are exclusive"));
                }
                config.level = LevelSource::Generated(parse_number("--level", args.get(i))?);
                level_given = true;
            }
            "--config" => {
                i += 1;
                if level_given {
                    return Err(anyhow!("--level and --config are exclusive"));
                }
                let v = args
                    .get(i)
                    .ok_or_else(|| anyhow!("missing value for --config"))?;
                config.level = LevelSource::File(PathBuf::from(v));
                level_given = true;
            }
            "--seed" => {
                i += 1;
                config.seed = parse_number("--seed", args.get(i))?;
            }
            "--max-turns" => {
                i += 1;
                config.max_turns = Some(parse_number("--max-turns", args.get(i))?);
            }
            "--json" => config.json = true,
            "--verbose" => config.verbose = true,
            other => {
                return Err(anyhow!("unknown argument: {}", other));
            }
        }
        i += 1;
    }
    Ok(config)
}

/// Parse and validate a level from JSON text
pub fn parse_level_json(text: &str) -> Result<LevelConfig> {
    let level: LevelConfig = serde_json::from_str(text).context("level JSON is malformed")?;
    level.validate().context("level configuration is invalid")?;
    Ok(level)
}

/// Resolve the level the runner should play
pub fn load_level(source: &LevelSource) -> Result<LevelConfig> {
    match source {
        LevelSource::Generated(index) => {
            let level = generate_level(*index);
            level
                .validate()
                .with_context(|| format!("generated level {} is invalid", index))?;
            Ok(level)
        }
        LevelSource::File(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            parse_level_json(&text).with_context(|| format!("loading {}", path.display()))
        }
    }
}
