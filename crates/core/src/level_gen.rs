//! Level generator - deterministic level configurations from a level index
//!
//! The only input is the index: the generator seeds its own [`SimpleRng`] from it, so
//! the same index always yields the same level.

use crate::rng::SimpleRng;
use crate::types::{
    BombPlacement, LevelConfig, Objective, Obstacle, ObstaclePlacement, Position,
};

/// Mixed into the index so level 0 does not start from the degenerate seed
const LEVEL_SEED_SALT: u32 = 0x9E37_79B9;

/// First level that carries bombs
const BOMB_START_LEVEL: u32 = 30;

/// Minimum plain ice cells on a break-all-ice level
const MIN_ICE_CELLS: usize = 3;

/// Cap on the target score, keeping the derived star thresholds ascending
const MAX_TARGET_SCORE: u32 = 1_000_000_000;

/// (weight, obstacle) tables
const OBSTACLE_WEIGHTS: [(u32, Obstacle); 4] = [
    (20, Obstacle::Wall),
    (40, Obstacle::Ice),
    (15, Obstacle::ReinforcedIce),
    (25, Obstacle::Locked),
];
const ICE_OBSTACLE_WEIGHTS: [(u32, Obstacle); 4] = [
    (10, Obstacle::Wall),
    (50, Obstacle::Ice),
    (30, Obstacle::ReinforcedIce),
    (10, Obstacle::Locked),
];

fn board_edge(index: u32) -> i32 {
    match index {
        0..=9 => 7,
        10..=24 => 8,
        _ => 9,
    }
}

fn color_count(index: u32) -> u8 {
    match index {
        0..=4 => 4,
        5..=19 => 5,
        _ => 6,
    }
}

fn move_budget(index: u32) -> u32 {
    30u32.saturating_sub(index / 3).max(15)
}

fn obstacle_density(index: u32) -> u32 {
    (4 + index / 2).min(20)
}

fn pick_weighted(rng: &mut SimpleRng, table: &[(u32, Obstacle)]) -> Obstacle {
    let total: u32 = table.iter().map(|(w, _)| w).sum();
    let mut roll = rng.next_range(total);
    for &(weight, obstacle) in table {
        if roll < weight {
            return obstacle;
        }
        roll -= weight;
    }
    Obstacle::Ice
}

/// Build the configuration of level `index`.
///
/// # Examples
///
/// ```
/// use match_three_core::generate_level;
///
/// let level = generate_level(12);
/// assert_eq!((level.rows, level.cols), (8, 8));
/// assert_eq!(level, generate_level(12));
/// assert!(level.validate().is_ok());
/// ```
pub fn generate_level(index: u32) -> LevelConfig {
    let mut rng = SimpleRng::new(index.wrapping_add(LEVEL_SEED_SALT));

    let edge = board_edge(index);
    let colors = color_count(index);
    let target = index
        .saturating_mul(250)
        .saturating_add(1000)
        .min(MAX_TARGET_SCORE);

    let mut config = LevelConfig::simple(edge, edge, colors, move_budget(index), target);

    config.objective = match index % 3 {
        0 => Objective::ReachScore,
        1 => Objective::BreakAllIce,
        _ => {
            let palette = config.palette();
            let color = rng.pick(palette).copied().unwrap_or(palette[0]);
            Objective::ClearColor {
                color,
                count: 15 + index / 2,
            }
        }
    };
    let wants_ice = config.objective == Objective::BreakAllIce;

    let mut cells: Vec<Position> = (0..edge)
        .flat_map(|r| (0..edge).map(move |c| Position::new(r, c)))
        .collect();
    rng.shuffle(&mut cells);

    let count = (cells.len() as u32 * obstacle_density(index) / 100) as usize;
    let table = if wants_ice {
        &ICE_OBSTACLE_WEIGHTS
    } else {
        &OBSTACLE_WEIGHTS
    };
    let (obstacle_cells, free_cells) = cells.split_at(count.min(cells.len()));

    config.obstacles = obstacle_cells
        .iter()
        .map(|&position| ObstaclePlacement {
            position,
            obstacle: pick_weighted(&mut rng, table),
        })
        .collect();

    if wants_ice {
        // Reinforced ice alone would leave the objective met from the start.
        let mut ice = config
            .obstacles
            .iter()
            .filter(|p| p.obstacle == Obstacle::Ice)
            .count();
        for placement in config.obstacles.iter_mut() {
            if ice >= MIN_ICE_CELLS {
                break;
            }
            if placement.obstacle != Obstacle::Ice {
                placement.obstacle = Obstacle::Ice;
                ice += 1;
            }
        }
        for &position in free_cells {
            if ice >= MIN_ICE_CELLS {
                break;
            }
            config.obstacles.push(ObstaclePlacement {
                position,
                obstacle: Obstacle::Ice,
            });
            ice += 1;
        }
    }

    if index >= BOMB_START_LEVEL {
        let bombs = (1 + (index - BOMB_START_LEVEL) / 10).min(4) as usize;
        let timer = 15u32.saturating_sub((index - BOMB_START_LEVEL) / 5).max(8);
        let taken: Vec<Position> = config.obstacles.iter().map(|p| p.position).collect();
        config.bombs = cells
            .iter()
            .rev()
            .filter(|p| !taken.contains(p))
            .take(bombs)
            .map(|&position| BombPlacement { position, timer })
            .collect();
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progression_tables() {
        assert_eq!(board_edge(0), 7);
        assert_eq!(board_edge(9), 7);
        assert_eq!(board_edge(10), 8);
        assert_eq!(board_edge(25), 9);
        assert_eq!(color_count(4), 4);
        assert_eq!(color_count(5), 5);
        assert_eq!(color_count(20), 6);
        assert_eq!(move_budget(0), 30);
        assert_eq!(move_budget(9), 27);
        assert_eq!(move_budget(100), 15);
        assert_eq!(obstacle_density(0), 4);
        assert_eq!(obstacle_density(100), 20);
    }

    #[test]
    fn test_thresholds_and_objective_cycle() {
        let level = generate_level(4);
        assert_eq!(level.target_score, 2000);
        assert_eq!(level.two_star_score, 3000);
        assert_eq!(level.three_star_score, 4000);
        assert_eq!(generate_level(3).objective, Objective::ReachScore);
        assert_eq!(level.objective, Objective::BreakAllIce);
        match generate_level(5).objective {
            Objective::ClearColor { count, .. } => assert_eq!(count, 17),
            other => panic!("unexpected objective {other:?}"),
        }
    }

    #[test]
    fn test_ice_levels_have_ice() {
        for index in (1..60).step_by(3) {
            let level = generate_level(index);
            let ice = level
                .obstacles
                .iter()
                .filter(|p| p.obstacle == Obstacle::Ice)
                .count();
            assert!(ice >= MIN_ICE_CELLS, "level {index} has {ice} ice");
        }
    }

    #[test]
    fn test_huge_indices_stay_valid() {
        for index in [4_000_000, u32::MAX - 1, u32::MAX] {
            let level = generate_level(index);
            assert!(level.validate().is_ok(), "level {index}");
            assert_eq!(level.target_score, MAX_TARGET_SCORE);
            assert_eq!(level, generate_level(index));
        }
    }

    #[test]
    fn test_bombs_start_at_thirty() {
        assert!(generate_level(29).bombs.is_empty());
        let level = generate_level(30);
        assert_eq!(level.bombs.len(), 1);
        assert_eq!(level.bombs[0].timer, 15);
        let late = generate_level(90);
        assert_eq!(late.bombs.len(), 4);
        assert!(late.bombs.iter().all(|b| b.timer == 8));
    }

    #[test]
    fn test_generated_levels_validate_and_repeat() {
        for index in 0..80 {
            let level = generate_level(index);
            assert_eq!(level, generate_level(index));
            assert_eq!(level.validate(), Ok(()), "level {index}");
        }
    }
}
