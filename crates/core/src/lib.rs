//! Core simulation - pure, deterministic, and testable
//!
//! This crate holds every game rule of the match-3 engine. It performs no I/O and has
//! no notion of time, which makes it:
//!
//! - **Deterministic**: the same seed and the same inputs replay the same game
//! - **Testable**: every rule is exercised headlessly
//! - **Portable**: a terminal, GUI or server driver can sit on top of it
//!
//! # Module Structure
//!
//! - [`board`]: grid of pieces with wall, ice, lock and bomb overlays
//! - [`matcher`]: run detection and L/T merging
//! - [`specials`]: which special a match earns and where it lands
//! - [`effects`]: clear sets for activations, chains and two-special combos
//! - [`gravity`]: per-segment compaction and refill
//! - [`shuffle`]: valid-move search, hints and deadlock reshuffles
//! - [`scoring`]: match points, cascade multiplier, stars
//! - [`objective`]: objective progress counters
//! - [`level_gen`]: levels generated from an index
//! - [`session`]: the per-level phase state machine
//! - [`snapshot`]: deep copies for undo
//! - [`rng`]: the LCG and the piece factory
//!
//! # Example
//!
//! ```
//! use match_three_core::{Session, SwapOutcome};
//! use match_three_core::types::{LevelConfig, Phase};
//!
//! let mut session = Session::new(LevelConfig::simple(7, 7, 4, 30, 800), 12345);
//!
//! // Play the first valid move and resolve its cascade.
//! let (from, to) = session.hint().unwrap();
//! assert!(session.apply_swap(from, to).is_accepted());
//! while let Some(step) = session.step_cascade() {
//!     assert!(step.score_gained > 0);
//! }
//!
//! assert_eq!(session.moves_left(), 29);
//! assert!(session.score() >= 100);
//! assert_eq!(session.phase(), Phase::Idle);
//! ```

pub mod board;
pub mod effects;
pub mod gravity;
pub mod level_gen;
pub mod matcher;
pub mod objective;
pub mod rng;
pub mod scoring;
pub mod session;
pub mod shuffle;
pub mod snapshot;
pub mod specials;

pub use match_three_types as types;

// Re-export commonly used types for convenience
pub use board::{Board, ClearPlan, OverlayDiff};
pub use effects::{activation_area, combo_area, expand_chain, Activation};
pub use gravity::{apply_gravity, GravityResult, Movement};
pub use level_gen::generate_level;
pub use matcher::{find_matches, has_matches, MatchResult};
pub use objective::{ObjectiveProgress, ObjectiveTracker};
pub use rng::{PieceFactory, SimpleRng};
pub use scoring::{calculate_match_score, special_clear_score, star_rating};
pub use session::{
    CascadeStep, PowerUpOutcome, PowerUpRejection, Session, SwapOutcome, SwapRejection,
};
pub use shuffle::{find_valid_move, has_valid_moves, is_valid_move, reshuffle, ReshuffleOutcome};
pub use snapshot::SessionSnapshot;
pub use specials::{resolve_special, SpecialSpawn};
