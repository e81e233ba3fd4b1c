//! Turn driver helpers on top of a [`Session`](match_three_core::Session).
//!
//! The core session resolves one cascade step per call; these helpers run a whole
//! turn (action, cascade, end evaluation) and report it in one value.

pub mod turn;

pub use turn::{
    autoplay_turn, finish_bonus_moves, play_bonus_move, play_power_up, play_swap, settle,
    TurnError, TurnReport,
};
