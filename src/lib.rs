//! Match-three (workspace facade crate).
//!
//! Re-exports the implementation crates under `crates/` as
//! `match_three::{types, core, engine}`, and hosts the headless runner's argument
//! parsing and JSON report types.

pub use match_three_core as core;
pub use match_three_engine as engine;
pub use match_three_types as types;

pub mod cli;
pub mod report;
