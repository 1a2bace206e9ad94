//! Command line surface: argument parsing and the scoring config file.

mod args;
pub mod config;

pub use args::{Args, BatchArgs, Command, InitArgs, ScoreArgs, SimulateArgs};
pub use config::ScoringConfig;
