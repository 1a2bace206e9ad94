use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// PromptScore: AI proficiency scoring
///
/// Scores recorded AI-assisted work sessions on prompt quality, efficiency,
/// speed, response quality and iteration skill.
#[derive(Parser, Debug)]
#[command(name = "promptscore")]
#[command(author = "PromptScore Team")]
#[command(version = "0.1.0")]
#[command(about = "Score AI-assisted work sessions for prompt proficiency")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score a single recorded session
    Score(ScoreArgs),

    /// Score every session file in a directory
    Batch(BatchArgs),

    /// Play a scripted session against the canned responder and score it
    Simulate(SimulateArgs),

    /// Generate a default scoring config file
    Init(InitArgs),

    /// List the built-in task presets
    Tasks,
}

#[derive(Parser, Debug)]
pub struct ScoreArgs {
    /// Path to the session request file (JSON)
    pub input: PathBuf,

    /// Where to write the scoring result (defaults to the configured
    /// output directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Path to the scoring config file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct BatchArgs {
    /// Directory of session request files (JSON)
    pub dir: PathBuf,

    /// Override the output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Path to the scoring config file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum sessions scored concurrently (defaults to the configured
    /// parallelism)
    #[arg(long)]
    pub parallelism: Option<usize>,
}

#[derive(Parser, Debug)]
pub struct SimulateArgs {
    /// Path to the session script (YAML)
    pub script: PathBuf,

    /// Where to write the scoring result
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write the assembled session request for later batch scoring
    #[arg(long)]
    pub save_request: Option<PathBuf>,

    /// Path to the scoring config file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Output path for the config file
    #[arg(short, long, default_value = "score-config.yaml")]
    pub output: PathBuf,
}
