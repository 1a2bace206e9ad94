mod cli;
mod eval;
mod responder;
mod scoring;
mod session;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Args, Command, ScoringConfig};
use eval::{BatchResults, BatchRunner, OutcomeStatus, SessionRunner, SessionScript};
use responder::ScriptedResponder;
use scoring::ScoringResult;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    match args.command {
        Command::Score(score_args) => {
            score_session(score_args)?;
        }
        Command::Batch(batch_args) => {
            run_batch(batch_args).await?;
        }
        Command::Simulate(simulate_args) => {
            simulate_session(simulate_args)?;
        }
        Command::Init(init_args) => {
            generate_config(init_args)?;
        }
        Command::Tasks => {
            list_tasks();
        }
    }

    Ok(())
}

fn load_config(path: &Option<PathBuf>) -> Result<ScoringConfig> {
    match path {
        Some(path) => {
            info!("Loading scoring config from {:?}", path);
            ScoringConfig::load(path)
        }
        None => Ok(ScoringConfig::default()),
    }
}

fn score_session(args: cli::ScoreArgs) -> Result<()> {
    let config = load_config(&args.config)?;

    let content = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read session file {:?}", args.input))?;
    let request: session::EvaluateRequest = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse session file {:?}", args.input))?;

    let result = scoring::evaluate(&request, &config)?;

    print_result(&result);

    let output = match args.output {
        Some(path) => path,
        None => {
            std::fs::create_dir_all(&config.output_dir)?;
            config.output_dir.join(format!("{}.json", result.test_id))
        }
    };
    std::fs::write(&output, serde_json::to_string_pretty(&result)?)
        .with_context(|| format!("Failed to write result to {:?}", output))?;

    println!("\nResult saved to: {:?}", output);

    Ok(())
}

async fn run_batch(args: cli::BatchArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let parallelism = args.parallelism.unwrap_or(config.parallelism);
    let output_dir = args.output.unwrap_or_else(|| config.output_dir.clone());

    let runner = BatchRunner::new(config);
    let results = runner.run(&args.dir, parallelism).await?;

    print_batch_results(&results);

    runner.save_results(&output_dir).await?;
    println!("\nResults saved to: {:?}", output_dir);

    Ok(())
}

fn simulate_session(args: cli::SimulateArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let script = SessionScript::load(&args.script)?;

    let responder = ScriptedResponder::new();
    let runner = SessionRunner::new(&responder);
    let request = runner.run(&script)?;

    if let Some(path) = &args.save_request {
        std::fs::write(path, serde_json::to_string_pretty(&request)?)
            .with_context(|| format!("Failed to write request to {:?}", path))?;
        println!("Assembled request saved to: {:?}", path);
    }

    let result = scoring::evaluate(&request, &config)?;

    print_result(&result);

    if let Some(output) = &args.output {
        std::fs::write(output, serde_json::to_string_pretty(&result)?)
            .with_context(|| format!("Failed to write result to {:?}", output))?;
        println!("\nResult saved to: {:?}", output);
    }

    Ok(())
}

fn generate_config(args: cli::InitArgs) -> Result<()> {
    let config = ScoringConfig::default();

    config.save(&args.output)?;
    println!("Generated scoring config at: {:?}", args.output);

    Ok(())
}

fn list_tasks() {
    println!("Built-in task presets:\n");
    for name in session::presets::NAMES {
        if let Some(task) = session::presets::by_name(name) {
            let criteria: Vec<&str> = task
                .custom_criteria
                .iter()
                .map(|c| c.name.as_str())
                .collect();
            println!("  {}", name);
            println!("    {}", task.task_description);
            println!("    criteria: {}", criteria.join(", "));
        }
    }
}

fn print_result(result: &ScoringResult) {
    println!("\n{}", "=".repeat(60));
    println!("SCORING COMPLETE");
    println!("{}", "=".repeat(60));
    println!("\nSession: {}", result.test_id);
    println!("Result:  {}", result.headline());
    println!("         {}", result.recommendation.description());

    println!("\nDimensions:");
    for (name, dim) in result.dimensions.ordered() {
        println!(
            "  {:<18} {:>3}/100  (weight {:.0}%, contributes {})",
            name,
            dim.score,
            dim.weight * 100.0,
            dim.weighted_score
        );
    }

    if !result.criteria_results.is_empty() {
        println!("\nCustom Criteria:");
        for criterion in &result.criteria_results {
            println!(
                "  {:<24} {:>3}/100  [{}] {}",
                criterion.name, criterion.score, criterion.kind, criterion.details
            );
        }
    }

    println!("\n{}", result.feedback.summary);

    if !result.feedback.top_strengths.is_empty() {
        println!("\nStrengths:");
        for item in &result.feedback.top_strengths {
            println!("  + {}", item);
        }
    }
    if !result.feedback.top_weaknesses.is_empty() {
        println!("\nWeaknesses:");
        for item in &result.feedback.top_weaknesses {
            println!("  - {}", item);
        }
    }
    if !result.feedback.improvement_plan.is_empty() {
        println!("\nImprovement Plan:");
        for item in &result.feedback.improvement_plan {
            println!("  * {}", item);
        }
    }
}

fn print_batch_results(results: &BatchResults) {
    println!("\n{}", "=".repeat(60));
    println!("BATCH SCORING COMPLETE");
    println!("{}", "=".repeat(60));
    println!("\nSummary:");
    println!("  Total sessions: {}", results.summary.total_sessions);
    println!("  Scored: {}", results.summary.scored);
    println!("  Failed: {}", results.summary.failed);
    println!("  Mean score: {:.1}", results.summary.mean_score);

    println!("\nSession Rankings:");
    let mut rank = 0;
    for outcome in &results.outcomes {
        if outcome.status != OutcomeStatus::Scored {
            continue;
        }
        rank += 1;
        println!(
            "  #{} {} - {}/100 (grade {})",
            rank,
            outcome.test_id,
            outcome.score.unwrap_or(0),
            outcome.grade.as_deref().unwrap_or("-")
        );
    }

    for outcome in &results.outcomes {
        if outcome.status == OutcomeStatus::Failed {
            println!(
                "  !! {} failed: {}",
                outcome.test_id,
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}
