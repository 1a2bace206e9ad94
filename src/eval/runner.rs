use anyhow::{bail, Context, Result};
use futures::future::try_join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::cli::config::ScoringConfig;
use crate::eval::{BatchResults, SessionOutcome};
use crate::scoring;
use crate::session::EvaluateRequest;

/// Scores every request file in a directory under a shared configuration
pub struct BatchRunner {
    config: ScoringConfig,
    results: Arc<Mutex<BatchResults>>,
}

impl BatchRunner {
    pub fn new(config: ScoringConfig) -> Self {
        let batch_id = Uuid::new_v4().to_string();
        let results = Arc::new(Mutex::new(BatchResults::new(&batch_id)));

        Self { config, results }
    }

    /// Score all sessions in `dir`, at most `parallelism` at a time
    pub async fn run(&self, dir: &Path, parallelism: usize) -> Result<BatchResults> {
        let batch_id = {
            let results = self.results.lock().await;
            results.batch_id.clone()
        };

        let files = collect_request_files(dir)?;
        if files.is_empty() {
            bail!("No .json session files found in {:?}", dir);
        }

        info!(
            "Starting batch {} over {} sessions with parallelism {}",
            batch_id,
            files.len(),
            parallelism
        );

        let semaphore = Arc::new(tokio::sync::Semaphore::new(parallelism.max(1)));
        let mut handles = Vec::new();

        for path in files {
            let permit = semaphore.clone().acquire_owned().await.unwrap();
            let config = self.config.clone();
            let results = Arc::clone(&self.results);

            let handle = tokio::spawn(async move {
                let outcome = score_request_file(&path, &config);

                {
                    let mut results_guard = results.lock().await;
                    results_guard.add_outcome(outcome);
                }

                drop(permit);
            });

            handles.push(handle);
        }

        try_join_all(handles).await?;

        let mut final_results = self.results.lock().await;
        final_results.finalize();

        Ok(final_results.clone())
    }

    /// Get the current results
    pub async fn results(&self) -> BatchResults {
        self.results.lock().await.clone()
    }

    /// Save the batch summary, report and per-session results
    pub async fn save_results(&self, output_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

        let results = self.results.lock().await;

        let json_path = output_dir.join(format!("{}.json", results.batch_id));
        results.save_json(&json_path)?;
        info!("Saved batch results to {:?}", json_path);

        let report_path = output_dir.join(format!("{}_report.md", results.batch_id));
        std::fs::write(&report_path, results.generate_report())?;
        info!("Saved report to {:?}", report_path);

        for outcome in &results.outcomes {
            if let Some(result) = &outcome.result {
                let session_path = output_dir.join(format!("{}.json", result.test_id));
                let content = serde_json::to_string_pretty(result)?;
                std::fs::write(&session_path, content)?;
            }
        }

        Ok(())
    }
}

/// Score one request file; failures are captured in the outcome
fn score_request_file(path: &Path, config: &ScoringConfig) -> SessionOutcome {
    let source = path.display().to_string();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            error!("Failed to read {}: {}", source, e);
            return SessionOutcome::failed(&source, &stem, &format!("Failed to read file: {}", e));
        }
    };

    let request: EvaluateRequest = match serde_json::from_str(&content) {
        Ok(request) => request,
        Err(e) => {
            error!("Failed to parse {}: {}", source, e);
            return SessionOutcome::failed(&source, &stem, &format!("Invalid request JSON: {}", e));
        }
    };

    match scoring::evaluate(&request, config) {
        Ok(result) => {
            info!("Scored {}: {}", result.test_id, result.headline());
            SessionOutcome::scored(&source, result)
        }
        Err(e) => {
            warn!("Scoring rejected {}: {}", source, e);
            SessionOutcome::failed(&source, &request.test_id, &format!("Scoring failed: {}", e))
        }
    }
}

/// All .json files in a directory, in name order
fn collect_request_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read session directory {:?}", dir))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|ext| ext == "json").unwrap_or(false))
        .collect();

    files.sort();
    Ok(files)
}
