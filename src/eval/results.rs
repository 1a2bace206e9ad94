use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::scoring::ScoringResult;

/// Outcome of scoring a single session in a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOutcome {
    /// Identifier from the request, or the file stem when the request
    /// could not be parsed
    pub test_id: String,
    /// File the request was read from
    pub source: String,
    /// Status of the scoring attempt
    pub status: OutcomeStatus,
    /// Headline score if scored
    pub score: Option<u32>,
    /// Letter grade if scored
    pub grade: Option<String>,
    /// Full scoring result if scored
    pub result: Option<ScoringResult>,
    /// Error message if scoring failed
    pub error: Option<String>,
}

impl SessionOutcome {
    pub fn scored(source: &str, result: ScoringResult) -> Self {
        Self {
            test_id: result.test_id.clone(),
            source: source.to_string(),
            status: OutcomeStatus::Scored,
            score: Some(result.prompt_score),
            grade: Some(result.letter_grade.to_string()),
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(source: &str, test_id: &str, error: &str) -> Self {
        Self {
            test_id: test_id.to_string(),
            source: source.to_string(),
            status: OutcomeStatus::Failed,
            score: None,
            grade: None,
            result: None,
            error: Some(error.to_string()),
        }
    }
}

/// Status of one session in a batch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Scored,
    Failed,
}

/// Summary statistics for a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total sessions attempted
    pub total_sessions: u32,
    /// Sessions scored successfully
    pub scored: u32,
    /// Sessions that failed to score
    pub failed: u32,
    /// Mean headline score over scored sessions
    pub mean_score: f64,
    /// Grade counts over scored sessions
    pub grade_distribution: BTreeMap<String, u32>,
    /// Highest scoring session
    pub best_session: Option<String>,
    /// Lowest scoring session
    pub worst_session: Option<String>,
}

/// Complete results of one batch scoring run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Unique batch ID
    pub batch_id: String,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// End time
    pub completed_at: Option<DateTime<Utc>>,
    /// Per-session outcomes, ranked best-first once finalized
    pub outcomes: Vec<SessionOutcome>,
    /// Summary statistics
    pub summary: BatchSummary,
}

impl BatchResults {
    pub fn new(batch_id: &str) -> Self {
        Self {
            batch_id: batch_id.to_string(),
            started_at: Utc::now(),
            completed_at: None,
            outcomes: Vec::new(),
            summary: BatchSummary {
                total_sessions: 0,
                scored: 0,
                failed: 0,
                mean_score: 0.0,
                grade_distribution: BTreeMap::new(),
                best_session: None,
                worst_session: None,
            },
        }
    }

    /// Add a session outcome
    pub fn add_outcome(&mut self, outcome: SessionOutcome) {
        self.outcomes.push(outcome);
    }

    /// Rank outcomes and recompute the summary
    pub fn calculate_summary(&mut self) {
        // None sorts below Some(0), so failed sessions land at the bottom
        self.outcomes.sort_by(|a, b| b.score.cmp(&a.score));

        let scored: Vec<&SessionOutcome> = self
            .outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::Scored)
            .collect();

        self.summary.total_sessions = self.outcomes.len() as u32;
        self.summary.scored = scored.len() as u32;
        self.summary.failed = (self.outcomes.len() - scored.len()) as u32;

        let mut distribution: BTreeMap<String, u32> = BTreeMap::new();
        for outcome in &scored {
            if let Some(grade) = &outcome.grade {
                *distribution.entry(grade.clone()).or_insert(0) += 1;
            }
        }
        self.summary.grade_distribution = distribution;

        if scored.is_empty() {
            self.summary.mean_score = 0.0;
            self.summary.best_session = None;
            self.summary.worst_session = None;
        } else {
            let total: u32 = scored.iter().filter_map(|o| o.score).sum();
            self.summary.mean_score = total as f64 / scored.len() as f64;
            self.summary.best_session = scored.first().map(|o| o.test_id.clone());
            self.summary.worst_session = scored.last().map(|o| o.test_id.clone());
        }
    }

    /// Finalize the results
    pub fn finalize(&mut self) {
        self.completed_at = Some(Utc::now());
        self.calculate_summary();
    }

    /// Save results to a JSON file
    pub fn save_json(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Generate a human-readable report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("# Batch Scoring Report\n\n");
        report.push_str(&format!("Batch ID: {}\n", self.batch_id));
        report.push_str(&format!("Started: {}\n", self.started_at));
        if let Some(completed) = self.completed_at {
            report.push_str(&format!("Completed: {}\n", completed));
        }
        report.push_str("\n");

        report.push_str("## Summary\n\n");
        report.push_str(&format!(
            "- Total Sessions: {}\n",
            self.summary.total_sessions
        ));
        report.push_str(&format!("- Scored: {}\n", self.summary.scored));
        report.push_str(&format!("- Failed: {}\n", self.summary.failed));
        report.push_str(&format!("- Mean Score: {:.1}\n", self.summary.mean_score));
        for (grade, count) in &self.summary.grade_distribution {
            report.push_str(&format!("- Grade {}: {}\n", grade, count));
        }
        report.push_str("\n");

        report.push_str("## Session Rankings\n\n");
        report.push_str("| Rank | Session | Score | Grade | Recommendation |\n");
        report.push_str("|------|---------|-------|-------|----------------|\n");

        let mut rank = 0;
        for outcome in &self.outcomes {
            if outcome.status != OutcomeStatus::Scored {
                continue;
            }
            rank += 1;
            let recommendation = outcome
                .result
                .as_ref()
                .map(|r| r.recommendation.label())
                .unwrap_or("-");
            report.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                rank,
                outcome.test_id,
                outcome.score.unwrap_or(0),
                outcome.grade.as_deref().unwrap_or("-"),
                recommendation
            ));
        }

        let failures: Vec<&SessionOutcome> = self
            .outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::Failed)
            .collect();

        if !failures.is_empty() {
            report.push_str("\n## Failures\n\n");
            for outcome in failures {
                report.push_str(&format!(
                    "- {} ({}): {}\n",
                    outcome.test_id,
                    outcome.source,
                    outcome.error.as_deref().unwrap_or("unknown error")
                ));
            }
        }

        report
    }
}
