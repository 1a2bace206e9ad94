use crate::scoring::text;
use crate::session::{Message, Role, SessionStats};
use tracing::{debug, warn};

/// Ratios above this are treated as "far over budget"; clamping here keeps
/// downstream curves out of pathological territory
pub const RATIO_CEILING: f64 = 2.0;

/// Budget-normalized usage for one session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsageRatios {
    /// attempts_used / max_attempts, clamped to [0, 2]
    pub attempt_ratio: f64,
    /// tokens_used / token_budget, clamped to [0, 2]
    pub token_ratio: f64,
    /// time_spent_seconds / time budget, clamped to [0, 2]
    pub time_ratio: f64,
    /// False when no token usage was recorded at all
    pub has_token_data: bool,
    /// False when no timing was recorded at all
    pub has_time_data: bool,
}

impl UsageRatios {
    /// Derive ratios from raw stats. Never fails: zero budgets with zero
    /// usage read as "no data", zero budgets with usage read as maximal
    /// overrun.
    pub fn from_stats(stats: &SessionStats) -> Self {
        let ratios = Self {
            attempt_ratio: ratio(stats.attempts_used as f64, stats.max_attempts as f64),
            token_ratio: ratio(stats.tokens_used as f64, stats.token_budget as f64),
            time_ratio: ratio(
                stats.time_spent_seconds as f64,
                stats.time_budget_seconds() as f64,
            ),
            has_token_data: stats.tokens_used > 0,
            has_time_data: stats.time_spent_seconds > 0,
        };

        if ratios.attempt_ratio >= RATIO_CEILING
            || ratios.token_ratio >= RATIO_CEILING
            || ratios.time_ratio >= RATIO_CEILING
        {
            warn!(
                "Session usage far over budget (attempts {:.2}x, tokens {:.2}x, time {:.2}x)",
                ratios.attempt_ratio, ratios.token_ratio, ratios.time_ratio
            );
        }
        debug!(
            "Usage ratios: attempts {:.3}, tokens {:.3}, time {:.3}",
            ratios.attempt_ratio, ratios.token_ratio, ratios.time_ratio
        );

        ratios
    }
}

fn ratio(used: f64, budget: f64) -> f64 {
    if budget <= 0.0 {
        if used <= 0.0 {
            0.0
        } else {
            RATIO_CEILING
        }
    } else {
        (used / budget).clamp(0.0, RATIO_CEILING)
    }
}

/// Word-level aggregates of the transcript, echoed on the result stats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranscriptStats {
    pub total_prompts: u32,
    pub avg_prompt_length: u32,
    pub total_response_length: u32,
}

impl TranscriptStats {
    pub fn from_messages(messages: &[Message]) -> Self {
        let prompt_lengths: Vec<usize> = messages
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| text::word_count(&m.content))
            .collect();

        let response_words: usize = messages
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .map(|m| text::word_count(&m.content))
            .sum();

        let avg_prompt_length = if prompt_lengths.is_empty() {
            0
        } else {
            let total: usize = prompt_lengths.iter().sum();
            (total as f64 / prompt_lengths.len() as f64).round() as u32
        };

        Self {
            total_prompts: prompt_lengths.len() as u32,
            avg_prompt_length,
            total_response_length: response_words as u32,
        }
    }
}
