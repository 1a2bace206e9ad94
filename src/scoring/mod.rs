//! The proficiency scoring engine. [`evaluate`] is a pure function from a
//! session (transcript, usage numbers, task definition) to a
//! [`ScoringResult`]: five weighted dimension scores, custom criteria
//! outcomes, composite score, grade, percentile and feedback. Identical
//! inputs under the same configuration produce identical results, apart
//! from the evaluation timestamp.

mod aggregate;
mod criteria;
mod dimensions;
mod feedback;
mod metrics;
mod text;
mod types;

pub use aggregate::{composite_score, letter_grade, percentile, recommendation};
pub use criteria::{
    evaluate_criteria, validate_criteria, HeuristicGrader, RubricGrader, RubricVerdict,
};
pub use dimensions::NEUTRAL_SCORE;
pub use metrics::{TranscriptStats, UsageRatios, RATIO_CEILING};
pub use types::{
    CriterionResult, DimensionScore, DimensionSet, Feedback, LetterGrade, Recommendation,
    ResultStats, ScoringResult,
};

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use crate::cli::config::ScoringConfig;
use crate::session::EvaluateRequest;

/// Invariant violations that abort an evaluation with no result. Degenerate
/// inputs and sub-evaluator failures never land here; they are absorbed
/// into the result as clamped or neutral scores with explanatory notes.
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("dimension weights sum to {sum:.4}, expected 1.0")]
    WeightSum { sum: f64 },

    #[error("dimension weight {name} is {value}, expected a value in [0, 1]")]
    WeightRange { name: &'static str, value: f64 },

    #[error("grade thresholds must descend from S to D within 0-100")]
    GradeOrder,

    #[error("percentile spread must be positive, got {spread}")]
    PercentileSpread { spread: f64 },

    #[error("parallelism must be at least 1")]
    Parallelism,

    #[error("invalid criterion '{id}': {reason}")]
    InvalidCriterion { id: String, reason: String },
}

/// Score one session with the built-in heuristic rubric grader
pub fn evaluate(
    request: &EvaluateRequest,
    config: &ScoringConfig,
) -> Result<ScoringResult, ScoreError> {
    evaluate_with_grader(request, config, &HeuristicGrader)
}

/// Score one session, delegating rubric criteria to the given grader
pub fn evaluate_with_grader(
    request: &EvaluateRequest,
    config: &ScoringConfig,
    grader: &dyn RubricGrader,
) -> Result<ScoringResult, ScoreError> {
    config.validate()?;
    criteria::validate_criteria(&request.custom_criteria)?;

    info!(
        "Scoring session {} ({} messages, {} attempts used)",
        request.test_id,
        request.messages.len(),
        request.attempts_used
    );

    let session = request.stats();
    let ratios = UsageRatios::from_stats(&session);
    let transcript = TranscriptStats::from_messages(&request.messages);

    let weights = &config.dimension_weights;
    let dimensions = DimensionSet {
        prompt_quality: dimensions::prompt_quality(request, weights.prompt_quality),
        response_quality: dimensions::response_quality(request, weights.response_quality),
        efficiency: dimensions::efficiency(&ratios, weights.efficiency),
        speed: dimensions::speed(&ratios, weights.speed),
        iteration_iq: dimensions::iteration_iq(request, weights.iteration_iq),
    };

    let prompt_score = aggregate::composite_score(&dimensions);
    let grade = aggregate::letter_grade(prompt_score, &config.grade_thresholds);
    let percentile = aggregate::percentile(prompt_score, &config.percentile);
    let recommendation = aggregate::recommendation(prompt_score);
    let feedback = feedback::generate(&dimensions, prompt_score, grade);
    let criteria_results = criteria::evaluate_criteria(request, grader);

    let result = ScoringResult {
        test_id: request.test_id.clone(),
        prompt_score,
        letter_grade: grade,
        percentile,
        recommendation,
        dimensions,
        feedback,
        stats: ResultStats {
            attempts_used: session.attempts_used,
            tokens_used: session.tokens_used,
            time_spent_seconds: session.time_spent_seconds,
            max_attempts: session.max_attempts,
            token_budget: session.token_budget,
            time_limit_minutes: session.time_limit_minutes,
            total_prompts: transcript.total_prompts,
            avg_prompt_length: transcript.avg_prompt_length,
            total_response_length: transcript.total_response_length,
        },
        criteria_results,
        criteria_used: criteria_label(request.custom_criteria.len()),
        evaluated_at: Utc::now(),
    };

    info!("Session {} scored {}", result.test_id, result.headline());
    Ok(result)
}

/// "standard" when only the fixed dimensions applied, otherwise a count of
/// the task-author criteria evaluated on top of them
pub fn criteria_label(custom_count: usize) -> String {
    if custom_count == 0 {
        "standard".to_string()
    } else {
        format!("standard + {} custom", custom_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{presets, CriterionDefinition, CriterionRule, Message};

    fn config() -> ScoringConfig {
        ScoringConfig::default()
    }

    fn terse_session() -> EvaluateRequest {
        EvaluateRequest {
            test_id: "scenario-terse".to_string(),
            messages: vec![
                Message::user("write an email"),
                Message::assistant("Sure, here is a short draft email for your review."),
            ],
            attempts_used: 1,
            tokens_used: 80,
            time_spent_seconds: 40,
            max_attempts: 5,
            token_budget: 2000,
            time_limit_minutes: 15,
            task_description: "Write an email".to_string(),
            expected_outcome: String::new(),
            custom_criteria: vec![],
        }
    }

    fn iterative_session() -> EvaluateRequest {
        EvaluateRequest {
            test_id: "scenario-iterative".to_string(),
            messages: vec![
                Message::user(
                    "Draft a marketing email announcing our new analytics dashboard to \
                     existing customers. It should be friendly but professional, about \
                     150 words.",
                ),
                Message::assistant(
                    "Here's a draft announcing the analytics dashboard to your \
                     customers, with an overall pitch focused on faster insights.",
                ),
                Message::user(
                    "Keep the overall pitch. The email must include a subject line \
                     under 60 characters, and it should target data team leads as the \
                     audience.",
                ),
                Message::assistant(
                    "Updated: the subject line is 'Dashboards for data leads' at 42 \
                     characters, and the email now targets data team leads directly.",
                ),
                Message::user(
                    "Good structure. Now add exactly 3 bullet points on benefits for \
                     the data team audience, each under 12 words, format them as a \
                     list, and keep the whole email under 150 words.",
                ),
                Message::assistant(
                    "Done. Three bullets under twelve words each; the body sits at 138 \
                     words with the benefits front and center.",
                ),
                Message::user(
                    "The bullets read well. Rewrite the opening so that it names the \
                     reader's reporting pain point, keep the tone professional, avoid \
                     buzzwords, and do not exceed 150 words; the email should stay \
                     under that limit.",
                ),
                Message::assistant(
                    "Rewrote the opening around the reporting pain point and kept the \
                     tone professional; the body is 141 words with the subject line \
                     unchanged.",
                ),
                Message::user(
                    "Perfect. Final pass: include a subject line under 60 characters, \
                     exactly 3 bullets, a closing call to action to start a trial, no \
                     more than 150 words in the body, and a professional tone for the \
                     data team audience.",
                ),
                Message::assistant(
                    "Here is the final version of the marketing email.\n\nSubject: \
                     Your data, answered in one dashboard\n\nHi there,\n\nWe're \
                     announcing our new analytics dashboard for existing customers \
                     like you. Three benefits as short bullets:\n\n- Every metric in \
                     one place, updated live\n- Reports that took hours now build \
                     themselves\n- Churn alerts that fire early enough to act\n\n\
                     Consider this your invitation: start your free trial today and \
                     see your first dashboard in under an hour.\n\nBest,\nThe Product \
                     Team\n\nP.S. The subject line is 43 characters, the three bullet \
                     points are under twelve words each, and the body runs 96 words.",
                ),
            ],
            attempts_used: 5,
            tokens_used: 2000,
            time_spent_seconds: 900,
            max_attempts: 5,
            token_budget: 2000,
            time_limit_minutes: 15,
            task_description: "Write a marketing email announcing our new analytics \
                               dashboard to existing customers. It must include a \
                               subject line, three bullet points on benefits, and a \
                               call to action."
                .to_string(),
            expected_outcome: "A marketing email for existing customers announcing \
                               the analytics dashboard, with a subject line, three \
                               benefits as short bullets, and an invitation to start \
                               a free trial."
                .to_string(),
            custom_criteria: vec![],
        }
    }

    #[test]
    fn test_scenario_terse_single_prompt() {
        let result = evaluate(&terse_session(), &config()).unwrap();

        let dims = &result.dimensions;
        assert!(
            (25..=45).contains(&dims.prompt_quality.score),
            "prompt quality was {}",
            dims.prompt_quality.score
        );
        assert!(dims.efficiency.score >= 80, "efficiency was {}", dims.efficiency.score);
        assert!(dims.speed.score >= 80, "speed was {}", dims.speed.score);
        assert_eq!(dims.iteration_iq.score, NEUTRAL_SCORE);

        assert!(
            (45..=64).contains(&result.prompt_score),
            "composite was {}",
            result.prompt_score
        );
        assert_eq!(result.letter_grade, LetterGrade::C);
        assert!(
            (40..=55).contains(&result.percentile),
            "percentile was {}",
            result.percentile
        );
        assert_eq!(result.criteria_used, "standard");
        assert!(result.criteria_results.is_empty());
    }

    #[test]
    fn test_scenario_iterative_full_budget() {
        let result = evaluate(&iterative_session(), &config()).unwrap();

        let dims = &result.dimensions;
        assert!(
            dims.prompt_quality.score >= 75,
            "prompt quality was {}",
            dims.prompt_quality.score
        );
        assert!(
            dims.iteration_iq.score >= 75,
            "iteration iq was {}",
            dims.iteration_iq.score
        );
        assert!(dims.efficiency.score <= 40, "efficiency was {}", dims.efficiency.score);
        assert!(dims.speed.score <= 40, "speed was {}", dims.speed.score);

        assert!(
            (60..=75).contains(&result.prompt_score),
            "composite was {}",
            result.prompt_score
        );
        assert_eq!(result.letter_grade, LetterGrade::B);
    }

    #[test]
    fn test_identical_inputs_identical_results() {
        let request = iterative_session();
        let first = evaluate(&request, &config()).unwrap();
        let second = evaluate(&request, &config()).unwrap();

        let mut a = serde_json::to_value(&first).unwrap();
        let mut b = serde_json::to_value(&second).unwrap();
        a.as_object_mut().unwrap().remove("evaluatedAt");
        b.as_object_mut().unwrap().remove("evaluatedAt");

        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_transcript_scores_without_error() {
        let request = EvaluateRequest {
            test_id: "empty".to_string(),
            messages: vec![],
            attempts_used: 0,
            tokens_used: 0,
            time_spent_seconds: 0,
            max_attempts: 5,
            token_budget: 2000,
            time_limit_minutes: 15,
            task_description: "Write an email".to_string(),
            expected_outcome: String::new(),
            custom_criteria: vec![],
        };

        let result = evaluate(&request, &config()).unwrap();

        assert!(result.prompt_score < 50, "got {}", result.prompt_score);
        // No usage data: efficiency and speed both fall back to neutral
        assert_eq!(result.dimensions.efficiency.score, NEUTRAL_SCORE);
        assert_eq!(result.dimensions.speed.score, NEUTRAL_SCORE);
        assert_eq!(result.recommendation, Recommendation::NotRecommended);
    }

    #[test]
    fn test_criteria_used_label_counts_customs() {
        let mut request = terse_session();
        request.custom_criteria = presets::marketing_email().custom_criteria;

        let result = evaluate(&request, &config()).unwrap();

        assert_eq!(result.criteria_used, "standard + 4 custom");
        assert_eq!(result.criteria_results.len(), 4);
    }

    #[test]
    fn test_rejects_weights_that_do_not_sum_to_one() {
        let mut bad = config();
        bad.dimension_weights.prompt_quality = 0.20;

        let err = evaluate(&terse_session(), &bad).unwrap_err();
        assert!(matches!(err, ScoreError::WeightSum { .. }));
    }

    #[test]
    fn test_rejects_malformed_criterion() {
        let mut request = terse_session();
        request.custom_criteria = vec![CriterionDefinition {
            id: "bad-tone".to_string(),
            name: "Tone".to_string(),
            description: String::new(),
            weight: 20,
            rule: CriterionRule::Tone {
                tone: "sarcastic".to_string(),
            },
        }];

        let err = evaluate(&request, &config()).unwrap_err();
        assert!(matches!(err, ScoreError::InvalidCriterion { .. }));
    }

    #[test]
    fn test_result_serializes_with_wire_names() {
        let result = evaluate(&terse_session(), &config()).unwrap();
        let json = serde_json::to_value(&result).unwrap();

        assert!(json.get("promptScore").is_some());
        assert!(json.get("letterGrade").is_some());
        assert!(json["dimensions"].get("iterationIQ").is_some());
        assert!(json["dimensions"]["promptQuality"].get("weightedScore").is_some());
        assert!(json["stats"].get("totalPrompts").is_some());
    }

    #[test]
    fn test_criteria_label() {
        assert_eq!(criteria_label(0), "standard");
        assert_eq!(criteria_label(3), "standard + 3 custom");
    }
}
