//! Task-author-defined criteria, checked against the final assistant
//! response. Keyword, tone and length rules are evaluated directly;
//! rubric rules go through the [`RubricGrader`] seam so a model-backed
//! grader can be plugged in without touching the deterministic checks.

use anyhow::Result;
use tracing::{debug, warn};

use crate::scoring::text;
use crate::scoring::types::CriterionResult;
use crate::scoring::ScoreError;
use crate::session::{CriterionDefinition, CriterionRule, EvaluateRequest, TaskSpec};

/// Score recorded when a rubric grader fails; keeps one broken criterion
/// from sinking the rest of the evaluation
const RUBRIC_FALLBACK: u32 = 50;

/// Verdict returned by a rubric grader
#[derive(Debug, Clone)]
pub struct RubricVerdict {
    pub score: u32,
    pub rationale: String,
}

/// Grades free-text rubric criteria. Implementations must be deterministic
/// for identical inputs or resolve to a deterministic fallback.
pub trait RubricGrader {
    fn grade(
        &self,
        criterion: &CriterionDefinition,
        response: &str,
        task: &TaskSpec,
    ) -> Result<RubricVerdict>;
}

/// Built-in grader: surface signals only, no model calls
pub struct HeuristicGrader;

impl RubricGrader for HeuristicGrader {
    fn grade(
        &self,
        criterion: &CriterionDefinition,
        response: &str,
        _task: &TaskSpec,
    ) -> Result<RubricVerdict> {
        if response.trim().is_empty() {
            return Ok(RubricVerdict {
                score: 5,
                rationale: "no response to grade".to_string(),
            });
        }

        let guidance = match &criterion.rule {
            CriterionRule::Rubric { guidance } => guidance.clone(),
            _ => None,
        };
        let reference = guidance
            .filter(|g| !g.trim().is_empty())
            .unwrap_or_else(|| criterion.description.clone());

        let coverage = text::coverage(&reference, response);
        let mut score = 25.0 + 40.0 * coverage;

        if text::sentence_count(response) >= 2 {
            score += 10.0;
        }
        if text::has_digits(response) {
            score += 8.0;
        }
        if text::capitalized_entities(response) >= 1 {
            score += 7.0;
        }
        if text::word_count(response) >= 30 {
            score += 10.0;
        }

        Ok(RubricVerdict {
            score: score.clamp(5.0, 100.0).round() as u32,
            rationale: format!("covers {:.0}% of the rubric guidance", coverage * 100.0),
        })
    }
}

/// Reject malformed criterion definitions before any scoring happens
pub fn validate_criteria(criteria: &[CriterionDefinition]) -> Result<(), ScoreError> {
    for criterion in criteria {
        let invalid = |reason: String| ScoreError::InvalidCriterion {
            id: criterion.id.clone(),
            reason,
        };

        if criterion.id.trim().is_empty() {
            return Err(ScoreError::InvalidCriterion {
                id: "<unset>".to_string(),
                reason: "criterion id is empty".to_string(),
            });
        }
        if criterion.weight > 100 {
            return Err(invalid(format!("weight {} exceeds 100", criterion.weight)));
        }

        match &criterion.rule {
            CriterionRule::Rubric { .. } => {}
            CriterionRule::Keyword {
                must_include,
                must_not_include,
            } => {
                if must_include.is_empty() && must_not_include.is_empty() {
                    return Err(invalid("keyword criterion has no terms to check".to_string()));
                }
                if must_include
                    .iter()
                    .chain(must_not_include.iter())
                    .any(|t| t.trim().is_empty())
                {
                    return Err(invalid("keyword criterion contains an empty term".to_string()));
                }
            }
            CriterionRule::Tone { tone } => {
                if tone_profile(tone).is_none() {
                    return Err(invalid(format!(
                        "unknown tone '{}' (expected one of: {})",
                        tone,
                        tone_names().join(", ")
                    )));
                }
            }
            CriterionRule::Length {
                min_words,
                max_words,
            } => {
                if min_words.is_none() && max_words.is_none() {
                    return Err(invalid("length criterion has no bounds".to_string()));
                }
                if let (Some(min), Some(max)) = (min_words, max_words) {
                    if min > max {
                        return Err(invalid(format!(
                            "minWords {} exceeds maxWords {}",
                            min, max
                        )));
                    }
                }
            }
        }
    }

    Ok(())
}

/// Evaluate every custom criterion against the final assistant response.
/// Individual criterion failures degrade that criterion only.
pub fn evaluate_criteria(
    request: &EvaluateRequest,
    grader: &dyn RubricGrader,
) -> Vec<CriterionResult> {
    let response = request
        .final_response()
        .map(|m| m.content.as_str())
        .unwrap_or("");
    let task = request.task();

    request
        .custom_criteria
        .iter()
        .map(|criterion| {
            let (score, details) = match &criterion.rule {
                CriterionRule::Keyword {
                    must_include,
                    must_not_include,
                } => score_keywords(response, must_include, must_not_include),
                CriterionRule::Tone { tone } => score_tone(tone, response),
                CriterionRule::Length {
                    min_words,
                    max_words,
                } => score_length(response, *min_words, *max_words),
                CriterionRule::Rubric { .. } => match grader.grade(criterion, response, &task) {
                    Ok(verdict) => (verdict.score, verdict.rationale),
                    Err(err) => {
                        warn!("Rubric grading failed for criterion {}: {}", criterion.id, err);
                        (
                            RUBRIC_FALLBACK,
                            format!("rubric grading unavailable: {}", err),
                        )
                    }
                },
            };

            debug!("Criterion {} ({}) scored {}", criterion.id, criterion.rule.kind(), score);

            CriterionResult {
                name: criterion.name.clone(),
                kind: criterion.rule.kind().to_string(),
                score,
                details,
            }
        })
        .collect()
}

fn score_keywords(response: &str, must_include: &[String], must_not_include: &[String]) -> (u32, String) {
    let total = must_include.len() + must_not_include.len();
    if total == 0 {
        return (50, "no keyword terms configured".to_string());
    }

    let missing: Vec<&str> = must_include
        .iter()
        .filter(|term| !text::contains_term(response, term))
        .map(String::as_str)
        .collect();
    let banned: Vec<&str> = must_not_include
        .iter()
        .filter(|term| text::contains_term(response, term))
        .map(String::as_str)
        .collect();

    let satisfied = total - missing.len() - banned.len();
    let score = (100.0 * satisfied as f64 / total as f64).round() as u32;

    let details = if missing.is_empty() && banned.is_empty() {
        format!("all {} keyword checks passed", total)
    } else {
        let mut parts = Vec::new();
        if !missing.is_empty() {
            parts.push(format!("missing: {}", missing.join(", ")));
        }
        if !banned.is_empty() {
            parts.push(format!("banned terms present: {}", banned.join(", ")));
        }
        parts.join("; ")
    };

    (score, details)
}

fn score_length(response: &str, min_words: Option<u32>, max_words: Option<u32>) -> (u32, String) {
    if response.trim().is_empty() {
        return (10, "no response to measure".to_string());
    }

    let count = text::word_count(response);
    let wc = count as f64;

    if let Some(min) = min_words {
        if count < min as usize {
            let score = (100.0 * wc / min as f64).clamp(10.0, 100.0).round() as u32;
            return (score, format!("too short: {} words (minimum {})", count, min));
        }
    }
    if let Some(max) = max_words {
        if count > max as usize {
            let overrun = (wc - max as f64) / max as f64;
            let score = (100.0 * (1.0 - overrun)).clamp(10.0, 100.0).round() as u32;
            return (score, format!("too long: {} words (maximum {})", count, max));
        }
    }

    (100, format!("{} words, within bounds", count))
}

/// Closed tone taxonomy with marker lexicons and register relationships
struct ToneProfile {
    name: &'static str,
    markers: &'static [&'static str],
    adjacent: &'static [&'static str],
    opposite: &'static [&'static str],
}

const TONES: &[ToneProfile] = &[
    ToneProfile {
        name: "professional",
        markers: &[
            "regards",
            "sincerely",
            "please",
            "thank you",
            "we recommend",
            "pleased",
            "ensure",
            "deliver",
            "best,",
            "team",
        ],
        adjacent: &["formal", "friendly"],
        opposite: &["casual"],
    },
    ToneProfile {
        name: "formal",
        markers: &[
            "dear",
            "furthermore",
            "therefore",
            "pursuant",
            "hereby",
            "kindly",
            "regarding",
            "accordingly",
        ],
        adjacent: &["professional"],
        opposite: &["casual", "friendly"],
    },
    ToneProfile {
        name: "friendly",
        markers: &[
            "hi ", "hey ", "hey,", "thanks", "love", "happy", "great", "glad", "hope",
            "cheers", "excited",
        ],
        adjacent: &["casual", "empathetic", "professional"],
        opposite: &["formal"],
    },
    ToneProfile {
        name: "casual",
        markers: &[
            "gonna",
            "wanna",
            "cool",
            "awesome",
            "yeah",
            "btw",
            "stuff",
            "folks",
            "no worries",
            "lol",
        ],
        adjacent: &["friendly"],
        opposite: &["professional", "formal"],
    },
    ToneProfile {
        name: "empathetic",
        markers: &[
            "understand",
            "we know",
            "appreciate",
            "sorry",
            "support",
            "here for you",
            "challenging",
            "we hear",
        ],
        adjacent: &["friendly"],
        opposite: &["urgent"],
    },
    ToneProfile {
        name: "urgent",
        markers: &[
            "right now",
            "act now",
            "today",
            "immediately",
            "don't miss",
            "limited",
            "deadline",
            "act fast",
            "hurry",
            "last chance",
            "asap",
        ],
        adjacent: &[],
        opposite: &["empathetic"],
    },
];

fn tone_profile(name: &str) -> Option<&'static ToneProfile> {
    TONES.iter().find(|t| t.name == name)
}

fn tone_names() -> Vec<&'static str> {
    TONES.iter().map(|t| t.name).collect()
}

fn score_tone(target: &str, response: &str) -> (u32, String) {
    let profile = match tone_profile(target) {
        Some(p) => p,
        // Unknown labels are rejected up front; score neutrally if one
        // reaches this path through a direct call
        None => return (50, format!("unrecognized tone '{}'", target)),
    };

    let mut detected: Option<(&str, usize)> = None;
    let mut target_hits = 0usize;
    for tone in TONES {
        let hits = text::marker_hits(response, tone.markers);
        if tone.name == target {
            target_hits = hits;
        }
        if hits > 0 && detected.map_or(true, |(_, best)| hits > best) {
            detected = Some((tone.name, hits));
        }
    }

    match detected {
        None => (50, "tone signal is weak; no clear register detected".to_string()),
        Some((name, hits)) if name == target => {
            let score = (85 + 3 * hits as u32).min(100);
            (score, format!("matches the requested {} register", target))
        }
        Some((name, _)) if profile.adjacent.contains(&name) => {
            if target_hits > 0 {
                (
                    75,
                    format!("mostly {} with some {} markers", name, target),
                )
            } else {
                (
                    65,
                    format!("reads {} rather than {}; close but not exact", name, target),
                )
            }
        }
        Some((name, _)) if profile.opposite.contains(&name) => (
            20,
            format!("reads {}, the opposite of the requested {}", name, target),
        ),
        Some((name, _)) => (45, format!("reads {} where {} was requested", name, target)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{presets, Message};
    use anyhow::anyhow;

    fn request_with_response(response: &str, criteria: Vec<CriterionDefinition>) -> EvaluateRequest {
        EvaluateRequest {
            test_id: "t-1".to_string(),
            messages: vec![
                Message::user("write the email"),
                Message::assistant(response),
            ],
            attempts_used: 1,
            tokens_used: 100,
            time_spent_seconds: 60,
            max_attempts: 5,
            token_budget: 2000,
            time_limit_minutes: 15,
            task_description: "Write a marketing email".to_string(),
            expected_outcome: String::new(),
            custom_criteria: criteria,
        }
    }

    fn keyword_criterion(must_include: &[&str], must_not_include: &[&str]) -> CriterionDefinition {
        CriterionDefinition {
            id: "kw".to_string(),
            name: "Keywords".to_string(),
            description: String::new(),
            weight: 30,
            rule: CriterionRule::Keyword {
                must_include: must_include.iter().map(|s| s.to_string()).collect(),
                must_not_include: must_not_include.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    struct FailingGrader;

    impl RubricGrader for FailingGrader {
        fn grade(
            &self,
            _criterion: &CriterionDefinition,
            _response: &str,
            _task: &TaskSpec,
        ) -> Result<RubricVerdict> {
            Err(anyhow!("grader offline"))
        }
    }

    #[test]
    fn test_keyword_partial_credit() {
        let (score, details) = score_keywords(
            "Our data platform helps your team move faster.",
            &["data".to_string(), "integration".to_string()],
            &["synergy".to_string()],
        );

        // 2 of 3 checks pass: "data" found, "synergy" absent, "integration" missing
        assert_eq!(score, 67);
        assert!(details.contains("integration"));
    }

    #[test]
    fn test_keyword_banned_term() {
        let (score, details) = score_keywords(
            "Unlock synergy with our data tools.",
            &["data".to_string()],
            &["synergy".to_string()],
        );

        assert_eq!(score, 50);
        assert!(details.contains("synergy"));
    }

    #[test]
    fn test_keyword_all_pass() {
        let (score, details) = score_keywords(
            "SELECT c.id FROM customers c JOIN orders o GROUP BY c.id",
            &["SELECT".to_string(), "JOIN".to_string(), "GROUP BY".to_string()],
            &[],
        );

        assert_eq!(score, 100);
        assert!(details.contains("passed"));
    }

    #[test]
    fn test_length_within_bounds() {
        let response = "This draft has exactly ten words in it, I promise.";
        let (score, _) = score_length(response, Some(5), Some(20));
        assert_eq!(score, 100);
    }

    #[test]
    fn test_length_too_short_decays() {
        let response = "Only five words right here.";
        let (score, details) = score_length(response, Some(50), None);

        // 5 of 50 words
        assert_eq!(score, 10);
        assert!(details.contains("too short"));
    }

    #[test]
    fn test_length_too_long_floors_at_ten() {
        let long: String = std::iter::repeat("word").take(40).collect::<Vec<_>>().join(" ");
        let (score, details) = score_length(&long, None, Some(10));

        assert_eq!(score, 10);
        assert!(details.contains("too long"));
    }

    #[test]
    fn test_tone_exact_match() {
        let response = "Thank you for your time. Please find the proposal attached; \
                        we recommend starting with the analytics module. Best, the team.";
        let (score, details) = score_tone("professional", response);

        assert!(score >= 85, "professional response scored {}", score);
        assert!(details.contains("matches"));
    }

    #[test]
    fn test_tone_opposite_register() {
        let response = "hey folks, yeah this stuff is awesome, gonna be so cool";
        let (score, details) = score_tone("professional", response);

        assert_eq!(score, 20);
        assert!(details.contains("opposite"));
    }

    #[test]
    fn test_tone_weak_signal_is_neutral() {
        let (score, _) = score_tone("professional", "The quarterly numbers were flat.");
        assert_eq!(score, 50);
    }

    #[test]
    fn test_rubric_heuristic_rewards_guidance_coverage() {
        let criterion = CriterionDefinition {
            id: "r1".to_string(),
            name: "Subject Line Quality".to_string(),
            description: "Has a compelling, specific subject line".to_string(),
            weight: 25,
            rule: CriterionRule::Rubric { guidance: None },
        };
        let task = presets::marketing_email();

        let strong = HeuristicGrader
            .grade(
                &criterion,
                "Subject: Your data, finally in one place\n\nWe built a specific \
                 dashboard for teams like yours. It connects 12 sources and shows \
                 compelling trends within minutes of setup, so your Monday reviews \
                 start with answers instead of exports.",
                &task,
            )
            .unwrap();
        let empty = HeuristicGrader.grade(&criterion, "", &task).unwrap();

        assert!(strong.score > empty.score);
        assert_eq!(empty.score, 5);
        assert!((40..=100).contains(&strong.score));
    }

    #[test]
    fn test_rubric_failure_degrades_that_criterion_only() {
        let criteria = vec![
            keyword_criterion(&["data"], &[]),
            CriterionDefinition {
                id: "r1".to_string(),
                name: "Insights".to_string(),
                description: "Actionable insights".to_string(),
                weight: 30,
                rule: CriterionRule::Rubric { guidance: None },
            },
        ];
        let request = request_with_response("The data pipeline is ready.", criteria);

        let results = evaluate_criteria(&request, &FailingGrader);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].score, 100);
        assert_eq!(results[1].score, RUBRIC_FALLBACK);
        assert!(results[1].details.contains("unavailable"));
    }

    #[test]
    fn test_evaluate_criteria_with_no_response() {
        let request = EvaluateRequest {
            messages: vec![Message::user("write the email")],
            ..request_with_response("", vec![keyword_criterion(&["data"], &[])])
        };

        let results = evaluate_criteria(&request, &HeuristicGrader);
        assert_eq!(results[0].score, 0);
    }

    #[test]
    fn test_validate_rejects_oversized_weight() {
        let mut criterion = keyword_criterion(&["data"], &[]);
        criterion.weight = 150;

        let err = validate_criteria(&[criterion]).unwrap_err();
        assert!(matches!(err, ScoreError::InvalidCriterion { .. }));
    }

    #[test]
    fn test_validate_rejects_empty_keyword_lists() {
        let criterion = keyword_criterion(&[], &[]);
        assert!(validate_criteria(&[criterion]).is_err());
    }

    #[test]
    fn test_validate_rejects_unbounded_length() {
        let criterion = CriterionDefinition {
            id: "len".to_string(),
            name: "Length".to_string(),
            description: String::new(),
            weight: 20,
            rule: CriterionRule::Length {
                min_words: None,
                max_words: None,
            },
        };
        assert!(validate_criteria(&[criterion]).is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_length_bounds() {
        let criterion = CriterionDefinition {
            id: "len".to_string(),
            name: "Length".to_string(),
            description: String::new(),
            weight: 20,
            rule: CriterionRule::Length {
                min_words: Some(200),
                max_words: Some(100),
            },
        };

        let err = validate_criteria(&[criterion]).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("minWords"), "got: {}", message);
    }

    #[test]
    fn test_validate_rejects_unknown_tone() {
        let criterion = CriterionDefinition {
            id: "tone".to_string(),
            name: "Tone".to_string(),
            description: String::new(),
            weight: 20,
            rule: CriterionRule::Tone {
                tone: "sarcastic".to_string(),
            },
        };

        let err = validate_criteria(&[criterion]).unwrap_err();
        assert!(err.to_string().contains("sarcastic"));
    }

    #[test]
    fn test_validate_accepts_presets() {
        for name in presets::NAMES {
            let task = presets::by_name(name).unwrap();
            assert!(
                validate_criteria(&task.custom_criteria).is_ok(),
                "{} presets should validate",
                name
            );
        }
    }
}
