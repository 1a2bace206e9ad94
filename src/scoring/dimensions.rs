//! The five fixed dimension scorers. Each one looks at the full session
//! context and produces a 0-100 sub-score plus the natural-language notes
//! matching its score band: 80 and above reports strengths only, below 40
//! reports weaknesses and suggestions only, anything between reports both.

use crate::scoring::metrics::UsageRatios;
use crate::scoring::text;
use crate::scoring::types::DimensionScore;
use crate::session::{EvaluateRequest, Message, Role};

/// Score given to a dimension that has no usable signal
pub const NEUTRAL_SCORE: u32 = 60;

const HIGH_BAND: u32 = 80;
const LOW_BAND: u32 = 40;
const MAX_NOTES: usize = 4;

const SCORE_CEILING: f64 = 95.0;
const SCORE_FLOOR: f64 = 5.0;

// Usage curves: linear in the ratios with plateaus at both ends, so
// overruns degrade smoothly and near-zero usage is not rewarded past the
// ceiling.
const TOKEN_SLOPE: f64 = 0.45;
const ATTEMPT_SLOPE: f64 = 0.30;
const TIME_SLOPE: f64 = 0.70;

/// Phrases that signal an explicit constraint or format requirement
const CONSTRAINT_MARKERS: &[&str] = &[
    "must",
    "should",
    "need",
    "format",
    "include",
    "exactly",
    "at least",
    "at most",
    "no more than",
    "under",
    "within",
    "limit",
    "bullet",
    "list",
    "step",
    "tone",
    "word",
    "section",
    "paragraph",
    "subject line",
    "avoid",
    "do not",
    "don't",
];

/// Phrases that signal a stated goal or audience
const GOAL_MARKERS: &[&str] = &[
    "for ", "audience", "aimed at", "so that", "goal", "target", "intended",
];

/// Vague filler that leaves the AI guessing
const FILLER_MARKERS: &[&str] = &[
    "something",
    "stuff",
    "things",
    "whatever",
    "maybe",
    "etc",
    "kinda",
    "sort of",
    "anything",
    "somehow",
];

/// How well the user's prompts specify the work (weight 0.30)
pub fn prompt_quality(request: &EvaluateRequest, weight: f64) -> DimensionScore {
    let prompts = request.user_messages();

    if prompts.is_empty() {
        let dim = DimensionScore::new(15, weight);
        return with_notes(
            dim,
            vec![],
            vec!["No user prompts were recorded in this session.".to_string()],
            vec!["Submit at least one prompt describing the task.".to_string()],
        );
    }

    let scores: Vec<u32> = prompts.iter().map(|m| score_prompt(&m.content)).collect();
    let mean = scores.iter().sum::<u32>() as f64 / scores.len() as f64;
    let best = *scores.iter().max().unwrap_or(&0) as f64;
    // Reward a strong final prompt without erasing weak early ones
    let score = (0.7 * mean + 0.3 * best).round().clamp(0.0, 100.0) as u32;

    let combined: String = prompts
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let constraint_hits = text::marker_hits(&combined, CONSTRAINT_MARKERS);
    let goal_hits = text::marker_hits(&combined, GOAL_MARKERS);
    let filler_hits = text::marker_hits(&combined, FILLER_MARKERS);
    let avg_words = prompts
        .iter()
        .map(|m| text::word_count(&m.content))
        .sum::<usize>()
        / prompts.len();

    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    let mut suggestions = Vec::new();

    if constraint_hits >= 3 {
        strengths.push("Prompts state explicit constraints and format requirements.".to_string());
    }
    if text::has_digits(&combined) {
        strengths.push("Concrete numbers make the requests measurable.".to_string());
    }
    if goal_hits >= 1 {
        strengths.push("The goal and audience are spelled out.".to_string());
    }
    if prompts.iter().any(|m| text::sentence_count(&m.content) >= 2) {
        strengths.push("Prompts are structured rather than run-on.".to_string());
    }

    if constraint_hits == 0 {
        weaknesses
            .push("Prompts give the AI no explicit constraints or format requirements.".to_string());
        suggestions
            .push("State the goal, audience and required format in the first prompt.".to_string());
    }
    if avg_words < 8 {
        weaknesses
            .push("Prompts are very short; the AI has to guess most of the details.".to_string());
        suggestions.push(
            "Add measurable constraints such as word counts or a required structure.".to_string(),
        );
    }
    if filler_hits >= 2 {
        weaknesses
            .push("Vague filler like 'stuff' or 'something' leaves room for misreads.".to_string());
        suggestions.push("Replace vague phrasing with concrete requirements.".to_string());
    }

    with_notes(DimensionScore::new(score, weight), strengths, weaknesses, suggestions)
}

fn score_prompt(content: &str) -> u32 {
    let word_count = text::word_count(content);
    let sentences = text::sentence_count(content);

    let mut score: f64 = 32.0;

    // Explicit constraints are the strongest signal
    score += (text::marker_hits(content, CONSTRAINT_MARKERS).min(5) * 5) as f64;

    // Specificity: numbers, named entities, stated goal/audience
    if text::has_digits(content) {
        score += 6.0;
    }
    score += (text::capitalized_entities(content).min(2) * 4) as f64;
    score += (text::marker_hits(content, GOAL_MARKERS).min(2) * 3) as f64;

    // Structure
    if sentences >= 2 {
        score += 8.0;
    }
    if content.contains('\n') {
        score += 4.0;
    }
    if (12..=120).contains(&word_count) {
        score += 3.0;
    }

    // Penalties
    score -= (text::marker_hits(content, FILLER_MARKERS).min(3) * 5) as f64;
    if word_count < 6 {
        score -= 5.0;
    }
    if word_count > 40 && sentences == 1 {
        score -= 8.0;
    }

    score.clamp(SCORE_FLOOR, SCORE_CEILING).round() as u32
}

/// How well the final assistant message meets the expected outcome
/// (weight 0.25)
pub fn response_quality(request: &EvaluateRequest, weight: f64) -> DimensionScore {
    let response = match request.final_response() {
        Some(m) if !m.content.trim().is_empty() => m,
        _ => {
            let dim = DimensionScore::new(10, weight);
            return with_notes(
                dim,
                vec![],
                vec!["The session ended without an assistant response.".to_string()],
                vec![
                    "Submit a prompt and wait for the response before finishing.".to_string(),
                ],
            );
        }
    };

    // Topic coverage against the expected outcome, falling back to the task
    // description when the author gave none
    let reference = if request.expected_outcome.trim().is_empty() {
        &request.task_description
    } else {
        &request.expected_outcome
    };
    let coverage = text::coverage(reference, &response.content);

    // Length adequacy relative to task complexity
    let complexity =
        text::word_count(&request.task_description) + text::word_count(&request.expected_outcome);
    let expected_words = (complexity * 2).clamp(30, 250) as f64;
    let response_words = text::word_count(&response.content) as f64;
    let length_ratio = response_words / expected_words;
    let length_component = if length_ratio >= 4.0 {
        14.0
    } else if length_ratio >= 1.0 {
        20.0
    } else {
        20.0 * length_ratio
    };

    // Structural completeness: sentences in the task that read like explicit
    // requirements, credited by how much of each shows up in the response
    let requirements = requirement_phrases(&request.task_description, &request.expected_outcome);
    let completeness_component = if requirements.is_empty() {
        12.0
    } else {
        let covered: f64 = requirements
            .iter()
            .map(|phrase| text::coverage(phrase, &response.content))
            .sum::<f64>()
            / requirements.len() as f64;
        20.0 * covered
    };

    let raw = 15.0 + 45.0 * coverage + length_component + completeness_component;
    let score = raw.clamp(SCORE_FLOOR, SCORE_CEILING).round() as u32;

    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    let mut suggestions = Vec::new();

    if coverage >= 0.6 {
        strengths.push("The final response covers the expected outcome well.".to_string());
    }
    if length_ratio >= 0.8 && length_ratio < 4.0 {
        strengths.push("Response length fits the scope of the task.".to_string());
    }
    if !requirements.is_empty() && completeness_component >= 16.0 {
        strengths.push("All explicitly required elements are addressed.".to_string());
    }

    if coverage < 0.3 {
        weaknesses.push("The final response misses most of what the task asked for.".to_string());
        suggestions
            .push("Ask the AI to revise until the response covers the expected outcome.".to_string());
    }
    if length_ratio < 0.5 {
        weaknesses.push("The response is too brief for the task's scope.".to_string());
        suggestions.push("Request a longer, more complete treatment of the task.".to_string());
    }
    if !requirements.is_empty() && completeness_component < 8.0 {
        weaknesses.push("Explicit requirements from the task are not addressed.".to_string());
        suggestions.push("Spell out the missing requirements in a follow-up prompt.".to_string());
    }

    with_notes(DimensionScore::new(score, weight), strengths, weaknesses, suggestions)
}

fn requirement_phrases(task_description: &str, expected_outcome: &str) -> Vec<String> {
    let combined = format!("{}. {}", task_description, expected_outcome);
    combined
        .split(['.', ';', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| text::marker_hits(s, &["must", "should", "include", "need", "require"]) > 0)
        .map(str::to_string)
        .collect()
}

/// Token and attempt discipline (weight 0.15)
pub fn efficiency(ratios: &UsageRatios, weight: f64) -> DimensionScore {
    if !ratios.has_token_data && ratios.attempt_ratio == 0.0 {
        let dim = DimensionScore::new(NEUTRAL_SCORE, weight);
        return with_notes(
            dim,
            vec![],
            vec!["Insufficient usage data to assess efficiency.".to_string()],
            vec![],
        );
    }

    let mut raw =
        100.0 * (1.0 - TOKEN_SLOPE * ratios.token_ratio - ATTEMPT_SLOPE * ratios.attempt_ratio);

    let mut weaknesses = Vec::new();
    let mut suggestions = Vec::new();

    if !ratios.has_token_data {
        // Attempts only; don't let missing token data read as thrift
        raw = raw.min(75.0);
        weaknesses.push("Token usage was not recorded for this session.".to_string());
    }

    let score = raw.clamp(SCORE_FLOOR, SCORE_CEILING).round() as u32;

    let mut strengths = Vec::new();
    if ratios.has_token_data && ratios.token_ratio < 0.5 {
        strengths.push("Token usage stayed well under budget.".to_string());
    }
    if ratios.attempt_ratio <= 0.4 {
        strengths.push("Few attempts were needed.".to_string());
    }

    if ratios.token_ratio > 1.0 {
        weaknesses.push("The token budget was exceeded.".to_string());
        suggestions.push("Trim redundant context from prompts to save tokens.".to_string());
    } else if ratios.token_ratio > 0.8 {
        weaknesses.push("Token usage ran close to the budget.".to_string());
    }
    if ratios.attempt_ratio > 1.0 {
        weaknesses.push("More attempts were used than the task allows.".to_string());
        suggestions.push("Consolidate requirements into fewer, richer prompts.".to_string());
    }

    with_notes(DimensionScore::new(score, weight), strengths, weaknesses, suggestions)
}

/// Wall-clock discipline, isolated from response quality (weight 0.15)
pub fn speed(ratios: &UsageRatios, weight: f64) -> DimensionScore {
    if !ratios.has_time_data {
        let dim = DimensionScore::new(NEUTRAL_SCORE, weight);
        return with_notes(
            dim,
            vec![],
            vec!["Insufficient timing data to assess speed.".to_string()],
            vec![],
        );
    }

    let raw = 100.0 * (1.0 - TIME_SLOPE * ratios.time_ratio);
    let score = raw.clamp(SCORE_FLOOR, SCORE_CEILING).round() as u32;

    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    let mut suggestions = Vec::new();

    if ratios.time_ratio < 0.5 {
        strengths.push("Finished well under the time limit.".to_string());
    }
    if ratios.time_ratio > 1.0 {
        weaknesses.push("The time limit was exceeded.".to_string());
        suggestions.push("Plan the first prompt before the clock starts.".to_string());
    } else if ratios.time_ratio > 0.85 {
        weaknesses.push("The session ran close to the time limit.".to_string());
        suggestions.push("Keep refinement cycles short and focused.".to_string());
    }

    with_notes(DimensionScore::new(score, weight), strengths, weaknesses, suggestions)
}

/// Whether successive prompts meaningfully refine the exchange (weight 0.15)
pub fn iteration_iq(request: &EvaluateRequest, weight: f64) -> DimensionScore {
    let exchanges = prompt_exchanges(&request.messages);

    if exchanges.len() < 2 {
        let dim = DimensionScore::new(NEUTRAL_SCORE, weight);
        return with_notes(
            dim,
            vec![],
            vec![
                "Single-prompt session; iteration skill could not be assessed.".to_string(),
            ],
            vec![],
        );
    }

    let mut pair_scores = Vec::new();
    let mut duplicates = 0usize;
    let mut built_on_reply = 0usize;
    let mut constraint_growth = 0usize;

    for window in exchanges.windows(2) {
        let (prev, reply) = &window[0];
        let (next, _) = &window[1];

        let mut pair: f64 = 50.0;
        let sim = text::similarity(prev, next);

        if sim > 0.8 {
            pair -= 30.0;
            duplicates += 1;
        }
        if sim <= 0.5 {
            pair += 10.0;
        }

        let prev_markers = text::marker_hits(prev, CONSTRAINT_MARKERS);
        let next_markers = text::marker_hits(next, CONSTRAINT_MARKERS);
        if next_markers > prev_markers {
            pair += 15.0;
            constraint_growth += 1;
        }

        if let Some(reply) = reply {
            let reply_words = text::content_words(reply);
            let referenced = text::content_words(next)
                .iter()
                .filter(|w| reply_words.contains(*w))
                .count();
            if referenced >= 2 {
                pair += 15.0;
                built_on_reply += 1;
            }
        }

        let grew = text::word_count(next) as f64 >= text::word_count(prev) as f64 * 1.2;
        if grew || (text::has_digits(next) && !text::has_digits(prev)) {
            pair += 10.0;
        }

        pair_scores.push(pair.clamp(SCORE_FLOOR, SCORE_CEILING));
    }

    let score = (pair_scores.iter().sum::<f64>() / pair_scores.len() as f64).round() as u32;
    let pairs = pair_scores.len();

    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    let mut suggestions = Vec::new();

    if duplicates == 0 && score >= 60 {
        strengths.push("Each prompt meaningfully refines the previous one.".to_string());
    }
    if built_on_reply * 2 >= pairs {
        strengths.push("Follow-ups respond directly to the assistant's output.".to_string());
    }
    if constraint_growth * 2 >= pairs {
        strengths.push("Constraints accumulate across attempts.".to_string());
    }

    if duplicates > 0 {
        weaknesses.push("Consecutive prompts repeat each other almost verbatim.".to_string());
        suggestions
            .push("Change one thing at a time instead of restating the request.".to_string());
    }
    if built_on_reply == 0 {
        weaknesses.push("Follow-up prompts do not engage with the responses.".to_string());
        suggestions
            .push("Reference what the assistant produced and say what to change.".to_string());
    }

    with_notes(DimensionScore::new(score, weight), strengths, weaknesses, suggestions)
}

/// User prompts paired with the assistant reply that followed each one
/// (None when the session ended before a reply)
fn prompt_exchanges(messages: &[Message]) -> Vec<(String, Option<String>)> {
    let mut exchanges: Vec<(String, Option<String>)> = Vec::new();

    for message in messages {
        match message.role {
            Role::User => exchanges.push((message.content.clone(), None)),
            Role::Assistant => {
                if let Some(last) = exchanges.last_mut() {
                    if last.1.is_none() {
                        last.1 = Some(message.content.clone());
                    }
                }
            }
        }
    }

    exchanges
}

/// Keep only the notes the score band calls for, capped at four each
fn with_notes(
    mut dim: DimensionScore,
    strengths: Vec<String>,
    weaknesses: Vec<String>,
    suggestions: Vec<String>,
) -> DimensionScore {
    let cap = |mut items: Vec<String>| {
        items.truncate(MAX_NOTES);
        items
    };

    if dim.score >= HIGH_BAND {
        dim.strengths = cap(strengths);
    } else if dim.score < LOW_BAND {
        dim.weaknesses = cap(weaknesses);
        dim.suggestions = cap(suggestions);
    } else {
        dim.strengths = cap(strengths);
        dim.weaknesses = cap(weaknesses);
        dim.suggestions = cap(suggestions);
    }

    dim
}
