use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Score and explanation for one fixed dimension
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionScore {
    /// Sub-score, 0-100
    pub score: u32,
    /// Fraction of the composite this dimension carries
    pub weight: f64,
    /// Rounded contribution shown to readers; the composite itself sums
    /// unrounded products
    pub weighted_score: u32,
    /// What went well, 0-4 items
    pub strengths: Vec<String>,
    /// What held the score back, 0-4 items
    pub weaknesses: Vec<String>,
    /// Concrete next steps, 0-4 items
    pub suggestions: Vec<String>,
}

impl DimensionScore {
    pub fn new(score: u32, weight: f64) -> Self {
        Self {
            score: score.min(100),
            weight,
            weighted_score: (score.min(100) as f64 * weight).round() as u32,
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            suggestions: Vec::new(),
        }
    }
}

/// The five fixed dimensions of one scoring run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionSet {
    pub prompt_quality: DimensionScore,
    pub efficiency: DimensionScore,
    pub speed: DimensionScore,
    pub response_quality: DimensionScore,
    #[serde(rename = "iterationIQ")]
    pub iteration_iq: DimensionScore,
}

impl DimensionSet {
    /// Dimensions in reporting order, with their display names
    pub fn ordered(&self) -> [(&'static str, &DimensionScore); 5] {
        [
            ("Prompt Quality", &self.prompt_quality),
            ("Response Quality", &self.response_quality),
            ("Efficiency", &self.efficiency),
            ("Speed", &self.speed),
            ("Iteration IQ", &self.iteration_iq),
        ]
    }
}

/// Letter grade bands for the headline score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LetterGrade {
    S,
    A,
    B,
    C,
    D,
    F,
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            LetterGrade::S => "S",
            LetterGrade::A => "A",
            LetterGrade::B => "B",
            LetterGrade::C => "C",
            LetterGrade::D => "D",
            LetterGrade::F => "F",
        };
        write!(f, "{}", letter)
    }
}

/// Hiring recommendation derived from the headline score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongHire,
    Hire,
    ConsiderWithTraining,
    NotRecommended,
}

impl Recommendation {
    pub fn label(&self) -> &'static str {
        match self {
            Recommendation::StrongHire => "Strong Hire",
            Recommendation::Hire => "Hire",
            Recommendation::ConsiderWithTraining => "Consider with Training",
            Recommendation::NotRecommended => "Not Recommended",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Recommendation::StrongHire => {
                "Candidate demonstrates advanced AI proficiency. Efficient, structured, \
                 and adaptive prompting."
            }
            Recommendation::Hire => {
                "Candidate meets proficiency requirements. Solid fundamentals with room \
                 for growth."
            }
            Recommendation::ConsiderWithTraining => {
                "Candidate shows potential but needs development in AI tool usage."
            }
            Recommendation::NotRecommended => {
                "Candidate needs significant AI training before being effective."
            }
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Human-readable explanation attached to a result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    /// One-sentence overall verdict
    pub summary: String,
    /// Best strength items across dimensions, capped at 4
    pub top_strengths: Vec<String>,
    /// Worst weakness items across dimensions, capped at 4
    pub top_weaknesses: Vec<String>,
    /// Suggestions from the weakest dimensions, capped at 4
    pub improvement_plan: Vec<String>,
}

/// Outcome of one custom criterion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionResult {
    pub name: String,
    /// Criterion kind: rubric, keyword, tone or length
    #[serde(rename = "type")]
    pub kind: String,
    /// Criterion score, 0-100
    pub score: u32,
    /// Short explanation of how the score was reached
    pub details: String,
}

/// Session statistics echoed on the result, plus transcript aggregates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultStats {
    pub attempts_used: u32,
    pub tokens_used: u64,
    pub time_spent_seconds: u64,
    pub max_attempts: u32,
    pub token_budget: u64,
    pub time_limit_minutes: u64,
    /// Number of user messages in the transcript
    pub total_prompts: u32,
    /// Mean user-message length in words
    pub avg_prompt_length: u32,
    /// Total assistant output in words
    pub total_response_length: u32,
}

/// Complete assessment of one session; immutable once created
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringResult {
    /// Identifier passed through from the request untouched
    pub test_id: String,
    /// Headline proficiency score, 0-100
    pub prompt_score: u32,
    pub letter_grade: LetterGrade,
    /// Share of candidates this score beats, 1-99
    pub percentile: u32,
    pub recommendation: Recommendation,
    pub dimensions: DimensionSet,
    pub feedback: Feedback,
    pub stats: ResultStats,
    /// Custom criteria outcomes, in request order
    pub criteria_results: Vec<CriterionResult>,
    /// Label for the criteria set that was applied
    pub criteria_used: String,
    pub evaluated_at: DateTime<Utc>,
}

impl ScoringResult {
    /// One-line form for logs and terminal output
    pub fn headline(&self) -> String {
        format!(
            "{}/100 (grade {}, {}th percentile) - {}",
            self.prompt_score,
            self.letter_grade,
            self.percentile,
            self.recommendation.label()
        )
    }
}
