use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who produced a transcript message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person being assessed
    User,
    /// The conversational AI tool
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single transcript message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// When the message was sent; optional because imported transcripts
    /// may not carry timestamps
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Message {
    pub fn user(content: &str) -> Self {
        Self {
            role: Role::User,
            content: content.to_string(),
            timestamp: None,
        }
    }

    pub fn assistant(content: &str) -> Self {
        Self {
            role: Role::Assistant,
            content: content.to_string(),
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }
}

/// Objective usage numbers for one session
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub attempts_used: u32,
    pub max_attempts: u32,
    pub tokens_used: u64,
    pub token_budget: u64,
    pub time_spent_seconds: u64,
    pub time_limit_minutes: u64,
}

impl SessionStats {
    /// Time budget in seconds
    pub fn time_budget_seconds(&self) -> u64 {
        self.time_limit_minutes * 60
    }
}

/// The assessment definition a session is scored against
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    pub task_description: String,

    /// What a good final response should contain
    #[serde(default)]
    pub expected_outcome: String,

    /// Task-author-defined criteria evaluated alongside the fixed dimensions
    #[serde(default)]
    pub custom_criteria: Vec<CriterionDefinition>,
}

/// One task-author-defined criterion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionDefinition {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Relative importance, 0-100
    pub weight: u32,

    #[serde(flatten)]
    pub rule: CriterionRule,
}

/// Closed set of criterion kinds; the payload carries the per-kind config
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "lowercase")]
pub enum CriterionRule {
    /// Free-text criterion graded holistically; empty guidance falls back
    /// to the criterion description
    Rubric {
        #[serde(default)]
        guidance: Option<String>,
    },
    /// Required and banned terms in the final response
    Keyword {
        #[serde(default, rename = "mustInclude")]
        must_include: Vec<String>,
        #[serde(default, rename = "mustNotInclude")]
        must_not_include: Vec<String>,
    },
    /// Target tone label for the final response
    Tone { tone: String },
    /// Word-count bounds for the final response
    Length {
        #[serde(default, rename = "minWords")]
        min_words: Option<u32>,
        #[serde(default, rename = "maxWords")]
        max_words: Option<u32>,
    },
}

impl CriterionRule {
    /// Wire name of the criterion kind
    pub fn kind(&self) -> &'static str {
        match self {
            CriterionRule::Rubric { .. } => "rubric",
            CriterionRule::Keyword { .. } => "keyword",
            CriterionRule::Tone { .. } => "tone",
            CriterionRule::Length { .. } => "length",
        }
    }
}

/// Budget defaults applied when a request omits them
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_TOKEN_BUDGET: u64 = 2000;
pub const DEFAULT_TIME_LIMIT_MINUTES: u64 = 15;

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_token_budget() -> u64 {
    DEFAULT_TOKEN_BUDGET
}

fn default_time_limit_minutes() -> u64 {
    DEFAULT_TIME_LIMIT_MINUTES
}

/// A complete scoring request: transcript, usage and task in one JSON shape
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    pub test_id: String,

    #[serde(default)]
    pub messages: Vec<Message>,

    #[serde(default)]
    pub attempts_used: u32,
    #[serde(default)]
    pub tokens_used: u64,
    #[serde(default)]
    pub time_spent_seconds: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_token_budget")]
    pub token_budget: u64,
    #[serde(default = "default_time_limit_minutes")]
    pub time_limit_minutes: u64,

    #[serde(default)]
    pub task_description: String,
    #[serde(default)]
    pub expected_outcome: String,
    #[serde(default)]
    pub custom_criteria: Vec<CriterionDefinition>,
}

impl EvaluateRequest {
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            attempts_used: self.attempts_used,
            max_attempts: self.max_attempts,
            tokens_used: self.tokens_used,
            token_budget: self.token_budget,
            time_spent_seconds: self.time_spent_seconds,
            time_limit_minutes: self.time_limit_minutes,
        }
    }

    pub fn task(&self) -> TaskSpec {
        TaskSpec {
            task_description: self.task_description.clone(),
            expected_outcome: self.expected_outcome.clone(),
            custom_criteria: self.custom_criteria.clone(),
        }
    }

    /// User messages in transcript order
    pub fn user_messages(&self) -> Vec<&Message> {
        self.messages
            .iter()
            .filter(|m| m.role == Role::User)
            .collect()
    }

    /// Assistant messages in transcript order
    pub fn assistant_messages(&self) -> Vec<&Message> {
        self.messages
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .collect()
    }

    /// The final assistant message, if the task was not abandoned before
    /// any reply arrived
    pub fn final_response(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
    }
}

/// Built-in task definitions for demos and the session runner
pub mod presets {
    use super::*;

    pub const NAMES: &[&str] = &[
        "marketing-email",
        "sales-outreach",
        "sql-analysis",
        "code-debugging",
        "customer-support",
    ];

    pub fn by_name(name: &str) -> Option<TaskSpec> {
        match name {
            "marketing-email" => Some(marketing_email()),
            "sales-outreach" => Some(sales_outreach()),
            "sql-analysis" => Some(sql_analysis()),
            "code-debugging" => Some(code_debugging()),
            "customer-support" => Some(customer_support()),
            _ => None,
        }
    }

    pub fn marketing_email() -> TaskSpec {
        TaskSpec {
            task_description: "Write a marketing email announcing a new analytics \
                               feature to existing customers."
                .to_string(),
            expected_outcome: "A concise marketing email with a specific subject line, \
                               a clear value proposition around analytics and data \
                               integration, and a call to action to try the feature."
                .to_string(),
            custom_criteria: vec![
                CriterionDefinition {
                    id: "me-1".to_string(),
                    name: "Personalization".to_string(),
                    description: "References data and integration pain points".to_string(),
                    weight: 30,
                    rule: CriterionRule::Keyword {
                        must_include: vec!["data".to_string(), "integration".to_string()],
                        must_not_include: vec![],
                    },
                },
                CriterionDefinition {
                    id: "me-2".to_string(),
                    name: "Professional Tone".to_string(),
                    description: "Professional but conversational tone".to_string(),
                    weight: 20,
                    rule: CriterionRule::Tone {
                        tone: "professional".to_string(),
                    },
                },
                CriterionDefinition {
                    id: "me-3".to_string(),
                    name: "Conciseness".to_string(),
                    description: "Email body under 200 words".to_string(),
                    weight: 25,
                    rule: CriterionRule::Length {
                        min_words: None,
                        max_words: Some(200),
                    },
                },
                CriterionDefinition {
                    id: "me-4".to_string(),
                    name: "Subject Line Quality".to_string(),
                    description: "Has a compelling, specific subject line that would get \
                                  opened"
                        .to_string(),
                    weight: 25,
                    rule: CriterionRule::Rubric { guidance: None },
                },
            ],
        }
    }

    pub fn sales_outreach() -> TaskSpec {
        TaskSpec {
            task_description: "Write a cold outreach email to a CTO pitching a data \
                               platform, aiming for a 15-minute intro call."
                .to_string(),
            expected_outcome: "A short, personalized email that names a concrete pain \
                               point, explains the product in one sentence, and ends \
                               with a soft, specific call to action."
                .to_string(),
            custom_criteria: vec![
                CriterionDefinition {
                    id: "so-1".to_string(),
                    name: "Pain Point".to_string(),
                    description: "References pain points relevant to CTOs".to_string(),
                    weight: 35,
                    rule: CriterionRule::Keyword {
                        must_include: vec!["data".to_string(), "integration".to_string()],
                        must_not_include: vec!["synergy".to_string()],
                    },
                },
                CriterionDefinition {
                    id: "so-2".to_string(),
                    name: "Professional Tone".to_string(),
                    description: "Professional but conversational".to_string(),
                    weight: 25,
                    rule: CriterionRule::Tone {
                        tone: "professional".to_string(),
                    },
                },
                CriterionDefinition {
                    id: "so-3".to_string(),
                    name: "Conciseness".to_string(),
                    description: "Under 150 words".to_string(),
                    weight: 40,
                    rule: CriterionRule::Length {
                        min_words: None,
                        max_words: Some(150),
                    },
                },
            ],
        }
    }

    pub fn sql_analysis() -> TaskSpec {
        TaskSpec {
            task_description: "Use the AI to produce SQL that finds customers inactive \
                               for 90 days and summarize churn insights."
                .to_string(),
            expected_outcome: "Working SQL using JOIN and GROUP BY with date-based \
                               filtering over 90 days, plus two or three actionable \
                               churn insights."
                .to_string(),
            custom_criteria: vec![
                CriterionDefinition {
                    id: "sa-1".to_string(),
                    name: "Correct SQL Syntax".to_string(),
                    description: "Uses JOIN, GROUP BY and aggregation".to_string(),
                    weight: 40,
                    rule: CriterionRule::Keyword {
                        must_include: vec![
                            "SELECT".to_string(),
                            "JOIN".to_string(),
                            "GROUP BY".to_string(),
                        ],
                        must_not_include: vec![],
                    },
                },
                CriterionDefinition {
                    id: "sa-2".to_string(),
                    name: "Churn Query".to_string(),
                    description: "Identifies inactive customers with date-based filtering"
                        .to_string(),
                    weight: 30,
                    rule: CriterionRule::Keyword {
                        must_include: vec!["90".to_string(), "days".to_string()],
                        must_not_include: vec![],
                    },
                },
                CriterionDefinition {
                    id: "sa-3".to_string(),
                    name: "Business Insights".to_string(),
                    description: "Provides actionable, specific insights based on the \
                                  data model"
                        .to_string(),
                    weight: 30,
                    rule: CriterionRule::Rubric { guidance: None },
                },
            ],
        }
    }

    pub fn code_debugging() -> TaskSpec {
        TaskSpec {
            task_description: "Use the AI to find and fix the race condition in an \
                               async database connection pool that leaks connections \
                               under load."
                .to_string(),
            expected_outcome: "Identifies the unsynchronized access to shared pool \
                               state, explains why it breaks under concurrency, \
                               provides a corrected version using an asyncio lock or \
                               semaphore, and includes a test verifying the fix."
                .to_string(),
            custom_criteria: vec![
                CriterionDefinition {
                    id: "cd-1".to_string(),
                    name: "Bug Identification".to_string(),
                    description: "Correctly identifies the race condition on shared \
                                  pool state"
                        .to_string(),
                    weight: 30,
                    rule: CriterionRule::Keyword {
                        must_include: vec!["race condition".to_string(), "lock".to_string()],
                        must_not_include: vec![],
                    },
                },
                CriterionDefinition {
                    id: "cd-2".to_string(),
                    name: "Explanation Quality".to_string(),
                    description: "Clear explanation of why the bug occurs under \
                                  concurrency"
                        .to_string(),
                    weight: 25,
                    rule: CriterionRule::Rubric { guidance: None },
                },
                CriterionDefinition {
                    id: "cd-3".to_string(),
                    name: "Working Fix".to_string(),
                    description: "Corrected code using an asyncio lock or semaphore"
                        .to_string(),
                    weight: 30,
                    rule: CriterionRule::Keyword {
                        must_include: vec!["asyncio".to_string(), "lock".to_string()],
                        must_not_include: vec![],
                    },
                },
                CriterionDefinition {
                    id: "cd-4".to_string(),
                    name: "Test Included".to_string(),
                    description: "Includes a test or verification approach".to_string(),
                    weight: 15,
                    rule: CriterionRule::Keyword {
                        must_include: vec!["test".to_string(), "assert".to_string()],
                        must_not_include: vec![],
                    },
                },
            ],
        }
    }

    pub fn customer_support() -> TaskSpec {
        TaskSpec {
            task_description: "Write a response to a long-time customer threatening \
                               to cancel after five days of unresolved dashboard \
                               failures."
                .to_string(),
            expected_outcome: "An empathetic reply that acknowledges the specific \
                               frustrations, takes ownership without blaming other \
                               teams, lays out a concrete fix timeline with a goodwill \
                               credit, and stays under 250 words."
                .to_string(),
            custom_criteria: vec![
                CriterionDefinition {
                    id: "cs-1".to_string(),
                    name: "Empathetic Tone".to_string(),
                    description: "Acknowledges the customer's frustration in a warm, \
                                  understanding register"
                        .to_string(),
                    weight: 25,
                    rule: CriterionRule::Tone {
                        tone: "empathetic".to_string(),
                    },
                },
                CriterionDefinition {
                    id: "cs-2".to_string(),
                    name: "Takes Ownership".to_string(),
                    description: "Takes responsibility without blaming systems or \
                                  other teams"
                        .to_string(),
                    weight: 20,
                    rule: CriterionRule::Rubric { guidance: None },
                },
                CriterionDefinition {
                    id: "cs-3".to_string(),
                    name: "Concrete Resolution".to_string(),
                    description: "Provides specific next steps with a timeline"
                        .to_string(),
                    weight: 30,
                    rule: CriterionRule::Keyword {
                        must_include: vec!["fix".to_string(), "hours".to_string()],
                        must_not_include: vec![],
                    },
                },
                CriterionDefinition {
                    id: "cs-4".to_string(),
                    name: "Response Length".to_string(),
                    description: "Under 250 words".to_string(),
                    weight: 25,
                    rule: CriterionRule::Length {
                        min_words: None,
                        max_words: Some(250),
                    },
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serde_names() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn test_criterion_wire_shape() {
        let json = r#"{
            "id": "c1",
            "name": "Personalization",
            "description": "Mentions pain points",
            "type": "keyword",
            "weight": 25,
            "config": { "mustInclude": ["data", "integration"], "mustNotInclude": [] }
        }"#;

        let criterion: CriterionDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(criterion.weight, 25);
        assert_eq!(criterion.rule.kind(), "keyword");
        match &criterion.rule {
            CriterionRule::Keyword { must_include, .. } => {
                assert_eq!(must_include.len(), 2);
            }
            other => panic!("unexpected rule: {:?}", other),
        }
    }

    #[test]
    fn test_rubric_criterion_with_empty_config() {
        let json = r#"{
            "id": "c2",
            "name": "Headline Quality",
            "type": "rubric",
            "weight": 20,
            "config": {}
        }"#;

        let criterion: CriterionDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(criterion.rule.kind(), "rubric");
    }

    #[test]
    fn test_request_defaults() {
        let json = r#"{ "testId": "t-1", "messages": [] }"#;
        let request: EvaluateRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.max_attempts, 5);
        assert_eq!(request.token_budget, 2000);
        assert_eq!(request.time_limit_minutes, 15);
        assert_eq!(request.attempts_used, 0);
    }

    #[test]
    fn test_final_response() {
        let request = EvaluateRequest {
            test_id: "t-1".to_string(),
            messages: vec![
                Message::user("write an email"),
                Message::assistant("first draft"),
                Message::user("make it shorter"),
                Message::assistant("second draft"),
                Message::user("abandoned follow-up"),
            ],
            attempts_used: 2,
            tokens_used: 100,
            time_spent_seconds: 60,
            max_attempts: 5,
            token_budget: 2000,
            time_limit_minutes: 15,
            task_description: String::new(),
            expected_outcome: String::new(),
            custom_criteria: vec![],
        };

        assert_eq!(request.final_response().unwrap().content, "second draft");
        assert_eq!(request.user_messages().len(), 3);
    }

    #[test]
    fn test_presets_by_name() {
        for name in presets::NAMES {
            let task = presets::by_name(name).unwrap();
            assert!(!task.custom_criteria.is_empty(), "{} has criteria", name);
        }
        assert!(presets::by_name("nope").is_none());
    }

    #[test]
    fn test_debugging_and_support_presets() {
        let debugging = presets::by_name("code-debugging").unwrap();
        assert_eq!(debugging.custom_criteria.len(), 4);
        assert!(debugging.task_description.contains("race condition"));
        match &debugging.custom_criteria[0].rule {
            CriterionRule::Keyword { must_include, .. } => {
                assert!(must_include.contains(&"race condition".to_string()));
            }
            other => panic!("unexpected rule: {:?}", other),
        }

        let support = presets::by_name("customer-support").unwrap();
        assert_eq!(support.custom_criteria.len(), 4);
        match &support.custom_criteria[0].rule {
            CriterionRule::Tone { tone } => assert_eq!(tone, "empathetic"),
            other => panic!("unexpected rule: {:?}", other),
        }
        match &support.custom_criteria[3].rule {
            CriterionRule::Length { max_words, .. } => assert_eq!(*max_words, Some(250)),
            other => panic!("unexpected rule: {:?}", other),
        }

        let total: u32 = debugging.custom_criteria.iter().map(|c| c.weight).sum();
        assert_eq!(total, 100);
        let total: u32 = support.custom_criteria.iter().map(|c| c.weight).sum();
        assert_eq!(total, 100);
    }
}
