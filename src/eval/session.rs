//! Scripted session simulation. A [`SessionScript`] lists the prompts a
//! candidate would send; the runner plays them against a [`Responder`] and
//! assembles the transcript and usage numbers into a scoring request.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::responder::Responder;
use crate::session::{
    presets, EvaluateRequest, Message, TaskSpec, DEFAULT_MAX_ATTEMPTS, DEFAULT_TIME_LIMIT_MINUTES,
    DEFAULT_TOKEN_BUDGET,
};

fn default_seconds_per_turn() -> u64 {
    90
}

/// A scripted candidate session, loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionScript {
    /// Identifier carried through to the scoring result
    pub test_id: String,

    /// Named built-in task to score against
    #[serde(default)]
    pub preset: Option<String>,

    /// Inline task description; overrides the preset's when set
    #[serde(default)]
    pub task_description: Option<String>,

    /// Inline expected outcome; overrides the preset's when set
    #[serde(default)]
    pub expected_outcome: Option<String>,

    /// Prompts sent in order, one attempt each
    pub prompts: Vec<String>,

    /// Simulated wall-clock seconds consumed per prompt/reply turn
    #[serde(default = "default_seconds_per_turn")]
    pub seconds_per_turn: u64,

    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub token_budget: Option<u64>,
    #[serde(default)]
    pub time_limit_minutes: Option<u64>,
}

impl SessionScript {
    /// Load a script from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read session script: {:?}", path.as_ref()))?;

        let script: SessionScript = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse session script: {:?}", path.as_ref()))?;

        Ok(script)
    }

    /// Resolve the task this session is scored against
    pub fn resolve_task(&self) -> Result<TaskSpec> {
        let mut task = match &self.preset {
            Some(name) => presets::by_name(name).ok_or_else(|| {
                anyhow!(
                    "Unknown task preset '{}', available: {}",
                    name,
                    presets::NAMES.join(", ")
                )
            })?,
            None => TaskSpec {
                task_description: String::new(),
                expected_outcome: String::new(),
                custom_criteria: Vec::new(),
            },
        };

        if let Some(description) = &self.task_description {
            task.task_description = description.clone();
        }
        if let Some(outcome) = &self.expected_outcome {
            task.expected_outcome = outcome.clone();
        }

        if task.task_description.is_empty() {
            bail!("Session script needs a preset or a task_description");
        }

        Ok(task)
    }
}

/// Plays a script against a responder and collects the transcript
pub struct SessionRunner<'a> {
    responder: &'a dyn Responder,
}

impl<'a> SessionRunner<'a> {
    pub fn new(responder: &'a dyn Responder) -> Self {
        Self { responder }
    }

    /// Run the scripted session and assemble a scoring request
    pub fn run(&self, script: &SessionScript) -> Result<EvaluateRequest> {
        if script.prompts.is_empty() {
            bail!("Session script has no prompts");
        }

        let task = script.resolve_task()?;

        info!(
            "Simulating session '{}' with {} prompts",
            script.test_id,
            script.prompts.len()
        );

        let started = Utc::now();
        let mut messages: Vec<Message> = Vec::new();
        let mut tokens_used: u64 = 0;

        for (i, prompt) in script.prompts.iter().enumerate() {
            let sent_at = started + Duration::seconds((script.seconds_per_turn * i as u64) as i64);
            let replied_at = sent_at + Duration::seconds(script.seconds_per_turn as i64 / 2);

            let reply = self
                .responder
                .respond(prompt, &messages, &task)
                .with_context(|| format!("Responder failed on prompt {}", i + 1))?;

            debug!(
                "Turn {}: {} prompt words, {} reply tokens from {}",
                i + 1,
                prompt.split_whitespace().count(),
                reply.tokens_used,
                reply.model
            );

            tokens_used += (prompt.len() / 4) as u64 + reply.tokens_used;

            messages.push(Message::user(prompt).with_timestamp(sent_at));
            messages.push(Message::assistant(&reply.content).with_timestamp(replied_at));
        }

        Ok(EvaluateRequest {
            test_id: script.test_id.clone(),
            messages,
            attempts_used: script.prompts.len() as u32,
            tokens_used,
            time_spent_seconds: script.seconds_per_turn * script.prompts.len() as u64,
            max_attempts: script.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
            token_budget: script.token_budget.unwrap_or(DEFAULT_TOKEN_BUDGET),
            time_limit_minutes: script
                .time_limit_minutes
                .unwrap_or(DEFAULT_TIME_LIMIT_MINUTES),
            task_description: task.task_description,
            expected_outcome: task.expected_outcome,
            custom_criteria: task.custom_criteria,
        })
    }
}
