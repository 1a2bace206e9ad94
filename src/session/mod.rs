//! Session domain types: transcripts, usage stats, task definitions and the
//! scoring request contract shared with the surrounding application.

mod types;

pub use types::{
    presets, CriterionDefinition, CriterionRule, EvaluateRequest, Message, Role, SessionStats,
    TaskSpec, DEFAULT_MAX_ATTEMPTS, DEFAULT_TIME_LIMIT_MINUTES, DEFAULT_TOKEN_BUDGET,
};
