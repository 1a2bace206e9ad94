//! The capability boundary for producing assistant replies. The session
//! runner only ever talks to a [`Responder`]; whether replies come from a
//! scripted bank or a real model changes nothing downstream, and the
//! scoring engine treats the resulting transcripts identically.

mod scripted;

pub use scripted::ScriptedResponder;

use anyhow::Result;

use crate::session::{Message, TaskSpec};

/// One assistant reply plus its usage accounting
#[derive(Debug, Clone)]
pub struct ResponderReply {
    pub content: String,
    /// Model label recorded for the session, e.g. "gpt-4o-mock"
    pub model: String,
    pub tokens_used: u64,
}

/// Produces the assistant side of a conversation: given the new prompt,
/// the transcript so far and the task being attempted, return a reply.
pub trait Responder {
    fn respond(&self, prompt: &str, history: &[Message], task: &TaskSpec)
        -> Result<ResponderReply>;
}
