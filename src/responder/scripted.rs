//! Deterministic stand-in for a model call. Replies come from small canned
//! banks that improve with each attempt, so demo sessions show the scoring
//! pipeline reacting to iteration without any network access.

use anyhow::{bail, Result};

use crate::responder::{Responder, ResponderReply};
use crate::session::{Message, Role, TaskSpec};

const MODEL_NAME: &str = "gpt-4o-mock";

/// Escalating drafts for email-flavored tasks
const MARKETING_BANK: &[&str] = &[
    "Here's a first draft:\n\nHi there,\n\nWe have some exciting news about our \
     product. There are new features you might like, and we think they could help \
     your team. Let us know if you want to learn more.\n\nThanks",
    "Here's a revised draft:\n\nSubject: New analytics features for your team\n\n\
     Hi there,\n\nOur new analytics dashboard is ready for you. It connects your \
     data sources, builds reports automatically, and flags trends worth acting \
     on. Reply to this email and we'll set you up.\n\nBest,\nThe Product Team",
    "Here's the polished version:\n\nSubject: Your data, working for you in \
     minutes\n\nHi there,\n\nThe analytics dashboard you've been waiting for is \
     live. Three things your team gets today:\n\n- Every data source connected in \
     minutes, no integration work\n- Reports that build themselves before Monday \
     standup\n- Trend alerts that surface problems while they're still small\n\n\
     Start your free trial today and see your own numbers within the hour.\n\n\
     Best,\nThe Product Team",
];

/// Generic escalating replies for everything else
const DEFAULT_BANK: &[&str] = &[
    "Here's an initial attempt at the task. It covers the basic request at a \
     high level, though some details are left open and the structure is rough.",
    "Here's an improved version. The structure now follows your instructions, \
     the main requirements are addressed one by one, and the open details from \
     the first pass are filled in.",
    "Here's the refined result. Every requirement you listed is addressed in \
     order, the format matches what you asked for, and the wording is tightened \
     so the final output is ready to use as-is.",
];

/// Canned-reply responder used by the simulate command and tests
#[derive(Debug, Default)]
pub struct ScriptedResponder;

impl ScriptedResponder {
    pub fn new() -> Self {
        Self
    }

    fn bank(task: &TaskSpec) -> &'static [&'static str] {
        let description = task.task_description.to_lowercase();
        if description.contains("email") || description.contains("marketing") {
            MARKETING_BANK
        } else {
            DEFAULT_BANK
        }
    }
}

impl Responder for ScriptedResponder {
    fn respond(
        &self,
        prompt: &str,
        history: &[Message],
        task: &TaskSpec,
    ) -> Result<ResponderReply> {
        if prompt.trim().is_empty() {
            bail!("cannot respond to an empty prompt");
        }

        // Attempts already made, counting the prompt being answered now
        let attempt = history.iter().filter(|m| m.role == Role::User).count() + 1;

        let bank = Self::bank(task);
        let content = bank[(attempt - 1).min(bank.len() - 1)].to_string();
        let tokens_used = (content.len() / 4) as u64;

        Ok(ResponderReply {
            content,
            model: MODEL_NAME.to_string(),
            tokens_used,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::presets;

    fn email_task() -> TaskSpec {
        presets::marketing_email()
    }

    #[test]
    fn test_replies_are_deterministic() {
        let responder = ScriptedResponder::new();
        let task = email_task();

        let first = responder.respond("write the email", &[], &task).unwrap();
        let second = responder.respond("write the email", &[], &task).unwrap();

        assert_eq!(first.content, second.content);
        assert_eq!(first.tokens_used, second.tokens_used);
        assert_eq!(first.model, "gpt-4o-mock");
    }

    #[test]
    fn test_email_tasks_use_the_marketing_bank() {
        let responder = ScriptedResponder::new();
        let history = vec![
            Message::user("draft it"),
            Message::assistant("first"),
            Message::user("add a subject line"),
            Message::assistant("second"),
        ];

        let reply = responder
            .respond("polish it", &history, &email_task())
            .unwrap();

        assert!(reply.content.contains("Subject:"));
    }

    #[test]
    fn test_replies_improve_with_attempts() {
        let responder = ScriptedResponder::new();
        let task = email_task();

        let first = responder.respond("draft it", &[], &task).unwrap();
        let history = vec![Message::user("draft it"), Message::assistant(&first.content)];
        let second = responder.respond("improve it", &history, &task).unwrap();

        assert_ne!(first.content, second.content);
        // The first draft has no subject line; the revision does
        assert!(!first.content.contains("Subject:"));
        assert!(second.content.contains("Subject:"));
    }

    #[test]
    fn test_bank_sticks_to_last_reply_after_exhaustion() {
        let responder = ScriptedResponder::new();
        let task = email_task();

        let mut history = Vec::new();
        for i in 0..6 {
            history.push(Message::user(&format!("attempt {}", i)));
            history.push(Message::assistant("reply"));
        }

        let late = responder.respond("one more", &history, &task).unwrap();
        assert_eq!(late.content, MARKETING_BANK[MARKETING_BANK.len() - 1]);
    }

    #[test]
    fn test_empty_prompt_is_rejected() {
        let responder = ScriptedResponder::new();
        assert!(responder.respond("   ", &[], &email_task()).is_err());
    }

    #[test]
    fn test_non_email_tasks_use_the_default_bank() {
        let responder = ScriptedResponder::new();
        let task = presets::sql_analysis();

        let reply = responder.respond("write the query", &[], &task).unwrap();
        assert_eq!(reply.content, DEFAULT_BANK[0]);
    }
}
