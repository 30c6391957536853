//! Registration dialogue for Telegram users the backend does not know yet.
//!
//! The bot keeps no session state. Every bot message that asks a question is
//! stored with a [`Prompt`] tag, and the step a user is on is worked out from
//! their recent history, newest first:
//!
//! * the prompt on the most recent bot message says what is being answered;
//! * the answer to an earlier prompt is the first user message after it.

use std::fmt;
use std::str::FromStr;

use crate::models::BotMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    FirstName,
    LastName,
    ProjectId,
    TaskDescription,
}

impl Prompt {
    pub fn as_str(&self) -> &'static str {
        match self {
            Prompt::FirstName => "first_name",
            Prompt::LastName => "last_name",
            Prompt::ProjectId => "project_id",
            Prompt::TaskDescription => "task_description",
        }
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Prompt {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first_name" => Ok(Prompt::FirstName),
            "last_name" => Ok(Prompt::LastName),
            "project_id" => Ok(Prompt::ProjectId),
            "task_description" => Ok(Prompt::TaskDescription),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnboardingStep {
    Start,
    AwaitingFirstName,
    AwaitingLastName { first_name: String },
    AwaitingProjectId { first_name: String, last_name: String },
}

/// Prompt carried by the most recent bot message, if that message asked anything.
pub fn pending_prompt(history: &[BotMessage]) -> Option<Prompt> {
    history
        .iter()
        .find(|m| m.is_from_bot())
        .and_then(|m| m.prompt.as_deref())
        .and_then(|p| p.parse().ok())
}

/// Text of the first user message sent after the latest bot message asking `prompt`.
pub fn answer_to(history: &[BotMessage], prompt: Prompt) -> Option<&str> {
    let asked_at = history
        .iter()
        .position(|m| m.is_from_bot() && m.prompt.as_deref() == Some(prompt.as_str()))?;
    history[..asked_at]
        .iter()
        .rev()
        .find(|m| !m.is_from_bot())
        .map(|m| m.text.trim())
        .filter(|text| !text.is_empty())
}

/// Works out where an unregistered user is in the dialogue. `history` must not
/// include the message currently being handled.
pub fn infer_step(history: &[BotMessage]) -> OnboardingStep {
    match pending_prompt(history) {
        Some(Prompt::FirstName) => OnboardingStep::AwaitingFirstName,
        Some(Prompt::LastName) => match answer_to(history, Prompt::FirstName) {
            Some(first_name) => OnboardingStep::AwaitingLastName {
                first_name: first_name.to_string(),
            },
            None => OnboardingStep::Start,
        },
        Some(Prompt::ProjectId) => {
            match (answer_to(history, Prompt::FirstName), answer_to(history, Prompt::LastName)) {
                (Some(first_name), Some(last_name)) => OnboardingStep::AwaitingProjectId {
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                },
                _ => OnboardingStep::Start,
            }
        }
        Some(Prompt::TaskDescription) | None => OnboardingStep::Start,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::{SENDER_BOT, SENDER_USER};
    use chrono::Utc;

    /// Builds a newest-first history from an oldest-first script.
    fn history(script: &[(&str, &str, Option<Prompt>)]) -> Vec<BotMessage> {
        let mut messages: Vec<BotMessage> = script
            .iter()
            .enumerate()
            .map(|(i, (sender, text, prompt))| BotMessage {
                id: i as i64 + 1,
                telegram_id: 42,
                chat_id: 42,
                sender: sender.to_string(),
                text: text.to_string(),
                prompt: prompt.map(|p| p.as_str().to_string()),
                created_at: Utc::now(),
            })
            .collect();
        messages.reverse();
        messages
    }

    #[test]
    fn empty_history_starts_over() {
        assert_eq!(infer_step(&[]), OnboardingStep::Start);
    }

    #[test]
    fn walks_through_the_dialogue() {
        let h = history(&[
            (SENDER_USER, "/start", None),
            (SENDER_BOT, "first name?", Some(Prompt::FirstName)),
        ]);
        assert_eq!(infer_step(&h), OnboardingStep::AwaitingFirstName);

        let h = history(&[
            (SENDER_USER, "/start", None),
            (SENDER_BOT, "first name?", Some(Prompt::FirstName)),
            (SENDER_USER, "Grace", None),
            (SENDER_BOT, "last name?", Some(Prompt::LastName)),
        ]);
        assert_eq!(
            infer_step(&h),
            OnboardingStep::AwaitingLastName { first_name: "Grace".into() }
        );

        let h = history(&[
            (SENDER_USER, "/start", None),
            (SENDER_BOT, "first name?", Some(Prompt::FirstName)),
            (SENDER_USER, "Grace", None),
            (SENDER_BOT, "last name?", Some(Prompt::LastName)),
            (SENDER_USER, "Hopper", None),
            (SENDER_BOT, "project?", Some(Prompt::ProjectId)),
        ]);
        assert_eq!(
            infer_step(&h),
            OnboardingStep::AwaitingProjectId {
                first_name: "Grace".into(),
                last_name: "Hopper".into()
            }
        );
    }

    #[test]
    fn reasked_project_keeps_names() {
        let h = history(&[
            (SENDER_BOT, "first name?", Some(Prompt::FirstName)),
            (SENDER_USER, "Grace", None),
            (SENDER_BOT, "last name?", Some(Prompt::LastName)),
            (SENDER_USER, "Hopper", None),
            (SENDER_BOT, "project?", Some(Prompt::ProjectId)),
            (SENDER_USER, "999", None),
            (SENDER_BOT, "no such project, project?", Some(Prompt::ProjectId)),
        ]);
        assert!(matches!(
            infer_step(&h),
            OnboardingStep::AwaitingProjectId { ref first_name, ref last_name }
                if first_name == "Grace" && last_name == "Hopper"
        ));
    }

    #[test]
    fn restarted_dialogue_uses_latest_answers() {
        let h = history(&[
            (SENDER_BOT, "first name?", Some(Prompt::FirstName)),
            (SENDER_USER, "Gracie", None),
            (SENDER_BOT, "last name?", Some(Prompt::LastName)),
            (SENDER_USER, "/start", None),
            (SENDER_BOT, "first name?", Some(Prompt::FirstName)),
            (SENDER_USER, "Grace", None),
            (SENDER_BOT, "last name?", Some(Prompt::LastName)),
        ]);
        assert_eq!(
            infer_step(&h),
            OnboardingStep::AwaitingLastName { first_name: "Grace".into() }
        );
    }

    #[test]
    fn history_cut_short_starts_over() {
        // the first-name exchange fell outside the history window
        let h = history(&[
            (SENDER_USER, "Hopper", None),
            (SENDER_BOT, "project?", Some(Prompt::ProjectId)),
        ]);
        assert_eq!(infer_step(&h), OnboardingStep::Start);
    }

    #[test]
    fn untagged_bot_message_clears_the_prompt() {
        let h = history(&[
            (SENDER_BOT, "describe the task", Some(Prompt::TaskDescription)),
            (SENDER_USER, "My Tasks", None),
            (SENDER_BOT, "no tasks", None),
        ]);
        assert_eq!(pending_prompt(&h), None);
    }
}
