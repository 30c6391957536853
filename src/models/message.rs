use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::to_column_precision;

pub const SENDER_USER: &str = "user";
pub const SENDER_BOT: &str = "bot";

/// One line of a Telegram conversation, kept so the bot can tell where a
/// user is in a multi-message exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct BotMessage {
    pub id: i64,
    pub telegram_id: i64,
    pub chat_id: i64,
    pub sender: String,
    pub text: String,
    pub prompt: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BotMessage {
    pub fn from_new(id: i64, created_at: DateTime<Utc>, new: NewMessage) -> Self {
        BotMessage {
            id,
            telegram_id: new.telegram_id,
            chat_id: new.chat_id,
            sender: new.sender.to_string(),
            text: new.text,
            prompt: new.prompt,
            created_at: to_column_precision(created_at),
        }
    }

    pub fn is_from_bot(&self) -> bool {
        self.sender == SENDER_BOT
    }
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub telegram_id: i64,
    pub chat_id: i64,
    pub sender: &'static str,
    pub text: String,
    pub prompt: Option<String>,
}
