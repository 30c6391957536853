pub mod commands;
pub mod conversation;
pub mod format;
pub mod onboarding;
pub mod telegram;

pub use conversation::{Conversation, Incoming, Keyboard, Notification, Reply};
pub use telegram::TelegramBot;
