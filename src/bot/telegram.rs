//! Long-polling transport between Telegram and [`Conversation`].

use std::sync::Arc;

use log::{error, info, warn};
use teloxide::prelude::*;
use teloxide::types::{ChatId, KeyboardButton, KeyboardMarkup, KeyboardRemove, ReplyMarkup};

use super::conversation::{Conversation, Incoming, Keyboard, Reply};

pub struct TelegramBot {
    bot: Bot,
    conversation: Arc<Conversation>,
}

impl TelegramBot {
    pub fn new(token: &str, conversation: Conversation) -> Self {
        TelegramBot {
            bot: Bot::new(token),
            conversation: Arc::new(conversation),
        }
    }

    /// Runs until the dispatcher stops.
    pub async fn start_polling(self) {
        info!("Starting Telegram bot in polling mode...");

        let handler = Update::filter_message().endpoint(handle_message);

        Dispatcher::builder(self.bot, handler)
            .dependencies(dptree::deps![self.conversation])
            .default_handler(|upd| async move {
                warn!("Unhandled update: {:?}", upd);
            })
            .build()
            .dispatch()
            .await;

        info!("Telegram bot stopped");
    }
}

async fn handle_message(
    bot: Bot,
    msg: Message,
    conversation: Arc<Conversation>,
) -> ResponseResult<()> {
    let (Some(text), Some(from)) = (msg.text(), msg.from.as_ref()) else {
        return Ok(());
    };

    let incoming = Incoming {
        telegram_id: from.id.0 as i64,
        chat_id: msg.chat.id.0,
        text: text.to_string(),
    };

    let reply = match conversation.handle(incoming).await {
        Ok(reply) => reply,
        Err(e) => {
            error!("Dropping message from chat {}: {}", msg.chat.id, e);
            return Ok(());
        }
    };

    send_reply(&bot, msg.chat.id, &reply).await?;

    for notification in &reply.notifications {
        if let Err(e) = bot
            .send_message(ChatId(notification.chat_id), &notification.text)
            .await
        {
            warn!("Failed to notify chat {}: {}", notification.chat_id, e);
        }
    }
    Ok(())
}

async fn send_reply(bot: &Bot, chat_id: ChatId, reply: &Reply) -> ResponseResult<()> {
    let mut request = bot.send_message(chat_id, &reply.text);
    if let Some(markup) = reply_markup(&reply.keyboard) {
        request = request.reply_markup(markup);
    }
    request.await?;
    Ok(())
}

fn reply_markup(keyboard: &Keyboard) -> Option<ReplyMarkup> {
    match keyboard {
        Keyboard::Unchanged => None,
        Keyboard::Remove => Some(ReplyMarkup::KeyboardRemove(KeyboardRemove::new())),
        Keyboard::Menu(rows) => Some(ReplyMarkup::Keyboard(KeyboardMarkup::new(
            rows.iter()
                .map(|row| row.iter().map(|label| KeyboardButton::new(label.clone()))),
        ))),
    }
}
