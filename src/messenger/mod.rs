use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use teloxide::{ApiError, RequestError};

use crate::error::SendError;

/// Messaging transport for one tenant. Message ids are the transport's own
/// handles, kept opaque to the engine beyond equality.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, chat_id: i64, text: &str) -> Result<i32, SendError>;
    async fn send_poll(
        &self,
        chat_id: i64,
        question: &str,
        options: &[String],
    ) -> Result<i32, SendError>;
    /// Best-effort: callers log and move on when this fails.
    async fn delete(&self, chat_id: i64, message_id: i32) -> Result<(), SendError>;
}

pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn classify(err: RequestError) -> SendError {
    match err {
        RequestError::Api(ApiError::BotBlocked)
        | RequestError::Api(ApiError::ChatNotFound)
        | RequestError::Api(ApiError::UserDeactivated)
        | RequestError::Api(ApiError::CantInitiateConversation)
        | RequestError::Api(ApiError::BotKicked)
        | RequestError::Api(ApiError::BotKickedFromSupergroup) => SendError::Blocked,
        other => SendError::Transient(other.to_string()),
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send(&self, chat_id: i64, text: &str) -> Result<i32, SendError> {
        let message = self
            .bot
            .send_message(ChatId(chat_id), text)
            .await
            .map_err(classify)?;
        Ok(message.id.0)
    }

    async fn send_poll(
        &self,
        chat_id: i64,
        question: &str,
        options: &[String],
    ) -> Result<i32, SendError> {
        let message = self
            .bot
            .send_poll(ChatId(chat_id), question, options.to_vec())
            .is_anonymous(false)
            .await
            .map_err(classify)?;
        Ok(message.id.0)
    }

    async fn delete(&self, chat_id: i64, message_id: i32) -> Result<(), SendError> {
        self.bot
            .delete_message(ChatId(chat_id), MessageId(message_id))
            .await
            .map_err(classify)?;
        Ok(())
    }
}
