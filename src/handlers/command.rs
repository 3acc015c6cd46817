use std::error::Error;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::commands::Command;
use crate::state::TenantState;
use crate::types::Chat;

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<TenantState>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    match cmd {
        Command::Start => {
            let chat = get_or_create(&state, msg.chat.id.0).await?;
            state.chats.upsert_chat(chat).await?;
            bot.send_message(
                msg.chat.id,
                "
                \n 🕌 Use /subscribe to receive prayer reminders: a daily timetable preview, a heads-up before each prayer, and a notice when it begins.
                \n 🕐 Use /times to see today's prayer times.
                \n 🤲 Use /jamaah to turn congregation mode on or off: the heads-up becomes a join-now/join-later poll.
                \n 🔕 Use /unsubscribe to stop receiving reminders.
                \n ❓ Use /help for additional guidance.
                ",
            )
            .await?;
        }
        Command::Subscribe => {
            let mut chat = get_or_create(&state, msg.chat.id.0).await?;
            chat.subscribed = true;
            state.chats.upsert_chat(chat).await?;
            bot.send_message(
                msg.chat.id,
                "✅ You've subscribed to prayer reminders. Use /unsubscribe anytime to stop receiving them.",
            )
            .await?;
        }
        Command::Unsubscribe => {
            if let Some(mut chat) = state.chats.get_chat(msg.chat.id.0).await? {
                chat.subscribed = false;
                state.chats.upsert_chat(chat).await?;
            }
            bot.send_message(
                msg.chat.id,
                "✅ You've unsubscribed. Use /subscribe anytime to start receiving reminders again.",
            )
            .await?;
        }
        Command::Times => {
            let now = state.clock.now(state.tz);
            match state.schedule.prayer_day(now.date_naive()) {
                Ok(day) => {
                    let lines = day
                        .instants()
                        .iter()
                        .map(|(prayer, at)| format!("{}: {}", prayer.name(), at.format("%H:%M")))
                        .collect::<Vec<_>>()
                        .join("\n");
                    bot.send_message(
                        msg.chat.id,
                        format!("🕌 Prayer times for {}:\n\n{}", day.date, lines),
                    )
                    .await?;
                }
                Err(e) => {
                    log::warn!("{}: /times failed: {}", state.name, e);
                    bot.send_message(msg.chat.id, "No timetable is available for today yet.")
                        .await?;
                }
            }
        }
        Command::Jamaah => {
            let mut chat = get_or_create(&state, msg.chat.id.0).await?;
            chat.reminders.congregation.enabled = !chat.reminders.congregation.enabled;
            let enabled = chat.reminders.congregation.enabled;
            state.chats.upsert_chat(chat).await?;
            let reply = if enabled {
                "🤲 Congregation mode is on: before each prayer you'll get a join-now/join-later poll."
            } else {
                "Congregation mode is off: you'll get plain reminders."
            };
            bot.send_message(msg.chat.id, reply).await?;
        }
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
    }
    Ok(())
}

// Chats are created on first interaction, with the tenant's default offsets.
async fn get_or_create(
    state: &TenantState,
    chat_id: i64,
) -> Result<Chat, crate::error::StoreError> {
    Ok(state.chats.get_chat(chat_id).await?.unwrap_or_else(|| {
        Chat::new(chat_id, state.day_preview_offset, state.upcoming_offset)
    }))
}
