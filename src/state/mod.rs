use chrono::Weekday;
use chrono_tz::Tz;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use teloxide::Bot;

use crate::clock::{Clock, SystemClock};
use crate::config::TenantConfig;
use crate::dispatch::Dispatcher;
use crate::error::StoreError;
use crate::messenger::{Messenger, TelegramMessenger};
use crate::store::{ChatStore, CsvScheduleStore, JsonChatStore, ScheduleStore};
use crate::texts::{CsvTexts, TextProvider};

#[derive(Debug, Clone, Copy)]
pub struct WeeklyEvent {
    pub weekday: Weekday,
    pub hour: u32,
}

/// Everything one tenant needs at runtime. All collaborators are constructed
/// eagerly at startup, so a tenant either starts whole or not at all.
pub struct TenantState {
    pub name: String,
    pub tz: Tz,
    pub tick: std::time::Duration,
    pub day_preview_offset: i64,
    pub upcoming_offset: i64,
    pub continuous_offset: i64,
    pub weekly: Option<WeeklyEvent>,
    pub clock: Arc<dyn Clock>,
    pub schedule: Arc<dyn ScheduleStore>,
    pub chats: Arc<dyn ChatStore>,
    pub texts: Arc<dyn TextProvider>,
    pub messenger: Arc<dyn Messenger>,
    pub dispatcher: Dispatcher,
}

impl TenantState {
    pub async fn build(cfg: &TenantConfig) -> Result<(Arc<Self>, Bot), StoreError> {
        let tz: Tz = cfg
            .timezone
            .parse()
            .map_err(|e| StoreError::Invalid(format!("timezone '{}': {}", cfg.timezone, e)))?;

        let token = std::env::var(&cfg.token_env)
            .map_err(|_| StoreError::Invalid(format!("missing env var {}", cfg.token_env)))?;
        let bot = Bot::new(token);

        let weekly = cfg
            .weekly
            .as_ref()
            .map(|w| -> Result<WeeklyEvent, StoreError> {
                let weekday: Weekday = w
                    .weekday
                    .parse()
                    .map_err(|_| StoreError::Invalid(format!("weekday '{}'", w.weekday)))?;
                if w.hour > 23 {
                    return Err(StoreError::Invalid(format!("weekly hour {}", w.hour)));
                }
                Ok(WeeklyEvent {
                    weekday,
                    hour: w.hour,
                })
            })
            .transpose()?;

        let schedule: Arc<dyn ScheduleStore> =
            Arc::new(CsvScheduleStore::load(Path::new(&cfg.timetable), tz)?);
        let chats: Arc<dyn ChatStore> =
            Arc::new(JsonChatStore::load(PathBuf::from(&cfg.chats)).await?);
        let texts: Arc<dyn TextProvider> = Arc::new(CsvTexts::load(Path::new(&cfg.texts))?);
        let messenger: Arc<dyn Messenger> = Arc::new(TelegramMessenger::new(bot.clone()));
        let dispatcher = Dispatcher::new(
            messenger.clone(),
            chats.clone(),
            schedule.clone(),
            texts.clone(),
        );

        let state = Arc::new(TenantState {
            name: cfg.name.clone(),
            tz,
            tick: std::time::Duration::from_secs(cfg.tick_secs),
            day_preview_offset: cfg.day_preview_offset_minutes,
            upcoming_offset: cfg.upcoming_offset_minutes,
            continuous_offset: cfg.continuous_offset_minutes,
            weekly,
            clock: Arc::new(SystemClock),
            schedule,
            chats,
            texts,
            messenger,
            dispatcher,
        });
        Ok((state, bot))
    }
}
