use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::types::{zoned, Chat, PrayerDay, ReminderKind};

/// Persistent chat storage for one tenant.
#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn get_chat(&self, chat_id: i64) -> Result<Option<Chat>, StoreError>;
    async fn upsert_chat(&self, chat: Chat) -> Result<(), StoreError>;
    async fn subscribed_chats(&self) -> Result<Vec<Chat>, StoreError>;
    /// Advance one kind's watermark and remember the delivered message id.
    /// The watermark is monotonic: an earlier `fired_at` is ignored.
    async fn update_reminder_state(
        &self,
        chat_id: i64,
        kind: ReminderKind,
        last_message_id: Option<i32>,
        fired_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
    async fn delete_chat(&self, chat_id: i64) -> Result<(), StoreError>;
}

/// Prayer timetable lookup for one tenant.
pub trait ScheduleStore: Send + Sync {
    fn prayer_day(&self, date: NaiveDate) -> Result<PrayerDay, StoreError>;
}

/// Chat store backed by a JSON file, one per tenant.
pub struct JsonChatStore {
    path: PathBuf,
    chats: Mutex<HashMap<i64, Chat>>,
}

impl JsonChatStore {
    pub async fn load(path: PathBuf) -> Result<Self, StoreError> {
        let chats = if !path.exists() {
            log::info!("creating new chat file {}", path.display());
            let empty: HashMap<i64, Chat> = HashMap::new();
            let json = serde_json::to_string_pretty(&empty)?;
            let mut file = File::create(&path).await?;
            file.write_all(json.as_bytes()).await?;
            empty
        } else {
            let json = fs::read_to_string(&path)?;
            serde_json::from_str(&json)?
        };
        Ok(Self {
            path,
            chats: Mutex::new(chats),
        })
    }

    async fn persist(&self, chats: &HashMap<i64, Chat>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(chats)?;

        // Write to a temporary file first, then rename over the real one.
        let temp_path = self.path.with_extension("tmp.json");
        let mut temp_file = File::create(&temp_path).await?;
        temp_file.write_all(json.as_bytes()).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        Ok(())
    }
}

#[async_trait]
impl ChatStore for JsonChatStore {
    async fn get_chat(&self, chat_id: i64) -> Result<Option<Chat>, StoreError> {
        let chats = self.chats.lock().await;
        Ok(chats.get(&chat_id).cloned())
    }

    async fn upsert_chat(&self, chat: Chat) -> Result<(), StoreError> {
        let mut chats = self.chats.lock().await;
        chats.insert(chat.id, chat);
        self.persist(&chats).await
    }

    async fn subscribed_chats(&self) -> Result<Vec<Chat>, StoreError> {
        let chats = self.chats.lock().await;
        Ok(chats.values().filter(|c| c.subscribed).cloned().collect())
    }

    async fn update_reminder_state(
        &self,
        chat_id: i64,
        kind: ReminderKind,
        last_message_id: Option<i32>,
        fired_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut chats = self.chats.lock().await;
        let chat = chats
            .get_mut(&chat_id)
            .ok_or_else(|| StoreError::NotFound(format!("chat {}", chat_id)))?;

        let state = chat.reminders.state_mut(kind);
        if fired_at < state.last_fired_at {
            log::warn!(
                "chat {}: ignoring {} watermark rewind ({} < {})",
                chat_id,
                kind.name(),
                fired_at,
                state.last_fired_at
            );
            return Ok(());
        }
        state.last_fired_at = fired_at;
        state.last_message_id = last_message_id;

        self.persist(&chats).await
    }

    async fn delete_chat(&self, chat_id: i64) -> Result<(), StoreError> {
        let mut chats = self.chats.lock().await;
        chats.remove(&chat_id);
        self.persist(&chats).await
    }
}

#[derive(Debug, Deserialize)]
struct TimetableRow {
    date: NaiveDate,
    dawn: String,
    sunrise: String,
    midday: String,
    afternoon: String,
    sunset: String,
    night: String,
}

/// Timetable CSVs carry HH:MM columns; seconds are accepted too.
fn parse_time(value: &str) -> Result<NaiveTime, StoreError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|e| StoreError::Invalid(format!("time '{}': {}", value, e)))
}

/// Schedule store loaded once from a timetable CSV, one per tenant.
pub struct CsvScheduleStore {
    tz: Tz,
    days: HashMap<NaiveDate, [NaiveTime; 6]>,
}

impl CsvScheduleStore {
    pub fn load(path: &Path, tz: Tz) -> Result<Self, StoreError> {
        let mut days = HashMap::new();
        let mut rdr = csv::Reader::from_path(path)?;

        for result in rdr.deserialize() {
            let row: TimetableRow = result?;
            let times = [
                parse_time(&row.dawn)?,
                parse_time(&row.sunrise)?,
                parse_time(&row.midday)?,
                parse_time(&row.afternoon)?,
                parse_time(&row.sunset)?,
                parse_time(&row.night)?,
            ];
            days.insert(row.date, times);
        }
        Ok(Self { tz, days })
    }
}

impl ScheduleStore for CsvScheduleStore {
    fn prayer_day(&self, date: NaiveDate) -> Result<PrayerDay, StoreError> {
        let times = self
            .days
            .get(&date)
            .ok_or_else(|| StoreError::NotFound(format!("timetable for {}", date)))?;

        let tomorrow = date.succ_opt().and_then(|d| self.days.get(&d).map(|t| (d, t)));

        Ok(PrayerDay {
            date,
            dawn: zoned(self.tz, date, times[0]),
            sunrise: zoned(self.tz, date, times[1]),
            midday: zoned(self.tz, date, times[2]),
            afternoon: zoned(self.tz, date, times[3]),
            sunset: zoned(self.tz, date, times[4]),
            night: zoned(self.tz, date, times[5]),
            next_dawn: tomorrow.map(|(d, t)| zoned(self.tz, d, t[0])),
            next_sunrise: tomorrow.map(|(d, t)| zoned(self.tz, d, t[1])),
        })
    }
}
