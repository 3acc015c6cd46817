use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use crate::types::Prayer;

/// The three reminder kinds a chat can receive, in dispatch priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReminderKind {
    DayPreview,
    Upcoming,
    Arrived,
}

impl ReminderKind {
    pub const ALL: [ReminderKind; 3] = [
        ReminderKind::DayPreview,
        ReminderKind::Upcoming,
        ReminderKind::Arrived,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ReminderKind::DayPreview => "day_preview",
            ReminderKind::Upcoming => "upcoming",
            ReminderKind::Arrived => "arrived",
        }
    }
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Per-chat, per-kind reminder record. `last_fired_at` is the idempotence
/// watermark; `last_message_id` points at the previous delivery so it can be
/// deleted before the next one goes out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderState {
    pub offset_minutes: i64,
    #[serde(with = "chrono::serde::ts_seconds", default = "epoch")]
    pub last_fired_at: DateTime<Utc>,
    pub last_message_id: Option<i32>,
}

impl ReminderState {
    pub fn new(offset_minutes: i64) -> Self {
        Self {
            offset_minutes,
            last_fired_at: epoch(),
            last_message_id: None,
        }
    }

    pub fn offset(&self) -> Duration {
        Duration::minutes(self.offset_minutes)
    }
}

/// Congregational (jamaah) mode: when enabled, the Upcoming reminder becomes a
/// join-now/join-later poll with a configured delay per prayer. Sunrise has no
/// congregation, so it never appears in the map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CongregationConfig {
    pub enabled: bool,
    pub delay_minutes: HashMap<Prayer, i64>,
}

impl Default for CongregationConfig {
    fn default() -> Self {
        let mut delay_minutes = HashMap::new();
        delay_minutes.insert(Prayer::Dawn, 20);
        delay_minutes.insert(Prayer::Midday, 15);
        delay_minutes.insert(Prayer::Afternoon, 15);
        delay_minutes.insert(Prayer::Sunset, 10);
        delay_minutes.insert(Prayer::Night, 15);
        Self {
            enabled: false,
            delay_minutes,
        }
    }
}

impl CongregationConfig {
    pub fn delay_for(&self, prayer: Prayer) -> Option<i64> {
        if !self.enabled || prayer == Prayer::Sunrise {
            return None;
        }
        self.delay_minutes.get(&prayer).copied()
    }
}

/// The reminder configuration bundle attached to each chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderBundle {
    pub day_preview: ReminderState,
    pub upcoming: ReminderState,
    pub arrived: ReminderState,
    #[serde(default)]
    pub congregation: CongregationConfig,
}

impl ReminderBundle {
    pub fn new(day_preview_offset: i64, upcoming_offset: i64) -> Self {
        Self {
            day_preview: ReminderState::new(day_preview_offset),
            upcoming: ReminderState::new(upcoming_offset),
            arrived: ReminderState::new(0),
            congregation: CongregationConfig::default(),
        }
    }

    pub fn state(&self, kind: ReminderKind) -> &ReminderState {
        match kind {
            ReminderKind::DayPreview => &self.day_preview,
            ReminderKind::Upcoming => &self.upcoming,
            ReminderKind::Arrived => &self.arrived,
        }
    }

    pub fn state_mut(&mut self, kind: ReminderKind) -> &mut ReminderState {
        match kind {
            ReminderKind::DayPreview => &mut self.day_preview,
            ReminderKind::Upcoming => &mut self.upcoming,
            ReminderKind::Arrived => &mut self.arrived,
        }
    }
}
