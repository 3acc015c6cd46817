use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

use crate::error::{SendError, StoreError};
use crate::messenger::Messenger;
use crate::store::{ChatStore, ScheduleStore};
use crate::texts::{render, TextProvider};
use crate::trigger;
use crate::types::{Chat, CongregationConfig, Prayer, PrayerDay, ReminderBundle, ReminderKind};

enum Payload {
    Text(String),
    Poll { question: String, options: Vec<String> },
}

/// Processes one chat per scheduling tick: evaluates the three reminder kinds
/// in priority order and delivers whichever are due.
#[derive(Clone)]
pub struct Dispatcher {
    messenger: Arc<dyn Messenger>,
    chats: Arc<dyn ChatStore>,
    schedule: Arc<dyn ScheduleStore>,
    texts: Arc<dyn TextProvider>,
}

impl Dispatcher {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        chats: Arc<dyn ChatStore>,
        schedule: Arc<dyn ScheduleStore>,
        texts: Arc<dyn TextProvider>,
    ) -> Self {
        Self {
            messenger,
            chats,
            schedule,
            texts,
        }
    }

    pub async fn process(
        &self,
        chat: &Chat,
        day: &PrayerDay,
        now: DateTime<Tz>,
    ) -> Result<(), StoreError> {
        // Local copies: `now` advances a minute per delivery, and the bundle
        // tracks watermarks already persisted during this tick.
        let mut now = now;
        let mut bundle = chat.reminders.clone();

        // DayPreview before Upcoming before Arrived. Arrived last, so a
        // just-started prayer is never also announced as upcoming afterwards.
        for kind in ReminderKind::ALL {
            let state = bundle.state(kind);
            let payload = match kind {
                ReminderKind::DayPreview => trigger::day_preview_due(now, state)
                    .then(|| self.day_preview_payload(day)),
                ReminderKind::Upcoming => trigger::upcoming_due(now, day, state)
                    .map(|(p, at)| self.upcoming_payload(p, at, now, &bundle.congregation)),
                ReminderKind::Arrived => trigger::arrived_due(now, day, state)
                    .map(|(p, at)| self.arrived_payload(p, at, &bundle.congregation)),
            };
            let Some(payload) = payload else { continue };

            self.delete_previous(chat.id, kind, &bundle).await;

            let sent = match &payload {
                Payload::Text(text) => self.messenger.send(chat.id, text).await,
                Payload::Poll { question, options } => {
                    self.messenger.send_poll(chat.id, question, options).await
                }
            };

            match sent {
                Ok(message_id) => {
                    // Advance a minute before persisting the watermark, so
                    // this exact wall-clock instant cannot qualify again.
                    now = now + Duration::minutes(1);
                    let fired_at = now.with_timezone(&Utc);
                    self.chats
                        .update_reminder_state(chat.id, kind, Some(message_id), fired_at)
                        .await?;
                    let state = bundle.state_mut(kind);
                    state.last_fired_at = fired_at;
                    state.last_message_id = Some(message_id);
                    log::info!("chat {}: sent {} reminder", chat.id, kind.name());
                }
                Err(SendError::Blocked) => {
                    log::info!("chat {} is unreachable, removing it", chat.id);
                    self.chats.delete_chat(chat.id).await?;
                    return Ok(());
                }
                Err(SendError::Transient(e)) => {
                    // State untouched: the same reminder stays due next tick.
                    log::error!("chat {}: failed to send {}: {}", chat.id, kind.name(), e);
                }
            }
        }
        Ok(())
    }

    /// Remove the previous delivery of this kind; Arrived also supersedes the
    /// companion Upcoming message. Failures are logged, never fatal.
    async fn delete_previous(&self, chat_id: i64, kind: ReminderKind, bundle: &ReminderBundle) {
        let mut stale = Vec::new();
        if let Some(id) = bundle.state(kind).last_message_id {
            stale.push(id);
        }
        if kind == ReminderKind::Arrived {
            if let Some(id) = bundle.upcoming.last_message_id {
                stale.push(id);
            }
        }
        for message_id in stale {
            if let Err(e) = self.messenger.delete(chat_id, message_id).await {
                log::warn!("chat {}: could not delete message {}: {}", chat_id, message_id, e);
            }
        }
    }

    /// Tomorrow's timetable when it is already known, otherwise today's.
    fn day_preview_payload(&self, day: &PrayerDay) -> Payload {
        let preview = day
            .date
            .succ_opt()
            .and_then(|d| self.schedule.prayer_day(d).ok())
            .unwrap_or_else(|| day.clone());
        let text = render(
            &self.texts.get("day_preview"),
            &[
                ("date", preview.date.to_string()),
                ("dawn", preview.dawn.format("%H:%M").to_string()),
                ("sunrise", preview.sunrise.format("%H:%M").to_string()),
                ("midday", preview.midday.format("%H:%M").to_string()),
                ("afternoon", preview.afternoon.format("%H:%M").to_string()),
                ("sunset", preview.sunset.format("%H:%M").to_string()),
                ("night", preview.night.format("%H:%M").to_string()),
            ],
        );
        Payload::Text(text)
    }

    fn upcoming_payload(
        &self,
        prayer: Prayer,
        at: DateTime<Tz>,
        now: DateTime<Tz>,
        congregation: &CongregationConfig,
    ) -> Payload {
        if let Some(delay) = congregation.delay_for(prayer) {
            let question = render(
                &self.texts.get("congregation_question"),
                &[
                    ("prayer", prayer.name().to_string()),
                    ("time", at.format("%H:%M").to_string()),
                ],
            );
            let options = vec![
                self.texts.get("congregation_now"),
                render(
                    &self.texts.get("congregation_later"),
                    &[("delay", delay.to_string())],
                ),
            ];
            return Payload::Poll { question, options };
        }

        let minutes = (at - now).num_minutes().max(0);
        Payload::Text(render(
            &self.texts.get("upcoming"),
            &[
                ("prayer", prayer.name().to_string()),
                ("time", at.format("%H:%M").to_string()),
                ("minutes", minutes.to_string()),
            ],
        ))
    }

    fn arrived_payload(
        &self,
        prayer: Prayer,
        at: DateTime<Tz>,
        congregation: &CongregationConfig,
    ) -> Payload {
        let mut text = render(
            &self.texts.get("arrived"),
            &[
                ("prayer", prayer.name().to_string()),
                ("time", at.format("%H:%M").to_string()),
            ],
        );
        if let Some(delay) = congregation.delay_for(prayer) {
            text.push('\n');
            text.push_str(&render(
                &self.texts.get("arrived_congregation"),
                &[("delay", delay.to_string())],
            ));
        }
        Payload::Text(text)
    }
}
