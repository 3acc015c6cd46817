use chrono::{DateTime, Duration, NaiveTime, Weekday};
use chrono_tz::Tz;
use chrono::Datelike;
use std::sync::Arc;
use tokio::sync::watch;

use super::sleep_or_shutdown;
use crate::error::{SendError, StoreError};
use crate::state::TenantState;
use crate::store::ScheduleStore;
use crate::texts::render;
use crate::types::{zoned, Prayer};

const LOOKUP_BACKOFF: std::time::Duration = std::time::Duration::from_secs(60);

/// The nearest prayer strictly after `now`: the rest of today's instants,
/// then tomorrow's dawn.
pub fn next_prayer(
    schedule: &dyn ScheduleStore,
    now: DateTime<Tz>,
) -> Result<(Prayer, DateTime<Tz>), StoreError> {
    let today = schedule.prayer_day(now.date_naive())?;
    for (prayer, at) in today.instants() {
        if at > now {
            return Ok((prayer, at));
        }
    }
    let date = now
        .date_naive()
        .succ_opt()
        .ok_or_else(|| StoreError::Invalid("calendar overflow".into()))?;
    let tomorrow = schedule.prayer_day(date)?;
    Ok((Prayer::Dawn, tomorrow.dawn))
}

/// The next occurrence of `weekday` at `hour`:00 strictly after `now`.
pub fn next_weekly_instant(now: DateTime<Tz>, weekday: Weekday, hour: u32) -> DateTime<Tz> {
    let tz = now.timezone();
    let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
    let mut date = now.date_naive();
    for _ in 0..8 {
        if date.weekday() == weekday {
            let at = zoned(tz, date, time);
            if at > now {
                return at;
            }
        }
        date = match date.succ_opt() {
            Some(d) => d,
            None => return now,
        };
    }
    now
}

/// Tenant-wide broadcast loop: sleep until `prayer - offset`, announce the
/// upcoming prayer, sleep the rest, announce the start, recompute. Targets
/// are recomputed fresh after every wake.
pub async fn run_prayer_loop(state: Arc<TenantState>, mut shutdown: watch::Receiver<bool>) {
    let offset = Duration::minutes(state.continuous_offset);
    log::info!("{}: continuous prayer loop started", state.name);

    loop {
        let now = state.clock.now(state.tz);
        let (prayer, at) = match next_prayer(state.schedule.as_ref(), now) {
            Ok(found) => found,
            Err(e) => {
                log::warn!("{}: next prayer lookup failed: {}", state.name, e);
                if sleep_or_shutdown(LOOKUP_BACKOFF, &mut shutdown).await {
                    break;
                }
                continue;
            }
        };

        let remaining = at - now;
        let upcoming_wait = (remaining - offset).max(Duration::zero());
        let starts_wait = remaining.min(offset);

        if upcoming_wait > Duration::zero() {
            if sleep_or_shutdown(upcoming_wait.to_std().unwrap_or_default(), &mut shutdown).await {
                break;
            }
        }
        let minutes = (at - state.clock.now(state.tz)).num_minutes().max(0);
        let text = render(
            &state.texts.get("upcoming"),
            &[
                ("prayer", prayer.name().to_string()),
                ("time", at.format("%H:%M").to_string()),
                ("minutes", minutes.to_string()),
            ],
        );
        broadcast(&state, &text).await;

        if sleep_or_shutdown(starts_wait.to_std().unwrap_or_default(), &mut shutdown).await {
            break;
        }
        let text = render(
            &state.texts.get("arrived"),
            &[
                ("prayer", prayer.name().to_string()),
                ("time", at.format("%H:%M").to_string()),
            ],
        );
        broadcast(&state, &text).await;
    }
    log::info!("{}: continuous prayer loop shutting down", state.name);
}

/// Weekly congregational announcement: sleep until the configured weekday and
/// hour, broadcast that day's midday time, repeat.
pub async fn run_weekly_loop(state: Arc<TenantState>, mut shutdown: watch::Receiver<bool>) {
    let Some(weekly) = state.weekly else { return };
    log::info!("{}: weekly loop started ({:?} at {}:00)", state.name, weekly.weekday, weekly.hour);

    loop {
        let now = state.clock.now(state.tz);
        let at = next_weekly_instant(now, weekly.weekday, weekly.hour);
        if sleep_or_shutdown((at - now).to_std().unwrap_or_default(), &mut shutdown).await {
            break;
        }

        match state.schedule.prayer_day(at.date_naive()) {
            Ok(day) => {
                let text = render(
                    &state.texts.get("weekly"),
                    &[("time", day.midday.format("%H:%M").to_string())],
                );
                broadcast(&state, &text).await;
            }
            // target advances to next week on its own after the missed slot
            Err(e) => log::warn!("{}: weekly broadcast skipped: {}", state.name, e),
        }
    }
    log::info!("{}: weekly loop shutting down", state.name);
}

async fn broadcast(state: &TenantState, text: &str) {
    let chats = match state.chats.subscribed_chats().await {
        Ok(chats) => chats,
        Err(e) => {
            log::error!("{}: could not load chats for broadcast: {}", state.name, e);
            return;
        }
    };

    for chat in chats {
        match state.messenger.send(chat.id, text).await {
            Ok(_) => {}
            Err(SendError::Blocked) => {
                log::info!("chat {} is unreachable, removing it", chat.id);
                if let Err(e) = state.chats.delete_chat(chat.id).await {
                    log::error!("chat {}: removal failed: {}", chat.id, e);
                }
            }
            Err(SendError::Transient(e)) => {
                log::error!("chat {}: broadcast failed: {}", chat.id, e);
            }
        }
    }
}
