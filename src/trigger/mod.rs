use chrono::{DateTime, Duration, NaiveTime};
use chrono_tz::Tz;

use crate::types::{zoned, Prayer, PrayerDay, ReminderKind, ReminderState};

/// Outcome of one trigger evaluation. DayPreview carries no prayer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    NotDue,
    Due { prayer: Option<Prayer> },
}

/// Pure trigger logic: no I/O, no state mutation. A kind is due when its
/// trigger instant has passed the watermark but not `now`, that is
/// `last_fired_at < trigger <= now`. Equality with `now` counts.
pub fn evaluate(
    kind: ReminderKind,
    now: DateTime<Tz>,
    day: &PrayerDay,
    state: &ReminderState,
) -> Decision {
    let due = match kind {
        ReminderKind::DayPreview => day_preview_due(now, state).then_some(None),
        ReminderKind::Upcoming => upcoming_due(now, day, state).map(|(p, _)| Some(p)),
        ReminderKind::Arrived => arrived_due(now, day, state).map(|(p, _)| Some(p)),
    };
    match due {
        Some(prayer) => Decision::Due { prayer },
        None => Decision::NotDue,
    }
}

/// DayPreview recurs once per day, computed from the watermark alone: the
/// anchor is the midnight following the last delivery plus 24 hours, and the
/// notice goes out `offset` before it. With a 3h offset that lands at 21:00
/// every evening. There is no lower bound against the watermark here; the
/// anchor itself moves forward with each delivery.
pub fn day_preview_due(now: DateTime<Tz>, state: &ReminderState) -> bool {
    let tz = now.timezone();
    let last_local = state.last_fired_at.with_timezone(&tz);
    let Some(next_day) = last_local.date_naive().succ_opt() else {
        return false;
    };
    let midnight = zoned(tz, next_day, NaiveTime::MIN);
    let trigger = midnight + Duration::hours(24) - state.offset();
    trigger <= now
}

/// Scans today's six instants plus the lookahead two in chronological order
/// and returns the earliest qualifying prayer with its instant, so a backlog
/// of missed windows advances one step per evaluation at most.
pub fn upcoming_due(
    now: DateTime<Tz>,
    day: &PrayerDay,
    state: &ReminderState,
) -> Option<(Prayer, DateTime<Tz>)> {
    let last = state.last_fired_at.with_timezone(&now.timezone());
    for (prayer, at) in day.upcoming_windows() {
        let trigger = at - state.offset();
        if last < trigger && trigger <= now {
            return Some((prayer, at));
        }
    }
    None
}

/// Arrived fires at the prayer instant itself; the configured offset does not
/// apply to it. Earliest qualifying instant only, like Upcoming.
pub fn arrived_due(
    now: DateTime<Tz>,
    day: &PrayerDay,
    state: &ReminderState,
) -> Option<(Prayer, DateTime<Tz>)> {
    let last = state.last_fired_at.with_timezone(&now.timezone());
    for (prayer, at) in day.instants() {
        if last < at && at <= now {
            return Some((prayer, at));
        }
    }
    None
}
