use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

mod reminder;
pub use reminder::*;

/// The six daily prayers in chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Prayer {
    Dawn,
    Sunrise,
    Midday,
    Afternoon,
    Sunset,
    Night,
}

impl Prayer {
    pub const ALL: [Prayer; 6] = [
        Prayer::Dawn,
        Prayer::Sunrise,
        Prayer::Midday,
        Prayer::Afternoon,
        Prayer::Sunset,
        Prayer::Night,
    ];

    /// User-facing name used in message templates.
    pub fn name(&self) -> &'static str {
        match self {
            Prayer::Dawn => "Fajr",
            Prayer::Sunrise => "Sunrise",
            Prayer::Midday => "Dhuhr",
            Prayer::Afternoon => "Asr",
            Prayer::Sunset => "Maghrib",
            Prayer::Night => "Isha",
        }
    }
}

/// Resolve a local date+time in `tz`, handling DST gaps and overlaps.
pub fn zoned(tz: Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Tz> {
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(dt, _) => dt,
        // the wall-clock time falls inside a DST gap; shift forward an hour
        LocalResult::None => match tz.from_local_datetime(&(naive + Duration::hours(1))) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt,
            LocalResult::None => Utc.from_utc_datetime(&naive).with_timezone(&tz),
        },
    }
}

/// One day's prayer timetable, resolved to zoned instants. Immutable once
/// built; `next_dawn`/`next_sunrise` carry the following day's first two
/// instants for the Upcoming lookahead window.
#[derive(Debug, Clone)]
pub struct PrayerDay {
    pub date: NaiveDate,
    pub dawn: DateTime<Tz>,
    pub sunrise: DateTime<Tz>,
    pub midday: DateTime<Tz>,
    pub afternoon: DateTime<Tz>,
    pub sunset: DateTime<Tz>,
    pub night: DateTime<Tz>,
    pub next_dawn: Option<DateTime<Tz>>,
    pub next_sunrise: Option<DateTime<Tz>>,
}

impl PrayerDay {
    pub fn instant(&self, prayer: Prayer) -> DateTime<Tz> {
        match prayer {
            Prayer::Dawn => self.dawn,
            Prayer::Sunrise => self.sunrise,
            Prayer::Midday => self.midday,
            Prayer::Afternoon => self.afternoon,
            Prayer::Sunset => self.sunset,
            Prayer::Night => self.night,
        }
    }

    /// Today's six instants in chronological order.
    pub fn instants(&self) -> [(Prayer, DateTime<Tz>); 6] {
        [
            (Prayer::Dawn, self.dawn),
            (Prayer::Sunrise, self.sunrise),
            (Prayer::Midday, self.midday),
            (Prayer::Afternoon, self.afternoon),
            (Prayer::Sunset, self.sunset),
            (Prayer::Night, self.night),
        ]
    }

    /// Today's six instants plus the lookahead instants, in chronological
    /// order. Used by the Upcoming evaluation, whose trigger point can land
    /// before local midnight rollover.
    pub fn upcoming_windows(&self) -> Vec<(Prayer, DateTime<Tz>)> {
        let mut windows: Vec<_> = self.instants().to_vec();
        if let Some(at) = self.next_dawn {
            windows.push((Prayer::Dawn, at));
        }
        if let Some(at) = self.next_sunrise {
            windows.push((Prayer::Sunrise, at));
        }
        windows
    }
}

/// A chat known to one tenant. `state` is free text owned by the command
/// layer; the reminder engine only reads `subscribed` and the bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(default)]
    pub state: String,
    pub subscribed: bool,
    pub reminders: ReminderBundle,
}

impl Chat {
    pub fn new(id: i64, day_preview_offset: i64, upcoming_offset: i64) -> Self {
        Self {
            id,
            state: String::new(),
            subscribed: false,
            reminders: ReminderBundle::new(day_preview_offset, upcoming_offset),
        }
    }
}
