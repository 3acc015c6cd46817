use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Supplies "now" in a tenant's configured zone.
pub trait Clock: Send + Sync {
    fn now(&self, tz: Tz) -> DateTime<Tz>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self, tz: Tz) -> DateTime<Tz> {
        Utc::now().with_timezone(&tz)
    }
}
