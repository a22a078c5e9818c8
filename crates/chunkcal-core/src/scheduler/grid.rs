//! Half-hour slot grid for one day's work window.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed slot width, independent of chunk duration.
pub const SLOT_MINUTES: u32 = 30;

/// Minute offsets inside an hour, in tie-break order.
pub const SLOT_MINUTE_OFFSETS: [u32; 2] = [0, 30];

/// Reservation key for a slot: wall-clock `(hour, minute)` on the target date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotKey {
    pub hour: u32,
    pub minute: u32,
}

impl SlotKey {
    pub fn new(hour: u32, minute: u32) -> Self {
        Self { hour, minute }
    }

    pub fn minute_of_day(&self) -> u32 {
        self.hour * 60 + self.minute
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Ordered candidate slot starts covering `[work_start, work_end)` on a date.
///
/// An inverted or empty window yields an empty grid.
#[derive(Debug, Clone)]
pub struct SlotGrid {
    date: NaiveDate,
    timezone: Tz,
    keys: Vec<SlotKey>,
}

impl SlotGrid {
    pub fn new(date: NaiveDate, work_start_hour: i32, work_end_hour: i32, timezone: Tz) -> Self {
        let start = work_start_hour.clamp(0, 24) as u32;
        let end = work_end_hour.clamp(0, 24) as u32;

        let keys = (start..end)
            .flat_map(|hour| SLOT_MINUTE_OFFSETS.map(|minute| SlotKey::new(hour, minute)))
            .collect();

        Self {
            date,
            timezone,
            keys,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn keys(&self) -> &[SlotKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: SlotKey) -> bool {
        self.keys.binary_search(&key).is_ok()
    }

    /// UTC instant of a slot start.
    ///
    /// `None` when the wall-clock time does not exist on that date in the
    /// user's timezone (spring-forward gap). Ambiguous times take the earlier
    /// instant.
    pub fn instant(&self, key: SlotKey) -> Option<DateTime<Utc>> {
        let local = self.date.and_hms_opt(key.hour, key.minute, 0)?;
        self.timezone
            .from_local_datetime(&local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }
}
