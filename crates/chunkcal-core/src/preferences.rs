//! User scheduling preferences.
//!
//! [`UserPreferences`] is the raw shape supplied by the preferences provider:
//! every field may be missing or malformed. [`ResolvedPreferences`] is what
//! the scheduler runs on, with all defaults applied. Resolution never fails.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

pub const DEFAULT_WORK_START_HOUR: i32 = 9;
pub const DEFAULT_WORK_END_HOUR: i32 = 17;
pub const DEFAULT_CHUNK_MINUTES: u32 = 10;
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Work window as `"HH:MM"` strings. Only the hour component is used.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkHours {
    pub start: String,
    pub end: String,
}

impl Default for WorkHours {
    fn default() -> Self {
        Self {
            start: "09:00".to_string(),
            end: "17:00".to_string(),
        }
    }
}

/// Relative energy weights (0-100) for the three parts of the day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnergyProfile {
    pub morning: u32,
    pub afternoon: u32,
    pub evening: u32,
}

impl Default for EnergyProfile {
    fn default() -> Self {
        Self {
            morning: 80,
            afternoon: 60,
            evening: 40,
        }
    }
}

/// Preferences as stored for a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub work_hours: Option<WorkHours>,
    #[serde(default)]
    pub energy_profile: Option<EnergyProfile>,
    #[serde(default)]
    pub default_chunk_minutes: Option<u32>,
}

impl UserPreferences {
    pub fn resolve(&self) -> ResolvedPreferences {
        ResolvedPreferences::from_preferences(self)
    }
}

/// Preferences with every default applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPreferences {
    pub work_start_hour: i32,
    pub work_end_hour: i32,
    pub energy_profile: EnergyProfile,
    pub timezone: Tz,
    pub default_chunk_minutes: u32,
}

impl Default for ResolvedPreferences {
    fn default() -> Self {
        UserPreferences::default().resolve()
    }
}

impl ResolvedPreferences {
    pub fn from_preferences(prefs: &UserPreferences) -> Self {
        let (start, end) = match &prefs.work_hours {
            Some(hours) => (
                parse_hour(&hours.start).unwrap_or(DEFAULT_WORK_START_HOUR),
                parse_hour(&hours.end).unwrap_or(DEFAULT_WORK_END_HOUR),
            ),
            None => (DEFAULT_WORK_START_HOUR, DEFAULT_WORK_END_HOUR),
        };

        let timezone = prefs
            .timezone
            .as_deref()
            .map(resolve_timezone)
            .unwrap_or(Tz::UTC);

        Self {
            work_start_hour: start,
            work_end_hour: end,
            energy_profile: prefs.energy_profile.unwrap_or_default(),
            timezone,
            default_chunk_minutes: prefs
                .default_chunk_minutes
                .filter(|m| *m > 0)
                .unwrap_or(DEFAULT_CHUNK_MINUTES),
        }
    }

    /// `true` when the window contains at least one hour.
    pub fn has_valid_window(&self) -> bool {
        self.work_start_hour < self.work_end_hour
    }
}

/// Hour component of an `"HH:MM"` (or bare `"HH"`) string.
///
/// Returns `None` for anything that isn't an hour in `0..=24`; 24 is allowed
/// so a window can run to midnight.
pub fn parse_hour(value: &str) -> Option<i32> {
    let hour = value.split(':').next()?.trim();
    if hour.is_empty() {
        return None;
    }
    hour.parse::<i32>().ok().filter(|h| (0..=24).contains(h))
}

fn resolve_timezone(name: &str) -> Tz {
    match name.parse::<Tz>() {
        Ok(tz) => tz,
        Err(_) => {
            tracing::warn!(timezone = name, "unknown timezone, falling back to UTC");
            Tz::UTC
        }
    }
}
