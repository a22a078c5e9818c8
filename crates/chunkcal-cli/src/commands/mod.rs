pub mod chunk;
pub mod config;
pub mod prefs;
pub mod project;
pub mod schedule;
pub mod task;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use chunkcal_core::{ChunkStore, Config};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Config, store and acting user for commands that touch data.
pub struct Context {
    pub config: Config,
    pub store: ChunkStore,
    pub user_id: String,
}

impl Context {
    /// Load config, create the local user on first use and open the store.
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = Config::load()?;
        if config.ensure_user_id() {
            config.save()?;
            tracing::info!(user = %config.user.id, "created local user");
        }

        let store = ChunkStore::open()?;
        store.ensure_user(&config.user.id, &config.user.name)?;
        let user_id = config.user.id.clone();

        Ok(Self {
            config,
            store,
            user_id,
        })
    }

    /// The user's resolved timezone.
    pub fn timezone(&self) -> Result<Tz, Box<dyn std::error::Error>> {
        Ok(self.store.get_preferences(&self.user_id)?.resolve().timezone)
    }

    pub fn json_output(&self, flag: bool) -> bool {
        flag || self.config.display.json
    }

    /// Format an instant for display, in local time when configured.
    pub fn format_time(&self, at: DateTime<Utc>, tz: Tz) -> String {
        if self.config.display.local_times {
            at.with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string()
        } else {
            at.format("%Y-%m-%d %H:%MZ").to_string()
        }
    }
}

/// Parse an RFC 3339 instant, or a `YYYY-MM-DD HH:MM` local time in `tz`.
pub fn parse_instant(value: &str, tz: Tz) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    let local = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value.trim(), fmt).ok())
        .ok_or_else(|| format!("invalid time '{value}': expected RFC 3339 or YYYY-MM-DD HH:MM"))?;

    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| format!("{value} does not exist in {tz}"))
}
