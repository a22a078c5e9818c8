//! Scheduling preference commands for CLI.

use chrono_tz::Tz;
use chunkcal_core::preferences::parse_hour;
use chunkcal_core::EnergyProfile;
use clap::Subcommand;

use super::{CmdResult, Context};

#[derive(Subcommand)]
pub enum PrefsAction {
    /// Show stored and effective preferences
    Show,
    /// Update preferences; omitted flags keep their current value
    Set {
        /// IANA timezone, e.g. "Europe/Berlin"
        #[arg(long)]
        timezone: Option<String>,
        /// Work start as HH:MM (minutes are ignored by the scheduler)
        #[arg(long)]
        work_start: Option<String>,
        /// Work end as HH:MM
        #[arg(long)]
        work_end: Option<String>,
        /// Morning energy, 0-100
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
        morning: Option<u32>,
        /// Afternoon energy, 0-100
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
        afternoon: Option<u32>,
        /// Evening energy, 0-100
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
        evening: Option<u32>,
        /// Default duration for new chunks, in minutes
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        default_chunk_minutes: Option<u32>,
    },
}

fn checked_hour(flag: &str, value: String) -> Result<String, String> {
    match parse_hour(&value) {
        Some(_) => Ok(value.trim().to_string()),
        None => Err(format!("--{flag}: '{value}' is not an hour between 00 and 24")),
    }
}

pub fn run(action: PrefsAction) -> CmdResult {
    let ctx = Context::open()?;

    match action {
        PrefsAction::Show => {
            let stored = ctx.store.get_preferences(&ctx.user_id)?;
            let resolved = stored.resolve();
            let output = serde_json::json!({
                "stored": stored,
                "effective": {
                    "timezone": resolved.timezone.name(),
                    "workStartHour": resolved.work_start_hour,
                    "workEndHour": resolved.work_end_hour,
                    "energyProfile": resolved.energy_profile,
                    "defaultChunkMinutes": resolved.default_chunk_minutes,
                },
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        PrefsAction::Set {
            timezone,
            work_start,
            work_end,
            morning,
            afternoon,
            evening,
            default_chunk_minutes,
        } => {
            let mut prefs = ctx.store.get_preferences(&ctx.user_id)?;

            if let Some(tz) = timezone {
                tz.parse::<Tz>()
                    .map_err(|_| format!("--timezone: unknown timezone '{tz}'"))?;
                prefs.timezone = Some(tz);
            }

            if work_start.is_some() || work_end.is_some() {
                let mut hours = prefs.work_hours.take().unwrap_or_default();
                if let Some(start) = work_start {
                    hours.start = checked_hour("work-start", start)?;
                }
                if let Some(end) = work_end {
                    hours.end = checked_hour("work-end", end)?;
                }
                if parse_hour(&hours.start) >= parse_hour(&hours.end) {
                    tracing::warn!(
                        start = %hours.start,
                        end = %hours.end,
                        "work start is not before work end; auto-scheduling will fail"
                    );
                }
                prefs.work_hours = Some(hours);
            }

            if morning.is_some() || afternoon.is_some() || evening.is_some() {
                let current = prefs.energy_profile.unwrap_or_default();
                prefs.energy_profile = Some(EnergyProfile {
                    morning: morning.unwrap_or(current.morning),
                    afternoon: afternoon.unwrap_or(current.afternoon),
                    evening: evening.unwrap_or(current.evening),
                });
            }

            if default_chunk_minutes.is_some() {
                prefs.default_chunk_minutes = default_chunk_minutes;
            }

            ctx.store.set_preferences(&ctx.user_id, &prefs)?;
            println!("{}", serde_json::to_string_pretty(&prefs)?);
        }
    }
    Ok(())
}
