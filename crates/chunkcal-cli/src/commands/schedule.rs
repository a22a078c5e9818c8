//! Auto-scheduling commands for CLI.

use chunkcal_core::scheduler::{parse_date, OrderingMode, SchedulingSession};
use clap::Subcommand;

use super::{CmdResult, Context};

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Place chunks onto a day's work window
    Auto {
        /// Target day (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Chunk to schedule (repeatable); defaults to every unscheduled todo chunk
        #[arg(long = "chunk")]
        chunks: Vec<String>,
        /// Start every chunk after the in-batch chunks it depends on
        #[arg(long)]
        dependency_aware: bool,
        /// Compute placements without saving them
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show chunks scheduled on a day
    Show {
        /// Day (YYYY-MM-DD), in your timezone
        #[arg(long)]
        date: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: ScheduleAction) -> CmdResult {
    let ctx = Context::open()?;

    match action {
        ScheduleAction::Auto {
            date,
            chunks,
            dependency_aware,
            dry_run,
            json,
        } => {
            let date = parse_date(&date)?;
            let batch = if chunks.is_empty() {
                ctx.store.list_unscheduled(&ctx.user_id)?
            } else {
                ctx.store.get_owned_chunks(&ctx.user_id, &chunks)?
            };

            let ordering = if dependency_aware {
                OrderingMode::DependencyAware
            } else {
                ctx.config.ordering_mode()
            };
            let prefs = ctx.store.get_preferences(&ctx.user_id)?;
            let session = SchedulingSession::new(&prefs).with_ordering(ordering);
            let outcome = session.run(&batch, date)?;

            if !dry_run {
                ctx.store.apply_placements(&ctx.user_id, &outcome.placements)?;
            }

            if ctx.json_output(json) {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
                return Ok(());
            }

            let tz = session.preferences().timezone;
            for placement in &outcome.placements {
                let title = batch
                    .iter()
                    .find(|c| c.id == placement.chunk_id)
                    .map_or("", |c| c.title.as_str());
                println!(
                    "{}  {}  {}",
                    ctx.format_time(placement.scheduled_start, tz),
                    placement.chunk_id,
                    title
                );
            }
            println!(
                "{} placed, {} unplaced{}",
                outcome.placed_count(),
                outcome.unplaced_count(),
                if dry_run { " (dry run, nothing saved)" } else { "" }
            );
            for id in &outcome.unplaced {
                println!("unplaced: {id}");
            }
        }
        ScheduleAction::Show { date, json } => {
            let date = parse_date(&date)?;
            let tz = ctx.timezone()?;
            let chunks = ctx.store.list_scheduled_on(&ctx.user_id, date, tz)?;

            if ctx.json_output(json) {
                println!("{}", serde_json::to_string_pretty(&chunks)?);
                return Ok(());
            }
            if chunks.is_empty() {
                println!("Nothing scheduled on {date}.");
            }
            for chunk in &chunks {
                if let Some(span) = chunk.schedule {
                    println!(
                        "{} - {}  {:<4}  {}",
                        ctx.format_time(span.start, tz),
                        ctx.format_time(span.end, tz),
                        chunk.energy,
                        chunk.title
                    );
                }
            }
        }
    }
    Ok(())
}
