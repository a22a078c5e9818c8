//! Chunk commands: create, inspect and place chunks by hand.

use chrono_tz::Tz;
use chunkcal_core::{Chunk, ChunkStatus, Energy, StoreError};
use clap::Subcommand;

use super::{parse_instant, CmdResult, Context};

#[derive(Subcommand)]
pub enum ChunkAction {
    /// Add a chunk to one of your tasks
    Add {
        /// Task ID
        task_id: String,
        /// Chunk title
        title: String,
        /// Duration in minutes (defaults to the preferred chunk length)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        minutes: Option<u32>,
        /// Energy demand: low, med or high
        #[arg(long, default_value = "med")]
        energy: Energy,
        /// Position within the task (defaults to the end)
        #[arg(long)]
        order: Option<i32>,
        /// Chunk that should come first (repeatable)
        #[arg(long = "dep")]
        deps: Vec<String>,
        /// Longer description
        #[arg(long)]
        description: Option<String>,
    },
    /// List your chunks
    List {
        /// Only todo chunks without a schedule
        #[arg(long)]
        unscheduled: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one chunk as JSON
    Show {
        /// Chunk ID
        id: String,
    },
    /// Place a chunk by hand. No conflict check is made.
    Schedule {
        /// Chunk ID
        id: String,
        /// Start: RFC 3339, or "YYYY-MM-DD HH:MM" in your timezone
        start: String,
        /// End, same formats as start
        end: String,
    },
    /// Clear a chunk's schedule
    Unschedule {
        /// Chunk ID
        id: String,
    },
    /// Change a chunk's status (todo, doing, done, snoozed, stuck)
    Status {
        /// Chunk ID
        id: String,
        status: ChunkStatus,
    },
}

fn owned_task_chunk_count(ctx: &Context, task_id: &str) -> Result<usize, StoreError> {
    let task = ctx
        .store
        .get_task(task_id)?
        .ok_or_else(|| StoreError::TaskNotFound(task_id.to_string()))?;
    match ctx.store.get_project(&task.project_id)? {
        Some(p) if p.user_id == ctx.user_id => {}
        _ => return Err(StoreError::TaskNotFound(task_id.to_string())),
    }
    let chunks = ctx.store.list_chunks(&ctx.user_id)?;
    Ok(chunks.iter().filter(|c| c.task_id == task_id).count())
}

fn print_table(ctx: &Context, chunks: &[Chunk], tz: Tz) {
    if chunks.is_empty() {
        println!("No chunks.");
        return;
    }
    for chunk in chunks {
        let when = match chunk.schedule {
            Some(span) => ctx.format_time(span.start, tz),
            None => "-".to_string(),
        };
        println!(
            "{}  {:<16}  {:>3}m  {:<4}  {:<7}  {}",
            chunk.id, when, chunk.duration_minutes, chunk.energy, chunk.status, chunk.title
        );
    }
}

pub fn run(action: ChunkAction) -> CmdResult {
    let ctx = Context::open()?;

    match action {
        ChunkAction::Add {
            task_id,
            title,
            minutes,
            energy,
            order,
            deps,
            description,
        } => {
            let existing = owned_task_chunk_count(&ctx, &task_id)?;
            let minutes = match minutes {
                Some(m) => m,
                None => {
                    ctx.store
                        .get_preferences(&ctx.user_id)?
                        .resolve()
                        .default_chunk_minutes
                }
            };
            let order = order.unwrap_or_else(|| i32::try_from(existing).unwrap_or(i32::MAX));

            let mut chunk = Chunk::new(task_id, title, minutes)
                .with_energy(energy)
                .with_order_index(order)
                .with_dependencies(deps);
            chunk.description = description;
            ctx.store.create_chunk(&chunk)?;
            println!("Chunk created: {}", chunk.id);
            println!("{}", serde_json::to_string_pretty(&chunk)?);
        }
        ChunkAction::List { unscheduled, json } => {
            let chunks = if unscheduled {
                ctx.store.list_unscheduled(&ctx.user_id)?
            } else {
                ctx.store.list_chunks(&ctx.user_id)?
            };
            if ctx.json_output(json) {
                println!("{}", serde_json::to_string_pretty(&chunks)?);
            } else {
                print_table(&ctx, &chunks, ctx.timezone()?);
            }
        }
        ChunkAction::Show { id } => {
            let chunks = ctx.store.get_owned_chunks(&ctx.user_id, &[id])?;
            println!("{}", serde_json::to_string_pretty(&chunks[0])?);
        }
        ChunkAction::Schedule { id, start, end } => {
            let tz = ctx.timezone()?;
            let start = parse_instant(&start, tz)?;
            let end = parse_instant(&end, tz)?;
            ctx.store.schedule_manually(&ctx.user_id, &id, start, end)?;
            println!(
                "Chunk {id} scheduled {} - {}",
                ctx.format_time(start, tz),
                ctx.format_time(end, tz)
            );
        }
        ChunkAction::Unschedule { id } => {
            ctx.store.unschedule(&ctx.user_id, &id)?;
            println!("Chunk {id} unscheduled");
        }
        ChunkAction::Status { id, status } => {
            ctx.store.set_chunk_status(&ctx.user_id, &id, status)?;
            println!("Chunk {id} is now {status}");
        }
    }
    Ok(())
}
