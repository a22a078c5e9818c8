//! Task management commands for CLI.

use chunkcal_core::{StoreError, Task};
use clap::Subcommand;

use super::{CmdResult, Context};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a task in one of your projects
    Create {
        /// Project ID
        project_id: String,
        /// Task title
        title: String,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
        /// Rough estimate in minutes
        #[arg(long)]
        estimate: Option<u32>,
    },
    /// List tasks of a project
    List {
        /// Project ID
        project_id: String,
    },
}

/// Fail unless the project exists and belongs to the acting user.
fn check_project(ctx: &Context, project_id: &str) -> Result<(), StoreError> {
    match ctx.store.get_project(project_id)? {
        Some(p) if p.user_id == ctx.user_id => Ok(()),
        _ => Err(StoreError::ProjectNotFound(project_id.to_string())),
    }
}

pub fn run(action: TaskAction) -> CmdResult {
    let ctx = Context::open()?;

    match action {
        TaskAction::Create {
            project_id,
            title,
            notes,
            estimate,
        } => {
            check_project(&ctx, &project_id)?;
            let mut task = Task::new(project_id, title);
            task.notes = notes;
            task.estimate_minutes = estimate;
            ctx.store.create_task(&task)?;
            println!("Task created: {}", task.id);
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::List { project_id } => {
            check_project(&ctx, &project_id)?;
            let tasks = ctx.store.list_tasks(&project_id)?;
            println!("{}", serde_json::to_string_pretty(&tasks)?);
        }
    }
    Ok(())
}
