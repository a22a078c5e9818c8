//! Project management commands for CLI.

use chrono::Utc;
use chunkcal_core::Project;
use clap::Subcommand;

use super::{CmdResult, Context};

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a new project
    Create {
        /// Project title
        title: String,
        /// Short description
        #[arg(long)]
        description: Option<String>,
        /// Deadline as ISO 8601 string
        #[arg(long)]
        deadline: Option<String>,
    },
    /// List your projects
    List,
}

pub fn run(action: ProjectAction) -> CmdResult {
    let ctx = Context::open()?;

    match action {
        ProjectAction::Create {
            title,
            description,
            deadline,
        } => {
            let deadline = deadline
                .map(|d| {
                    chrono::DateTime::parse_from_rfc3339(&d)
                        .map(|dt| dt.with_timezone(&Utc))
                        .map_err(|e| format!("--deadline: {e}"))
                })
                .transpose()?;

            let mut project = Project::new(&ctx.user_id, title);
            project.description = description;
            project.deadline = deadline;
            ctx.store.create_project(&project)?;
            println!("Project created: {}", project.id);
            println!("{}", serde_json::to_string_pretty(&project)?);
        }
        ProjectAction::List => {
            let projects = ctx.store.list_projects(&ctx.user_id)?;
            println!("{}", serde_json::to_string_pretty(&projects)?);
        }
    }
    Ok(())
}
