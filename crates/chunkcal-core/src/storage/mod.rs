mod config;
pub mod chunk_store;

pub use chunk_store::{ChunkStore, User};
pub use config::{Config, DisplayConfig, SchedulerSection, UserConfig};

use std::path::PathBuf;

/// Returns the chunkcal data directory, creating it if needed.
///
/// `CHUNKCAL_HOME` wins when set. Otherwise `~/.config/chunkcal`, or
/// `~/.config/chunkcal-dev` when `CHUNKCAL_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("CHUNKCAL_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("CHUNKCAL_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("chunkcal-dev")
            } else {
                base_dir.join("chunkcal")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
