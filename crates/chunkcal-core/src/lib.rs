//! # chunkcal core library
//!
//! Domain model, auto-scheduler and storage for chunkcal, a planner that
//! splits projects into short work chunks and places them on a day's work
//! window according to each chunk's energy demand.
//!
//! ## Architecture
//!
//! - **Model**: projects own tasks, tasks own [`Chunk`]s
//! - **Scheduler**: a pure, synchronous [`SchedulingSession`] that turns a
//!   batch of chunks, a date and [`UserPreferences`] into a [`ScheduleOutcome`]
//! - **Storage**: SQLite-based [`ChunkStore`] and TOML-based [`Config`]
//!
//! The scheduler holds no state between calls; see [`scheduler`] for what
//! that means for concurrent callers.

pub mod chunk;
pub mod error;
pub mod preferences;
pub mod project;
pub mod scheduler;
pub mod storage;

pub use chunk::{Chunk, ChunkStatus, Energy, Placement, ScheduledSpan};
pub use error::{ConfigError, CoreError, ScheduleError, StoreError};
pub use preferences::{EnergyProfile, ResolvedPreferences, UserPreferences, WorkHours};
pub use project::{Project, ProjectStatus, Task, TaskStatus};
pub use scheduler::{schedule, OrderingMode, ScheduleOutcome, SchedulingSession};
pub use storage::{ChunkStore, Config, User};
