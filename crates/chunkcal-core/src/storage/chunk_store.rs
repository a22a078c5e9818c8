//! SQLite-based storage for users, projects, tasks and chunks.
//!
//! Provides persistent storage for:
//! - users and their scheduling preferences
//! - projects and tasks (ownership chain for chunks)
//! - chunks and their scheduled spans
//!
//! The scheduler never touches this module; callers read chunks here, run a
//! [`crate::scheduler::SchedulingSession`], and write the outcome back with
//! [`ChunkStore::apply_placements`].

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::chunk::{Chunk, ChunkStatus, Energy, Placement, ScheduledSpan};
use crate::error::StoreError;
use crate::preferences::{EnergyProfile, UserPreferences, WorkHours};
use crate::project::{Project, ProjectStatus, Task, TaskStatus};

type StoreResult<T> = Result<T, StoreError>;

const CHUNK_COLUMNS: &str = "c.id, c.task_id, c.title, c.description, c.duration_min, c.deps, \
     c.energy, c.order_index, c.status, c.scheduled_start, c.scheduled_end";

const OWNED_CHUNKS: &str = "FROM chunks c
     JOIN tasks t ON c.task_id = t.id
     JOIN projects p ON t.project_id = p.id
     WHERE p.user_id = ?1";

const CHUNK_ORDER: &str = "ORDER BY t.created_at, t.id, c.order_index, c.id";

/// A stored user with their raw preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub preferences: UserPreferences,
    pub created_at: DateTime<Utc>,
}

// === Helper Functions ===

fn format_ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_ts(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_opt_ts(idx: usize, value: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    value.map(|v| parse_ts(idx, &v)).transpose()
}

/// Decode a JSON preference column; malformed values are treated as unset.
fn decode_pref<T: serde::de::DeserializeOwned>(column: &str, raw: Option<String>) -> Option<T> {
    let raw = raw?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(column, error = %err, "ignoring malformed stored preference");
            None
        }
    }
}

fn row_to_chunk(row: &Row) -> rusqlite::Result<Chunk> {
    let deps_json: String = row.get(5)?;
    let dependencies: Vec<String> = serde_json::from_str(&deps_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

    let energy: Option<String> = row.get(6)?;
    let status: String = row.get(8)?;

    let start = parse_opt_ts(9, row.get(9)?)?;
    let end = parse_opt_ts(10, row.get(10)?)?;
    let schedule = match (start, end) {
        (Some(start), Some(end)) => Some(ScheduledSpan::new(start, end)),
        _ => None,
    };

    Ok(Chunk {
        id: row.get(0)?,
        task_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        duration_minutes: row.get(4)?,
        dependencies,
        energy: energy.as_deref().map(Energy::from_tag).unwrap_or_default(),
        order_index: row.get(7)?,
        status: ChunkStatus::from_tag(&status),
        schedule,
    })
}

fn row_to_project(row: &Row) -> rusqlite::Result<Project> {
    let deadline: Option<String> = row.get(4)?;
    let status: String = row.get(5)?;
    let created_at: String = row.get(6)?;
    Ok(Project {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        deadline: parse_opt_ts(4, deadline)?,
        status: ProjectStatus::from_tag(&status),
        created_at: parse_ts(6, &created_at)?,
    })
}

fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    let status: String = row.get(5)?;
    let created_at: String = row.get(6)?;
    Ok(Task {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        notes: row.get(3)?,
        estimate_minutes: row.get(4)?,
        status: TaskStatus::from_tag(&status),
        created_at: parse_ts(6, &created_at)?,
    })
}

/// SQLite database for chunk storage.
pub struct ChunkStore {
    conn: Connection,
}

impl ChunkStore {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the store at `<data dir>/chunkcal.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> StoreResult<Self> {
        let dir = data_dir().map_err(|e| StoreError::invalid("data_dir", e.to_string()))?;
        Self::open_at(&dir.join("chunkcal.db"))
    }

    /// Open (or create) a store at an explicit path.
    pub fn open_at(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    /// Open an in-memory store.
    pub fn open_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS users (
                id                    TEXT PRIMARY KEY,
                name                  TEXT NOT NULL,
                timezone              TEXT,
                work_hours            TEXT,
                energy_profile        TEXT,
                default_chunk_minutes INTEGER,
                created_at            TEXT NOT NULL,
                updated_at            TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS projects (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id),
                title       TEXT NOT NULL,
                description TEXT,
                deadline    TEXT,
                status      TEXT NOT NULL DEFAULT 'active',
                created_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tasks (
                id           TEXT PRIMARY KEY,
                project_id   TEXT NOT NULL REFERENCES projects(id),
                title        TEXT NOT NULL,
                notes        TEXT,
                estimate_min INTEGER,
                status       TEXT NOT NULL DEFAULT 'todo',
                created_at   TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS chunks (
                id              TEXT PRIMARY KEY,
                task_id         TEXT NOT NULL REFERENCES tasks(id),
                title           TEXT NOT NULL,
                description     TEXT,
                duration_min    INTEGER NOT NULL CHECK (duration_min > 0),
                deps            TEXT NOT NULL DEFAULT '[]',
                energy          TEXT DEFAULT 'med',
                order_index     INTEGER NOT NULL,
                status          TEXT NOT NULL DEFAULT 'todo',
                scheduled_start TEXT,
                scheduled_end   TEXT,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL,
                CHECK ((scheduled_start IS NULL) = (scheduled_end IS NULL))
            );

            CREATE INDEX IF NOT EXISTS idx_projects_user ON projects(user_id);
            CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id);
            CREATE INDEX IF NOT EXISTS idx_chunks_task ON chunks(task_id);
            CREATE INDEX IF NOT EXISTS idx_chunks_scheduled_start ON chunks(scheduled_start);",
        )
    }

    // === Users ===

    /// Create the user if missing and return it.
    pub fn ensure_user(&self, id: &str, name: &str) -> StoreResult<User> {
        let now = format_ts(Utc::now());
        self.conn.execute(
            "INSERT OR IGNORE INTO users (id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![id, name, now],
        )?;
        self.get_user(id)?
            .ok_or_else(|| StoreError::UserNotFound(id.to_string()))
    }

    pub fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, timezone, work_hours, energy_profile, default_chunk_minutes, created_at
                 FROM users WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, Option<u32>>(5)?,
                        row.get::<_, String>(6)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, name, timezone, work_hours, energy_profile, default_chunk_minutes, created_at)) = row
        else {
            return Ok(None);
        };

        Ok(Some(User {
            id,
            name,
            preferences: UserPreferences {
                timezone,
                work_hours: decode_pref::<WorkHours>("work_hours", work_hours),
                energy_profile: decode_pref::<EnergyProfile>("energy_profile", energy_profile),
                default_chunk_minutes,
            },
            created_at: parse_ts(6, &created_at)?,
        }))
    }

    /// Scheduling preferences for a user, as stored (unresolved).
    pub fn get_preferences(&self, user_id: &str) -> StoreResult<UserPreferences> {
        self.get_user(user_id)?
            .map(|u| u.preferences)
            .ok_or_else(|| StoreError::UserNotFound(user_id.to_string()))
    }

    pub fn set_preferences(&self, user_id: &str, prefs: &UserPreferences) -> StoreResult<()> {
        let work_hours = prefs.work_hours.as_ref().map(serde_json::to_string).transpose()?;
        let energy_profile = prefs.energy_profile.as_ref().map(serde_json::to_string).transpose()?;

        let updated = self.conn.execute(
            "UPDATE users SET timezone = ?2, work_hours = ?3, energy_profile = ?4,
                 default_chunk_minutes = ?5, updated_at = ?6
             WHERE id = ?1",
            params![
                user_id,
                prefs.timezone,
                work_hours,
                energy_profile,
                prefs.default_chunk_minutes,
                format_ts(Utc::now()),
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::UserNotFound(user_id.to_string()));
        }
        Ok(())
    }

    // === Projects ===

    pub fn create_project(&self, project: &Project) -> StoreResult<()> {
        if self.get_user(&project.user_id)?.is_none() {
            return Err(StoreError::UserNotFound(project.user_id.clone()));
        }
        self.conn.execute(
            "INSERT INTO projects (id, user_id, title, description, deadline, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                project.id,
                project.user_id,
                project.title,
                project.description,
                project.deadline.map(format_ts),
                project.status.as_str(),
                format_ts(project.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_project(&self, id: &str) -> StoreResult<Option<Project>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, user_id, title, description, deadline, status, created_at
                 FROM projects WHERE id = ?1",
                params![id],
                row_to_project,
            )
            .optional()?)
    }

    pub fn list_projects(&self, user_id: &str) -> StoreResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, title, description, deadline, status, created_at
             FROM projects WHERE user_id = ?1 ORDER BY created_at, id",
        )?;
        let projects = stmt
            .query_map(params![user_id], row_to_project)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    // === Tasks ===

    pub fn create_task(&self, task: &Task) -> StoreResult<()> {
        if self.get_project(&task.project_id)?.is_none() {
            return Err(StoreError::ProjectNotFound(task.project_id.clone()));
        }
        self.conn.execute(
            "INSERT INTO tasks (id, project_id, title, notes, estimate_min, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                task.id,
                task.project_id,
                task.title,
                task.notes,
                task.estimate_minutes,
                task.status.as_str(),
                format_ts(task.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_task(&self, id: &str) -> StoreResult<Option<Task>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, project_id, title, notes, estimate_min, status, created_at
                 FROM tasks WHERE id = ?1",
                params![id],
                row_to_task,
            )
            .optional()?)
    }

    pub fn list_tasks(&self, project_id: &str) -> StoreResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, title, notes, estimate_min, status, created_at
             FROM tasks WHERE project_id = ?1 ORDER BY created_at, id",
        )?;
        let tasks = stmt
            .query_map(params![project_id], row_to_task)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    // === Chunks ===

    /// Insert a chunk. Its task must exist and its duration must be positive.
    pub fn create_chunk(&self, chunk: &Chunk) -> StoreResult<()> {
        if chunk.duration_minutes == 0 {
            return Err(StoreError::invalid("duration_minutes", "must be positive"));
        }
        if self.get_task(&chunk.task_id)?.is_none() {
            return Err(StoreError::TaskNotFound(chunk.task_id.clone()));
        }

        let now = format_ts(Utc::now());
        self.conn.execute(
            "INSERT INTO chunks (id, task_id, title, description, duration_min, deps, energy,
                                 order_index, status, scheduled_start, scheduled_end,
                                 created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
            params![
                chunk.id,
                chunk.task_id,
                chunk.title,
                chunk.description,
                chunk.duration_minutes,
                serde_json::to_string(&chunk.dependencies)?,
                chunk.energy.as_str(),
                chunk.order_index,
                chunk.status.as_str(),
                chunk.scheduled_start().map(format_ts),
                chunk.scheduled_end().map(format_ts),
                now,
            ],
        )?;
        Ok(())
    }

    pub fn get_chunk(&self, id: &str) -> StoreResult<Option<Chunk>> {
        let sql = format!("SELECT {CHUNK_COLUMNS} FROM chunks c WHERE c.id = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![id], row_to_chunk)
            .optional()?)
    }

    /// Fetch chunks by id, in the order given. Repeated ids are returned once.
    ///
    /// # Errors
    /// `ChunkNotFound` for the first id that doesn't exist.
    pub fn get_chunks(&self, ids: &[String]) -> StoreResult<Vec<Chunk>> {
        let mut seen = HashSet::new();
        ids.iter()
            .filter(|id| seen.insert(id.as_str()))
            .map(|id| {
                self.get_chunk(id)?
                    .ok_or_else(|| StoreError::ChunkNotFound(id.clone()))
            })
            .collect()
    }

    /// Like [`Self::get_chunks`], but every chunk must belong to `user_id`.
    pub fn get_owned_chunks(&self, user_id: &str, ids: &[String]) -> StoreResult<Vec<Chunk>> {
        for id in ids {
            self.ensure_owned(user_id, id)?;
        }
        self.get_chunks(ids)
    }

    fn query_chunks(&self, filter: &str, params: &[&dyn rusqlite::ToSql]) -> StoreResult<Vec<Chunk>> {
        let sql = format!("SELECT {CHUNK_COLUMNS} {OWNED_CHUNKS} {filter} {CHUNK_ORDER}");
        let mut stmt = self.conn.prepare(&sql)?;
        let chunks = stmt
            .query_map(params, row_to_chunk)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(chunks)
    }

    /// Every chunk in the user's projects.
    pub fn list_chunks(&self, user_id: &str) -> StoreResult<Vec<Chunk>> {
        self.query_chunks("", &[&user_id])
    }

    /// `todo` chunks with no scheduled span.
    pub fn list_unscheduled(&self, user_id: &str) -> StoreResult<Vec<Chunk>> {
        self.query_chunks(
            "AND c.status = 'todo' AND c.scheduled_start IS NULL",
            &[&user_id],
        )
    }

    /// Chunks whose start falls in `[from, to)`, ordered by start.
    pub fn list_scheduled_between(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<Chunk>> {
        let (from, to) = (format_ts(from), format_ts(to));
        let mut chunks = self.query_chunks(
            "AND c.scheduled_start >= ?2 AND c.scheduled_start < ?3",
            &[&user_id, &from, &to],
        )?;
        chunks.sort_by_key(|c| c.scheduled_start());
        Ok(chunks)
    }

    /// Chunks starting on `date` in the given timezone.
    pub fn list_scheduled_on(&self, user_id: &str, date: NaiveDate, timezone: Tz) -> StoreResult<Vec<Chunk>> {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .and_then(|local| timezone.from_local_datetime(&local).earliest())
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| StoreError::invalid("date", format!("{date} has no midnight in {timezone}")))?;
        // Next local midnight; DST days are not 24h long.
        let next = date
            .succ_opt()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .and_then(|local| timezone.from_local_datetime(&local).earliest())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(midnight + Duration::days(1));
        self.list_scheduled_between(user_id, midnight, next)
    }

    /// Owner of a chunk through its task and project.
    pub fn chunk_owner(&self, chunk_id: &str) -> StoreResult<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT p.user_id FROM chunks c
                 JOIN tasks t ON c.task_id = t.id
                 JOIN projects p ON t.project_id = p.id
                 WHERE c.id = ?1",
                params![chunk_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?)
    }

    fn ensure_owned(&self, user_id: &str, chunk_id: &str) -> StoreResult<()> {
        match self.chunk_owner(chunk_id)? {
            None => Err(StoreError::ChunkNotFound(chunk_id.to_string())),
            Some(owner) if owner != user_id => Err(StoreError::NotOwned {
                chunk_id: chunk_id.to_string(),
                user_id: user_id.to_string(),
            }),
            Some(_) => Ok(()),
        }
    }

    fn write_span(&self, chunk_id: &str, span: Option<(DateTime<Utc>, DateTime<Utc>)>) -> StoreResult<()> {
        let (start, end) = match span {
            Some((start, end)) => (Some(format_ts(start)), Some(format_ts(end))),
            None => (None, None),
        };
        self.conn.execute(
            "UPDATE chunks SET scheduled_start = ?2, scheduled_end = ?3, updated_at = ?4 WHERE id = ?1",
            params![chunk_id, start, end, format_ts(Utc::now())],
        )?;
        Ok(())
    }

    /// Persist an auto-schedule outcome in one transaction.
    ///
    /// Every chunk must belong to `user_id`; on any failure nothing is
    /// written. This does not look at what is already scheduled: running
    /// two sessions for the same user and day and applying both can put two
    /// chunks on the same instant. Serialize "read, schedule, apply" per
    /// user and day outside the store if that matters.
    pub fn apply_placements(&self, user_id: &str, placements: &[Placement]) -> StoreResult<usize> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(StoreError::from_sqlite)?;
        for placement in placements {
            self.ensure_owned(user_id, &placement.chunk_id)?;
            self.write_span(
                &placement.chunk_id,
                Some((placement.scheduled_start, placement.scheduled_end)),
            )?;
        }
        tx.commit().map_err(StoreError::from_sqlite)?;
        tracing::info!(user = user_id, applied = placements.len(), "applied placements");
        Ok(placements.len())
    }

    /// Manual placement: set both timestamps directly.
    ///
    /// Only ownership is checked. No conflict check against other chunks is
    /// made, so this path can double-book an instant the auto-scheduler
    /// would have refused.
    pub fn schedule_manually(
        &self,
        user_id: &str,
        chunk_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.ensure_owned(user_id, chunk_id)?;
        self.write_span(chunk_id, Some((start, end)))?;
        tracing::debug!(chunk = chunk_id, %start, %end, "manually scheduled chunk");
        Ok(())
    }

    /// Clear both timestamps.
    pub fn unschedule(&self, user_id: &str, chunk_id: &str) -> StoreResult<()> {
        self.ensure_owned(user_id, chunk_id)?;
        self.write_span(chunk_id, None)?;
        tracing::debug!(chunk = chunk_id, "unscheduled chunk");
        Ok(())
    }

    pub fn set_chunk_status(&self, user_id: &str, chunk_id: &str, status: ChunkStatus) -> StoreResult<()> {
        self.ensure_owned(user_id, chunk_id)?;
        self.conn.execute(
            "UPDATE chunks SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![chunk_id, status.as_str(), format_ts(Utc::now())],
        )?;
        Ok(())
    }
}
