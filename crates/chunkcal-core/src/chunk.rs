//! Chunk types: the atomic schedulable unit of work.
//!
//! A chunk is a 5-15 minute slice of a task. It carries an energy tag that
//! biases where the auto-scheduler puts it, and an optional scheduled span.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cognitive demand of a chunk.
///
/// Unknown tags coming from storage or JSON decode as `Unspecified` rather
/// than failing, and are scheduled with the fallback preference list.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Energy {
    Low,
    #[default]
    #[serde(alias = "medium")]
    Med,
    High,
    #[serde(other)]
    Unspecified,
}

impl Energy {
    /// Processing priority: higher is placed earlier.
    pub fn rank(self) -> u8 {
        match self {
            Energy::High => 3,
            Energy::Med => 2,
            Energy::Low => 1,
            Energy::Unspecified => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Energy::Low => "low",
            Energy::Med => "med",
            Energy::High => "high",
            Energy::Unspecified => "unspecified",
        }
    }

    /// Lenient parse used for stored values: anything unknown is `Unspecified`.
    pub fn from_tag(tag: &str) -> Self {
        tag.parse().unwrap_or(Energy::Unspecified)
    }
}

impl fmt::Display for Energy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Energy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Energy::Low),
            "med" | "medium" => Ok(Energy::Med),
            "high" => Ok(Energy::High),
            other => Err(format!("unknown energy '{other}' (expected low, med or high)")),
        }
    }
}

/// Workflow status of a chunk.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChunkStatus {
    #[default]
    Todo,
    Doing,
    Done,
    Snoozed,
    Stuck,
}

impl ChunkStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ChunkStatus::Todo => "todo",
            ChunkStatus::Doing => "doing",
            ChunkStatus::Done => "done",
            ChunkStatus::Snoozed => "snoozed",
            ChunkStatus::Stuck => "stuck",
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "doing" => ChunkStatus::Doing,
            "done" => ChunkStatus::Done,
            "snoozed" => ChunkStatus::Snoozed,
            "stuck" => ChunkStatus::Stuck,
            _ => ChunkStatus::Todo,
        }
    }
}

impl fmt::Display for ChunkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ChunkStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "todo" => Ok(ChunkStatus::Todo),
            "doing" => Ok(ChunkStatus::Doing),
            "done" => Ok(ChunkStatus::Done),
            "snoozed" => Ok(ChunkStatus::Snoozed),
            "stuck" => Ok(ChunkStatus::Stuck),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

/// Start and end of a scheduled chunk. Both are always present together.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledSpan {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ScheduledSpan {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// A unit of schedulable work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub id: String,
    #[serde(default)]
    pub task_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub duration_minutes: u32,
    #[serde(default)]
    pub energy: Energy,
    /// Chunks that should logically precede this one.
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub order_index: i32,
    #[serde(default)]
    pub status: ChunkStatus,
    #[serde(default)]
    pub schedule: Option<ScheduledSpan>,
}

impl Chunk {
    /// Create an unscheduled `todo` chunk with a fresh id and medium energy.
    pub fn new(task_id: impl Into<String>, title: impl Into<String>, duration_minutes: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            task_id: task_id.into(),
            title: title.into(),
            description: None,
            duration_minutes,
            energy: Energy::default(),
            dependencies: Vec::new(),
            order_index: 0,
            status: ChunkStatus::Todo,
            schedule: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_energy(mut self, energy: Energy) -> Self {
        self.energy = energy;
        self
    }

    pub fn with_order_index(mut self, order_index: i32) -> Self {
        self.order_index = order_index;
        self
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_scheduled(&self) -> bool {
        self.schedule.is_some()
    }

    pub fn scheduled_start(&self) -> Option<DateTime<Utc>> {
        self.schedule.map(|s| s.start)
    }

    pub fn scheduled_end(&self) -> Option<DateTime<Utc>> {
        self.schedule.map(|s| s.end)
    }

    /// Duration as a chrono value.
    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.duration_minutes))
    }

    /// Apply a placement produced for this chunk.
    pub fn apply(&mut self, placement: &Placement) {
        self.schedule = Some(ScheduledSpan::new(
            placement.scheduled_start,
            placement.scheduled_end,
        ));
    }

    pub fn unschedule(&mut self) {
        self.schedule = None;
    }
}

/// One entry of a scheduling result.
///
/// Serializes as `{id, scheduledStart, scheduledEnd}` with RFC 3339 instants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    #[serde(rename = "id")]
    pub chunk_id: String,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
}

impl Placement {
    pub fn new(chunk_id: impl Into<String>, scheduled_start: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            scheduled_start,
            scheduled_end: scheduled_start + duration,
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.scheduled_end - self.scheduled_start).num_minutes()
    }
}
