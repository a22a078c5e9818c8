//! Auto-scheduler for work chunks.
//!
//! Places a batch of chunks onto one day's work window:
//! - [`grid`]: half-hour slot grid for the window
//! - [`energy`]: preferred hours per energy tag and profile
//! - [`ordering`]: processing order (energy first, optionally dependency aware)
//! - [`placer`]: greedy first-free-slot placement with explicit reservations
//! - [`session`]: orchestration, validation and the result type
//!
//! Reservations live only for the duration of one call. Two separate calls
//! for the same user and day can pick the same slot; callers that need the
//! no-double-booking guarantee across calls must serialize
//! "read schedule, run session, persist" themselves.

pub mod energy;
pub mod grid;
pub mod ordering;
pub mod placer;
pub mod session;

pub use energy::{candidate_slots, preferred_hours};
pub use grid::{SlotGrid, SlotKey, SLOT_MINUTES};
pub use ordering::{order_chunks, OrderingMode};
pub use placer::{
    place_all, place_chunk, place_chunk_after, PlacementRequest, PlacerOutput, Reservations, SlotChoice,
};
pub use session::{parse_date, schedule, schedule_str, ScheduleOutcome, SchedulingSession};
