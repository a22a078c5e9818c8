//! Greedy placer.
//!
//! Each chunk takes the first free preferred slot, else the first free slot
//! in the grid, else it stays unplaced. No backtracking.
//!
//! Reservations are plain values: [`place_chunk`] reads them, [`place_all`]
//! folds them through the batch and hands the final set back. Nothing is
//! shared between calls.
//!
//! Collisions are detected on exact slot keys only. Chunks up to 30 minutes
//! long can't overlap that way; a 45-minute chunk at 09:00 and another chunk
//! at 09:30 would, and nothing here checks for it.

use std::collections::BTreeSet;

use crate::chunk::{Chunk, Placement};

use super::energy::candidate_slots;
use super::grid::{SlotGrid, SlotKey};

/// Slot keys taken during one scheduling invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reservations {
    taken: BTreeSet<SlotKey>,
}

impl Reservations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with keys that must be treated as occupied.
    pub fn with_taken<I: IntoIterator<Item = SlotKey>>(keys: I) -> Self {
        Self {
            taken: keys.into_iter().collect(),
        }
    }

    pub fn is_reserved(&self, key: SlotKey) -> bool {
        self.taken.contains(&key)
    }

    /// Returns a copy with `key` added.
    #[must_use]
    pub fn reserve(mut self, key: SlotKey) -> Self {
        self.taken.insert(key);
        self
    }

    pub fn len(&self) -> usize {
        self.taken.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SlotKey> {
        self.taken.iter()
    }
}

/// Where a chunk landed and which rule put it there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotChoice {
    pub key: SlotKey,
    pub placement: Placement,
    pub preferred: bool,
}

/// A chunk together with the hours it would like to start in.
#[derive(Debug, Clone)]
pub struct PlacementRequest<'a> {
    pub chunk: &'a Chunk,
    pub preferred_hours: Vec<i32>,
    /// Ids of chunks in the same batch that must start earlier. Only the
    /// ones already placed when this request comes up constrain it.
    pub after: Vec<&'a str>,
}

impl<'a> PlacementRequest<'a> {
    pub fn new(chunk: &'a Chunk, preferred_hours: Vec<i32>) -> Self {
        Self {
            chunk,
            preferred_hours,
            after: Vec::new(),
        }
    }

    pub fn after<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.after = ids.into_iter().collect();
        self
    }
}

/// Result of placing a whole batch.
#[derive(Debug, Clone, Default)]
pub struct PlacerOutput {
    pub choices: Vec<SlotChoice>,
    pub unplaced: Vec<String>,
    pub reservations: Reservations,
}

/// Pick a slot for one chunk without touching the reservation set.
pub fn place_chunk(
    chunk: &Chunk,
    preferred_hours: &[i32],
    grid: &SlotGrid,
    reservations: &Reservations,
) -> Option<SlotChoice> {
    place_chunk_after(chunk, preferred_hours, grid, reservations, None)
}

/// Like [`place_chunk`], but only slots strictly later than `not_before`
/// are considered.
pub fn place_chunk_after(
    chunk: &Chunk,
    preferred_hours: &[i32],
    grid: &SlotGrid,
    reservations: &Reservations,
    not_before: Option<SlotKey>,
) -> Option<SlotChoice> {
    let free = |key: &SlotKey| {
        grid.contains(*key)
            && !reservations.is_reserved(*key)
            && not_before.map_or(true, |bound| *key > bound)
    };

    let preferred = candidate_slots(preferred_hours)
        .into_iter()
        .filter(|key| free(key))
        .find_map(|key| grid.instant(key).map(|start| (key, start, true)));

    let chosen = preferred.or_else(|| {
        grid.keys()
            .iter()
            .filter(|key| free(*key))
            .find_map(|key| grid.instant(*key).map(|start| (*key, start, false)))
    });

    chosen.map(|(key, start, preferred)| SlotChoice {
        key,
        placement: Placement::new(chunk.id.clone(), start, chunk.duration()),
        preferred,
    })
}

/// Place an already-ordered batch, threading reservations through it.
pub fn place_all(
    requests: &[PlacementRequest<'_>],
    grid: &SlotGrid,
    reservations: Reservations,
) -> PlacerOutput {
    let start = PlacerOutput {
        reservations,
        ..PlacerOutput::default()
    };

    requests.iter().fold(start, |mut out, request| {
        let not_before = request
            .after
            .iter()
            .filter_map(|id| {
                out.choices
                    .iter()
                    .find(|c| c.placement.chunk_id == *id)
                    .map(|c| c.key)
            })
            .max();

        match place_chunk_after(
            request.chunk,
            &request.preferred_hours,
            grid,
            &out.reservations,
            not_before,
        ) {
            Some(choice) => {
                out.reservations = out.reservations.reserve(choice.key);
                out.choices.push(choice);
            }
            None => out.unplaced.push(request.chunk.id.clone()),
        }
        out
    })
}
