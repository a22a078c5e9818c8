//! Scheduling session: one auto-schedule invocation.
//!
//! `(chunks, date, preferences) -> ScheduleOutcome`. Pure and synchronous;
//! persisting the outcome is the caller's job.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::chunk::{Chunk, Placement};
use crate::error::ScheduleError;
use crate::preferences::{ResolvedPreferences, UserPreferences};

use super::energy::preferred_hours;
use super::grid::SlotGrid;
use super::ordering::{order_chunks, OrderingMode};
use super::placer::{place_all, PlacementRequest, Reservations};

/// Placements in placement order, plus the chunks that did not fit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleOutcome {
    pub date: NaiveDate,
    pub placements: Vec<Placement>,
    /// Chunk ids left unscheduled because every slot was taken.
    pub unplaced: Vec<String>,
}

impl ScheduleOutcome {
    pub fn placed_count(&self) -> usize {
        self.placements.len()
    }

    pub fn unplaced_count(&self) -> usize {
        self.unplaced.len()
    }

    pub fn is_complete(&self) -> bool {
        self.unplaced.is_empty()
    }

    pub fn placement_for(&self, chunk_id: &str) -> Option<&Placement> {
        self.placements.iter().find(|p| p.chunk_id == chunk_id)
    }
}

/// Scheduler configured for one user's preferences.
#[derive(Debug, Clone)]
pub struct SchedulingSession {
    prefs: ResolvedPreferences,
    ordering: OrderingMode,
}

impl SchedulingSession {
    pub fn new(prefs: &UserPreferences) -> Self {
        Self::with_resolved(prefs.resolve())
    }

    pub fn with_resolved(prefs: ResolvedPreferences) -> Self {
        Self {
            prefs,
            ordering: OrderingMode::default(),
        }
    }

    pub fn with_ordering(mut self, ordering: OrderingMode) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn preferences(&self) -> &ResolvedPreferences {
        &self.prefs
    }

    pub fn ordering(&self) -> OrderingMode {
        self.ordering
    }

    /// Schedule `chunks` onto `date`.
    ///
    /// # Errors
    /// `EmptyInput` when `chunks` is empty, `InvalidWorkWindow` when the
    /// resolved work start is not before the work end.
    pub fn run(&self, chunks: &[Chunk], date: NaiveDate) -> Result<ScheduleOutcome, ScheduleError> {
        if chunks.is_empty() {
            return Err(ScheduleError::EmptyInput);
        }

        let ws = self.prefs.work_start_hour;
        let we = self.prefs.work_end_hour;
        if !self.prefs.has_valid_window() {
            tracing::warn!(start = ws, end = we, "work window is empty, nothing scheduled");
            return Err(ScheduleError::InvalidWorkWindow { start: ws, end: we });
        }

        let grid = SlotGrid::new(date, ws, we, self.prefs.timezone);

        let mut seen = HashSet::new();
        let ordered: Vec<&Chunk> = order_chunks(chunks, self.ordering)
            .into_iter()
            .filter(|chunk| seen.insert(chunk.id.as_str()))
            .collect();
        if ordered.len() < chunks.len() {
            tracing::warn!(
                skipped = chunks.len() - ordered.len(),
                "duplicate chunk ids in batch, placing each once"
            );
        }

        let requests: Vec<PlacementRequest<'_>> = ordered
            .into_iter()
            .map(|chunk| {
                let hours = preferred_hours(chunk.energy, ws, we, &self.prefs.energy_profile);
                let request = PlacementRequest::new(chunk, hours);
                match self.ordering {
                    OrderingMode::EnergyFirst => request,
                    OrderingMode::DependencyAware => request.after(
                        chunk
                            .dependencies
                            .iter()
                            .map(String::as_str)
                            .filter(|dep| *dep != chunk.id && seen.contains(dep)),
                    ),
                }
            })
            .collect();

        let output = place_all(&requests, &grid, Reservations::new());

        for choice in &output.choices {
            tracing::debug!(
                chunk = %choice.placement.chunk_id,
                slot = %choice.key,
                preferred = choice.preferred,
                "placed chunk"
            );
        }
        if !output.unplaced.is_empty() {
            tracing::warn!(
                %date,
                unplaced = output.unplaced.len(),
                slots = grid.len(),
                "not every chunk fit in the work window"
            );
        }
        tracing::info!(
            %date,
            placed = output.choices.len(),
            unplaced = output.unplaced.len(),
            "auto-schedule finished"
        );

        Ok(ScheduleOutcome {
            date,
            placements: output.choices.into_iter().map(|c| c.placement).collect(),
            unplaced: output.unplaced,
        })
    }
}

/// Schedule with default ordering.
pub fn schedule(
    chunks: &[Chunk],
    date: NaiveDate,
    prefs: &UserPreferences,
) -> Result<ScheduleOutcome, ScheduleError> {
    SchedulingSession::new(prefs).run(chunks, date)
}

/// Same as [`schedule`], taking the date as `YYYY-MM-DD`.
pub fn schedule_str(
    chunks: &[Chunk],
    date: &str,
    prefs: &UserPreferences,
) -> Result<ScheduleOutcome, ScheduleError> {
    let date = parse_date(date)?;
    schedule(chunks, date, prefs)
}

pub fn parse_date(value: &str) -> Result<NaiveDate, ScheduleError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ScheduleError::InvalidDate(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::Energy;
    use crate::preferences::{EnergyProfile, WorkHours};
    use chrono::{Timelike, Utc, TimeZone};

    fn chunk(id: &str, energy: Energy, order_index: i32) -> Chunk {
        Chunk::new("task", id, 10)
            .with_id(id)
            .with_energy(energy)
            .with_order_index(order_index)
    }

    fn prefs(evening: u32) -> UserPreferences {
        UserPreferences {
            energy_profile: Some(EnergyProfile {
                morning: 80,
                afternoon: 60,
                evening,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn reference_scenario_places_by_energy() {
        let chunks = vec![
            chunk("A", Energy::High, 0),
            chunk("B", Energy::Med, 1),
            chunk("C", Energy::Low, 2),
        ];
        let outcome = schedule_str(&chunks, "2025-03-03", &prefs(20)).unwrap();

        let at = |h| Utc.with_ymd_and_hms(2025, 3, 3, h, 0, 0).unwrap();
        assert_eq!(outcome.placement_for("A").unwrap().scheduled_start, at(9));
        assert_eq!(outcome.placement_for("B").unwrap().scheduled_start, at(11));
        assert_eq!(outcome.placement_for("C").unwrap().scheduled_start, at(16));
        assert!(outcome.is_complete());
    }

    #[test]
    fn placements_come_back_in_processing_order() {
        let chunks = vec![
            chunk("low", Energy::Low, 0),
            chunk("high", Energy::High, 0),
        ];
        let outcome = schedule_str(&chunks, "2025-03-03", &prefs(40)).unwrap();
        let ids: Vec<_> = outcome.placements.iter().map(|p| p.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["high", "low"]);
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = schedule_str(&[], "2025-03-03", &UserPreferences::default()).unwrap_err();
        assert_eq!(err, ScheduleError::EmptyInput);
    }

    #[test]
    fn inverted_window_is_rejected() {
        let prefs = UserPreferences {
            work_hours: Some(WorkHours {
                start: "18:00".into(),
                end: "08:00".into(),
            }),
            ..Default::default()
        };
        let err = schedule_str(&[chunk("a", Energy::Med, 0)], "2025-03-03", &prefs).unwrap_err();
        assert_eq!(err, ScheduleError::InvalidWorkWindow { start: 18, end: 8 });
    }

    #[test]
    fn malformed_date_is_rejected() {
        let err = schedule_str(&[chunk("a", Energy::Med, 0)], "03/03/2025", &prefs(40)).unwrap_err();
        assert_eq!(err, ScheduleError::InvalidDate("03/03/2025".into()));
    }

    #[test]
    fn timezone_shifts_emitted_instants() {
        let prefs = UserPreferences {
            timezone: Some("America/New_York".into()),
            ..prefs(40)
        };
        let outcome = schedule_str(&[chunk("a", Energy::High, 0)], "2025-07-01", &prefs).unwrap();
        // 09:00 EDT
        assert_eq!(outcome.placements[0].scheduled_start.hour(), 13);
    }

    #[test]
    fn dependency_aware_session_places_dependency_first() {
        let chunks = vec![
            chunk("write", Energy::High, 1).with_dependencies(["research"]),
            chunk("research", Energy::Low, 0),
        ];
        let session = SchedulingSession::new(&prefs(40)).with_ordering(OrderingMode::DependencyAware);
        let outcome = session.run(&chunks, NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()).unwrap();
        let ids: Vec<_> = outcome.placements.iter().map(|p| p.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["research", "write"]);

        let research = outcome.placement_for("research").unwrap().scheduled_start;
        let write = outcome.placement_for("write").unwrap().scheduled_start;
        assert_eq!(research, Utc.with_ymd_and_hms(2025, 3, 3, 15, 0, 0).unwrap());
        assert_eq!(write, Utc.with_ymd_and_hms(2025, 3, 3, 15, 30, 0).unwrap());
        assert!(write > research);
    }

    #[test]
    fn energy_first_session_lets_dependents_start_earlier() {
        let chunks = vec![
            chunk("write", Energy::High, 1).with_dependencies(["research"]),
            chunk("research", Energy::Low, 0),
        ];
        let outcome = schedule_str(&chunks, "2025-03-03", &prefs(40)).unwrap();
        let research = outcome.placement_for("research").unwrap().scheduled_start;
        let write = outcome.placement_for("write").unwrap().scheduled_start;
        assert!(write < research);
    }

    #[test]
    fn dependent_without_a_later_slot_stays_unplaced() {
        let prefs = UserPreferences {
            work_hours: Some(WorkHours {
                start: "09:00".into(),
                end: "10:00".into(),
            }),
            ..prefs(40)
        };
        let chunks = vec![
            chunk("first", Energy::High, 0),
            chunk("second", Energy::High, 1),
            chunk("after", Energy::High, 2).with_dependencies(["second"]),
        ];
        let session = SchedulingSession::new(&prefs).with_ordering(OrderingMode::DependencyAware);
        let outcome = session.run(&chunks, NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()).unwrap();
        assert_eq!(outcome.placed_count(), 2);
        assert_eq!(outcome.unplaced, vec!["after".to_string()]);
    }

    #[test]
    fn duplicate_chunk_ids_are_placed_once() {
        let twice = chunk("twice", Energy::Med, 0);
        let chunks = vec![twice.clone(), twice, chunk("other", Energy::Med, 1)];
        let outcome = schedule_str(&chunks, "2025-03-03", &prefs(40)).unwrap();

        let ids: Vec<_> = outcome.placements.iter().map(|p| p.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["twice", "other"]);
        assert!(outcome.is_complete());
    }
}
