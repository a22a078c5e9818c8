//! Energy preference resolver.
//!
//! A fixed lookup table from (energy tag, energy profile) to the hours a
//! chunk would ideally start in. Not a scored ranking.

use crate::chunk::Energy;
use crate::preferences::EnergyProfile;

use super::grid::{SlotKey, SLOT_MINUTE_OFFSETS};

/// Preferred start hours for a chunk, best first, restricted to
/// `[work_start, work_end)`.
pub fn preferred_hours(
    energy: Energy,
    work_start: i32,
    work_end: i32,
    profile: &EnergyProfile,
) -> Vec<i32> {
    let ws = work_start;
    let we = work_end;

    let hours: Vec<i32> = match energy {
        Energy::High => {
            if profile.morning > profile.afternoon {
                vec![ws, ws + 1, ws + 2]
            } else {
                vec![ws + 4, ws + 5, ws + 6]
            }
        }
        Energy::Med => vec![ws + 2, ws + 3, ws + 5, ws + 6],
        Energy::Low => {
            if profile.evening > 30 {
                vec![we - 2, we - 1]
            } else {
                vec![ws + 7, ws + 8]
            }
        }
        Energy::Unspecified => vec![ws + 2, ws + 3, ws + 4],
    };

    hours
        .into_iter()
        .filter(|hour| *hour >= work_start && *hour < work_end)
        .collect()
}

/// Expand preferred hours into slot keys: hour order first, then `:00`
/// before `:30`.
pub fn candidate_slots(hours: &[i32]) -> Vec<SlotKey> {
    hours
        .iter()
        .filter(|hour| (0..24).contains(*hour))
        .flat_map(|hour| SLOT_MINUTE_OFFSETS.map(|minute| SlotKey::new(*hour as u32, minute)))
        .collect()
}
