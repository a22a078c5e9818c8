//! Chunk ordering policy: the order in which the placer tries chunks.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::chunk::Chunk;

/// How chunks are ordered before placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingMode {
    /// Energy descending, then `order_index` ascending. Dependencies are
    /// carried but not enforced.
    #[default]
    EnergyFirst,
    /// Same key, but a chunk is never tried before a dependency that is part
    /// of the same batch, and is only placed in a slot after the ones its
    /// placed dependencies took.
    DependencyAware,
}

/// Energy descending, then `order_index` ascending.
pub fn compare_chunks(a: &Chunk, b: &Chunk) -> Ordering {
    b.energy
        .rank()
        .cmp(&a.energy.rank())
        .then_with(|| a.order_index.cmp(&b.order_index))
}

/// Deterministic processing order. Equal keys keep their input order.
pub fn order_chunks(chunks: &[Chunk], mode: OrderingMode) -> Vec<&Chunk> {
    let mut ordered: Vec<&Chunk> = chunks.iter().collect();
    ordered.sort_by(|a, b| compare_chunks(a, b));

    match mode {
        OrderingMode::EnergyFirst => ordered,
        OrderingMode::DependencyAware => respect_dependencies(ordered),
    }
}

/// Kahn's algorithm over the batch, always releasing the ready chunk that
/// comes first in energy order. Dependencies outside the batch are ignored.
/// Chunks caught in a cycle are appended in energy order.
fn respect_dependencies(ordered: Vec<&Chunk>) -> Vec<&Chunk> {
    let mut position: HashMap<&str, usize> = HashMap::new();
    for (idx, chunk) in ordered.iter().enumerate() {
        position.entry(chunk.id.as_str()).or_insert(idx);
    }

    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); ordered.len()];
    let mut pending: Vec<usize> = vec![0; ordered.len()];

    for (idx, chunk) in ordered.iter().enumerate() {
        let mut seen = HashSet::new();
        for dep in &chunk.dependencies {
            let Some(&dep_idx) = position.get(dep.as_str()) else {
                continue;
            };
            if dep_idx == idx || !seen.insert(dep_idx) {
                continue;
            }
            dependents[dep_idx].push(idx);
            pending[idx] += 1;
        }
    }

    let mut ready: BTreeSet<usize> = (0..ordered.len()).filter(|i| pending[*i] == 0).collect();
    let mut emitted = vec![false; ordered.len()];
    let mut result = Vec::with_capacity(ordered.len());

    while let Some(idx) = ready.pop_first() {
        emitted[idx] = true;
        result.push(ordered[idx]);
        for &next in &dependents[idx] {
            pending[next] -= 1;
            if pending[next] == 0 {
                ready.insert(next);
            }
        }
    }

    if result.len() < ordered.len() {
        let stuck: Vec<&str> = ordered
            .iter()
            .enumerate()
            .filter(|(i, _)| !emitted[*i])
            .map(|(_, c)| c.id.as_str())
            .collect();
        tracing::warn!(chunks = ?stuck, "dependency cycle, falling back to energy order");
        result.extend(
            ordered
                .iter()
                .enumerate()
                .filter(|(i, _)| !emitted[*i])
                .map(|(_, c)| *c),
        );
    }

    result
}
