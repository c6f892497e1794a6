//! Influence propagation through the jump graph.
//!
//! Each sovereignty-owned system emits a base influence that diffuses along
//! jumps with a geometric falloff, bounded by hop count. Every system touched
//! by a diffusion joins the seed list consumed by the pixel scorer.

use std::collections::HashSet;

use crate::config::RenderTuning;
use crate::model::{MapState, SolarSystem};

/// Base influence multiplier applied to the sovereignty power.
const BASE_INFLUENCE: f64 = 10.0;
/// Systems at or above this power emit the full payload with a shorter
/// starting hop budget.
const HIGH_SOV_THRESHOLD: f64 = 6.0;

/// Seed and diffuse influence for every owned system, rebuilding the seed
/// list from scratch. Calling this again re-propagates from a clean slate.
pub(crate) fn calculate_influence(state: &mut MapState, tuning: &RenderTuning) {
    let MapState {
        systems,
        adjacency,
        seeds,
        ..
    } = state;
    let adjacency: &[Vec<usize>] = adjacency;

    seeds.clear();
    for system in systems.iter_mut() {
        system.influences.clear();
    }

    let owned: Vec<usize> = (0..systems.len())
        .filter(|&idx| systems[idx].owner.is_some())
        .collect();
    tracing::debug!("seeding influence from {} owned systems", owned.len());

    let mut in_seeds = vec![false; systems.len()];
    let mut visited = HashSet::new();
    for &seed in &owned {
        let system = &systems[seed];
        let Some(owner) = system.owner else { continue };

        let (value, start_hop) = if system.sov_power >= HIGH_SOV_THRESHOLD {
            (BASE_INFLUENCE * HIGH_SOV_THRESHOLD, 1)
        } else {
            (BASE_INFLUENCE * system.sov_power / 2.0, 2)
        };

        // The visited set is per diffusion and starts with the seed itself,
        // so self-loops and cycles back to the seed are ignored.
        visited.clear();
        visited.insert(seed);
        spread(
            systems,
            adjacency,
            seeds,
            &mut in_seeds,
            &mut visited,
            seed,
            owner,
            value,
            start_hop,
            tuning,
        );
    }
}

/// Attribute `value` of `owner`'s influence to `system`, then recurse into
/// unvisited neighbors with the falloff applied, while the hop budget lasts.
#[allow(clippy::too_many_arguments)]
fn spread(
    systems: &mut [SolarSystem],
    adjacency: &[Vec<usize>],
    seeds: &mut Vec<usize>,
    in_seeds: &mut [bool],
    visited: &mut HashSet<usize>,
    system: usize,
    owner: usize,
    value: f64,
    hop: u32,
    tuning: &RenderTuning,
) {
    systems[system].add_influence(owner, value);
    if !in_seeds[system] {
        in_seeds[system] = true;
        seeds.push(system);
    }

    if hop >= tuning.hop_limit {
        return;
    }
    for &neighbor in &adjacency[system] {
        if !visited.insert(neighbor) {
            continue;
        }
        spread(
            systems,
            adjacency,
            seeds,
            in_seeds,
            visited,
            neighbor,
            owner,
            value * tuning.power_falloff,
            hop + 1,
            tuning,
        );
    }
}

// ============================================================================
// Tests
// ============================================================================
