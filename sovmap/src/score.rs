//! Per-pixel owner scoring.
//!
//! Aggregates the influence of nearby seed systems through an
//! inverse-square-with-bias kernel and picks the dominant owner.

use smallvec::SmallVec;

use crate::config::RenderTuning;
use crate::model::MapState;

/// Scratch accumulator reused across pixels by a worker.
pub(crate) type ScoreAccumulator = SmallVec<[(usize, f64); 8]>;

/// Score pixel `(x, y)` against every seed system within range.
///
/// Returns the dominant owner's arena index and its aggregated sum, or
/// `None` when the best sum stays below the cutoff. Candidate entries are
/// ordered by owner id before the argmax so the result does not depend on
/// seed visit order.
pub(crate) fn score_pixel(
    x: u32,
    y: u32,
    state: &MapState,
    tuning: &RenderTuning,
    acc: &mut ScoreAccumulator,
) -> (Option<usize>, f64) {
    acc.clear();

    for &seed in &state.seeds {
        let system = &state.systems[seed];
        let dx = x as f64 - system.x as f64;
        let dy = y as f64 - system.y as f64;
        let dist_sq = dx * dx + dy * dy;
        if dist_sq > tuning.seed_range_sq {
            continue;
        }
        for &(owner, power) in &system.influences {
            let contribution = power / (tuning.distance_bias + dist_sq);
            match acc.iter_mut().find(|entry| entry.0 == owner) {
                Some(entry) => entry.1 += contribution,
                None => acc.push((owner, contribution)),
            }
        }
    }

    acc.sort_unstable_by_key(|&(owner, _)| state.owners[owner].id);

    let mut best_owner = None;
    let mut best_sum = 0.0;
    for &(owner, sum) in acc.iter() {
        if sum > best_sum {
            best_owner = Some(owner);
            best_sum = sum;
        }
    }
    if best_sum < tuning.influence_cutoff {
        best_owner = None;
    }
    (best_owner, best_sum)
}

// ============================================================================
// Tests
// ============================================================================
