//! Label extraction from the owner index.
//!
//! Scans the index on a coarse grid and flood-fills connected regions of the
//! same owner, producing one centroid label per region. Consumed cells are
//! zeroed, so extraction destroys the index.

use std::collections::VecDeque;

use crate::common::Buffer2;

/// Centroid label for one connected region of an owner's territory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerLabel {
    pub owner_id: u64,
    /// Centroid x in pixels.
    pub x: u32,
    /// Centroid y in pixels.
    pub y: u32,
    /// Number of grid cells in the region.
    pub count: u64,
}

/// Flood-fill the owner index on a grid with stride `sample_rate`, zeroing
/// each consumed cell.
pub(crate) fn extract_labels(index: &mut Buffer2<u64>, sample_rate: u32) -> Vec<OwnerLabel> {
    let width = index.width();
    let height = index.height();
    let stride = sample_rate as usize;

    let mut labels = Vec::new();
    let mut queue = VecDeque::new();
    for y in (0..height).step_by(stride) {
        for x in (0..width).step_by(stride) {
            let owner_id = *index.get(x, y);
            if owner_id == 0 {
                continue;
            }

            let mut sum_x = 0u64;
            let mut sum_y = 0u64;
            let mut count = 0u64;
            queue.push_back((x, y));
            while let Some((cx, cy)) = queue.pop_front() {
                if *index.get(cx, cy) != owner_id {
                    continue;
                }
                *index.get_mut(cx, cy) = 0;
                count += 1;
                sum_x += cx as u64;
                sum_y += cy as u64;

                if cx >= stride {
                    queue.push_back((cx - stride, cy));
                }
                if cx + stride < width {
                    queue.push_back((cx + stride, cy));
                }
                if cy >= stride {
                    queue.push_back((cx, cy - stride));
                }
                if cy + stride < height {
                    queue.push_back((cx, cy + stride));
                }
            }

            labels.push(OwnerLabel {
                owner_id,
                x: (sum_x / count + sample_rate as u64 / 2) as u32,
                y: (sum_y / count + sample_rate as u64 / 2) as u32,
                count,
            });
        }
    }
    labels
}

// ============================================================================
// Tests
// ============================================================================
