//! Column worker: rasterizes one vertical slab of the image.
//!
//! A worker scores pixels row by row, but a row's pixels are only emitted
//! while processing the row below it, because the border decision needs the
//! owner of both vertical neighbors. The loop therefore runs one synthetic
//! iteration past the last row, comparing it against a phantom all-null row,
//! so that all rows are emitted exactly once.
//!
//! Emitted pixels go into a private 16-row staging image that is flushed
//! into the shared image under its mutex whenever the window fills up.

use std::sync::atomic::Ordering;
use std::sync::Mutex;

use rasterium::{Color, Image};

use crate::common::SendPtr;
use crate::config::RenderTuning;
use crate::model::MapState;
use crate::score::{score_pixel, ScoreAccumulator};
use crate::MapError;

/// Height of the staging window.
const STAGING_ROWS: u32 = 16;

/// Map an aggregated influence score to a shading alpha:
/// `min(alpha_cap, floor(ln(ln(s + 1) + 1) * alpha_scale))`.
pub(crate) fn shade_alpha(strength: f64, tuning: &RenderTuning) -> u8 {
    let curve = ((strength + 1.0).ln() + 1.0).ln() * tuning.alpha_scale;
    (curve as i32).min(tuning.alpha_cap as i32) as u8
}

pub(crate) struct ColumnWorker<'a> {
    state: &'a MapState,
    tuning: &'a RenderTuning,
    image: &'a Mutex<Image>,
    /// Shared owner index; this worker writes only cells in its own slab.
    index: SendPtr<u64>,
    start_x: u32,
    end_x: u32,
    /// Image-space y of the staging window's top row.
    row_offset: u32,
    staging: Image,
}

impl<'a> ColumnWorker<'a> {
    pub fn new(
        state: &'a MapState,
        tuning: &'a RenderTuning,
        image: &'a Mutex<Image>,
        index: SendPtr<u64>,
        start_x: u32,
        end_x: u32,
    ) -> Self {
        assert!(start_x < end_x, "empty column slab");
        Self {
            state,
            tuning,
            image,
            index,
            start_x,
            end_x,
            row_offset: 0,
            staging: Image::new(end_x - start_x, STAGING_ROWS),
        }
    }

    pub fn render(mut self) -> Result<(), MapError> {
        let width = self.state.width;
        let height = self.state.height;
        let slab_width = (self.end_x - self.start_x) as usize;
        let old_index = self.state.old_owner_index.as_ref();

        let mut this_row: Vec<Option<usize>> = vec![None; slab_width];
        let mut prev_row: Vec<Option<usize>> = vec![None; slab_width];
        let mut this_influence = vec![0.0f64; slab_width];
        let mut prev_influence = vec![0.0f64; slab_width];
        let mut border = vec![false; slab_width];
        let mut acc = ScoreAccumulator::new();

        for y in 0..=height {
            if y < height {
                for i in 0..slab_width {
                    let x = self.start_x + i as u32;
                    let (owner, strength) = score_pixel(x, y, self.state, self.tuning, &mut acc);
                    this_row[i] = owner;
                    this_influence[i] = strength;
                    if let Some(o) = owner {
                        let owner = &self.state.owners[o];
                        owner.pixel_count.fetch_add(1, Ordering::Relaxed);
                        // SAFETY: the offset is inside the width*height index
                        // and each worker writes only cells with
                        // x in [start_x, end_x), so writers never alias.
                        unsafe {
                            self.index
                                .write(y as usize * width as usize + x as usize, owner.id);
                        }
                    }
                }
            } else {
                // Phantom row below the image: all null.
                this_row.fill(None);
            }

            if y > 0 {
                let dy = y - 1;
                let local_y = dy - self.row_offset;
                for i in 0..slab_width {
                    let Some(o) = prev_row[i] else { continue };
                    let owner = &self.state.owners[o];
                    if owner.npc {
                        continue;
                    }

                    let owner_changed = this_row[i] != prev_row[i];
                    let draw_border = border[i]
                        || owner_changed
                        || (i > 0 && prev_row[i - 1] != prev_row[i])
                        || (i + 1 < slab_width && prev_row[i + 1] != prev_row[i]);

                    let alpha = shade_alpha(prev_influence[i], self.tuning);
                    let shaded = if draw_border {
                        alpha.max(self.tuning.border_alpha_floor)
                    } else {
                        alpha
                    };
                    let x = self.start_x + i as u32;
                    // SAFETY: i < staging width by construction; local_y <
                    // STAGING_ROWS because the window is flushed as soon as
                    // its last row is written.
                    unsafe {
                        self.staging
                            .set_pixel_unchecked(i as u32, local_y, owner.color.with_alpha(shaded));
                    }

                    if let Some(old) = old_index {
                        let old_id = *old.get(x as usize, dy as usize);
                        let stride = self.tuning.hatch_stride;
                        if old_id != 0 && old_id != owner.id && (dy % stride + x) % stride == 0 {
                            let old_color = self
                                .state
                                .owner_color_by_id(old_id)
                                .unwrap_or(Color::WHITE);
                            // The hatch keeps the unboosted alpha.
                            unsafe {
                                self.staging.set_pixel_unchecked(
                                    i as u32,
                                    local_y,
                                    old_color.with_alpha(alpha),
                                );
                            }
                        }
                    }
                }

                if local_y == STAGING_ROWS - 1 {
                    self.flush(STAGING_ROWS)?;
                }
            }

            if y < height {
                for i in 0..slab_width {
                    border[i] = y == 0 || this_row[i] != prev_row[i];
                }
                std::mem::swap(&mut prev_row, &mut this_row);
                std::mem::swap(&mut prev_influence, &mut this_influence);
            }
        }

        let remaining = height - self.row_offset;
        if remaining > 0 {
            self.flush(remaining)?;
        }
        Ok(())
    }

    /// Copy the first `rows` staging rows into the shared image, then reset
    /// the window in place and advance it.
    fn flush(&mut self, rows: u32) -> Result<(), MapError> {
        {
            let mut image = self.image.lock().expect("image lock poisoned");
            image.blit_rows(&self.staging, self.start_x, self.row_offset, rows)?;
        }
        self.staging.reset();
        self.row_offset += rows;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
