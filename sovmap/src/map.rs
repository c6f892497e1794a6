//! Map coordinator.
//!
//! Owns the shared state: the owner/system/jump tables and seed list behind
//! a read/write lock, the shared image behind its own mutex (locked once per
//! staging flush), and the per-pixel owner index behind a mutex whose guard
//! the coordinator holds for the duration of a render while workers write
//! disjoint column slabs through a raw pointer. Joining the workers
//! establishes the happens-before edge for every index read that follows.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rasterium::Image;

use crate::common::{Buffer2, SendPtr};
use crate::config::{MapConfig, RenderTuning};
use crate::dump::{self, DumpData, SystemRecord};
use crate::influence;
use crate::labels::{self, OwnerLabel};
use crate::model::MapState;
use crate::owner_index;
use crate::render::{partition_columns, ColumnWorker};
use crate::MapError;

/// An influence map over one universe of owners, systems, and jumps.
///
/// The lifecycle is `load_data` (or [`Map::load_records`]) →
/// [`Map::calculate_influence`] → [`Map::render_multithreaded`] →
/// `save_png` / `save_owner_index` / [`Map::calculate_labels`]. Calls out of
/// order return [`MapError::InvalidState`].
#[derive(Debug)]
pub struct Map {
    tuning: RenderTuning,
    state: RwLock<MapState>,
    image: Mutex<Image>,
    index: Mutex<Buffer2<u64>>,
}

impl Map {
    /// Create an empty map. Panics if the configuration is invalid.
    pub fn new(config: MapConfig) -> Map {
        config.validate();
        Map {
            tuning: config.tuning,
            state: RwLock::new(MapState::new(
                config.width,
                config.height,
                config.sample_rate,
            )),
            image: Mutex::new(Image::new(config.width, config.height)),
            index: Mutex::new(Buffer2::new_filled(
                config.width as usize,
                config.height as usize,
                0u64,
            )),
        }
    }

    fn state_read(&self) -> RwLockReadGuard<'_, MapState> {
        self.state.read().expect("map state lock poisoned")
    }

    fn state_write(&self) -> RwLockWriteGuard<'_, MapState> {
        self.state.write().expect("map state lock poisoned")
    }

    fn image_lock(&self) -> MutexGuard<'_, Image> {
        self.image.lock().expect("image lock poisoned")
    }

    fn index_lock(&self) -> MutexGuard<'_, Buffer2<u64>> {
        self.index.lock().expect("owner index lock poisoned")
    }

    pub fn width(&self) -> u32 {
        self.state_read().width
    }

    pub fn height(&self) -> u32 {
        self.state_read().height
    }

    pub fn sample_rate(&self) -> u32 {
        self.state_read().sample_rate
    }

    /// Display name of a loaded owner.
    pub fn owner_name(&self, id: u64) -> Option<String> {
        let state = self.state_read();
        state
            .owner_ids
            .get(&id)
            .map(|&idx| state.owners[idx].name.clone())
    }

    /// Snapshot of a loaded system, by id.
    pub fn system_info(&self, id: u64) -> Option<SystemRecord> {
        let state = self.state_read();
        state.system_ids.get(&id).map(|&idx| {
            let system = &state.systems[idx];
            SystemRecord {
                id: system.id,
                x: system.x,
                y: system.y,
                region_id: system.region_id,
                constellation_id: system.constellation_id,
                has_station: system.has_station,
                sov_power: system.sov_power,
                owner_id: system.owner.map(|o| state.owners[o].id).unwrap_or(0),
            }
        })
    }

    // ========================================================================
    // Loading and reconfiguration
    // ========================================================================

    /// Resize the raster, resetting the image and owner index and dropping
    /// any loaded old-owner index.
    pub fn update_size(&self, width: u32, height: u32, sample_rate: u32) {
        MapConfig {
            width,
            height,
            sample_rate,
            tuning: self.tuning,
        }
        .validate();

        let mut state = self.state_write();
        state.width = width;
        state.height = height;
        state.sample_rate = sample_rate;
        state.old_owner_index = None;
        *self.image_lock() = Image::new(width, height);
        *self.index_lock() = Buffer2::new_filled(width as usize, height as usize, 0u64);
    }

    /// Decode and load a universe dump (see the crate's binary dump format).
    pub fn load_data(&self, bytes: &[u8]) -> Result<(), MapError> {
        self.load_records(dump::decode_dump(bytes)?)
    }

    /// Load a universe dump from a file.
    pub fn load_data_file<P: AsRef<Path>>(&self, path: P) -> Result<(), MapError> {
        let bytes = std::fs::read(&path).map_err(|source| MapError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        self.load_data(&bytes)
    }

    /// Load already-decoded records, replacing any previous universe.
    pub fn load_records(&self, data: DumpData) -> Result<(), MapError> {
        let mut state = self.state_write();
        tracing::info!(
            "loading {} owners, {} systems, {} jump entries",
            data.owners.len(),
            data.systems.len(),
            data.jumps.len()
        );
        state.install(data)
    }

    // ========================================================================
    // Influence and rendering
    // ========================================================================

    /// Seed and propagate influence through the jump graph. Safe to call
    /// repeatedly; every call starts from a clean slate.
    pub fn calculate_influence(&self) -> Result<(), MapError> {
        let mut state = self.state_write();
        if !state.loaded {
            return Err(MapError::InvalidState(
                "load_data must be called before calculate_influence",
            ));
        }
        influence::calculate_influence(&mut state, &self.tuning);
        state.influence_calculated = true;
        tracing::info!("influence propagated to {} seed systems", state.seeds.len());
        Ok(())
    }

    /// Render on the current thread with a single column worker.
    pub fn render(&self) -> Result<(), MapError> {
        self.render_with_workers(1)
    }

    /// Render with one column worker per available hardware thread.
    pub fn render_multithreaded(&self) -> Result<(), MapError> {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(1);
        self.render_with_workers(workers)
    }

    fn render_with_workers(&self, workers: u32) -> Result<(), MapError> {
        // Reset pass: counters, image, and index start from zero so that
        // back-to-back renders produce identical output.
        {
            let state = self.state_write();
            if !state.loaded {
                return Err(MapError::InvalidState(
                    "load_data must be called before render",
                ));
            }
            if !state.influence_calculated {
                return Err(MapError::InvalidState(
                    "calculate_influence must be called before render",
                ));
            }
            for owner in &state.owners {
                owner.pixel_count.store(0, std::sync::atomic::Ordering::Relaxed);
            }
            self.image_lock().reset();
            self.index_lock().fill(0);
        }

        let state = self.state_read();
        let mut index = self.index_lock();
        let slabs = partition_columns(state.width, workers);
        tracing::info!(
            "rendering {}x{} with {} column workers",
            state.width,
            state.height,
            slabs.len()
        );

        // Workers write disjoint column slabs of the index; the guard stays
        // held here until all of them have joined.
        let index_ptr = SendPtr::new(index.cells_mut().as_mut_ptr());
        let state_ref = &*state;
        let results: Vec<Result<(), MapError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = slabs
                .iter()
                .map(|&(start_x, end_x)| {
                    scope.spawn(move || {
                        ColumnWorker::new(
                            state_ref,
                            &self.tuning,
                            &self.image,
                            index_ptr,
                            start_x,
                            end_x,
                        )
                        .render()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        });

        if let Some(error) = results.into_iter().find_map(Result::err) {
            // Discard the partial render.
            self.image_lock().reset();
            index.fill(0);
            return Err(error);
        }
        Ok(())
    }

    // ========================================================================
    // Outputs
    // ========================================================================

    /// Write the rendered image as an 8-bit RGBA PNG.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), MapError> {
        self.image_lock()
            .save_png(&path)
            .map_err(|e| attach_path(e, path.as_ref()))
    }

    /// Snapshot of the rendered RGBA bytes, row-major.
    pub fn image_rgba(&self) -> Vec<u8> {
        self.image_lock().bytes().to_vec()
    }

    /// Snapshot of the owner index, row-major, 0 = no owner.
    pub fn owner_index_snapshot(&self) -> Vec<u64> {
        self.index_lock().cells().to_vec()
    }

    /// Rendered pixel count per owner id, in load order.
    pub fn pixel_counts(&self) -> Vec<(u64, u64)> {
        let state = self.state_read();
        state
            .owners
            .iter()
            .map(|owner| {
                (
                    owner.id,
                    owner.pixel_count.load(std::sync::atomic::Ordering::Relaxed),
                )
            })
            .collect()
    }

    /// Serialize the owner index in the `SOVNV1.0` format.
    pub fn save_owner_index<P: AsRef<Path>>(&self, path: P) -> Result<(), MapError> {
        let bytes = owner_index::encode_owner_index(&self.index_lock());
        std::fs::write(&path, bytes).map_err(|source| MapError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        })
    }

    /// Load a previous run's owner index for the hatched change overlay.
    pub fn load_old_owner_index<P: AsRef<Path>>(&self, path: P) -> Result<(), MapError> {
        let bytes = std::fs::read(&path).map_err(|source| MapError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        let mut state = self.state_write();
        let index = owner_index::decode_owner_index(&bytes, state.width, state.height)?;
        state.old_owner_index = Some(index);
        Ok(())
    }

    /// Install a previous run's owner index from a raw row-major buffer
    /// (0 = no owner).
    pub fn set_old_owner_index(
        &self,
        ids: Vec<u64>,
        width: u32,
        height: u32,
    ) -> Result<(), MapError> {
        let mut state = self.state_write();
        if width != state.width || height != state.height {
            return Err(MapError::DimensionMismatch {
                expected_width: state.width,
                expected_height: state.height,
                found_width: width,
                found_height: height,
            });
        }
        if ids.len() != width as usize * height as usize {
            return Err(MapError::DataCorrupt(format!(
                "old owner index has {} cells, expected {}",
                ids.len(),
                width as usize * height as usize
            )));
        }
        state.old_owner_index = Some(Buffer2::new(width as usize, height as usize, ids));
        Ok(())
    }

    pub fn has_old_owner_index(&self) -> bool {
        self.state_read().old_owner_index.is_some()
    }

    /// Render the old owner index as an opaque PNG, for inspecting what the
    /// hatch overlay will compare against.
    pub fn save_old_owner_debug_png<P: AsRef<Path>>(&self, path: P) -> Result<(), MapError> {
        let state = self.state_read();
        let old = state
            .old_owner_index
            .as_ref()
            .ok_or(MapError::InvalidState("no old owner index loaded"))?;

        let mut debug_image = Image::new(state.width, state.height);
        for y in 0..state.height {
            for x in 0..state.width {
                let color = match *old.get(x as usize, y as usize) {
                    0 => rasterium::Color::BLACK,
                    id => state
                        .owner_color_by_id(id)
                        .unwrap_or(rasterium::Color::WHITE),
                };
                debug_image.set_pixel(x, y, color)?;
            }
        }
        debug_image
            .save_png(&path)
            .map_err(|e| attach_path(e, path.as_ref()))
    }

    // ========================================================================
    // Labels
    // ========================================================================

    /// Extract one centroid label per connected owner region, scanning the
    /// owner index on the configured sampling grid. Consumes the index:
    /// every sampled cell is zeroed, so serialize the index first if both
    /// outputs are needed.
    pub fn calculate_labels(&self) -> Vec<OwnerLabel> {
        let state = self.state_read();
        let mut index = self.index_lock();
        let labels = labels::extract_labels(&mut index, state.sample_rate);
        tracing::debug!("extracted {} owner labels", labels.len());
        labels
    }
}

fn attach_path(e: rasterium::Error, path: &Path) -> MapError {
    match e {
        rasterium::Error::Io(source) => MapError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => other.into(),
    }
}
