//! Domain model: owners, solar systems, and the table state behind the map.
//!
//! Owners and systems live in contiguous arenas; every cross-reference
//! (system owner, influence entries, jump adjacency, seed list) is a dense
//! index into those arenas. The arenas are immutable during rendering except
//! for the per-owner pixel counters, which are atomic.

use std::collections::HashMap;
use std::sync::atomic::AtomicU64;

use rasterium::Color;
use smallvec::SmallVec;

use crate::common::Buffer2;
use crate::dump::DumpData;
use crate::MapError;

/// A territory-owning entity.
#[derive(Debug)]
pub(crate) struct Owner {
    /// Nonzero identity.
    pub id: u64,
    pub name: String,
    pub color: Color,
    /// NPC owners claim pixels in the owner index but are never shaded.
    pub npc: bool,
    /// Pixels claimed during the last render. Incremented atomically by the
    /// column workers; meaningful only after they have joined.
    pub pixel_count: AtomicU64,
}

/// A star system with a pre-projected pixel position.
#[derive(Debug)]
pub(crate) struct SolarSystem {
    pub id: u64,
    pub constellation_id: u64,
    pub region_id: u64,
    pub x: u32,
    pub y: u32,
    pub has_station: bool,
    /// Sovereignty power, >= 0.
    pub sov_power: f64,
    /// Arena index of the sovereignty holder, if any.
    pub owner: Option<usize>,
    /// Sparse owner -> influence map in insertion order. At most one entry
    /// per owner; written only by the propagator.
    pub influences: SmallVec<[(usize, f64); 4]>,
}

impl SolarSystem {
    /// Merge `value` into this system's influence entry for `owner`,
    /// appending a new entry if the owner is not present yet.
    pub fn add_influence(&mut self, owner: usize, value: f64) {
        for entry in &mut self.influences {
            if entry.0 == owner {
                entry.1 += value;
                return;
            }
        }
        self.influences.push((owner, value));
    }
}

/// Everything behind the coordinator's read/write lock: dimensions, arenas,
/// jump adjacency, the seed list, and the optional previous-run owner index.
#[derive(Debug)]
pub(crate) struct MapState {
    pub width: u32,
    pub height: u32,
    pub sample_rate: u32,

    pub owners: Vec<Owner>,
    pub owner_ids: HashMap<u64, usize>,
    pub systems: Vec<SolarSystem>,
    pub system_ids: HashMap<u64, usize>,
    /// Jump adjacency parallel to `systems`. Empty = no neighbors. Stored as
    /// given; symmetry is not assumed.
    pub adjacency: Vec<Vec<usize>>,
    /// Systems that emit influence: sovereignty-owned or reached by
    /// propagation, in visit order.
    pub seeds: Vec<usize>,
    pub old_owner_index: Option<Buffer2<u64>>,

    pub loaded: bool,
    pub influence_calculated: bool,
}

impl MapState {
    pub fn new(width: u32, height: u32, sample_rate: u32) -> Self {
        Self {
            width,
            height,
            sample_rate,
            owners: Vec::new(),
            owner_ids: HashMap::new(),
            systems: Vec::new(),
            system_ids: HashMap::new(),
            adjacency: Vec::new(),
            seeds: Vec::new(),
            old_owner_index: None,
            loaded: false,
            influence_calculated: false,
        }
    }

    /// Replace the tables with the decoded universe, resolving every id
    /// reference to an arena index.
    pub fn install(&mut self, data: DumpData) -> Result<(), MapError> {
        let mut owners = Vec::with_capacity(data.owners.len());
        let mut owner_ids = HashMap::with_capacity(data.owners.len());
        for record in data.owners {
            if record.id == 0 {
                return Err(MapError::DataCorrupt("owner id 0 is reserved".into()));
            }
            if owner_ids.insert(record.id, owners.len()).is_some() {
                return Err(MapError::DataCorrupt(format!(
                    "duplicate owner id {}",
                    record.id
                )));
            }
            owners.push(Owner {
                id: record.id,
                name: record.name,
                color: record.color,
                npc: record.npc,
                pixel_count: AtomicU64::new(0),
            });
        }

        let mut systems = Vec::with_capacity(data.systems.len());
        let mut system_ids = HashMap::with_capacity(data.systems.len());
        for record in data.systems {
            if record.id == 0 {
                return Err(MapError::DataCorrupt("system id 0 is reserved".into()));
            }
            if !record.sov_power.is_finite() || record.sov_power < 0.0 {
                return Err(MapError::DataCorrupt(format!(
                    "system {} has impossible sov power {}",
                    record.id, record.sov_power
                )));
            }
            let owner = match record.owner_id {
                0 => None,
                id => Some(*owner_ids.get(&id).ok_or_else(|| {
                    MapError::DataCorrupt(format!("system {} references unknown owner {}", record.id, id))
                })?),
            };
            if system_ids.insert(record.id, systems.len()).is_some() {
                return Err(MapError::DataCorrupt(format!(
                    "duplicate system id {}",
                    record.id
                )));
            }
            systems.push(SolarSystem {
                id: record.id,
                constellation_id: record.constellation_id,
                region_id: record.region_id,
                x: record.x,
                y: record.y,
                has_station: record.has_station,
                sov_power: record.sov_power,
                owner,
                influences: SmallVec::new(),
            });
        }

        let mut adjacency = vec![Vec::new(); systems.len()];
        for entry in data.jumps {
            if entry.system_id == 0 {
                return Err(MapError::DataCorrupt("jump source id 0 is forbidden".into()));
            }
            let source = *system_ids.get(&entry.system_id).ok_or_else(|| {
                MapError::DataCorrupt(format!("jump entry references unknown system {}", entry.system_id))
            })?;
            for neighbor_id in entry.neighbors {
                if neighbor_id == 0 {
                    return Err(MapError::DataCorrupt(
                        "jump endpoint id 0 is forbidden".into(),
                    ));
                }
                let neighbor = *system_ids.get(&neighbor_id).ok_or_else(|| {
                    MapError::DataCorrupt(format!(
                        "jump from system {} references unknown system {}",
                        entry.system_id, neighbor_id
                    ))
                })?;
                adjacency[source].push(neighbor);
            }
        }

        self.owners = owners;
        self.owner_ids = owner_ids;
        self.systems = systems;
        self.system_ids = system_ids;
        self.adjacency = adjacency;
        self.seeds.clear();
        self.loaded = true;
        self.influence_calculated = false;
        Ok(())
    }

    /// Color of the owner with the given id, if loaded.
    pub fn owner_color_by_id(&self, id: u64) -> Option<Color> {
        self.owner_ids.get(&id).map(|&idx| self.owners[idx].color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::{JumpEntry, OwnerRecord, SystemRecord};

    fn owner_record(id: u64) -> OwnerRecord {
        OwnerRecord {
            id,
            name: format!("owner {}", id),
            color: Color::rgb(id as u8, 0, 0),
            npc: false,
        }
    }

    fn system_record(id: u64, owner_id: u64) -> SystemRecord {
        SystemRecord {
            id,
            x: 10,
            y: 20,
            region_id: 1,
            constellation_id: 2,
            has_station: false,
            sov_power: 2.5,
            owner_id,
        }
    }

    #[test]
    fn test_add_influence_merges_per_owner() {
        let mut sys = SolarSystem {
            id: 1,
            constellation_id: 0,
            region_id: 0,
            x: 0,
            y: 0,
            has_station: false,
            sov_power: 0.0,
            owner: None,
            influences: SmallVec::new(),
        };
        sys.add_influence(3, 1.5);
        sys.add_influence(7, 2.0);
        sys.add_influence(3, 0.25);
        sys.add_influence(3, 0.25);

        assert_eq!(sys.influences.len(), 2);
        assert_eq!(sys.influences[0].0, 3);
        assert!((sys.influences[0].1 - 2.0).abs() < 1e-12);
        assert_eq!(sys.influences[1].0, 7);
        assert!((sys.influences[1].1 - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_install_resolves_references() {
        let mut state = MapState::new(64, 64, 8);
        state
            .install(DumpData {
                owners: vec![owner_record(10), owner_record(11)],
                systems: vec![system_record(1, 10), system_record(2, 0)],
                jumps: vec![JumpEntry {
                    system_id: 1,
                    neighbors: vec![2],
                }],
            })
            .unwrap();

        assert!(state.loaded);
        assert_eq!(state.owners.len(), 2);
        assert_eq!(state.systems.len(), 2);
        assert_eq!(state.systems[0].owner, Some(0));
        assert_eq!(state.systems[1].owner, None);
        assert_eq!(state.adjacency[0], vec![1]);
        assert!(state.adjacency[1].is_empty());
        assert_eq!(state.owner_color_by_id(11), Some(Color::rgb(11, 0, 0)));
        assert_eq!(state.owner_color_by_id(99), None);
    }

    #[test]
    fn test_install_rejects_unknown_owner() {
        let mut state = MapState::new(64, 64, 8);
        let err = state
            .install(DumpData {
                owners: vec![owner_record(10)],
                systems: vec![system_record(1, 42)],
                jumps: vec![],
            })
            .unwrap_err();
        assert!(matches!(err, MapError::DataCorrupt(_)));
    }

    #[test]
    fn test_install_rejects_zero_jump_endpoint() {
        let mut state = MapState::new(64, 64, 8);
        let err = state
            .install(DumpData {
                owners: vec![],
                systems: vec![system_record(1, 0)],
                jumps: vec![JumpEntry {
                    system_id: 1,
                    neighbors: vec![0],
                }],
            })
            .unwrap_err();
        assert!(matches!(err, MapError::DataCorrupt(_)));
    }

    #[test]
    fn test_install_rejects_negative_sov_power() {
        let mut state = MapState::new(64, 64, 8);
        let mut record = system_record(1, 0);
        record.sov_power = -1.0;
        let err = state
            .install(DumpData {
                owners: vec![],
                systems: vec![record],
                jumps: vec![],
            })
            .unwrap_err();
        assert!(matches!(err, MapError::DataCorrupt(_)));
    }
}
