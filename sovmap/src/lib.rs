//! Sovmap - sovereignty influence map renderer.
//!
//! Takes a universe of territory-owning entities, star systems with
//! pre-projected pixel positions, and a jump graph between systems, and
//! renders a translucent influence map: each pixel colored by its dominant
//! owner, alpha shaded by influence strength, thin borders at owner
//! transitions. Alongside the image it produces a per-pixel owner index
//! (for diffing between runs) and centroid label positions for connected
//! owner regions.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sovmap::{Map, MapConfig};
//!
//! let map = Map::new(MapConfig::default());
//! map.load_data_file("universe.dat")?;
//! map.calculate_influence()?;
//! map.render_multithreaded()?;
//! map.save_png("influence.png")?;
//!
//! for label in map.calculate_labels() {
//!     println!("{}: ({}, {})", label.owner_id, label.x, label.y);
//! }
//! ```

pub(crate) mod common;
mod config;
mod dump;
mod error;
mod influence;
mod labels;
mod map;
mod model;
mod owner_index;
mod render;
mod score;

pub use config::{MapConfig, RenderTuning};
pub use dump::{decode_dump, encode_dump, DumpData, JumpEntry, OwnerRecord, SystemRecord};
pub use error::MapError;
pub use labels::OwnerLabel;
pub use map::Map;
