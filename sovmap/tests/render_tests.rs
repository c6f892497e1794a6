//! End-to-end rendering scenarios on small synthetic universes.

use rasterium::Color;
use sovmap::{
    decode_dump, encode_dump, DumpData, JumpEntry, Map, MapConfig, MapError, OwnerRecord,
    SystemRecord,
};

fn config(width: u32, height: u32) -> MapConfig {
    MapConfig {
        width,
        height,
        sample_rate: 8,
        ..Default::default()
    }
}

fn owner(id: u64, color: Color, npc: bool) -> OwnerRecord {
    OwnerRecord {
        id,
        name: format!("owner {}", id),
        color,
        npc,
    }
}

fn system(id: u64, x: u32, y: u32, sov_power: f64, owner_id: u64) -> SystemRecord {
    SystemRecord {
        id,
        x,
        y,
        region_id: 1,
        constellation_id: 1,
        has_station: false,
        sov_power,
        owner_id,
    }
}

fn pixel(rgba: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * width + x) * 4) as usize;
    rgba[i..i + 4].try_into().unwrap()
}

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(name)
}

// ============================================================================
// Scenario: empty universe
// ============================================================================

#[test]
fn test_empty_universe_renders_nothing() {
    let map = Map::new(config(64, 64));
    map.load_records(DumpData::default()).unwrap();
    map.calculate_influence().unwrap();
    map.render_multithreaded().unwrap();

    assert!(map.image_rgba().iter().all(|&b| b == 0));
    assert!(map.owner_index_snapshot().iter().all(|&id| id == 0));
    assert!(map.calculate_labels().is_empty());
    assert!(map.pixel_counts().is_empty());
}

// ============================================================================
// Scenario: single seed, sov power 6
// ============================================================================

fn single_seed_map() -> Map {
    let map = Map::new(config(512, 512));
    map.load_records(DumpData {
        owners: vec![owner(100, Color::rgb(255, 0, 0), false)],
        systems: vec![system(1, 32, 32, 6.0, 100)],
        jumps: vec![],
    })
    .unwrap();
    map.calculate_influence().unwrap();
    map
}

#[test]
fn test_single_seed_shading() {
    let map = single_seed_map();
    map.render().unwrap();
    let rgba = map.image_rgba();

    // At the seed the aggregated score is 60 / 500 = 0.12, which shades to
    // alpha 75; the pixel sits well inside the owned disc, so no border.
    assert_eq!(pixel(&rgba, 512, 32, 32), [255, 0, 0, 75]);

    // Score at distance 50: 60 / 3050 < 0.023, unowned and fully transparent.
    assert_eq!(pixel(&rgba, 512, 82, 32), [0, 0, 0, 0]);

    // Beyond the seed range (d^2 > 160 000) pixels are exactly transparent.
    assert_eq!(pixel(&rgba, 512, 480, 480), [0, 0, 0, 0]);

    // (77, 32) is owned but its right neighbor is not: a border pixel at the
    // alpha floor.
    assert_eq!(pixel(&rgba, 512, 77, 32), [255, 0, 0, 0x48]);
    assert_eq!(pixel(&rgba, 512, 78, 32), [0, 0, 0, 0]);

    // The owner index mirrors ownership.
    let index = map.owner_index_snapshot();
    assert_eq!(index[(32 * 512 + 32) as usize], 100);
    assert_eq!(index[(32 * 512 + 78) as usize], 0);
}

#[test]
fn test_single_seed_label_near_seed() {
    let map = single_seed_map();
    map.render().unwrap();

    let labels = map.calculate_labels();
    assert_eq!(labels.len(), 1);
    let label = labels[0];
    assert_eq!(label.owner_id, 100);
    assert!(label.count > 0);
    // The owned disc is clipped by the image edges, so the centroid lands
    // near the seed but not exactly on it.
    assert!(label.x.abs_diff(32) <= 8, "label x {} far from seed", label.x);
    assert!(label.y.abs_diff(32) <= 8, "label y {} far from seed", label.y);

    // Extraction consumed the sampled cells.
    let index = map.owner_index_snapshot();
    for y in (0..512).step_by(8) {
        for x in (0..512).step_by(8) {
            assert_eq!(index[y * 512 + x], 0);
        }
    }
}

// ============================================================================
// Scenario: two adjacent seeds of the same owner
// ============================================================================

#[test]
fn test_two_seeds_same_owner_deepen_shading() {
    let single = single_seed_map();
    single.render().unwrap();
    let alpha_single = pixel(&single.image_rgba(), 512, 36, 32)[3];

    let double = Map::new(config(512, 512));
    double
        .load_records(DumpData {
            owners: vec![owner(100, Color::rgb(255, 0, 0), false)],
            systems: vec![system(1, 32, 32, 6.0, 100), system(2, 40, 32, 6.0, 100)],
            jumps: vec![JumpEntry {
                system_id: 1,
                neighbors: vec![2],
            }],
        })
        .unwrap();
    double.calculate_influence().unwrap();
    double.render().unwrap();
    let alpha_double = pixel(&double.image_rgba(), 512, 36, 32)[3];

    assert!(
        alpha_double > alpha_single,
        "adding a second seed must not weaken shading ({} vs {})",
        alpha_double,
        alpha_single
    );
}

// ============================================================================
// Scenario: hatched overlay against a previous owner index
// ============================================================================

#[test]
fn test_hatch_overlay_marks_changed_ownership() {
    let map = Map::new(config(64, 64));
    map.load_records(DumpData {
        owners: vec![
            owner(100, Color::rgb(255, 0, 0), false),
            owner(200, Color::rgb(0, 0, 255), false),
        ],
        systems: vec![system(1, 32, 32, 6.0, 100)],
        jumps: vec![],
    })
    .unwrap();
    // The whole 64x64 frame was owned by 200 in the previous run.
    map.set_old_owner_index(vec![200; 64 * 64], 64, 64).unwrap();
    assert!(map.has_old_owner_index());
    map.calculate_influence().unwrap();
    map.render().unwrap();

    let rgba = map.image_rgba();
    for (x, y) in [(10u32, 10u32), (23, 17), (40, 41)] {
        let [r, g, b, a] = pixel(&rgba, 64, x, y);
        assert!(a > 0);
        if (y % 5 + x) % 5 == 0 {
            assert_eq!((r, g, b), (0, 0, 255), "hatch expected at ({}, {})", x, y);
        } else {
            assert_eq!((r, g, b), (255, 0, 0), "owner color expected at ({}, {})", x, y);
        }
    }
}

#[test]
fn test_hatch_overlay_unknown_old_owner_is_white() {
    let map = Map::new(config(64, 64));
    map.load_records(DumpData {
        owners: vec![owner(100, Color::rgb(255, 0, 0), false)],
        systems: vec![system(1, 32, 32, 6.0, 100)],
        jumps: vec![],
    })
    .unwrap();
    map.set_old_owner_index(vec![999; 64 * 64], 64, 64).unwrap();
    map.calculate_influence().unwrap();
    map.render().unwrap();

    let [r, g, b, _] = pixel(&map.image_rgba(), 64, 10, 10);
    assert_eq!((r, g, b), (255, 255, 255));
}

#[test]
fn test_old_owner_index_dimension_mismatch() {
    let map = Map::new(config(64, 64));
    let err = map.set_old_owner_index(vec![1; 32 * 32], 32, 32).unwrap_err();
    assert!(matches!(err, MapError::DimensionMismatch { .. }));
}

// ============================================================================
// Scenario: NPC owners claim territory but are never shaded
// ============================================================================

#[test]
fn test_npc_owner_is_not_drawn() {
    let map = Map::new(config(64, 64));
    map.load_records(DumpData {
        owners: vec![owner(100, Color::rgb(255, 0, 0), true)],
        systems: vec![system(1, 32, 32, 6.0, 100)],
        jumps: vec![],
    })
    .unwrap();
    map.calculate_influence().unwrap();
    map.render().unwrap();

    assert!(map.image_rgba().iter().all(|&b| b == 0));
    // The index and counters still record the territory.
    let owned_cells = map
        .owner_index_snapshot()
        .iter()
        .filter(|&&id| id == 100)
        .count() as u64;
    assert!(owned_cells > 0);
    assert_eq!(map.pixel_counts(), vec![(100, owned_cells)]);
}

// ============================================================================
// Determinism and counters
// ============================================================================

#[test]
fn test_render_is_deterministic() {
    let map = single_seed_map();
    map.render_multithreaded().unwrap();
    let first_image = map.image_rgba();
    let first_index = map.owner_index_snapshot();
    let first_counts = map.pixel_counts();

    map.render_multithreaded().unwrap();
    assert_eq!(map.image_rgba(), first_image);
    assert_eq!(map.owner_index_snapshot(), first_index);
    assert_eq!(map.pixel_counts(), first_counts);
}

#[test]
fn test_pixel_counter_matches_owner_index() {
    let map = Map::new(config(256, 256));
    map.load_records(DumpData {
        owners: vec![
            owner(100, Color::rgb(255, 0, 0), false),
            owner(200, Color::rgb(0, 255, 0), false),
        ],
        systems: vec![
            system(1, 64, 64, 6.0, 100),
            system(2, 192, 192, 3.0, 200),
        ],
        jumps: vec![],
    })
    .unwrap();
    map.calculate_influence().unwrap();
    map.render_multithreaded().unwrap();

    let index = map.owner_index_snapshot();
    for (id, count) in map.pixel_counts() {
        let cells = index.iter().filter(|&&cell| cell == id).count() as u64;
        assert_eq!(count, cells, "counter for owner {} disagrees with index", id);
    }
}

// ============================================================================
// Ordering guards
// ============================================================================

#[test]
fn test_operations_out_of_order() {
    let map = Map::new(config(64, 64));
    assert!(matches!(
        map.calculate_influence(),
        Err(MapError::InvalidState(_))
    ));
    assert!(matches!(map.render(), Err(MapError::InvalidState(_))));

    map.load_records(DumpData::default()).unwrap();
    assert!(matches!(
        map.render_multithreaded(),
        Err(MapError::InvalidState(_))
    ));

    map.calculate_influence().unwrap();
    map.render_multithreaded().unwrap();
}

// ============================================================================
// File round trips
// ============================================================================

#[test]
fn test_dump_file_round_trip() {
    let data = DumpData {
        owners: vec![owner(100, Color::rgb(255, 0, 0), false)],
        systems: vec![system(1, 32, 32, 6.0, 100), system(2, 40, 32, 0.5, 0)],
        jumps: vec![JumpEntry {
            system_id: 1,
            neighbors: vec![2],
        }],
    };
    let bytes = encode_dump(&data);
    assert_eq!(decode_dump(&bytes).unwrap(), data);

    let path = temp_path("sovmap_dump_round_trip.dat");
    std::fs::write(&path, &bytes).unwrap();

    let map = Map::new(config(512, 512));
    map.load_data_file(&path).unwrap();
    map.calculate_influence().unwrap();
    map.render().unwrap();
    assert!(map.pixel_counts()[0].1 > 0);
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_owner_index_file_round_trip() {
    let map = single_seed_map();
    map.render().unwrap();
    let rendered_index = map.owner_index_snapshot();

    let path = temp_path("sovmap_owner_index_round_trip.dat");
    map.save_owner_index(&path).unwrap();

    // Reload into a fresh map of the same dimensions.
    let other = Map::new(config(512, 512));
    other.load_old_owner_index(&path).unwrap();
    assert!(other.has_old_owner_index());

    // A map with different dimensions refuses the file.
    let mismatched = Map::new(config(64, 64));
    assert!(matches!(
        mismatched.load_old_owner_index(&path),
        Err(MapError::DimensionMismatch { .. })
    ));

    // Rendering with the old index equal to the current one draws no hatch.
    let hatched = single_seed_map();
    hatched.load_old_owner_index(&path).unwrap();
    hatched.render().unwrap();
    let plain = single_seed_map();
    plain.render().unwrap();
    assert_eq!(hatched.image_rgba(), plain.image_rgba());

    assert_eq!(rendered_index, map.owner_index_snapshot());
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_save_png_output_decodes() {
    let map = single_seed_map();
    map.render().unwrap();

    let path = temp_path("sovmap_render_output.png");
    map.save_png(&path).unwrap();
    let reloaded = image::open(&path).unwrap().into_rgba8();
    assert_eq!(reloaded.width(), 512);
    assert_eq!(reloaded.height(), 512);
    assert_eq!(reloaded.as_raw().as_slice(), map.image_rgba().as_slice());
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_missing_dump_file_is_io_error() {
    let map = Map::new(config(64, 64));
    let err = map.load_data_file("/nonexistent/universe.dat").unwrap_err();
    assert!(matches!(err, MapError::Io { .. }));
}

#[test]
fn test_save_old_owner_debug_png() {
    let map = Map::new(config(16, 16));
    map.load_records(DumpData {
        owners: vec![owner(100, Color::rgb(9, 8, 7), false)],
        systems: vec![],
        jumps: vec![],
    })
    .unwrap();
    assert!(matches!(
        map.save_old_owner_debug_png(temp_path("sovmap_never_written.png")),
        Err(MapError::InvalidState(_))
    ));

    let mut ids = vec![0u64; 16 * 16];
    ids[5 * 16 + 3] = 100; // known owner at (3, 5)
    ids[0] = 42; // unknown owner at (0, 0)
    map.set_old_owner_index(ids, 16, 16).unwrap();

    let path = temp_path("sovmap_old_owner_debug.png");
    map.save_old_owner_debug_png(&path).unwrap();
    let img = image::open(&path).unwrap().into_rgba8();
    assert_eq!(img.get_pixel(3, 5).0, [9, 8, 7, 255]);
    assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255, 255]);
    assert_eq!(img.get_pixel(1, 1).0, [0, 0, 0, 255]);
    std::fs::remove_file(&path).ok();
}

// ============================================================================
// Loaded-data inspection
// ============================================================================

#[test]
fn test_owner_and_system_lookup() {
    let map = Map::new(config(64, 64));
    let record = SystemRecord {
        id: 5,
        x: 12,
        y: 34,
        region_id: 9,
        constellation_id: 11,
        has_station: true,
        sov_power: 4.5,
        owner_id: 100,
    };
    map.load_records(DumpData {
        owners: vec![owner(100, Color::rgb(1, 2, 3), false)],
        systems: vec![record.clone()],
        jumps: vec![],
    })
    .unwrap();

    assert_eq!(map.owner_name(100).as_deref(), Some("owner 100"));
    assert_eq!(map.owner_name(7), None);
    assert_eq!(map.system_info(5), Some(record));
    assert_eq!(map.system_info(6), None);
}

// ============================================================================
// Reconfiguration
// ============================================================================

#[test]
fn test_update_size_resets_outputs() {
    let map = single_seed_map();
    map.set_old_owner_index(vec![7; 512 * 512], 512, 512).unwrap();
    map.render().unwrap();
    assert!(map.image_rgba().iter().any(|&b| b != 0));

    map.update_size(32, 32, 4);
    assert_eq!(map.width(), 32);
    assert_eq!(map.height(), 32);
    assert_eq!(map.sample_rate(), 4);
    assert_eq!(map.image_rgba().len(), 32 * 32 * 4);
    assert!(map.image_rgba().iter().all(|&b| b == 0));
    assert!(map.owner_index_snapshot().iter().all(|&id| id == 0));
    assert!(!map.has_old_owner_index());
}
