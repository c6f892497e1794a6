//! Example: render a universe dump to a PNG.
//!
//! Loads a binary universe dump, propagates influence, renders the map with
//! one worker per hardware thread, prints the region labels, and writes the
//! image plus the owner index for the next run's change overlay.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --example render_dump -- universe.dat influence.png [old_owners.dat]
//! ```

use std::env;

use anyhow::Context;
use sovmap::{Map, MapConfig};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <dump.dat> <out.png> [old_owners.dat]", args[0]);
        std::process::exit(1);
    }

    let map = Map::new(MapConfig::default());
    map.load_data_file(&args[1])
        .with_context(|| format!("loading {}", args[1]))?;
    if let Some(old_owners) = args.get(3) {
        map.load_old_owner_index(old_owners)
            .with_context(|| format!("loading old owner index {}", old_owners))?;
    }

    map.calculate_influence()?;
    map.render_multithreaded()?;
    map.save_png(&args[2])
        .with_context(|| format!("writing {}", args[2]))?;

    let owner_index_path = format!("{}.owners.dat", args[2]);
    map.save_owner_index(&owner_index_path)
        .with_context(|| format!("writing {}", owner_index_path))?;

    // Labels consume the owner index, so they come after the index is saved.
    let labels = map.calculate_labels();
    println!("{} owner regions:", labels.len());
    for label in labels {
        let name = map
            .owner_name(label.owner_id)
            .unwrap_or_else(|| label.owner_id.to_string());
        println!(
            "  {:>24}: ({:>4}, {:>4}) covering {} cells",
            name, label.x, label.y, label.count
        );
    }
    Ok(())
}
