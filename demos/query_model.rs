//! Example: Build a small synthetic earth model in memory and query it
//!
//! Run with: cargo run --example query_model

use geogrids::{FsStore, MemStore, Model};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Geogrids Model Query Demo");
    println!("=========================\n");

    // A one-block model in the California Albers CRS: 60 km x 120 km in map
    // view, 45 km deep, with two values that vary linearly with position.
    let mut store = MemStore::new();
    store.set_attr("/", "title", "Demo Model");
    store.set_attr("/", "id", "demo");
    store.set_attr("/", "description", "Synthetic one-block model");
    store.set_attr("/", "data_values", vec!["density", "vp"]);
    store.set_attr("/", "data_units", vec!["kg/m**3", "m/s"]);
    store.set_attr("/", "data_layout", "vertex");
    store.set_attr("/", "dim_x", 60.0e+3);
    store.set_attr("/", "dim_y", 120.0e+3);
    store.set_attr("/", "dim_z", 45.0e+3);
    store.set_attr("/", "crs", "EPSG:3311");
    store.set_attr("/", "origin_x", 200000.0);
    store.set_attr("/", "origin_y", -400000.0);
    store.set_attr("/", "y_azimuth", 330.0);

    let dims = [7, 13, 10, 2];
    let (res_horiz, res_vert) = (10.0e+3, 5.0e+3);
    let mut samples = Vec::new();
    for i in 0..dims[0] {
        for j in 0..dims[1] {
            for k in 0..dims[2] {
                let x = i as f64 * res_horiz;
                let y = j as f64 * res_horiz;
                let z = -(k as f64) * res_vert;
                samples.push(2.5e+3 + 0.01 * x - 0.005 * y - 0.02 * z);
                samples.push(5.0e+3 + 0.02 * x + 0.01 * y - 0.05 * z);
            }
        }
    }
    store.set_attr("blocks/crust", "resolution_horiz", res_horiz);
    store.set_attr("blocks/crust", "resolution_vert", res_vert);
    store.set_attr("blocks/crust", "z_top", 0.0);
    store.add_dataset("blocks/crust", &dims, samples)?;

    // Persist it as a store directory, the format geogrids-query consumes.
    let dir = std::env::temp_dir().join("geogrids-demo-model");
    FsStore::save(&dir, &store)?;
    println!("Saved demo model to {}\n", dir.display());

    let mut model = Model::new();
    model.open(Arc::new(store));
    model.load_metadata()?;
    model.initialize()?;

    let info = model.info().expect("metadata was just loaded");
    println!("Model: {} ({})", info.title, info.id);
    println!("CRS:   {}", model.crs_string());
    println!(
        "Size:  {:.0} km x {:.0} km x {:.0} km",
        model.dims()[0] / 1.0e+3,
        model.dims()[1] / 1.0e+3,
        model.dims()[2] / 1.0e+3
    );
    println!("Values: {}\n", model.value_names().join(", "));

    // Query points are geographic: latitude, longitude (degrees), elevation (m).
    let points = [
        (35.0, -117.6, -3.0e+3),
        (35.0, -117.6, -30.0e+3),
        (35.1, -117.8, -10.0e+3),
        (40.0, -120.0, -10.0e+3), // far outside the model
    ];

    println!("Queries (EPSG:4326 input):");
    for (lat, lon, elev) in points {
        if !model.contains(lat, lon, elev)? {
            println!("  ({lat}, {lon}, {elev}): outside the model");
            continue;
        }
        let values = model.query(lat, lon, elev)?;
        println!(
            "  ({lat}, {lon}, {elev}): density = {:.1} kg/m**3, vp = {:.1} m/s",
            values[0], values[1]
        );
    }

    model.close();
    println!("\nDone.");
    Ok(())
}
