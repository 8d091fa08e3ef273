//! Shared model fixtures: a rotated three-block model over California with
//! values that are linear in the local coordinates, so grid interpolation
//! reproduces them exactly.

use geogrids::MemStore;

pub const ORIGIN_X: f64 = 200000.0;
pub const ORIGIN_Y: f64 = -400000.0;
pub const Y_AZIMUTH: f64 = 330.0;
pub const DIM_X: f64 = 60.0e+3;
pub const DIM_Y: f64 = 120.0e+3;
pub const DIM_Z: f64 = 45.0e+3;
pub const TOPO_RESOLUTION: f64 = 5.0e+3;

/// First stored value as a function of the local coordinates
pub fn value_one(x: f64, y: f64, z: f64) -> f64 {
    2.0e+3 + 1.0 * x + 0.4 * y - 0.5 * z
}

/// Second stored value as a function of the local coordinates
pub fn value_two(x: f64, y: f64, z: f64) -> f64 {
    -1.2e+3 + 2.1 * x - 0.9 * y + 0.3 * z
}

/// Ground surface elevation as a function of the local coordinates; the x*y
/// term is still reproduced exactly by bilinear interpolation.
fn ground_elevation(x: f64, y: f64) -> f64 {
    1.5e+2 + 0.2 * x - 0.1 * y + 0.05e-3 * x * y
}

struct BlockSpec {
    name: &'static str,
    resolution_horiz: f64,
    resolution_vert: f64,
    z_top: f64,
    nz: usize,
}

const BLOCKS: [BlockSpec; 3] = [
    BlockSpec {
        name: "top",
        resolution_horiz: 10.0e+3,
        resolution_vert: 2.5e+3,
        z_top: 0.0,
        nz: 3,
    },
    BlockSpec {
        name: "middle",
        resolution_horiz: 20.0e+3,
        resolution_vert: 5.0e+3,
        z_top: -5.0e+3,
        nz: 5,
    },
    BlockSpec {
        name: "bottom",
        resolution_horiz: 30.0e+3,
        resolution_vert: 10.0e+3,
        z_top: -25.0e+3,
        nz: 3,
    },
];

fn build(title: &str, id: &str, topography: bool, block_names: &[&str]) -> MemStore {
    let mut store = MemStore::new();
    store.set_attr("/", "title", title);
    store.set_attr("/", "id", id);
    store.set_attr("/", "description", "Fixture model with linear values");
    store.set_attr("/", "doi", "this.is.a.doi");
    store.set_attr("/", "version", "1.0.0");
    store.set_attr("/", "data_values", vec!["one", "two"]);
    store.set_attr("/", "data_units", vec!["m", "m/s"]);
    store.set_attr("/", "data_layout", "vertex");
    store.set_attr("/", "dim_x", DIM_X);
    store.set_attr("/", "dim_y", DIM_Y);
    store.set_attr("/", "dim_z", DIM_Z);
    store.set_attr("/", "crs", "EPSG:3311");
    store.set_attr("/", "origin_x", ORIGIN_X);
    store.set_attr("/", "origin_y", ORIGIN_Y);
    store.set_attr("/", "y_azimuth", Y_AZIMUTH);

    if topography {
        let nx = (DIM_X / TOPO_RESOLUTION) as usize + 1;
        let ny = (DIM_Y / TOPO_RESOLUTION) as usize + 1;
        let mut samples = Vec::with_capacity(nx * ny);
        for i in 0..nx {
            for j in 0..ny {
                let x = i as f64 * TOPO_RESOLUTION;
                let y = j as f64 * TOPO_RESOLUTION;
                samples.push(ground_elevation(x, y));
            }
        }
        store.set_attr("surfaces/top_surface", "resolution_horiz", TOPO_RESOLUTION);
        store
            .add_dataset("surfaces/top_surface", &[nx, ny], samples)
            .unwrap();
    }

    for spec in BLOCKS.iter().filter(|b| block_names.contains(&b.name)) {
        let nx = (DIM_X / spec.resolution_horiz) as usize + 1;
        let ny = (DIM_Y / spec.resolution_horiz) as usize + 1;
        let dims = [nx, ny, spec.nz, 2];
        let mut samples = Vec::with_capacity(nx * ny * spec.nz * 2);
        for i in 0..nx {
            for j in 0..ny {
                for k in 0..spec.nz {
                    let x = i as f64 * spec.resolution_horiz;
                    let y = j as f64 * spec.resolution_horiz;
                    let z = spec.z_top - k as f64 * spec.resolution_vert;
                    samples.push(value_one(x, y, z));
                    samples.push(value_two(x, y, z));
                }
            }
        }
        let path = format!("blocks/{}", spec.name);
        store.set_attr(&path, "resolution_horiz", spec.resolution_horiz);
        store.set_attr(&path, "resolution_vert", spec.resolution_vert);
        store.set_attr(&path, "z_top", spec.z_top);
        store.add_dataset(&path, &dims, samples).unwrap();
    }

    store
}

/// Three blocks under an undulating ground surface
pub fn three_blocks_topo() -> MemStore {
    build(
        "Three Blocks Topo",
        "three-blocks-topo",
        true,
        &["top", "middle", "bottom"],
    )
}

/// Three blocks with a flat ground surface at elevation 0 (no surface
/// datasets at all)
pub fn three_blocks_flat() -> MemStore {
    build(
        "Three Blocks Flat",
        "three-blocks-flat",
        false,
        &["top", "middle", "bottom"],
    )
}

/// Broken variant with the middle depth slab missing
pub fn two_blocks_gap() -> MemStore {
    build("Two Blocks Gap", "two-blocks-gap", true, &["top", "bottom"])
}
