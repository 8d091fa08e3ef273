//! # Geogrids
//!
//! Query engine for georeferenced earth models stored as stacks of uniform
//! grids. A model is a rotated, georeferenced box in a projected CRS: an
//! ordered set of [`Block`]s, each a uniform logical grid with its own
//! resolution, topped by optional elevation [`Surface`]s. Grid layers follow
//! the terrain through a vertical squashing of the coordinate between the
//! ground surface and the model bottom.
//!
//! ## Example
//!
//! ```no_run
//! use geogrids::{FileMode, Model};
//!
//! # fn main() -> geogrids::Result<()> {
//! let mut model = Model::new();
//! model.open_path("model.geogrids", FileMode::ReadOnly)?;
//! model.load_metadata()?;
//! model.initialize()?;
//!
//! // Latitude, longitude (degrees), elevation (m).
//! if model.contains(35.0, -118.0, -3.0e+3)? {
//!     let values = model.query(35.0, -118.0, -3.0e+3)?;
//!     for (name, value) in model.value_names().iter().zip(&values) {
//!         println!("{name} = {value}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod block;
pub mod crs;
pub mod error;
pub mod info;
pub mod model;
pub mod storage;
pub mod surface;

mod utils;

pub use block::Block;
pub use crs::{CrsTransform, CrsTransformer};
pub use error::{GridError, Result};
pub use info::ModelInfo;
pub use model::{DataLayout, Model, DEFAULT_INPUT_CRS};
pub use storage::{AttrValue, FileMode, FsStore, GeoStore, MemStore};
pub use surface::{Surface, TOPOGRAPHY_BATHYMETRY, TOP_SURFACE};

/// Marker returned for values that cannot be resolved
pub const NODATA_VALUE: f64 = -1.0e+20;

/// Slop for vertical coordinates that land a hair above the ground surface
pub const TOLERANCE: f64 = 1.0e-6;

/// Library version, from Cargo metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
