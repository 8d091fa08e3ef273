//! Elevation surfaces: regular 2-D grids queried with bilinear interpolation

use crate::error::{GridError, MetadataErrors, Result};
use crate::storage::GeoStore;
use crate::utils::cell_index;
use std::fmt;
use std::sync::Arc;

/// Name of the ground-surface dataset
pub const TOP_SURFACE: &str = "top_surface";
/// Name of the topography/bathymetry dataset
pub const TOPOGRAPHY_BATHYMETRY: &str = "topography_bathymetry";

/// A regular 2-D grid of elevation samples (top of model, or combined
/// topography/bathymetry).
///
/// Samples sit at multiples of the horizontal resolution in model-local
/// coordinates, x along the first grid axis. Queries are valid only between
/// [`Surface::open_query`] and [`Surface::close_query`]; coordinates outside
/// the horizontal extent clamp to the nearest boundary sample.
pub struct Surface {
    name: String,
    resolution_horiz: f64,
    dims: [usize; 2],
    store: Option<Arc<dyn GeoStore>>,
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("name", &self.name)
            .field("resolution_horiz", &self.resolution_horiz)
            .field("dims", &self.dims)
            .field("open", &self.store.is_some())
            .finish()
    }
}

impl Surface {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            resolution_horiz: 0.0,
            dims: [0, 0],
            store: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resolution_horiz(&self) -> f64 {
        self.resolution_horiz
    }

    /// Grid sample counts (x, y)
    pub fn dims(&self) -> [usize; 2] {
        self.dims
    }

    fn dataset_path(&self) -> String {
        format!("surfaces/{}", self.name)
    }

    /// Read resolution and grid extent, recording problems in `errors`.
    pub fn load_metadata(&mut self, store: &dyn GeoStore, errors: &mut MetadataErrors) {
        let path = self.dataset_path();

        match store.read_f64(&path, "resolution_horiz") {
            Ok(value) if value > 0.0 => self.resolution_horiz = value,
            Ok(_) => errors.add(format!("    {path}/resolution_horiz must be positive")),
            Err(_) => errors.add(format!("    {path}/resolution_horiz")),
        }

        match store.dataset_dims(&path) {
            Ok(dims) if dims.len() == 2 && dims[0] >= 2 && dims[1] >= 2 => {
                self.dims = [dims[0], dims[1]];
            }
            Ok(dims) => errors.add(format!(
                "    {path} must be a 2-D grid with at least 2 samples per axis (dims {dims:?})"
            )),
            Err(_) => errors.add(format!("    {path}")),
        }
    }

    /// Begin the query bracket, letting the backend cache grid chunks.
    pub fn open_query(&mut self, store: Arc<dyn GeoStore>) -> Result<()> {
        store.open_dataset(&self.dataset_path())?;
        self.store = Some(store);
        Ok(())
    }

    /// End the query bracket and release backend caches.
    pub fn close_query(&mut self) {
        if let Some(store) = self.store.take() {
            store.close_dataset(&self.dataset_path());
        }
    }

    /// Bilinearly interpolated elevation at model-local (x, y).
    pub fn query(&self, x: f64, y: f64) -> Result<f64> {
        let store = self.store.as_ref().ok_or_else(|| {
            GridError::Usage(format!(
                "surface '{}' queried outside open_query/close_query",
                self.name
            ))
        })?;

        let (i0, wx) = cell_index(x, self.resolution_horiz, self.dims[0]);
        let (j0, wy) = cell_index(y, self.resolution_horiz, self.dims[1]);
        let slab = store.read_hyperslab(&self.dataset_path(), &[i0, j0], &[2, 2])?;

        // Row-major [2, 2] window: (i0,j0), (i0,j0+1), (i0+1,j0), (i0+1,j0+1)
        Ok(slab[0] * (1.0 - wx) * (1.0 - wy)
            + slab[1] * (1.0 - wx) * wy
            + slab[2] * wx * (1.0 - wy)
            + slab[3] * wx * wy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemStore;
    use approx::assert_relative_eq;

    const RESOLUTION: f64 = 5.0e+3;
    const NX: usize = 13;
    const NY: usize = 25;

    // Bilinear interpolation reproduces a + b*x + c*y + d*x*y exactly.
    fn elevation(x: f64, y: f64) -> f64 {
        1.5e+2 + 0.2 * x - 0.1 * y + 0.05e-3 * x * y
    }

    fn topo_store() -> MemStore {
        let mut store = MemStore::new();
        let mut samples = Vec::with_capacity(NX * NY);
        for i in 0..NX {
            for j in 0..NY {
                samples.push(elevation(i as f64 * RESOLUTION, j as f64 * RESOLUTION));
            }
        }
        store.set_attr("surfaces/top_surface", "resolution_horiz", RESOLUTION);
        store
            .add_dataset("surfaces/top_surface", &[NX, NY], samples)
            .unwrap();
        store
    }

    fn open_surface(store: &Arc<MemStore>) -> Surface {
        let mut surface = Surface::new(TOP_SURFACE);
        let mut errors = MetadataErrors::new();
        surface.load_metadata(store.as_ref(), &mut errors);
        assert!(errors.is_empty());
        surface.open_query(Arc::clone(store) as Arc<dyn GeoStore>).unwrap();
        surface
    }

    #[test]
    fn test_load_metadata() {
        let store = topo_store();
        let mut surface = Surface::new(TOP_SURFACE);
        let mut errors = MetadataErrors::new();
        surface.load_metadata(&store, &mut errors);
        assert!(errors.is_empty());
        assert_eq!(surface.name(), TOP_SURFACE);
        assert_eq!(surface.resolution_horiz(), RESOLUTION);
        assert_eq!(surface.dims(), [NX, NY]);
    }

    #[test]
    fn test_load_metadata_missing() {
        let store = MemStore::new();
        let mut surface = Surface::new(TOPOGRAPHY_BATHYMETRY);
        let mut errors = MetadataErrors::new();
        surface.load_metadata(&store, &mut errors);
        let message = errors.into_result().unwrap_err().to_string();
        assert!(message.contains("surfaces/topography_bathymetry/resolution_horiz"));
        assert!(message.contains("surfaces/topography_bathymetry"));
    }

    #[test]
    fn test_query_interpolates() {
        let store = Arc::new(topo_store());
        let surface = open_surface(&store);

        // On a grid sample.
        assert_relative_eq!(
            surface.query(10.0e+3, 20.0e+3).unwrap(),
            elevation(10.0e+3, 20.0e+3),
            max_relative = 1.0e-12
        );
        // Interior of a cell.
        assert_relative_eq!(
            surface.query(12.3e+3, 57.9e+3).unwrap(),
            elevation(12.3e+3, 57.9e+3),
            max_relative = 1.0e-12
        );
        // Domain corner.
        assert_relative_eq!(
            surface.query(60.0e+3, 120.0e+3).unwrap(),
            elevation(60.0e+3, 120.0e+3),
            max_relative = 1.0e-12
        );
    }

    #[test]
    fn test_query_clamps_outside_extent() {
        let store = Arc::new(topo_store());
        let surface = open_surface(&store);
        assert_relative_eq!(
            surface.query(-5.0e+3, 1.0e+6).unwrap(),
            elevation(0.0, 120.0e+3),
            max_relative = 1.0e-12
        );
    }

    #[test]
    fn test_query_outside_bracket_fails() {
        let store = Arc::new(topo_store());
        let mut surface = open_surface(&store);
        surface.close_query();
        assert!(matches!(
            surface.query(0.0, 0.0),
            Err(GridError::Usage(_))
        ));
    }

    #[test]
    fn test_debug_reports_state_not_handle() {
        let store = Arc::new(topo_store());
        let mut surface = open_surface(&store);
        let rendered = format!("{surface:?}");
        assert!(rendered.contains("top_surface"));
        assert!(rendered.contains("open: true"));
        surface.close_query();
        assert!(format!("{surface:?}").contains("open: false"));
    }
}
