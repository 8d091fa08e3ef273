//! Model orchestration: metadata, coordinate pipeline, and value queries

use crate::block::Block;
use crate::crs::{CrsTransform, CrsTransformer};
use crate::error::{GridError, MetadataErrors, Result};
use crate::info::ModelInfo;
use crate::storage::{FileMode, FsStore, GeoStore};
use crate::surface::{Surface, TOPOGRAPHY_BATHYMETRY, TOP_SURFACE};
use crate::TOLERANCE;
use std::path::Path;
use std::sync::Arc;

/// Arrangement of values on the model grids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataLayout {
    /// Values stored at grid vertices
    #[default]
    Vertex,
}

const LAYOUT_VERTEX: &str = "vertex";

/// Default CRS of query input points (geographic WGS84)
pub const DEFAULT_INPUT_CRS: &str = "EPSG:4326";

/// A georeferenced earth model: an ordered stack of [`Block`]s under up to
/// two elevation [`Surface`]s, queried in an arbitrary input CRS.
///
/// Lifecycle: [`Model::open`] binds a storage handle, [`Model::load_metadata`]
/// reads and validates the container metadata, [`Model::initialize`] builds
/// the CRS transformer and opens the query brackets, then the query methods
/// are valid until [`Model::close`] (also run on drop).
///
/// A `Model` holds no internal locks; confine each instance to one thread or
/// serialize access externally.
pub struct Model {
    layout: DataLayout,
    value_names: Vec<String>,
    value_units: Vec<String>,
    units_boolean: Vec<bool>,
    model_crs: String,
    input_crs: String,
    origin: [f64; 2],
    y_azimuth: f64,
    dims: [f64; 3],
    info: Option<ModelInfo>,
    top_surface: Option<Surface>,
    topo_bathy: Option<Surface>,
    blocks: Vec<Block>,
    store: Option<Arc<dyn GeoStore>>,
    transformer: Option<Box<dyn CrsTransform>>,
}

impl Model {
    pub fn new() -> Self {
        Self {
            layout: DataLayout::Vertex,
            value_names: Vec::new(),
            value_units: Vec::new(),
            units_boolean: Vec::new(),
            model_crs: String::new(),
            input_crs: DEFAULT_INPUT_CRS.to_string(),
            origin: [0.0, 0.0],
            y_azimuth: 0.0,
            dims: [0.0, 0.0, 0.0],
            info: None,
            top_surface: None,
            topo_bathy: None,
            blocks: Vec::new(),
            store: None,
            transformer: None,
        }
    }

    /// Set the CRS of query input points. Takes effect at the next
    /// [`Model::initialize`].
    pub fn set_input_crs(&mut self, crs: &str) {
        self.input_crs = crs.to_string();
    }

    /// Bind a storage handle.
    pub fn open(&mut self, store: Arc<dyn GeoStore>) {
        self.store = Some(store);
    }

    /// Open a directory-backed container and bind it.
    pub fn open_path(&mut self, dir: impl AsRef<Path>, mode: FileMode) -> Result<()> {
        let store = FsStore::open(dir, mode)?;
        self.open(Arc::new(store));
        Ok(())
    }

    /// Release query resources and the storage handle.
    pub fn close(&mut self) {
        self.close_query_brackets();
        self.transformer = None;
        self.store = None;
    }

    /// Read and validate the container metadata, replacing any prior state.
    ///
    /// Every missing or invalid item is collected; on failure a single
    /// [`GridError::MissingMetadata`] names them all.
    pub fn load_metadata(&mut self) -> Result<()> {
        let store = self.store.clone().ok_or_else(|| {
            GridError::Usage("model not open: call open() before load_metadata()".to_string())
        })?;

        self.close_query_brackets();
        self.value_names.clear();
        self.value_units.clear();
        self.units_boolean.clear();
        self.top_surface = None;
        self.topo_bathy = None;
        self.blocks.clear();

        let mut errors = MetadataErrors::new();

        self.info = Some(ModelInfo::load(store.as_ref(), &mut errors));

        match store.read_string_vec("/", "data_values") {
            Ok(names) => self.value_names = names,
            Err(_) => errors.add("    /data_values"),
        }
        match store.read_string_vec("/", "data_units") {
            Ok(units) => {
                self.units_boolean = to_units_boolean(&units);
                self.value_units = units;
            }
            Err(_) => errors.add("    /data_units"),
        }
        match store.read_string("/", "data_layout") {
            Ok(layout) if layout.eq_ignore_ascii_case(LAYOUT_VERTEX) => {
                self.layout = DataLayout::Vertex;
            }
            Ok(_) => errors.add("    Only vertex-based data layout is supported"),
            Err(_) => errors.add("    /data_layout"),
        }

        for (name, axis) in [("dim_x", 0), ("dim_y", 1), ("dim_z", 2)] {
            match store.read_f64("/", name) {
                Ok(value) => self.dims[axis] = value,
                Err(_) => errors.add(format!("    /{name}")),
            }
        }

        match store.read_string("/", "crs") {
            Ok(crs) => self.model_crs = crs,
            Err(_) => errors.add("    /crs"),
        }
        for (name, axis) in [("origin_x", 0), ("origin_y", 1)] {
            match store.read_f64("/", name) {
                Ok(value) => self.origin[axis] = value,
                Err(_) => errors.add(format!("    /{name}")),
            }
        }
        match store.read_f64("/", "y_azimuth") {
            Ok(value) => self.y_azimuth = value,
            Err(_) => errors.add("    /y_azimuth"),
        }

        if store.has_group("surfaces") {
            if store.has_dataset(&format!("surfaces/{TOP_SURFACE}")) {
                let mut surface = Surface::new(TOP_SURFACE);
                surface.load_metadata(store.as_ref(), &mut errors);
                self.top_surface = Some(surface);
            }
            if store.has_dataset(&format!("surfaces/{TOPOGRAPHY_BATHYMETRY}")) {
                let mut surface = Surface::new(TOPOGRAPHY_BATHYMETRY);
                surface.load_metadata(store.as_ref(), &mut errors);
                self.topo_bathy = Some(surface);
            }
        }

        match store.group_datasets("blocks") {
            Ok(names) => {
                for name in &names {
                    let mut block = Block::new(name);
                    block.load_metadata(store.as_ref(), &mut errors);
                    self.blocks.push(block);
                }
            }
            Err(_) => errors.add("    /blocks"),
        }
        self.blocks.sort_by(Block::cmp_shallow_first);

        if !self.value_names.is_empty() {
            for block in &self.blocks {
                if block.num_values() != 0 && block.num_values() != self.value_names.len() {
                    errors.add(format!(
                        "    blocks/{} stores {} values, expected {}",
                        block.name(),
                        block.num_values(),
                        self.value_names.len()
                    ));
                }
            }
        }

        tracing::debug!(
            values = self.value_names.len(),
            blocks = self.blocks.len(),
            top_surface = self.top_surface.is_some(),
            topo_bathy = self.topo_bathy.is_some(),
            "loaded model metadata"
        );

        errors.into_result()
    }

    /// Build the CRS transformer from the input and model CRS and open the
    /// query brackets on all surfaces and blocks.
    pub fn initialize(&mut self) -> Result<()> {
        let transformer = CrsTransformer::new(&self.input_crs, &self.model_crs)?;
        self.initialize_with(Box::new(transformer))
    }

    /// As [`Model::initialize`], with a caller-supplied CRS transformer.
    ///
    /// Anything already opened is closed again if a query bracket fails to
    /// open partway through.
    pub fn initialize_with(&mut self, transformer: Box<dyn CrsTransform>) -> Result<()> {
        let store = self.store.clone().ok_or_else(|| {
            GridError::Usage("model not open: call open() before initialize()".to_string())
        })?;
        self.transformer = Some(transformer);

        let mut open_all = || -> Result<()> {
            if let Some(surface) = self.top_surface.as_mut() {
                surface.open_query(Arc::clone(&store))?;
            }
            if let Some(surface) = self.topo_bathy.as_mut() {
                surface.open_query(Arc::clone(&store))?;
            }
            for block in self.blocks.iter_mut() {
                block.open_query(Arc::clone(&store))?;
            }
            Ok(())
        };
        if let Err(err) = open_all() {
            self.close_query_brackets();
            return Err(err);
        }
        tracing::debug!(input_crs = %self.input_crs, model_crs = %self.model_crs, "model initialized");
        Ok(())
    }

    fn close_query_brackets(&mut self) {
        if let Some(surface) = self.top_surface.as_mut() {
            surface.close_query();
        }
        if let Some(surface) = self.topo_bathy.as_mut() {
            surface.close_query();
        }
        for block in self.blocks.iter_mut() {
            block.close_query();
        }
    }

    // Accessors ----------------------------------------------------------------

    pub fn value_names(&self) -> &[String] {
        &self.value_names
    }

    pub fn value_units(&self) -> &[String] {
        &self.value_units
    }

    /// One flag per value: `false` iff the unit is the dimensionless
    /// sentinel `"None"`.
    pub fn units_boolean(&self) -> &[bool] {
        &self.units_boolean
    }

    pub fn data_layout(&self) -> DataLayout {
        self.layout
    }

    /// Horizontal extents and total (positive) vertical extent of the local
    /// coordinate box
    pub fn dims(&self) -> [f64; 3] {
        self.dims
    }

    /// Location of the local-coordinate origin in the model CRS
    pub fn origin(&self) -> [f64; 2] {
        self.origin
    }

    /// Rotation of the local y axis, degrees clockwise from north
    pub fn y_azimuth(&self) -> f64 {
        self.y_azimuth
    }

    pub fn crs_string(&self) -> &str {
        &self.model_crs
    }

    pub fn input_crs(&self) -> &str {
        &self.input_crs
    }

    pub fn info(&self) -> Option<&ModelInfo> {
        self.info.as_ref()
    }

    pub fn top_surface(&self) -> Option<&Surface> {
        self.top_surface.as_ref()
    }

    pub fn topo_bathy(&self) -> Option<&Surface> {
        self.topo_bathy.as_ref()
    }

    /// Blocks sorted shallowest first
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    // Queries ------------------------------------------------------------------

    /// True iff the point lies inside the model box, vertical squashing
    /// included.
    pub fn contains(&self, x: f64, y: f64, z: f64) -> Result<bool> {
        let (x_local, y_local, z_local) = self.to_model_xyz(x, y, z)?;
        Ok(self.contains_local(x_local, y_local, z_local))
    }

    /// Horizontal-only containment; skips the vertical pipeline and its top
    /// surface dependency.
    pub fn contains_xy(&self, x: f64, y: f64) -> Result<bool> {
        let (x_local, y_local, _) = self.to_model_xy(x, y, 0.0)?;
        Ok((0.0..=self.dims[0]).contains(&x_local) && (0.0..=self.dims[1]).contains(&y_local))
    }

    /// Elevation of the top of the model at (x, y), in the input CRS.
    /// Returns 0 when the model carries no top surface.
    pub fn query_top_elevation(&self, x: f64, y: f64) -> Result<f64> {
        let Some(surface) = self.top_surface.as_ref() else {
            return Ok(0.0);
        };
        let (x_local, y_local, _) = self.to_model_xy(x, y, 0.0)?;
        let z_crs = surface.query(x_local, y_local)?;
        self.elevation_to_input(x_local, y_local, z_crs)
    }

    /// Elevation of the topography/bathymetry surface at (x, y), in the
    /// input CRS, falling back to the top surface when absent. Returns 0
    /// when the model carries neither.
    pub fn query_topo_bathy_elevation(&self, x: f64, y: f64) -> Result<f64> {
        let Some(surface) = self.topo_bathy.as_ref().or(self.top_surface.as_ref()) else {
            return Ok(0.0);
        };
        let (x_local, y_local, _) = self.to_model_xy(x, y, 0.0)?;
        let z_crs = surface.query(x_local, y_local)?;
        self.elevation_to_input(x_local, y_local, z_crs)
    }

    /// Interpolated values at the point, one per entry of
    /// [`Model::value_names`], in storage order.
    ///
    /// A point outside the model box is [`GridError::OutOfBounds`]; a depth
    /// no block claims (a gap in the block stack) is
    /// [`GridError::BlockNotFound`].
    pub fn query(&self, x: f64, y: f64, z: f64) -> Result<Vec<f64>> {
        let (x_local, y_local, z_local) = self.to_model_xyz(x, y, z)?;
        if !self.contains_local(x_local, y_local, z_local) {
            return Err(GridError::OutOfBounds(format!(
                "point ({x}, {y}, {z}) is outside the model"
            )));
        }

        let block = self
            .blocks
            .iter()
            .find(|block| z_local <= block.z_top() && z_local >= block.z_bottom())
            .ok_or(GridError::BlockNotFound(z_local))?;
        block.query(x_local, y_local, z_local, &self.units_boolean)
    }

    // Coordinate pipeline --------------------------------------------------------

    fn contains_local(&self, x_local: f64, y_local: f64, z_local: f64) -> bool {
        (0.0..=self.dims[0]).contains(&x_local)
            && (0.0..=self.dims[1]).contains(&y_local)
            && (-self.dims[2]..=0.0).contains(&z_local)
    }

    /// Input CRS -> local horizontal coordinates. Also returns the model-CRS
    /// elevation for the vertical pipeline.
    fn to_model_xy(&self, x: f64, y: f64, z: f64) -> Result<(f64, f64, f64)> {
        let transformer = self.transformer.as_ref().ok_or_else(|| {
            GridError::Usage(
                "model not initialized: call initialize() before queries".to_string(),
            )
        })?;

        let (x_crs, y_crs, z_crs) = transformer.transform(x, y, z)?;
        let (sin_az, cos_az) = self.y_azimuth.to_radians().sin_cos();
        let x_rel = x_crs - self.origin[0];
        let y_rel = y_crs - self.origin[1];
        let x_local = x_rel * cos_az - y_rel * sin_az;
        let y_local = x_rel * sin_az + y_rel * cos_az;
        Ok((x_local, y_local, z_crs))
    }

    /// Full pipeline: local horizontal coordinates plus the squashed local
    /// vertical coordinate.
    ///
    /// The vertical rescaling maps the ground surface to local z = 0 and the
    /// model bottom to -dim_z, so grid layers follow the terrain. Without a
    /// top surface the ground is taken at elevation 0.
    fn to_model_xyz(&self, x: f64, y: f64, z: f64) -> Result<(f64, f64, f64)> {
        let (x_local, y_local, z_crs) = self.to_model_xy(x, y, z)?;

        let z_ground = match self.top_surface.as_ref() {
            Some(surface) => surface.query(x_local, y_local)?,
            None => 0.0,
        };
        let z_bottom = -self.dims[2];
        let mut z_local = z_bottom * (z_ground - z_crs) / (z_ground - z_bottom);
        if z_local > 0.0 && z_local < TOLERANCE {
            z_local = 0.0;
        }
        Ok((x_local, y_local, z_local))
    }

    /// Local horizontal coordinates + model-CRS elevation -> input-CRS
    /// elevation (inverse of the horizontal pipeline).
    fn elevation_to_input(&self, x_local: f64, y_local: f64, z_crs: f64) -> Result<f64> {
        let transformer = self.transformer.as_ref().ok_or_else(|| {
            GridError::Usage(
                "model not initialized: call initialize() before queries".to_string(),
            )
        })?;

        let (sin_az, cos_az) = self.y_azimuth.to_radians().sin_cos();
        let x_rel = x_local * cos_az + y_local * sin_az;
        let y_rel = -x_local * sin_az + y_local * cos_az;
        let (_, _, elevation) =
            transformer.inverse_transform(x_rel + self.origin[0], y_rel + self.origin[1], z_crs)?;
        Ok(elevation)
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Model {
    fn drop(&mut self) {
        self.close();
    }
}

fn to_units_boolean(units: &[String]) -> Vec<bool> {
    units.iter().map(|unit| unit != "None").collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemStore;
    use approx::assert_relative_eq;

    const DIM_X: f64 = 60.0e+3;
    const DIM_Y: f64 = 120.0e+3;
    const DIM_Z: f64 = 45.0e+3;

    /// Minimal valid model in its own CRS: origin at (0, 0), no rotation,
    /// one block spanning the full depth, optional flat top surface.
    fn simple_store(ground_elevation: Option<f64>) -> MemStore {
        let mut store = MemStore::new();
        store.set_attr("/", "title", "Simple");
        store.set_attr("/", "id", "simple");
        store.set_attr("/", "description", "One-block test model");
        store.set_attr("/", "data_values", vec!["one", "two"]);
        store.set_attr("/", "data_units", vec!["m", "m/s"]);
        store.set_attr("/", "data_layout", "vertex");
        store.set_attr("/", "dim_x", DIM_X);
        store.set_attr("/", "dim_y", DIM_Y);
        store.set_attr("/", "dim_z", DIM_Z);
        store.set_attr("/", "crs", "EPSG:3311");
        store.set_attr("/", "origin_x", 0.0);
        store.set_attr("/", "origin_y", 0.0);
        store.set_attr("/", "y_azimuth", 0.0);

        if let Some(elevation) = ground_elevation {
            store.set_attr("surfaces/top_surface", "resolution_horiz", 30.0e+3);
            store
                .add_dataset("surfaces/top_surface", &[3, 5], vec![elevation; 15])
                .unwrap();
        }

        let dims = [3, 5, 4, 2];
        let mut samples = Vec::new();
        for i in 0..dims[0] {
            for j in 0..dims[1] {
                for k in 0..dims[2] {
                    let x = i as f64 * 30.0e+3;
                    let y = j as f64 * 30.0e+3;
                    let z = -(k as f64) * 15.0e+3;
                    samples.push(2.0e+3 + x + 0.4 * y - 0.5 * z);
                    samples.push(-1.2e+3 + 2.1 * x - 0.9 * y + 0.3 * z);
                }
            }
        }
        store.set_attr("blocks/solo", "resolution_horiz", 30.0e+3);
        store.set_attr("blocks/solo", "resolution_vert", 15.0e+3);
        store.set_attr("blocks/solo", "z_top", 0.0);
        store
            .add_dataset("blocks/solo", &dims, samples)
            .unwrap();
        store
    }

    fn open_model(store: MemStore) -> Model {
        let mut model = Model::new();
        model.open(Arc::new(store));
        model.set_input_crs("EPSG:3311");
        model.load_metadata().unwrap();
        model.initialize().unwrap();
        model
    }

    #[test]
    fn test_defaults() {
        let model = Model::new();
        assert_eq!(model.input_crs(), DEFAULT_INPUT_CRS);
        assert_eq!(model.data_layout(), DataLayout::Vertex);
        assert!(model.value_names().is_empty());
        assert_eq!(model.dims(), [0.0, 0.0, 0.0]);
        assert_eq!(model.origin(), [0.0, 0.0]);
        assert!(model.blocks().is_empty());
        assert!(model.info().is_none());
    }

    #[test]
    fn test_units_boolean_derivation() {
        let units = ["m".to_string(), "None".to_string(), "MPa".to_string()];
        assert_eq!(to_units_boolean(&units), vec![true, false, true]);
    }

    #[test]
    fn test_usage_errors() {
        let mut model = Model::new();
        assert!(matches!(model.load_metadata(), Err(GridError::Usage(_))));

        model.open(Arc::new(simple_store(None)));
        model.set_input_crs("EPSG:3311");
        model.load_metadata().unwrap();
        // Queries before initialize are usage errors, not panics.
        assert!(matches!(
            model.contains(1.0, 1.0, -1.0),
            Err(GridError::Usage(_))
        ));
        assert!(matches!(model.query(1.0, 1.0, -1.0), Err(GridError::Usage(_))));
    }

    #[test]
    fn test_load_metadata_aggregates_missing_items() {
        let mut store = simple_store(None);
        // Rebuild without two required attributes.
        let mut broken = MemStore::new();
        for (group, name) in [
            ("/", "title"),
            ("/", "id"),
            ("/", "description"),
            ("/", "data_units"),
            ("/", "data_layout"),
            ("/", "dim_y"),
            ("/", "dim_z"),
            ("/", "crs"),
            ("/", "origin_x"),
            ("/", "origin_y"),
            ("/", "y_azimuth"),
        ] {
            if store.has_attribute(group, name) {
                if let Ok(v) = store.read_f64(group, name) {
                    broken.set_attr(group, name, v);
                } else if let Ok(v) = store.read_string(group, name) {
                    broken.set_attr(group, name, v);
                } else if let Ok(v) = store.read_string_vec(group, name) {
                    broken.set_attr(group, name, v);
                }
            }
        }
        store = broken;
        store.set_attr("blocks/solo", "resolution_horiz", 30.0e+3);
        store.set_attr("blocks/solo", "resolution_vert", 15.0e+3);
        store.set_attr("blocks/solo", "z_top", 0.0);
        store
            .add_dataset("blocks/solo", &[2, 2, 2, 2], vec![0.0; 16])
            .unwrap();

        let mut model = Model::new();
        model.open(Arc::new(store));
        let err = model.load_metadata().unwrap_err();
        let message = err.to_string();
        // Both missing items named in one report.
        assert!(message.contains("/data_values"));
        assert!(message.contains("/dim_x"));
        assert!(!message.contains("/dim_y"));
    }

    #[test]
    fn test_load_metadata_rejects_unknown_layout() {
        let mut store = simple_store(None);
        store.set_attr("/", "data_layout", "cell");
        let mut model = Model::new();
        model.open(Arc::new(store));
        let message = model.load_metadata().unwrap_err().to_string();
        assert!(message.contains("vertex-based"));
    }

    #[test]
    fn test_contains_flat() {
        let model = open_model(simple_store(None));
        assert!(model.contains(30.0e+3, 60.0e+3, -10.0e+3).unwrap());
        assert!(model.contains(0.0, 0.0, 0.0).unwrap());
        assert!(model.contains(DIM_X, DIM_Y, -DIM_Z).unwrap());
        assert!(!model.contains(-1.0, 60.0e+3, -10.0e+3).unwrap());
        assert!(!model.contains(30.0e+3, DIM_Y + 1.0, -10.0e+3).unwrap());
        assert!(!model.contains(30.0e+3, 60.0e+3, 10.0).unwrap());
        assert!(!model.contains(30.0e+3, 60.0e+3, -DIM_Z - 1.0).unwrap());

        assert!(model.contains_xy(30.0e+3, 60.0e+3).unwrap());
        assert!(!model.contains_xy(DIM_X + 1.0, 60.0e+3).unwrap());
    }

    #[test]
    fn test_squash_identity_and_floor() {
        let ground = 1.5e+3;
        let model = open_model(simple_store(Some(ground)));

        // A point at the ground surface squashes to exactly local z = 0.
        assert!(model.contains(30.0e+3, 60.0e+3, ground).unwrap());
        let values = model.query(30.0e+3, 60.0e+3, ground).unwrap();
        let expected = 2.0e+3 + 30.0e+3 + 0.4 * 60.0e+3 - 0.5 * 0.0;
        assert_relative_eq!(values[0], expected, max_relative = 1.0e-9);

        // A point at datum depth dim_z squashes to the model bottom.
        let flat = open_model(simple_store(Some(0.0)));
        assert!(flat.contains(30.0e+3, 60.0e+3, -DIM_Z).unwrap());
        assert!(!flat.contains(30.0e+3, 60.0e+3, -DIM_Z - 1.0e-3).unwrap());
    }

    #[test]
    fn test_query_top_elevation() {
        let ground = 1.5e+3;
        let model = open_model(simple_store(Some(ground)));
        assert_relative_eq!(
            model.query_top_elevation(30.0e+3, 60.0e+3).unwrap(),
            ground,
            max_relative = 1.0e-12
        );
        // Topo/bathy falls back to the top surface when absent.
        assert_relative_eq!(
            model.query_topo_bathy_elevation(30.0e+3, 60.0e+3).unwrap(),
            ground,
            max_relative = 1.0e-12
        );

        // Without any surface both elevations degrade to 0.
        let flat = open_model(simple_store(None));
        assert_eq!(flat.query_top_elevation(30.0e+3, 60.0e+3).unwrap(), 0.0);
        assert_eq!(
            flat.query_topo_bathy_elevation(30.0e+3, 60.0e+3).unwrap(),
            0.0
        );
    }

    #[test]
    fn test_query_outside_model_is_reported() {
        let model = open_model(simple_store(None));
        assert!(matches!(
            model.query(-5.0e+3, 60.0e+3, -10.0e+3),
            Err(GridError::OutOfBounds(_))
        ));
    }

    #[test]
    fn test_query_values() {
        let model = open_model(simple_store(None));
        let (x, y, z) = (21.0e+3, 44.0e+3, -17.5e+3);
        let values = model.query(x, y, z).unwrap();
        assert_eq!(values.len(), 2);
        assert_relative_eq!(values[0], 2.0e+3 + x + 0.4 * y - 0.5 * z, max_relative = 1.0e-9);
        assert_relative_eq!(
            values[1],
            -1.2e+3 + 2.1 * x - 0.9 * y + 0.3 * z,
            max_relative = 1.0e-9
        );
    }

    #[test]
    fn test_close_releases_queries() {
        let mut model = open_model(simple_store(None));
        model.close();
        assert!(matches!(
            model.contains(1.0, 1.0, -1.0),
            Err(GridError::Usage(_))
        ));
    }
}
