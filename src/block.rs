//! Blocks: depth-bounded regular 3-D grids of physical values

use crate::error::{GridError, MetadataErrors, Result};
use crate::storage::GeoStore;
use crate::utils::cell_index;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// A regular 3-D sub-grid covering one contiguous depth slab of the model.
///
/// The grid stores every named physical value at each vertex, x along the
/// first axis, y along the second, depth along the third (z_top downwards),
/// values along the fourth. Together the blocks of a model partition
/// `[-dim_z, 0]` in local z without gaps or overlap.
pub struct Block {
    name: String,
    resolution_horiz: f64,
    resolution_vert: f64,
    z_top: f64,
    dims: [usize; 4],
    store: Option<Arc<dyn GeoStore>>,
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("name", &self.name)
            .field("resolution_horiz", &self.resolution_horiz)
            .field("resolution_vert", &self.resolution_vert)
            .field("z_top", &self.z_top)
            .field("dims", &self.dims)
            .field("open", &self.store.is_some())
            .finish()
    }
}

impl Block {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            resolution_horiz: 0.0,
            resolution_vert: 0.0,
            z_top: 0.0,
            dims: [0, 0, 0, 0],
            store: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resolution_horiz(&self) -> f64 {
        self.resolution_horiz
    }

    pub fn resolution_vert(&self) -> f64 {
        self.resolution_vert
    }

    /// Local z of the top of the block (shallow bound, <= 0)
    pub fn z_top(&self) -> f64 {
        self.z_top
    }

    /// Local z of the bottom of the block (deep bound)
    pub fn z_bottom(&self) -> f64 {
        self.z_top - self.resolution_vert * (self.dims[2].saturating_sub(1)) as f64
    }

    /// Grid sample counts (x, y, z, values)
    pub fn dims(&self) -> [usize; 4] {
        self.dims
    }

    /// Number of stored physical values per vertex
    pub fn num_values(&self) -> usize {
        self.dims[3]
    }

    fn dataset_path(&self) -> String {
        format!("blocks/{}", self.name)
    }

    /// Shallowest-first total order on the top depth, applied once after
    /// metadata load so depth dispatch can scan linearly.
    pub fn cmp_shallow_first(a: &Block, b: &Block) -> Ordering {
        b.z_top.total_cmp(&a.z_top)
    }

    /// Read resolutions, top depth, and grid extent, recording problems in
    /// `errors`.
    pub fn load_metadata(&mut self, store: &dyn GeoStore, errors: &mut MetadataErrors) {
        let path = self.dataset_path();

        match store.read_f64(&path, "resolution_horiz") {
            Ok(value) if value > 0.0 => self.resolution_horiz = value,
            Ok(_) => errors.add(format!("    {path}/resolution_horiz must be positive")),
            Err(_) => errors.add(format!("    {path}/resolution_horiz")),
        }
        match store.read_f64(&path, "resolution_vert") {
            Ok(value) if value > 0.0 => self.resolution_vert = value,
            Ok(_) => errors.add(format!("    {path}/resolution_vert must be positive")),
            Err(_) => errors.add(format!("    {path}/resolution_vert")),
        }
        match store.read_f64(&path, "z_top") {
            Ok(value) => self.z_top = value,
            Err(_) => errors.add(format!("    {path}/z_top")),
        }

        match store.dataset_dims(&path) {
            Ok(dims) if dims.len() == 4 && dims[..3].iter().all(|&n| n >= 2) && dims[3] >= 1 => {
                self.dims = [dims[0], dims[1], dims[2], dims[3]];
            }
            Ok(dims) => errors.add(format!(
                "    {path} must be a 3-D grid of values with at least 2 samples per axis (dims {dims:?})"
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

    /// Interpolated values at model-local (x, y, z), one per stored value in
    /// storage order.
    ///
    /// Unit-ful values are trilinearly interpolated from the eight
    /// surrounding vertices. Dimensionless values (`units_interpolate[i] ==
    /// false`) are categorical and sampled from the nearest vertex instead of
    /// blended.
    pub fn query(&self, x: f64, y: f64, z: f64, units_interpolate: &[bool]) -> Result<Vec<f64>> {
        let store = self.store.as_ref().ok_or_else(|| {
            GridError::Usage(format!(
                "block '{}' queried outside open_query/close_query",
                self.name
            ))
        })?;
        let num_values = self.dims[3];
        if units_interpolate.len() != num_values {
            return Err(GridError::Usage(format!(
                "block '{}' stores {num_values} values but {} unit flags were supplied",
                self.name,
                units_interpolate.len()
            )));
        }

        let (i0, wx) = cell_index(x, self.resolution_horiz, self.dims[0]);
        let (j0, wy) = cell_index(y, self.resolution_horiz, self.dims[1]);
        let (k0, wz) = cell_index(self.z_top - z, self.resolution_vert, self.dims[2]);

        let slab = store.read_hyperslab(
            &self.dataset_path(),
            &[i0, j0, k0, 0],
            &[2, 2, 2, num_values],
        )?;
        let corner = |ci: usize, cj: usize, ck: usize, v: usize| -> f64 {
            slab[((ci * 2 + cj) * 2 + ck) * num_values + v]
        };

        let mut values = Vec::with_capacity(num_values);
        for v in 0..num_values {
            if units_interpolate[v] {
                let mut acc = 0.0;
                for ci in 0..2 {
                    for cj in 0..2 {
                        for ck in 0..2 {
                            let weight = (if ci == 1 { wx } else { 1.0 - wx })
                                * (if cj == 1 { wy } else { 1.0 - wy })
                                * (if ck == 1 { wz } else { 1.0 - wz });
                            acc += weight * corner(ci, cj, ck, v);
                        }
                    }
                }
                values.push(acc);
            } else {
                let ci = usize::from(wx >= 0.5);
                let cj = usize::from(wy >= 0.5);
                let ck = usize::from(wz >= 0.5);
                values.push(corner(ci, cj, ck, v));
            }
        }
        Ok(values)
    }
}
