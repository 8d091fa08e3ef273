//! Storage backends for hierarchical model containers
//!
//! A model container is a tree of groups, typed attributes, and regular-grid
//! datasets. The query engine only consumes the narrow [`GeoStore`] contract,
//! so the real container format can be swapped for in-memory fixtures in
//! tests. Two implementations ship with the crate: [`MemStore`] (in-memory,
//! also used to author fixtures) and [`FsStore`] (directory-backed, with a
//! serde_json index and gzip-compressed binary dataset files).

use crate::error::{GridError, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use ndarray::{ArrayD, IxDyn, Slice};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File open modes for container-backed stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Read-only access
    ReadOnly,
    /// Read-write access to an existing container
    ReadWrite,
    /// Discard any existing container and start empty
    ReadWriteTruncate,
}

/// Attribute value stored at a group path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Float(f64),
    Text(String),
    TextList(Vec<String>),
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(value: Vec<String>) -> Self {
        AttrValue::TextList(value)
    }
}

impl From<Vec<&str>> for AttrValue {
    fn from(value: Vec<&str>) -> Self {
        AttrValue::TextList(value.into_iter().map(str::to_string).collect())
    }
}

/// Contract between the query engine and the container format.
///
/// Groups and datasets are addressed by `/`-separated paths; attributes live
/// on a group path (`"/"` for the container root). Dataset samples are read
/// as row-major hyperslabs. `open_dataset`/`close_dataset` bracket the query
/// phase of a dataset so a backend can set up and tear down caching or
/// streaming state.
pub trait GeoStore: Send + Sync {
    /// Check whether an attribute exists at a group path
    fn has_attribute(&self, group: &str, name: &str) -> bool;

    /// Read a string attribute
    fn read_string(&self, group: &str, name: &str) -> Result<String>;

    /// Read a floating-point attribute
    fn read_f64(&self, group: &str, name: &str) -> Result<f64>;

    /// Read a string-list attribute
    fn read_string_vec(&self, group: &str, name: &str) -> Result<Vec<String>>;

    /// Check whether a group exists
    fn has_group(&self, path: &str) -> bool;

    /// Check whether a dataset exists
    fn has_dataset(&self, path: &str) -> bool;

    /// Names of the datasets directly under a group, sorted
    fn group_datasets(&self, group: &str) -> Result<Vec<String>>;

    /// Grid dimensions of a dataset
    fn dataset_dims(&self, path: &str) -> Result<Vec<usize>>;

    /// Read a row-major hyperslab of samples: `count[i]` samples starting at
    /// `origin[i]` along each axis
    fn read_hyperslab(&self, path: &str, origin: &[usize], count: &[usize]) -> Result<Vec<f64>>;

    /// Begin the query phase for a dataset (backend may cache)
    fn open_dataset(&self, _path: &str) -> Result<()> {
        Ok(())
    }

    /// End the query phase for a dataset (backend may release caches)
    fn close_dataset(&self, _path: &str) {}
}

fn attr_key(group: &str, name: &str) -> String {
    if group == "/" {
        format!("/{name}")
    } else {
        format!("{group}/{name}")
    }
}

fn slab_from_array(
    array: &ArrayD<f64>,
    path: &str,
    origin: &[usize],
    count: &[usize],
) -> Result<Vec<f64>> {
    let shape = array.shape();
    if origin.len() != shape.len() || count.len() != shape.len() {
        return Err(GridError::OutOfBounds(format!(
            "hyperslab rank {} does not match rank {} of dataset {path}",
            origin.len(),
            shape.len()
        )));
    }
    for axis in 0..shape.len() {
        if count[axis] == 0 || origin[axis] + count[axis] > shape[axis] {
            return Err(GridError::OutOfBounds(format!(
                "hyperslab origin {origin:?} count {count:?} exceeds dims {shape:?} of dataset {path}"
            )));
        }
    }

    let view = array.slice_each_axis(|ax| {
        let axis = ax.axis.index();
        Slice::from(origin[axis]..origin[axis] + count[axis])
    });
    Ok(view.iter().copied().collect())
}

// ------------------------------------------------------------------------------------------------
// In-memory store

/// In-memory model container, used as a test double and to author fixtures
/// that are then persisted with [`FsStore::save`].
#[derive(Debug, Default)]
pub struct MemStore {
    attributes: BTreeMap<String, AttrValue>,
    groups: Vec<String>,
    datasets: BTreeMap<String, ArrayD<f64>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute at a group path (`"/"` for the root)
    pub fn set_attr(&mut self, group: &str, name: &str, value: impl Into<AttrValue>) {
        self.attributes.insert(attr_key(group, name), value.into());
    }

    /// Register an (possibly empty) group
    pub fn add_group(&mut self, path: &str) {
        let path = path.to_string();
        if !self.groups.contains(&path) {
            self.groups.push(path);
        }
    }

    /// Add a dataset with the given grid dimensions and row-major samples
    pub fn add_dataset(&mut self, path: &str, dims: &[usize], values: Vec<f64>) -> Result<()> {
        let array = ArrayD::from_shape_vec(IxDyn(dims), values).map_err(|err| {
            GridError::Storage(format!("dataset {path} shape mismatch: {err}"))
        })?;
        if let Some(pos) = path.rfind('/') {
            self.add_group(&path[..pos]);
        }
        self.datasets.insert(path.to_string(), array);
        Ok(())
    }

    fn attributes_by_group(&self) -> BTreeMap<String, BTreeMap<String, AttrValue>> {
        let mut grouped: BTreeMap<String, BTreeMap<String, AttrValue>> = BTreeMap::new();
        for (key, value) in &self.attributes {
            let (group, name) = match key.rfind('/') {
                Some(0) => ("/".to_string(), key[1..].to_string()),
                Some(pos) => (key[..pos].to_string(), key[pos + 1..].to_string()),
                None => continue,
            };
            grouped.entry(group).or_default().insert(name, value.clone());
        }
        grouped
    }
}

impl GeoStore for MemStore {
    fn has_attribute(&self, group: &str, name: &str) -> bool {
        self.attributes.contains_key(&attr_key(group, name))
    }

    fn read_string(&self, group: &str, name: &str) -> Result<String> {
        let key = attr_key(group, name);
        match self.attributes.get(&key) {
            Some(AttrValue::Text(value)) => Ok(value.clone()),
            Some(_) => Err(GridError::AttributeType(key)),
            None => Err(GridError::AttributeNotFound(key)),
        }
    }

    fn read_f64(&self, group: &str, name: &str) -> Result<f64> {
        let key = attr_key(group, name);
        match self.attributes.get(&key) {
            Some(AttrValue::Float(value)) => Ok(*value),
            Some(_) => Err(GridError::AttributeType(key)),
            None => Err(GridError::AttributeNotFound(key)),
        }
    }

    fn read_string_vec(&self, group: &str, name: &str) -> Result<Vec<String>> {
        let key = attr_key(group, name);
        match self.attributes.get(&key) {
            Some(AttrValue::TextList(value)) => Ok(value.clone()),
            Some(_) => Err(GridError::AttributeType(key)),
            None => Err(GridError::AttributeNotFound(key)),
        }
    }

    fn has_group(&self, path: &str) -> bool {
        self.groups.iter().any(|g| g == path)
            || self
                .datasets
                .keys()
                .any(|d| d.starts_with(path) && d[path.len()..].starts_with('/'))
    }

    fn has_dataset(&self, path: &str) -> bool {
        self.datasets.contains_key(path)
    }

    fn group_datasets(&self, group: &str) -> Result<Vec<String>> {
        if !self.has_group(group) {
            return Err(GridError::DatasetNotFound(group.to_string()));
        }
        let prefix = format!("{group}/");
        Ok(self
            .datasets
            .keys()
            .filter_map(|path| path.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect())
    }

    fn dataset_dims(&self, path: &str) -> Result<Vec<usize>> {
        self.datasets
            .get(path)
            .map(|array| array.shape().to_vec())
            .ok_or_else(|| GridError::DatasetNotFound(path.to_string()))
    }

    fn read_hyperslab(&self, path: &str, origin: &[usize], count: &[usize]) -> Result<Vec<f64>> {
        let array = self
            .datasets
            .get(path)
            .ok_or_else(|| GridError::DatasetNotFound(path.to_string()))?;
        slab_from_array(array, path, origin, count)
    }
}

// ------------------------------------------------------------------------------------------------
// Directory-backed store

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreIndex {
    groups: Vec<String>,
    attributes: BTreeMap<String, BTreeMap<String, AttrValue>>,
    datasets: BTreeMap<String, Vec<usize>>,
}

#[derive(Serialize, Deserialize)]
struct DatasetFile {
    dims: Vec<usize>,
    values: Vec<f64>,
}

const INDEX_FILE: &str = "store.json";
const DATA_DIR: &str = "data";

/// Directory-backed model container.
///
/// Layout: `<dir>/store.json` holds the group/attribute/dataset index and
/// `<dir>/data/<path>.grid` files hold gzip-compressed bincode sample
/// payloads. Datasets are loaded lazily and kept in a cache between
/// `open_dataset`/`close_dataset` calls.
pub struct FsStore {
    dir: PathBuf,
    index: StoreIndex,
    cache: RwLock<HashMap<String, Arc<ArrayD<f64>>>>,
}

impl FsStore {
    /// Open a store directory.
    ///
    /// `ReadOnly` and `ReadWrite` require an existing index;
    /// `ReadWriteTruncate` discards any existing content and starts empty.
    pub fn open(dir: impl AsRef<Path>, mode: FileMode) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let index = match mode {
            FileMode::ReadOnly | FileMode::ReadWrite => {
                let raw = fs::read(dir.join(INDEX_FILE)).map_err(|err| {
                    GridError::Storage(format!(
                        "cannot open store index in {}: {err}",
                        dir.display()
                    ))
                })?;
                serde_json::from_slice(&raw)?
            }
            FileMode::ReadWriteTruncate => {
                if dir.join(DATA_DIR).exists() {
                    fs::remove_dir_all(dir.join(DATA_DIR))?;
                }
                fs::create_dir_all(&dir)?;
                let index = StoreIndex::default();
                fs::write(dir.join(INDEX_FILE), serde_json::to_vec_pretty(&index)?)?;
                index
            }
        };
        tracing::debug!(dir = %dir.display(), datasets = index.datasets.len(), "opened store");
        Ok(Self {
            dir,
            index,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Persist an in-memory store as a store directory
    pub fn save(dir: impl AsRef<Path>, store: &MemStore) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir.join(DATA_DIR))?;

        let mut index = StoreIndex {
            groups: store.groups.clone(),
            attributes: store.attributes_by_group(),
            datasets: BTreeMap::new(),
        };
        for (path, array) in &store.datasets {
            index.datasets.insert(path.clone(), array.shape().to_vec());

            let payload = DatasetFile {
                dims: array.shape().to_vec(),
                values: array.iter().copied().collect(),
            };
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&bincode::serialize(&payload)?)?;
            fs::write(dir.join(Self::dataset_file(path)), encoder.finish()?)?;
        }
        fs::write(dir.join(INDEX_FILE), serde_json::to_vec_pretty(&index)?)?;
        Ok(())
    }

    fn dataset_file(path: &str) -> PathBuf {
        PathBuf::from(DATA_DIR).join(format!("{}.grid", path.replace('/', "__")))
    }

    fn load_dataset(&self, path: &str) -> Result<Arc<ArrayD<f64>>> {
        if let Some(array) = self.cache.read().get(path) {
            return Ok(Arc::clone(array));
        }

        if !self.index.datasets.contains_key(path) {
            return Err(GridError::DatasetNotFound(path.to_string()));
        }
        let raw = fs::read(self.dir.join(Self::dataset_file(path)))?;
        let mut decoder = GzDecoder::new(&raw[..]);
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed)?;
        let payload: DatasetFile = bincode::deserialize(&decompressed)?;
        let array = ArrayD::from_shape_vec(IxDyn(&payload.dims), payload.values)
            .map_err(|err| GridError::Storage(format!("dataset {path} corrupt: {err}")))?;

        let array = Arc::new(array);
        self.cache
            .write()
            .insert(path.to_string(), Arc::clone(&array));
        Ok(array)
    }
}

impl GeoStore for FsStore {
    fn has_attribute(&self, group: &str, name: &str) -> bool {
        self.index
            .attributes
            .get(group)
            .is_some_and(|attrs| attrs.contains_key(name))
    }

    fn read_string(&self, group: &str, name: &str) -> Result<String> {
        let key = attr_key(group, name);
        match self.index.attributes.get(group).and_then(|a| a.get(name)) {
            Some(AttrValue::Text(value)) => Ok(value.clone()),
            Some(_) => Err(GridError::AttributeType(key)),
            None => Err(GridError::AttributeNotFound(key)),
        }
    }

    fn read_f64(&self, group: &str, name: &str) -> Result<f64> {
        let key = attr_key(group, name);
        match self.index.attributes.get(group).and_then(|a| a.get(name)) {
            Some(AttrValue::Float(value)) => Ok(*value),
            Some(_) => Err(GridError::AttributeType(key)),
            None => Err(GridError::AttributeNotFound(key)),
        }
    }

    fn read_string_vec(&self, group: &str, name: &str) -> Result<Vec<String>> {
        let key = attr_key(group, name);
        match self.index.attributes.get(group).and_then(|a| a.get(name)) {
            Some(AttrValue::TextList(value)) => Ok(value.clone()),
            Some(_) => Err(GridError::AttributeType(key)),
            None => Err(GridError::AttributeNotFound(key)),
        }
    }

    fn has_group(&self, path: &str) -> bool {
        self.index.groups.iter().any(|g| g == path)
            || self
                .index
                .datasets
                .keys()
                .any(|d| d.starts_with(path) && d[path.len()..].starts_with('/'))
    }

    fn has_dataset(&self, path: &str) -> bool {
        self.index.datasets.contains_key(path)
    }

    fn group_datasets(&self, group: &str) -> Result<Vec<String>> {
        if !self.has_group(group) {
            return Err(GridError::DatasetNotFound(group.to_string()));
        }
        let prefix = format!("{group}/");
        Ok(self
            .index
            .datasets
            .keys()
            .filter_map(|path| path.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect())
    }

    fn dataset_dims(&self, path: &str) -> Result<Vec<usize>> {
        self.index
            .datasets
            .get(path)
            .cloned()
            .ok_or_else(|| GridError::DatasetNotFound(path.to_string()))
    }

    fn read_hyperslab(&self, path: &str, origin: &[usize], count: &[usize]) -> Result<Vec<f64>> {
        let array = self.load_dataset(path)?;
        slab_from_array(&array, path, origin, count)
    }

    fn open_dataset(&self, path: &str) -> Result<()> {
        self.load_dataset(path).map(|_| ())
    }

    fn close_dataset(&self, path: &str) {
        self.cache.write().remove(path);
    }
}
