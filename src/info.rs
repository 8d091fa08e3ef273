//! Free-text model description metadata

use crate::error::MetadataErrors;
use crate::storage::GeoStore;
use serde::{Deserialize, Serialize};

/// Descriptive metadata carried at the container root.
///
/// Title, id, and description are required; the remaining fields default to
/// empty when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelInfo {
    pub title: String,
    pub id: String,
    pub description: String,
    pub authors: Vec<String>,
    pub keywords: Vec<String>,
    pub doi: String,
    pub version: String,
    pub history: String,
}

impl ModelInfo {
    /// Read the description attributes from the container root, recording
    /// missing required items in `errors`.
    pub fn load(store: &dyn GeoStore, errors: &mut MetadataErrors) -> Self {
        let mut info = ModelInfo::default();

        for (name, field) in [
            ("title", &mut info.title),
            ("id", &mut info.id),
            ("description", &mut info.description),
        ] {
            match store.read_string("/", name) {
                Ok(value) => *field = value,
                Err(_) => errors.add(format!("    /{name}")),
            }
        }

        info.authors = store.read_string_vec("/", "authors").unwrap_or_default();
        info.keywords = store.read_string_vec("/", "keywords").unwrap_or_default();
        info.doi = store.read_string("/", "doi").unwrap_or_default();
        info.version = store.read_string("/", "version").unwrap_or_default();
        info.history = store.read_string("/", "history").unwrap_or_default();

        info
    }
}
