//! Loading of external resources referenced from a laid-out document.
//!
//! The painter only ever needs raw bytes: embedded PDF pages are parsed
//! after loading, raster images arrive decoded. URIs may carry a scheme
//! (`file://`) and a fragment (`#page=2`); neither takes part in the lookup.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ResourceError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Failed to load resource '{path}': {message}")]
    LoadFailed { path: String, message: String },

    #[error("Access outside the resource root denied: {0}")]
    OutsideRoot(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ResourceError {
    fn from(err: std::io::Error) -> Self {
        ResourceError::Io(err.to_string())
    }
}

pub type SharedResourceData = Arc<Vec<u8>>;

/// Normalizes a resource URI into the key providers look up.
pub fn resource_key(uri: &str) -> &str {
    let without_fragment = uri.split('#').next().unwrap_or(uri);
    without_fragment
        .strip_prefix("file://")
        .unwrap_or(without_fragment)
}

/// Source of resource bytes. Implementations must be cheap to call
/// repeatedly; the painter caches parsed documents, not bytes.
pub trait ResourceProvider: Send + Sync + Debug {
    fn load(&self, uri: &str) -> Result<SharedResourceData, ResourceError>;

    fn exists(&self, uri: &str) -> bool {
        self.load(uri).is_ok()
    }

    /// Human-readable provider name for log lines.
    fn name(&self) -> &'static str;
}

/// Resources registered up front, keyed by [`resource_key`].
#[derive(Debug, Default)]
pub struct InMemoryResourceProvider {
    resources: RwLock<HashMap<String, SharedResourceData>>,
}

impl InMemoryResourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, uri: &str, data: Vec<u8>) -> Result<(), ResourceError> {
        let key = resource_key(uri).to_string();
        let mut resources = self.resources.write().map_err(|_| ResourceError::LoadFailed {
            path: key.clone(),
            message: "resource store lock poisoned".to_string(),
        })?;
        resources.insert(key, Arc::new(data));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.resources.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResourceProvider for InMemoryResourceProvider {
    fn load(&self, uri: &str) -> Result<SharedResourceData, ResourceError> {
        let key = resource_key(uri);
        let resources = self.resources.read().map_err(|_| ResourceError::LoadFailed {
            path: key.to_string(),
            message: "resource store lock poisoned".to_string(),
        })?;
        resources
            .get(key)
            .cloned()
            .ok_or_else(|| ResourceError::NotFound(key.to_string()))
    }

    fn exists(&self, uri: &str) -> bool {
        self.resources
            .read()
            .map(|r| r.contains_key(resource_key(uri)))
            .unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "InMemoryResourceProvider"
    }
}
