//! Loads embedded documents and images from a root directory.
//!
//! Every resolved path must stay below the root; `..` escapes and absolute
//! paths are refused.

use folio_traits::{ResourceError, ResourceProvider, SharedResourceData, resource_key};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

#[derive(Debug)]
pub struct FilesystemResourceProvider {
    root: PathBuf,
    canonical_root: Option<PathBuf>,
}

impl FilesystemResourceProvider {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        let canonical_root = root.canonicalize().ok();
        Self {
            root,
            canonical_root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, uri: &str) -> Result<PathBuf, ResourceError> {
        let key = resource_key(uri);
        let relative = Path::new(key);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(ResourceError::OutsideRoot(key.to_string()));
        }

        let full = self.root.join(relative);
        if let (Ok(canonical), Some(root)) = (full.canonicalize(), &self.canonical_root) {
            // Symlinks may still point elsewhere.
            if !canonical.starts_with(root) {
                return Err(ResourceError::OutsideRoot(key.to_string()));
            }
            return Ok(canonical);
        }
        Ok(full)
    }
}

impl ResourceProvider for FilesystemResourceProvider {
    fn load(&self, uri: &str) -> Result<SharedResourceData, ResourceError> {
        let path = self.resolve(uri)?;
        log::debug!("Loading resource {}", path.display());
        std::fs::read(&path).map(Arc::new).map_err(|e| {
            let key = resource_key(uri).to_string();
            if e.kind() == std::io::ErrorKind::NotFound {
                ResourceError::NotFound(key)
            } else {
                ResourceError::LoadFailed {
                    path: key,
                    message: e.to_string(),
                }
            }
        })
    }

    fn exists(&self, uri: &str) -> bool {
        self.resolve(uri).map(|p| p.is_file()).unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "FilesystemResourceProvider"
    }
}
