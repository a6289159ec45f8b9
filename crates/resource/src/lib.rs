//! Resource providers for the folio page painter.
//!
//! - [`FilesystemResourceProvider`]: files under a root directory
//! - [`InMemoryResourceProvider`]: bytes registered up front (re-exported)

mod filesystem;

pub use filesystem::FilesystemResourceProvider;

pub use folio_traits::InMemoryResourceProvider;
