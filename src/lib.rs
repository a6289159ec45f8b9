//! folio paints laid-out XHTML documents into tagged PDF files.
//!
//! A layout engine produces a [`LaidOutDocument`]: the source element tree,
//! positioned boxes and page slices. [`PdfRenderer`] walks it page by page
//! through the lopdf output device, tagging text, lists, figures and links
//! for accessibility, and writes bookmarks and document metadata.

pub mod bookmarks;
pub mod config;
pub mod error;
pub mod metadata;
mod paint;
pub mod renderer;
pub mod source;

pub use bookmarks::{Bookmark, document_outline};
pub use config::{PdfVersion, RenderConfig};
pub use error::PipelineError;
pub use metadata::{Metadata, MetadataList};
pub use renderer::{CreationListener, PagePosition, PdfRenderer, PdfRendererBuilder, find_page_positions_by_id};
pub use source::parse_xhtml;

pub use folio_render_core::{OutputDevice, RenderError};
pub use folio_render_lopdf::{DeviceSettings, DocumentInfo, LopdfOutputDevice};
pub use folio_resource::FilesystemResourceProvider;
pub use folio_traits::{InMemoryResourceProvider, ResourceProvider};
pub use folio_types::LaidOutDocument;
