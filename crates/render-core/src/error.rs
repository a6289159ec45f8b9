use folio_traits::ResourceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF generation error: {0}")]
    Pdf(String),
    #[error("Unsupported color model: {0}")]
    UnsupportedColor(String),
    #[error("Unbalanced marked content: {open} open, {unmatched} unmatched closes")]
    TagImbalance { open: usize, unmatched: usize },
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),
    #[error("Could not place embedded document '{uri}': {message}")]
    EmbeddedDocument { uri: String, message: String },
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    #[error("Invalid document state: {0}")]
    DocumentState(String),
    #[error("Other rendering error: {0}")]
    Other(String),
}

impl From<lopdf::Error> for RenderError {
    fn from(err: lopdf::Error) -> Self {
        RenderError::Pdf(err.to_string())
    }
}

impl From<&str> for RenderError {
    fn from(s: &str) -> Self {
        RenderError::Other(s.to_string())
    }
}
