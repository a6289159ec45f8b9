use folio_render_core::RenderError;
use thiserror::Error;

/// Everything that can go wrong between reading a laid-out document and
/// finishing the PDF file.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid layout document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid source document: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Invalid id pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Document has no pages")]
    EmptyDocument,

    #[error("Invalid renderer state: {0}")]
    State(String),
}
