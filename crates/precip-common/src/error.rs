//! Error kinds surfaced by the precipitation map pipeline.
//!
//! Component crates keep their own error enums and convert into
//! [`PipelineError`] at the pipeline boundary. Every variant is recoverable
//! at the per-entry level except [`PipelineError::CatalogUnavailable`],
//! which aborts the run.

use crate::time::EntryNameError;
use thiserror::Error;

/// Result type alias using PipelineError.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Catalog unavailable at {url}: {message}")]
    CatalogUnavailable { url: String, message: String },

    #[error("Malformed entry name: {0}")]
    MalformedEntryName(#[from] EntryNameError),

    #[error("Retrieval of {url} failed: {message}")]
    RetrievalFailed { url: String, message: String },

    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("Unsupported grid format: {0}")]
    UnsupportedGridFormat(String),

    #[error("Field is empty after cropping to lon {lon_min}..{lon_max}, lat {lat_min}..{lat_max}")]
    EmptyFieldAfterCrop {
        lon_min: f64,
        lon_max: f64,
        lat_min: f64,
        lat_max: f64,
    },

    #[error("Rendering failed: {0}")]
    RenderFailed(String),
}

impl PipelineError {
    /// Short, stable identifier of the error kind for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::CatalogUnavailable { .. } => "catalog_unavailable",
            PipelineError::MalformedEntryName(_) => "malformed_entry_name",
            PipelineError::RetrievalFailed { .. } => "retrieval_failed",
            PipelineError::DecompressionFailed(_) => "decompression_failed",
            PipelineError::UnsupportedGridFormat(_) => "unsupported_grid_format",
            PipelineError::EmptyFieldAfterCrop { .. } => "empty_field_after_crop",
            PipelineError::RenderFailed(_) => "render_failed",
        }
    }

    /// Whether the run has to stop rather than skip the current entry.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PipelineError::CatalogUnavailable { .. })
    }
}
