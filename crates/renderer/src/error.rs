//! Error types for map rendering.

use precip_common::PipelineError;
use projection::ProjectionError;
use std::path::PathBuf;
use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("shapefile not found: {0}")]
    MissingShapefile(PathBuf),

    #[error("invalid shapefile {path}: {reason}")]
    InvalidShapefile { path: PathBuf, reason: String },

    /// The mesh has to be built from the field's own axis lengths.
    #[error("field of {values} values does not match a {lats}x{lons} mesh")]
    MeshMismatch {
        values: usize,
        lats: usize,
        lons: usize,
    },

    #[error("field has a step axis; select a single layer before rendering")]
    NotSingleLayer,

    #[error("invalid style: {0}")]
    InvalidStyle(String),

    #[error("canvas of {width}x{height} pixels could not be allocated")]
    Canvas { width: u32, height: u32 },

    #[error("font could not be loaded")]
    Font,

    #[error("PNG encoding failed: {0}")]
    Encode(String),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<RenderError> for PipelineError {
    fn from(err: RenderError) -> Self {
        PipelineError::RenderFailed(err.to_string())
    }
}
