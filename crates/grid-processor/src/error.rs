//! Error types for field extraction.

use precip_common::{BoundingBox, FieldShapeError, PipelineError};
use thiserror::Error;

/// Result type alias using ExtractError.
pub type ExtractResult<T> = Result<T, ExtractError>;

#[derive(Error, Debug)]
pub enum ExtractError {
    /// No grid point of the field falls inside the region.
    #[error("field has {lats} latitudes x {lons} longitudes inside {region:?}")]
    EmptyAfterCrop {
        region: BoundingBox,
        lats: usize,
        lons: usize,
    },

    /// Cropping needs a single layer.
    #[error("field still has {0} steps; select a layer before cropping")]
    StepAxisPresent(usize),

    #[error(transparent)]
    Shape(#[from] FieldShapeError),
}

impl From<ExtractError> for PipelineError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::EmptyAfterCrop { region, .. } => PipelineError::EmptyFieldAfterCrop {
                lon_min: region.min_x,
                lon_max: region.max_x,
                lat_min: region.min_y,
                lat_max: region.max_y,
            },
            other => PipelineError::UnsupportedGridFormat(other.to_string()),
        }
    }
}
