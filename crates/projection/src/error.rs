use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("invalid map extent: {0}")]
    InvalidExtent(String),

    /// Mercator is undefined at the poles.
    #[error("latitude {0} is outside the Mercator domain")]
    LatitudeOutOfRange(f64),

    #[error("invalid image size {width}x{height}")]
    InvalidImageSize { width: u32, height: u32 },
}
