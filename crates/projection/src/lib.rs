//! Coordinate reference system transformations.
//!
//! Implements the ellipsoidal Mercator projection from scratch without
//! external dependencies, plus the line simplification used to bring
//! boundary data down to a chosen level of detail.

pub mod error;
pub mod mercator;
pub mod simplify;

pub use error::ProjectionError;
pub use mercator::{Mercator, PixelTransform};
pub use simplify::{simplify_line, BoundaryResolution};
