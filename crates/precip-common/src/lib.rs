//! Common types shared across the precipitation map pipeline.

pub mod bbox;
pub mod error;
pub mod field;
pub mod grid;
pub mod time;

pub use bbox::BoundingBox;
pub use error::{PipelineError, PipelineResult};
pub use field::{FieldShapeError, LabeledField};
pub use grid::{GridSpec, ScanMode};
pub use time::{parse_entry_name, EntryNameError, EntryNameFormat, ForecastWindow};
