//! Field extraction for gridded precipitation data.
//!
//! Two steps turn a decoded variable into something the renderer can draw:
//!
//! ```text
//! LabeledField [step][lat][lon]
//!      │
//!      ├─► select_layer(LayerSelection)   -> [lat][lon]
//!      │
//!      └─► crop(region)                   -> [lat'][lon'], lat' ⊆ region, lon' ⊆ region
//! ```
//!
//! # Example
//!
//! ```ignore
//! use grid_processor::{extract, LayerSelection};
//! use precip_common::BoundingBox;
//!
//! let cropped = extract(field, LayerSelection::MinimumStep, &BoundingBox::germany())?;
//! ```

pub mod crop;
pub mod error;
pub mod select;

pub use crop::crop;
pub use error::{ExtractError, ExtractResult};
pub use select::{select_layer, LayerSelection};

use precip_common::{BoundingBox, LabeledField};
use tracing::debug;

/// Collapse the step axis and crop to `region`.
pub fn extract(
    field: LabeledField,
    selection: LayerSelection,
    region: &BoundingBox,
) -> ExtractResult<LabeledField> {
    let layer = select_layer(field, selection)?;
    let cropped = crop(&layer, region)?;
    let (lats, lons) = cropped.layer_shape();
    debug!(
        variable = cropped.name(),
        ?selection,
        lats,
        lons,
        "Extracted field"
    );
    Ok(cropped)
}
