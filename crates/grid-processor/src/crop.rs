//! Cropping a single layer to a geographic region.

use crate::{ExtractError, ExtractResult};
use precip_common::{BoundingBox, LabeledField};

/// Coordinates this close to a region edge count as inside it.
const EDGE_TOLERANCE: f64 = 1e-6;

/// Keep the grid points whose latitude lies in `[min_y, max_y]` and whose
/// longitude lies in `[min_x, max_x]`.
///
/// The selection is by coordinate value, so it works for ascending and
/// descending axes alike, and the original axis order is preserved.
pub fn crop(field: &LabeledField, region: &BoundingBox) -> ExtractResult<LabeledField> {
    if let Some(steps) = field.steps() {
        return Err(ExtractError::StepAxisPresent(steps.len()));
    }

    let lat_idx = indices_within(field.latitudes(), region.min_y, region.max_y);
    let lon_idx = indices_within(field.longitudes(), region.min_x, region.max_x);

    if lat_idx.is_empty() || lon_idx.is_empty() {
        return Err(ExtractError::EmptyAfterCrop {
            region: *region,
            lats: lat_idx.len(),
            lons: lon_idx.len(),
        });
    }

    let width = field.longitudes().len();
    let source = field.values();
    let mut values = Vec::with_capacity(lat_idx.len() * lon_idx.len());
    for &row in &lat_idx {
        let offset = row * width;
        values.extend(lon_idx.iter().map(|&col| source[offset + col]));
    }

    let latitudes = lat_idx.iter().map(|&i| field.latitudes()[i]).collect();
    let longitudes = lon_idx.iter().map(|&i| field.longitudes()[i]).collect();

    Ok(LabeledField::new(field.name(), latitudes, longitudes, values)?)
}

fn indices_within(axis: &[f64], min: f64, max: f64) -> Vec<usize> {
    axis.iter()
        .enumerate()
        .filter(|(_, &v)| v >= min - EDGE_TOLERANCE && v <= max + EDGE_TOLERANCE)
        .map(|(i, _)| i)
        .collect()
}
