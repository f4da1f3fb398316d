//! Collapsing the forecast step axis to a single layer.

use crate::ExtractResult;
use chrono::Duration;
use precip_common::LabeledField;
use serde::{Deserialize, Serialize};

/// How to reduce a field with a step axis to one 2D layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LayerSelection {
    /// Layer with the smallest step
    #[default]
    MinimumStep,
    /// Layer with the largest step
    LatestStep,
    /// Point-wise sum of all layers; NaN if any layer is NaN
    SumOverSteps,
}

/// Reduce `field` to a single layer. Fields without a step axis are
/// returned unchanged.
pub fn select_layer(field: LabeledField, selection: LayerSelection) -> ExtractResult<LabeledField> {
    let steps = match field.steps() {
        Some(steps) => steps.to_vec(),
        None => return Ok(field),
    };

    let values = match selection {
        LayerSelection::MinimumStep => layer_values(&field, extreme_index(&steps, |a, b| a < b)),
        LayerSelection::LatestStep => layer_values(&field, extreme_index(&steps, |a, b| a > b)),
        LayerSelection::SumOverSteps => {
            let (lats, lons) = field.layer_shape();
            let mut sum = vec![0.0f32; lats * lons];
            for index in 0..field.layer_count() {
                for (acc, v) in sum.iter_mut().zip(layer_values(&field, index)) {
                    *acc += v;
                }
            }
            sum
        }
    };

    Ok(LabeledField::new(
        field.name(),
        field.latitudes().to_vec(),
        field.longitudes().to_vec(),
        values,
    )?)
}

/// First index whose step beats every other under `better`.
fn extreme_index(steps: &[Duration], better: impl Fn(&Duration, &Duration) -> bool) -> usize {
    let mut best = 0;
    for (i, step) in steps.iter().enumerate().skip(1) {
        if better(step, &steps[best]) {
            best = i;
        }
    }
    best
}

fn layer_values(field: &LabeledField, index: usize) -> Vec<f32> {
    field.layer(index).map(<[f32]>::to_vec).unwrap_or_default()
}
