//! Gridded fields with named coordinate axes.

use chrono::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldShapeError {
    #[error("{values} values do not fit {steps} steps x {lats} latitudes x {lons} longitudes")]
    Mismatch {
        values: usize,
        steps: usize,
        lats: usize,
        lons: usize,
    },

    #[error("step axis is empty")]
    EmptyStepAxis,
}

/// A named variable on a rectilinear lat/lon grid, optionally with a
/// leading forecast step axis.
///
/// Values are laid out `[step][latitude][longitude]`. Missing values are
/// NaN. Axes keep the order in which the source file scans them.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledField {
    name: String,
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
    steps: Option<Vec<Duration>>,
    values: Vec<f32>,
}

impl LabeledField {
    /// A single 2D layer.
    pub fn new(
        name: impl Into<String>,
        latitudes: Vec<f64>,
        longitudes: Vec<f64>,
        values: Vec<f32>,
    ) -> Result<Self, FieldShapeError> {
        check_shape(1, latitudes.len(), longitudes.len(), values.len())?;
        Ok(Self {
            name: name.into(),
            latitudes,
            longitudes,
            steps: None,
            values,
        })
    }

    /// A stack of 2D layers, one per forecast step.
    pub fn with_steps(
        name: impl Into<String>,
        steps: Vec<Duration>,
        latitudes: Vec<f64>,
        longitudes: Vec<f64>,
        values: Vec<f32>,
    ) -> Result<Self, FieldShapeError> {
        if steps.is_empty() {
            return Err(FieldShapeError::EmptyStepAxis);
        }
        check_shape(steps.len(), latitudes.len(), longitudes.len(), values.len())?;
        Ok(Self {
            name: name.into(),
            latitudes,
            longitudes,
            steps: Some(steps),
            values,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn latitudes(&self) -> &[f64] {
        &self.latitudes
    }

    pub fn longitudes(&self) -> &[f64] {
        &self.longitudes
    }

    pub fn steps(&self) -> Option<&[Duration]> {
        self.steps.as_deref()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Declared dimension names, outermost first.
    pub fn dims(&self) -> Vec<&'static str> {
        let mut dims = Vec::with_capacity(3);
        if self.steps.is_some() {
            dims.push("step");
        }
        dims.extend(["latitude", "longitude"]);
        dims
    }

    /// Number of layers along the step axis (1 without a step axis).
    pub fn layer_count(&self) -> usize {
        self.steps.as_ref().map_or(1, Vec::len)
    }

    /// `(latitudes, longitudes)` of one layer.
    pub fn layer_shape(&self) -> (usize, usize) {
        (self.latitudes.len(), self.longitudes.len())
    }

    /// Values of layer `index`.
    pub fn layer(&self, index: usize) -> Option<&[f32]> {
        let size = self.latitudes.len() * self.longitudes.len();
        if index >= self.layer_count() {
            return None;
        }
        self.values.get(index * size..(index + 1) * size)
    }

    /// Value at `(lat_index, lon_index)` of layer `index`.
    pub fn value(&self, index: usize, lat_index: usize, lon_index: usize) -> Option<f32> {
        if lat_index >= self.latitudes.len() || lon_index >= self.longitudes.len() {
            return None;
        }
        self.layer(index)
            .map(|layer| layer[lat_index * self.longitudes.len() + lon_index])
    }
}

fn check_shape(
    steps: usize,
    lats: usize,
    lons: usize,
    values: usize,
) -> Result<(), FieldShapeError> {
    if steps * lats * lons != values {
        return Err(FieldShapeError::Mismatch {
            values,
            steps,
            lats,
            lons,
        });
    }
    Ok(())
}
