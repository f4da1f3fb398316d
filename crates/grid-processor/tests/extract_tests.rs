//! Integration tests for layer selection followed by cropping.

use chrono::Duration;
use grid_processor::{extract, ExtractError, LayerSelection};
use precip_common::{BoundingBox, LabeledField, PipelineError};
use test_utils::{create_precipitation_grid, create_test_grid};

/// 1° grid over lat 40..=60 (north to south) and lon 0..=20.
fn europe_field() -> LabeledField {
    let lats: Vec<f64> = (40..=60).rev().map(f64::from).collect();
    let lons: Vec<f64> = (0..=20).map(f64::from).collect();
    let values = create_test_grid(lons.len(), lats.len());
    LabeledField::new("tp", lats, lons, values).unwrap()
}

// =============================================================================
// Cropping
// =============================================================================

#[test]
fn test_crop_to_germany() {
    let cropped = extract(
        europe_field(),
        LayerSelection::MinimumStep,
        &BoundingBox::germany(),
    )
    .unwrap();

    let expected_lats: Vec<f64> = (47..=56).rev().map(f64::from).collect();
    let expected_lons: Vec<f64> = (6..=15).map(f64::from).collect();
    assert_eq!(cropped.latitudes(), expected_lats.as_slice());
    assert_eq!(cropped.longitudes(), expected_lons.as_slice());
    assert_eq!(cropped.layer_shape(), (10, 10));

    // First row is lat 56 = source row 4, first column is lon 6
    assert_eq!(cropped.value(0, 0, 0), Some(6004.0));
    // Last row is lat 47 = source row 13, last column is lon 15
    assert_eq!(cropped.value(0, 9, 9), Some(15013.0));
}

#[test]
fn test_crop_without_overlap() {
    let region = BoundingBox::new(100.0, -10.0, 110.0, 0.0);
    let err = extract(europe_field(), LayerSelection::MinimumStep, &region).unwrap_err();

    assert!(matches!(err, ExtractError::EmptyAfterCrop { lats: 0, lons: 0, .. }));
    let pipeline: PipelineError = err.into();
    assert_eq!(pipeline.kind(), "empty_field_after_crop");
}

#[test]
fn test_crop_with_latitude_overlap_only() {
    let region = BoundingBox::new(30.0, 47.0, 40.0, 56.0);
    let err = extract(europe_field(), LayerSelection::MinimumStep, &region).unwrap_err();
    assert!(matches!(err, ExtractError::EmptyAfterCrop { lats: 10, lons: 0, .. }));
}

#[test]
fn test_crop_keeps_missing_values() {
    let lats = vec![50.0, 49.0];
    let lons = vec![7.0, 8.0];
    let field = LabeledField::new("tp", lats, lons, vec![1.0, f32::NAN, 3.0, 4.0]).unwrap();

    let cropped = extract(field, LayerSelection::MinimumStep, &BoundingBox::germany()).unwrap();
    assert!(cropped.values()[1].is_nan());
    assert_eq!(cropped.values()[3], 4.0);
}

// =============================================================================
// Layer selection
// =============================================================================

fn stacked_field() -> LabeledField {
    let lats: Vec<f64> = (46..=57).map(f64::from).collect();
    let lons: Vec<f64> = (5..=16).map(f64::from).collect();
    let size = lats.len() * lons.len();

    let mut values = Vec::with_capacity(size * 3);
    for seed in [12, 6, 24] {
        values.extend(create_precipitation_grid(lons.len(), lats.len(), seed));
    }
    LabeledField::with_steps(
        "tp",
        vec![Duration::hours(12), Duration::hours(6), Duration::hours(24)],
        lats,
        lons,
        values,
    )
    .unwrap()
}

#[test]
fn test_minimum_step_then_crop() {
    let field = stacked_field();
    let expected = field.value(1, 1, 1);

    let cropped = extract(field, LayerSelection::MinimumStep, &BoundingBox::germany()).unwrap();
    assert!(cropped.steps().is_none());
    assert_eq!(cropped.dims(), vec!["latitude", "longitude"]);
    assert_eq!(cropped.layer_shape(), (10, 10));
    assert_eq!(cropped.value(0, 0, 0), expected);
}

#[test]
fn test_latest_step_then_crop() {
    let field = stacked_field();
    let expected = field.value(2, 10, 10);

    let cropped = extract(field, LayerSelection::LatestStep, &BoundingBox::germany()).unwrap();
    assert_eq!(cropped.value(0, 9, 9), expected);
}

#[test]
fn test_sum_over_steps_then_crop() {
    let field = stacked_field();
    let expected: f32 = (0..3).filter_map(|i| field.value(i, 5, 5)).sum();

    let cropped = extract(field, LayerSelection::SumOverSteps, &BoundingBox::germany()).unwrap();
    test_utils::assert_approx_eq!(cropped.value(0, 4, 4).unwrap(), expected, 1e-4);
}
