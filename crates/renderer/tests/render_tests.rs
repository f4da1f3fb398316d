//! Integration tests for full map rendering.

use chrono::{TimeZone, Utc};
use precip_common::{BoundingBox, ForecastWindow, LabeledField, PipelineError};
use renderer::{Basemap, MapRenderer, MapStyle, RenderError};
use std::path::Path;
use test_utils::{
    create_constant_grid, create_grid_with_nans, create_ramp_grid, rectangle, write_polygon_shapefile,
};

// ============================================================================
// Fixtures
// ============================================================================

/// Small, fast style: 72 dpi so a point is a pixel.
fn small_style(dir: &Path) -> MapStyle {
    MapStyle {
        map_width: 180,
        dpi: 72,
        countries_shapefile: dir.join("countries.shp"),
        region_shapefile: dir.join("DEU_adm1.shp"),
        ..MapStyle::default()
    }
}

/// Land on the western half of the map, one region in the middle.
fn write_basemap(dir: &Path) {
    write_polygon_shapefile(
        &dir.join("countries.shp"),
        &[vec![rectangle(0.0, 40.0, 10.5, 60.0)], vec![rectangle(10.5, 40.0, 12.0, 60.0)]],
    )
    .unwrap();
    write_polygon_shapefile(&dir.join("DEU_adm1.shp"), &[vec![rectangle(8.0, 49.0, 13.0, 53.0)]])
        .unwrap();
}

/// 0.5° field covering the region, north to south.
fn field(values: Vec<f32>) -> LabeledField {
    let lats: Vec<f64> = (0..19).map(|i| 56.0 - i as f64 * 0.5).collect();
    let lons: Vec<f64> = (0..19).map(|i| 6.0 + i as f64 * 0.5).collect();
    LabeledField::new("tp", lats, lons, values).unwrap()
}

fn window() -> ForecastWindow {
    ForecastWindow::new(Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap(), 12)
}

/// White or anti-aliased white over the dark background.
fn is_light(px: [u8; 4]) -> bool {
    px[..3].iter().all(|&c| c > 120)
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn test_all_zero_field_renders_basemap_and_text() {
    let dir = tempfile::tempdir().unwrap();
    write_basemap(dir.path());
    let renderer = MapRenderer::new(small_style(dir.path()), BoundingBox::germany()).unwrap();

    let image = renderer
        .render(&field(create_constant_grid(19, 19, 0.0)), &window())
        .unwrap();
    let (mx, my, mw, mh) = image.map_frame;

    assert_eq!((mw, mh), (180, renderer.transform().height()));
    assert!(image.width > mw && image.height > mh);

    // Eastern sea stays transparent, western land is the continent color
    let sea = image.pixel(mx + mw - 10, my + mh / 4).unwrap();
    assert_eq!(sea[3], 0, "sea pixel {:?}", sea);
    let land = image.pixel(mx + 10, my + mh / 4).unwrap();
    assert_eq!(land, [0x23, 0x23, 0x23, 255]);

    // Outside the map frame the background is the figure color
    assert_eq!(image.pixel(0, image.height - 1).unwrap(), [0x23, 0x23, 0x23, 255]);

    // Title row holds text
    assert!((0..image.width).any(|x| (0..my).any(|y| is_light(image.pixel(x, y).unwrap()))));

    // Borders: the land edge at lon 10.5 is stroked white
    let border_x = mx + mw / 2;
    assert!((border_x - 1..=border_x + 1).any(|x| is_light(image.pixel(x, my + mh / 4).unwrap())));

    // Colorbar right of the map frame is drawn even without rain
    let background = [0x23, 0x23, 0x23, 255];
    let legend_row = my + mh / 2;
    assert!((mx + mw + 1..image.width).any(|x| image.pixel(x, legend_row).unwrap() != background));

    // Caption in the lower-left corner of the map, on land west of the region outline
    let caption = (mx..mx + 30)
        .any(|x| (my + mh - 20..my + mh - 2).any(|y| is_light(image.pixel(x, y).unwrap())));
    assert!(caption, "no caption text in the lower-left corner");
}

#[test]
fn test_rain_is_drawn_over_sea_and_land() {
    let dir = tempfile::tempdir().unwrap();
    write_basemap(dir.path());
    let renderer = MapRenderer::new(small_style(dir.path()), BoundingBox::germany()).unwrap();

    let image = renderer
        .render(&field(create_constant_grid(19, 19, 10.0)), &window())
        .unwrap();
    let (mx, my, mw, mh) = image.map_frame;

    let sea = image.pixel(mx + mw - 10, my + mh / 4).unwrap();
    assert_eq!(sea[3], 128, "half-transparent band over transparent sea");
    let land = image.pixel(mx + 10, my + mh / 4).unwrap();
    assert_eq!(land[3], 255);
    assert_ne!(land, [0x23, 0x23, 0x23, 255], "band tints the land");
}

#[test]
fn test_missing_values_stay_unfilled() {
    let dir = tempfile::tempdir().unwrap();
    write_basemap(dir.path());
    let renderer = MapRenderer::new(small_style(dir.path()), BoundingBox::germany()).unwrap();

    // NaN over the north-eastern corner, 10 mm everywhere else
    let holes: Vec<(usize, usize)> = (13..19).flat_map(|col| (0..8).map(move |row| (col, row))).collect();
    let values: Vec<f32> = create_grid_with_nans(19, 19, &holes)
        .into_iter()
        .map(|v| if v.is_nan() { v } else { 10.0 })
        .collect();

    let image = renderer.render(&field(values), &window()).unwrap();
    let (mx, my, mw, mh) = image.map_frame;
    assert_eq!(image.pixel(mx + mw - 10, my + mh / 4).unwrap()[3], 0);
    assert_eq!(image.pixel(mx + mw - 10, my + mh * 3 / 4).unwrap()[3], 128);
}

#[test]
fn test_over_range_is_red() {
    let dir = tempfile::tempdir().unwrap();
    write_basemap(dir.path());
    let renderer = MapRenderer::new(small_style(dir.path()), BoundingBox::germany()).unwrap();

    let image = renderer
        .render(&field(create_constant_grid(19, 19, 80.0)), &window())
        .unwrap();
    let (mx, my, mw, mh) = image.map_frame;
    assert_eq!(image.pixel(mx + mw - 10, my + mh / 4).unwrap(), [255, 0, 0, 128]);
}

#[test]
fn test_ramp_field_uses_several_bands() {
    let dir = tempfile::tempdir().unwrap();
    write_basemap(dir.path());
    let renderer = MapRenderer::new(small_style(dir.path()), BoundingBox::germany()).unwrap();

    let image = renderer
        .render(&field(create_ramp_grid(19, 19, 60.0)), &window())
        .unwrap();
    let (mx, my, mw, mh) = image.map_frame;
    let row = my + mh - 5;
    let mut colors: Vec<[u8; 4]> = (mx + mw / 2..mx + mw).map(|x| image.pixel(x, row).unwrap()).collect();
    colors.dedup();
    assert!(colors.len() >= 4, "colors along the ramp: {:?}", colors);
}

#[test]
fn test_missing_shapefile_fails() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = MapRenderer::new(small_style(dir.path()), BoundingBox::germany()).unwrap();

    let err = renderer
        .render(&field(create_constant_grid(19, 19, 0.0)), &window())
        .unwrap_err();
    assert!(matches!(err, RenderError::MissingShapefile(_)));
    assert_eq!(PipelineError::from(err).kind(), "render_failed");
}

#[test]
fn test_step_axis_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = MapRenderer::new(small_style(dir.path()), BoundingBox::germany())
        .unwrap()
        .with_basemap(Basemap::default());

    let stacked = LabeledField::with_steps(
        "tp",
        vec![chrono::Duration::hours(1), chrono::Duration::hours(2)],
        vec![50.0],
        vec![7.0],
        vec![1.0, 2.0],
    )
    .unwrap();
    assert!(matches!(
        renderer.render(&stacked, &window()),
        Err(RenderError::NotSingleLayer)
    ));
}

#[test]
fn test_single_row_field_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_basemap(dir.path());
    let out = dir.path().join("images");
    let renderer = MapRenderer::new(small_style(dir.path()), BoundingBox::germany()).unwrap();

    let lons: Vec<f64> = (6..=15).map(f64::from).collect();
    let row = LabeledField::new("tp", vec![51.0], lons, vec![30.0; 10]).unwrap();

    let err = renderer.render_to_file(&row, &window(), &out).unwrap_err();
    assert!(matches!(err, RenderError::MeshMismatch { lats: 1, lons: 10, .. }));
    assert_eq!(PipelineError::from(err).kind(), "render_failed");
    assert!(!out.exists());
}

// ============================================================================
// Output files
// ============================================================================

#[test]
fn test_render_to_file_names_by_window() {
    let dir = tempfile::tempdir().unwrap();
    write_basemap(dir.path());
    let out = dir.path().join("images");
    let renderer = MapRenderer::new(small_style(dir.path()), BoundingBox::germany()).unwrap();

    let path = renderer
        .render_to_file(&field(create_constant_grid(19, 19, 3.0)), &window(), &out)
        .unwrap();

    assert_eq!(path, out.join("2023060100_2023060112.png"));
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
    assert_eq!(std::fs::read_dir(&out).unwrap().count(), 1);

    let decoded = image::load_from_memory(&bytes).unwrap();
    assert!(decoded.width() > 180);
}

#[test]
fn test_failed_render_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("images");
    let renderer = MapRenderer::new(small_style(dir.path()), BoundingBox::germany()).unwrap();

    assert!(renderer
        .render_to_file(&field(create_constant_grid(19, 19, 3.0)), &window(), &out)
        .is_err());
    assert!(!out.exists());
}

#[test]
fn test_invalid_style_rejected() {
    let style = MapStyle {
        colormap: "rainbow".to_string(),
        ..MapStyle::default()
    };
    assert!(matches!(
        MapRenderer::new(style, BoundingBox::germany()),
        Err(RenderError::InvalidStyle(_))
    ));
}
