//! Minimal ESRI shapefile writer for basemap fixtures.
//!
//! Writes `.shp` and `.shx` files holding polygons (shape type 5) or
//! polylines (shape type 3). Attributes (`.dbf`) are not written.

use std::fs;
use std::io;
use std::path::Path;

const POLYLINE: i32 = 3;
const POLYGON: i32 = 5;

/// Write polygons, each a list of rings of `(lon, lat)` points.
///
/// Rings are closed and oriented clockwise, which shapefile readers take as
/// outer rings.
pub fn write_polygon_shapefile(path: &Path, polygons: &[Vec<Vec<(f64, f64)>>]) -> io::Result<()> {
    let records: Vec<Vec<Vec<(f64, f64)>>> = polygons
        .iter()
        .map(|rings| rings.iter().map(|ring| clockwise_closed(ring)).collect())
        .collect();
    write_shapefile(path, POLYGON, &records)
}

/// Write polylines, each a list of parts of `(lon, lat)` points.
pub fn write_polyline_shapefile(path: &Path, lines: &[Vec<Vec<(f64, f64)>>]) -> io::Result<()> {
    write_shapefile(path, POLYLINE, lines)
}

/// Axis-aligned rectangle as a single closed ring.
pub fn rectangle(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Vec<(f64, f64)> {
    vec![
        (min_lon, min_lat),
        (min_lon, max_lat),
        (max_lon, max_lat),
        (max_lon, min_lat),
        (min_lon, min_lat),
    ]
}

fn clockwise_closed(ring: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut ring = ring.to_vec();
    if ring.first() != ring.last() {
        if let Some(&first) = ring.first() {
            ring.push(first);
        }
    }
    // Shoelace: positive area means counter-clockwise.
    let area: f64 = ring
        .windows(2)
        .map(|w| w[0].0 * w[1].1 - w[1].0 * w[0].1)
        .sum();
    if area > 0.0 {
        ring.reverse();
    }
    ring
}

fn write_shapefile(path: &Path, shape_type: i32, records: &[Vec<Vec<(f64, f64)>>]) -> io::Result<()> {
    let mut shp_body = Vec::new();
    let mut shx_body = Vec::new();
    let mut offset_words = 50i32;

    for (index, parts) in records.iter().enumerate() {
        let content = record_content(shape_type, parts);
        let content_words = (content.len() / 2) as i32;

        shx_body.extend_from_slice(&offset_words.to_be_bytes());
        shx_body.extend_from_slice(&content_words.to_be_bytes());

        shp_body.extend_from_slice(&(index as i32 + 1).to_be_bytes());
        shp_body.extend_from_slice(&content_words.to_be_bytes());
        shp_body.extend_from_slice(&content);

        offset_words += 4 + content_words;
    }

    let all_points: Vec<(f64, f64)> = records.iter().flatten().flatten().copied().collect();
    let bbox = bounds(&all_points);

    let mut shp = file_header(shape_type, 50 + (shp_body.len() / 2) as i32, bbox);
    shp.extend_from_slice(&shp_body);
    let mut shx = file_header(shape_type, 50 + (shx_body.len() / 2) as i32, bbox);
    shx.extend_from_slice(&shx_body);

    fs::write(path.with_extension("shp"), shp)?;
    fs::write(path.with_extension("shx"), shx)?;
    Ok(())
}

fn file_header(shape_type: i32, length_words: i32, bbox: [f64; 4]) -> Vec<u8> {
    let mut header = Vec::with_capacity(100);
    header.extend_from_slice(&9994i32.to_be_bytes()); // File code
    header.extend_from_slice(&[0u8; 20]); // Unused
    header.extend_from_slice(&length_words.to_be_bytes());
    header.extend_from_slice(&1000i32.to_le_bytes()); // Version
    header.extend_from_slice(&shape_type.to_le_bytes());
    for v in bbox {
        header.extend_from_slice(&v.to_le_bytes());
    }
    header.extend_from_slice(&[0u8; 32]); // Z and M ranges
    header
}

fn record_content(shape_type: i32, parts: &[Vec<(f64, f64)>]) -> Vec<u8> {
    let points: Vec<(f64, f64)> = parts.iter().flatten().copied().collect();
    let mut content = Vec::new();

    content.extend_from_slice(&shape_type.to_le_bytes());
    for v in bounds(&points) {
        content.extend_from_slice(&v.to_le_bytes());
    }
    content.extend_from_slice(&(parts.len() as i32).to_le_bytes());
    content.extend_from_slice(&(points.len() as i32).to_le_bytes());

    let mut start = 0i32;
    for part in parts {
        content.extend_from_slice(&start.to_le_bytes());
        start += part.len() as i32;
    }
    for (x, y) in points {
        content.extend_from_slice(&x.to_le_bytes());
        content.extend_from_slice(&y.to_le_bytes());
    }
    content
}

fn bounds(points: &[(f64, f64)]) -> [f64; 4] {
    if points.is_empty() {
        return [0.0; 4];
    }
    points.iter().fold(
        [f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY],
        |[min_x, min_y, max_x, max_y], &(x, y)| [min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y)],
    )
}
