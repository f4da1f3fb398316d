//! ESRI shapefile geometry reader.
//!
//! Only the `.shp` main file is read. Polygon and polyline records (plain,
//! `Z` and `M` variants) are returned with their parts as `(x, y)` point
//! lists; every other shape type is skipped.
//!
//! File layout:
//! ```text
//! Header (100 bytes)  file code 9994 (BE) @0, file length in words (BE) @24,
//!                     version 1000 (LE) @28, shape type (LE) @32, bbox @36
//! Record header       record number (BE), content length in words (BE)
//! Record content      shape type (LE), bbox (4 x f64), part count,
//!                     point count, part offsets, points (x, y as f64 LE)
//! ```

use crate::{RenderError, RenderResult};
use precip_common::BoundingBox;
use std::path::Path;

const FILE_CODE: i32 = 9994;
const HEADER_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Polygon,
    Polyline,
}

/// One shapefile record.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub kind: ShapeKind,
    pub bbox: BoundingBox,
    pub parts: Vec<Vec<(f64, f64)>>,
}

/// Read all polygon and polyline records of a `.shp` file.
pub fn read_shapes(path: &Path) -> RenderResult<Vec<Shape>> {
    if !path.exists() {
        return Err(RenderError::MissingShapefile(path.to_path_buf()));
    }
    let data = std::fs::read(path)?;
    parse_shapes(&data).map_err(|reason| RenderError::InvalidShapefile {
        path: path.to_path_buf(),
        reason,
    })
}

/// Parse the contents of a `.shp` file.
pub fn parse_shapes(data: &[u8]) -> Result<Vec<Shape>, String> {
    if data.len() < HEADER_LEN {
        return Err(format!("file of {} bytes is shorter than its header", data.len()));
    }
    if be_i32(data, 0) != FILE_CODE {
        return Err("not a shapefile (bad file code)".to_string());
    }

    let declared_len = be_i32(data, 24).max(0) as usize * 2;
    let end = declared_len.clamp(HEADER_LEN, data.len());

    let mut shapes = Vec::new();
    let mut offset = HEADER_LEN;
    while offset + 8 <= end {
        let content_len = be_i32(data, offset + 4).max(0) as usize * 2;
        let start = offset + 8;
        let stop = start + content_len;
        if stop > end {
            return Err(format!("record at byte {} runs past the end of the file", offset));
        }
        if let Some(shape) = parse_record(&data[start..stop])? {
            shapes.push(shape);
        }
        offset = stop;
    }

    Ok(shapes)
}

fn parse_record(content: &[u8]) -> Result<Option<Shape>, String> {
    if content.len() < 4 {
        return Err("record shorter than its shape type".to_string());
    }
    let kind = match le_i32(content, 0) {
        // Polygon, PolygonZ, PolygonM
        5 | 15 | 25 => ShapeKind::Polygon,
        // PolyLine, PolyLineZ, PolyLineM
        3 | 13 | 23 => ShapeKind::Polyline,
        _ => return Ok(None),
    };

    if content.len() < 44 {
        return Err("truncated polygon/polyline record".to_string());
    }
    let bbox = BoundingBox::new(
        le_f64(content, 4),
        le_f64(content, 12),
        le_f64(content, 20),
        le_f64(content, 28),
    );
    let num_parts = le_i32(content, 36).max(0) as usize;
    let num_points = le_i32(content, 40).max(0) as usize;

    let parts_start = 44;
    let points_start = parts_start + num_parts * 4;
    if content.len() < points_start + num_points * 16 {
        return Err(format!(
            "record declares {} parts and {} points but holds {} bytes",
            num_parts,
            num_points,
            content.len()
        ));
    }

    let mut starts: Vec<usize> = (0..num_parts)
        .map(|i| le_i32(content, parts_start + i * 4).max(0) as usize)
        .collect();
    starts.push(num_points);

    let mut parts = Vec::with_capacity(num_parts);
    for window in starts.windows(2) {
        let (from, to) = (window[0].min(num_points), window[1].min(num_points));
        if from >= to {
            continue;
        }
        let part = (from..to)
            .map(|i| {
                let at = points_start + i * 16;
                (le_f64(content, at), le_f64(content, at + 8))
            })
            .collect();
        parts.push(part);
    }

    Ok(Some(Shape { kind, bbox, parts }))
}

fn be_i32(data: &[u8], at: usize) -> i32 {
    i32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

fn le_i32(data: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

fn le_f64(data: &[u8], at: usize) -> f64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[at..at + 8]);
    f64::from_le_bytes(bytes)
}
