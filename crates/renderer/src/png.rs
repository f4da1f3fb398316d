//! PNG encoding for RGBA map images.
//!
//! Two color types are written:
//! - **Indexed (color type 3)** when the image has at most 256 colors, which
//!   is common for maps made of flat fills.
//! - **RGBA (color type 6)** otherwise, e.g. once anti-aliased text and
//!   lines add intermediate shades.
//!
//! A `pHYs` chunk records the pixel density so viewers and print tools size
//! the image at the intended dpi.

use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::io::Write;

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Maximum colors for indexed PNG
const MAX_PALETTE_SIZE: usize = 256;

/// Minimum pixels to benefit from parallel palette extraction
const PARALLEL_THRESHOLD: usize = 4096;

const METERS_PER_INCH: f64 = 0.0254;

type Palette = Vec<[u8; 4]>;

/// Encode straight RGBA pixels, choosing indexed or RGBA output.
pub fn encode_png(
    pixels: &[u8],
    width: usize,
    height: usize,
    dpi: Option<u32>,
) -> Result<Vec<u8>, String> {
    if pixels.len() != width * height * 4 {
        return Err(format!(
            "{} bytes do not hold a {}x{} RGBA image",
            pixels.len(),
            width,
            height
        ));
    }

    let palette = if pixels.len() / 4 >= PARALLEL_THRESHOLD {
        extract_palette_parallel(pixels)
    } else {
        extract_palette_sequential(pixels)
    };

    match palette {
        Some((palette, indices)) => create_png_indexed(width, height, &palette, &indices, dpi),
        None => create_png_rgba(pixels, width, height, dpi),
    }
}

/// Pixels per meter for a dpi value, as stored in `pHYs`.
pub fn pixels_per_meter(dpi: u32) -> u32 {
    (dpi as f64 / METERS_PER_INCH).round() as u32
}

#[inline(always)]
fn pack_color(px: &[u8]) -> u32 {
    u32::from_le_bytes([px[0], px[1], px[2], px[3]])
}

fn extract_palette_sequential(pixels: &[u8]) -> Option<(Palette, Vec<u8>)> {
    let mut lookup: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices = Vec::with_capacity(pixels.len() / 4);

    for px in pixels.chunks_exact(4) {
        let key = pack_color(px);
        let index = match lookup.get(&key) {
            Some(&index) => index,
            None => {
                if palette.len() >= MAX_PALETTE_SIZE {
                    return None;
                }
                let index = palette.len() as u8;
                palette.push([px[0], px[1], px[2], px[3]]);
                lookup.insert(key, index);
                index
            }
        };
        indices.push(index);
    }

    Some((palette, indices))
}

/// Collect unique colors per chunk in parallel, merge, then map pixels to
/// palette indices in parallel.
fn extract_palette_parallel(pixels: &[u8]) -> Option<(Palette, Vec<u8>)> {
    let chunk_pixels = (pixels.len() / 4 / rayon::current_num_threads()).max(256);

    let chunk_colors: Vec<HashSet<u32>> = pixels
        .par_chunks(chunk_pixels * 4)
        .map(|chunk| {
            let mut seen = HashSet::with_capacity(MAX_PALETTE_SIZE);
            for px in chunk.chunks_exact(4) {
                seen.insert(pack_color(px));
                if seen.len() > MAX_PALETTE_SIZE {
                    break;
                }
            }
            seen
        })
        .collect();

    let mut lookup: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    for key in chunk_colors.into_iter().flatten() {
        if lookup.contains_key(&key) {
            continue;
        }
        if palette.len() >= MAX_PALETTE_SIZE {
            return None;
        }
        lookup.insert(key, palette.len() as u8);
        palette.push(key.to_le_bytes());
    }

    let indices = pixels
        .par_chunks_exact(4)
        .map(|px| lookup.get(&pack_color(px)).copied().unwrap_or(0))
        .collect();

    Some((palette, indices))
}

/// Write an indexed PNG (color type 3) from a palette and one index per pixel.
pub fn create_png_indexed(
    width: usize,
    height: usize,
    palette: &[[u8; 4]],
    indices: &[u8],
    dpi: Option<u32>,
) -> Result<Vec<u8>, String> {
    if palette.is_empty() || palette.len() > MAX_PALETTE_SIZE {
        return Err(format!("palette of {} colors", palette.len()));
    }

    let mut png = SIGNATURE.to_vec();
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 3));
    write_phys(&mut png, dpi);

    let plte: Vec<u8> = palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    write_chunk(&mut png, b"PLTE", &plte);

    if palette.iter().any(|c| c[3] < 255) {
        let trns: Vec<u8> = palette.iter().map(|c| c[3]).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    let idat = deflate_scanlines(indices, width, height)
        .map_err(|e| format!("IDAT compression failed: {}", e))?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Write an RGBA PNG (color type 6).
pub fn create_png_rgba(
    pixels: &[u8],
    width: usize,
    height: usize,
    dpi: Option<u32>,
) -> Result<Vec<u8>, String> {
    let mut png = SIGNATURE.to_vec();
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 6));
    write_phys(&mut png, dpi);

    let idat = deflate_scanlines(pixels, width * 4, height)
        .map_err(|e| format!("IDAT compression failed: {}", e))?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

fn ihdr(width: usize, height: usize, color_type: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(13);
    data.extend_from_slice(&(width as u32).to_be_bytes());
    data.extend_from_slice(&(height as u32).to_be_bytes());
    data.push(8); // bit depth
    data.push(color_type);
    data.push(0); // compression method
    data.push(0); // filter method
    data.push(0); // interlace method
    data
}

fn write_phys(png: &mut Vec<u8>, dpi: Option<u32>) {
    let Some(dpi) = dpi.filter(|&d| d > 0) else {
        return;
    };
    let ppm = pixels_per_meter(dpi).to_be_bytes();
    let mut data = Vec::with_capacity(9);
    data.extend_from_slice(&ppm);
    data.extend_from_slice(&ppm);
    data.push(1); // unit: meter
    write_chunk(png, b"pHYs", &data);
}

/// Prefix each `row_bytes`-long scanline with filter type 0 and deflate.
fn deflate_scanlines(data: &[u8], row_bytes: usize, height: usize) -> std::io::Result<Vec<u8>> {
    let mut raw = Vec::with_capacity(height * (1 + row_bytes));
    for row in data.chunks_exact(row_bytes.max(1)).take(height) {
        raw.push(0);
        raw.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&raw)?;
    encoder.finish()
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}
