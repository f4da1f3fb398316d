//! Tests for PNG encoding.
//!
//! Encoded images are decoded again with the `image` crate to make sure the
//! hand-written chunks form a valid file.

use image::GenericImageView;
use renderer::png::{create_png_rgba, encode_png};

// ============================================================================
// Helper functions
// ============================================================================

/// Map-like pixels: a dark frame, transparent sea and a few band colors.
fn map_like_pixels(width: usize, height: usize) -> Vec<u8> {
    let bands: [[u8; 4]; 4] = [
        [35, 35, 35, 255],
        [0, 0, 0, 0],
        [207, 225, 37, 128],
        [255, 0, 0, 128],
    ];
    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let band = if x < 4 || y < 4 { 0 } else { 1 + (x * 3 / width) };
            pixels.extend_from_slice(&bands[band.min(3)]);
        }
    }
    pixels
}

// ============================================================================
// Round trips through a real decoder
// ============================================================================

#[test]
fn test_indexed_png_decodes() {
    let pixels = map_like_pixels(64, 48);
    let png = encode_png(&pixels, 64, 48, Some(300)).unwrap();

    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!(decoded.dimensions(), (64, 48));
    assert_eq!(decoded.to_rgba8().into_raw(), pixels);
}

#[test]
fn test_rgba_png_decodes() {
    let mut pixels = Vec::with_capacity(40 * 40 * 4);
    for i in 0..(40 * 40) as u32 {
        pixels.extend_from_slice(&[(i % 251) as u8, (i / 7 % 256) as u8, (i % 13) as u8, 255]);
    }
    let png = encode_png(&pixels, 40, 40, Some(300)).unwrap();

    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!(decoded.to_rgba8().into_raw(), pixels);
}

#[test]
fn test_indexed_is_smaller_for_flat_maps() {
    let pixels = map_like_pixels(256, 256);
    let indexed = encode_png(&pixels, 256, 256, None).unwrap();
    let rgba = create_png_rgba(&pixels, 256, 256, None).unwrap();
    assert!(
        indexed.len() < rgba.len(),
        "indexed {} bytes vs rgba {} bytes",
        indexed.len(),
        rgba.len()
    );
}
