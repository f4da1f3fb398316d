//! GRIB2 data unpacking.
//!
//! Simple packing (template 5.0) is decoded here. Every other packing is
//! handed to the `grib` crate, which covers complex packing, JPEG2000 and
//! PNG.

use crate::Grib2Error;
use std::io::Cursor;

/// Unpack simple packed GRIB2 data
///
/// `num_points` is the number of grid points. When a bitmap is present only
/// the points it marks as present consume packed values.
///
/// Simple packing formula: value = (reference_value + packed_value * 2^binary_scale) * 10^(-decimal_scale)
pub fn unpack_simple(
    packed_data: &[u8],
    num_points: u32,
    bits_per_value: u8,
    reference_value: f32,
    binary_scale_factor: i16,
    decimal_scale_factor: i16,
    bitmap: Option<&[u8]>,
) -> Result<Vec<Option<f32>>, Grib2Error> {
    let binary_scale = 2.0_f64.powi(binary_scale_factor as i32);
    let decimal_scale = 10.0_f64.powi(-(decimal_scale_factor as i32));
    let reference = reference_value as f64;

    let mut values = Vec::with_capacity(num_points as usize);
    let mut bit_position = 0;
    let bits_per_value = bits_per_value as usize;

    for i in 0..(num_points as usize) {
        if let Some(bm) = bitmap {
            // 1 bit per grid point, MSB first, 1 = value present
            let byte = bm.get(i / 8).ok_or_else(|| {
                Grib2Error::UnpackingError(format!("Bitmap too short for {} points", num_points))
            })?;
            if (byte >> (7 - (i % 8))) & 1 == 0 {
                values.push(None);
                continue;
            }
        }

        let packed_value = if bits_per_value == 0 {
            0
        } else {
            let v = extract_bits(packed_data, bit_position, bits_per_value)
                .map_err(|e| Grib2Error::UnpackingError(format!("Failed to extract bits: {}", e)))?;
            bit_position += bits_per_value;
            v
        };

        let value = (reference + packed_value as f64 * binary_scale) * decimal_scale;
        values.push(Some(value as f32));
    }

    Ok(values)
}

/// Decode a complete message with the `grib` crate.
///
/// Returns values in file scan order with NaN for missing points.
pub fn unpack_with_grib_crate(message: &[u8]) -> Result<Vec<f32>, Grib2Error> {
    let grib_file = grib::from_reader(Cursor::new(message))
        .map_err(|e| Grib2Error::UnpackingError(format!("grib crate failed to read message: {}", e)))?;

    let (_, submessage) = grib_file
        .iter()
        .next()
        .ok_or_else(|| Grib2Error::UnpackingError("Message has no submessage".to_string()))?;

    let decoder = grib::Grib2SubmessageDecoder::from(submessage)
        .map_err(|e| Grib2Error::UnpackingError(format!("Unsupported packing: {}", e)))?;
    let values = decoder
        .dispatch()
        .map_err(|e| Grib2Error::UnpackingError(format!("Decoding failed: {}", e)))?;

    Ok(values.collect())
}

/// Extract bits from a byte array
/// Returns the bits as a 32-bit unsigned integer
fn extract_bits(data: &[u8], start_bit: usize, num_bits: usize) -> Result<u32, String> {
    if num_bits > 32 || num_bits == 0 {
        return Err(format!("Invalid number of bits: {}", num_bits));
    }

    let mut result = 0u32;

    for i in 0..num_bits {
        let absolute_bit = start_bit + i;
        let byte_idx = absolute_bit / 8;
        let bit_idx = 7 - (absolute_bit % 8); // MSB first

        if byte_idx >= data.len() {
            return Err("Not enough data to extract bits".to_string());
        }

        let bit = (data[byte_idx] >> bit_idx) & 1;
        result = (result << 1) | (bit as u32);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bits() {
        // Test with simple byte: 0b10110101
        let data = vec![0b10110101];

        assert_eq!(extract_bits(&data, 0, 2).unwrap(), 0b10);
        assert_eq!(extract_bits(&data, 2, 2).unwrap(), 0b11);
        assert_eq!(extract_bits(&data, 0, 8).unwrap(), 0b10110101);
        assert!(extract_bits(&data, 4, 8).is_err());
    }

    #[test]
    fn test_simple_unpacking() {
        let packed = vec![100, 200];
        let vals = unpack_simple(&packed, 2, 8, 0.0, 0, 0, None).unwrap();

        assert_eq!(vals.len(), 2);
        assert!((vals[0].unwrap() - 100.0).abs() < 0.1);
        assert!((vals[1].unwrap() - 200.0).abs() < 0.1);
    }

    #[test]
    fn test_scale_factors() {
        // (1.0 + 3 * 2^1) * 10^-1 = 0.7
        let vals = unpack_simple(&[3], 1, 8, 1.0, 1, 1, None).unwrap();
        assert!((vals[0].unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_bitmap_skips_missing_points() {
        // Points 0 and 2 present, 1 missing: only two packed values.
        let bitmap = [0b1010_0000];
        let vals = unpack_simple(&[10, 20], 3, 8, 0.0, 0, 0, Some(&bitmap)).unwrap();
        assert_eq!(vals, vec![Some(10.0), None, Some(20.0)]);
    }

    #[test]
    fn test_constant_field() {
        let vals = unpack_simple(&[], 4, 0, 2.5, 0, 0, None).unwrap();
        assert_eq!(vals, vec![Some(2.5); 4]);
    }
}
