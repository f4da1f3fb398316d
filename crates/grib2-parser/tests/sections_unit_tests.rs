//! Unit tests for GRIB2 section helpers.

use chrono::Duration;
use grib2_parser::sections::{decode_grib2_signed, time_unit_duration};

// ============================================================================
// decode_grib2_signed tests
// ============================================================================

#[test]
fn test_decode_grib2_signed_positive() {
    assert_eq!(decode_grib2_signed(&[0x00, 0x00, 0x03, 0xE8]), 1000);

    // 90 degrees in microdegrees
    let bytes = 90_000_000_u32.to_be_bytes();
    assert_eq!(decode_grib2_signed(&bytes), 90_000_000);
}

#[test]
fn test_decode_grib2_signed_negative() {
    // Sign-magnitude: MSB=1 means negative
    assert_eq!(decode_grib2_signed(&[0x80, 0x00, 0x00, 0x01]), -1);

    let with_sign = 3_940_000_u32 | 0x8000_0000;
    assert_eq!(decode_grib2_signed(&with_sign.to_be_bytes()), -3_940_000);
}

#[test]
fn test_decode_grib2_signed_negative_zero() {
    assert_eq!(decode_grib2_signed(&[0x80, 0x00, 0x00, 0x00]), 0);
}

#[test]
fn test_sign_magnitude_vs_twos_complement() {
    // Two's complement -1 reads as the largest negative magnitude
    assert_eq!(decode_grib2_signed(&[0xFF, 0xFF, 0xFF, 0xFF]), -2147483647);
}

#[test]
fn test_decode_grib2_signed_wrong_length() {
    assert_eq!(decode_grib2_signed(&[0x00, 0x00, 0x01]), 0);
    assert_eq!(decode_grib2_signed(&[]), 0);
    assert_eq!(decode_grib2_signed(&[0x00, 0x00, 0x00, 0x01, 0x00]), 0);
}

// ============================================================================
// Time unit tests (Code Table 4.4)
// ============================================================================

#[test]
fn test_time_units() {
    assert_eq!(time_unit_duration(1, 48).unwrap(), Duration::hours(48));
    assert_eq!(time_unit_duration(2, 2).unwrap(), Duration::hours(48));
    assert_eq!(time_unit_duration(10, 4).unwrap(), Duration::hours(12));
    assert_eq!(time_unit_duration(12, 1).unwrap(), Duration::hours(12));
    assert_eq!(time_unit_duration(13, 3600).unwrap(), Duration::hours(1));
}

#[test]
fn test_unknown_time_unit() {
    assert!(time_unit_duration(254, 1).is_err());
}
