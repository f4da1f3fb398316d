//! GRIB2 section parsing.
//!
//! Each GRIB2 message consists of numbered sections holding metadata, the
//! grid description, the packing parameters and the packed values.

use crate::Grib2Error;
use bytes::Bytes;
use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Section 0: Indicator Section (16 bytes)
#[derive(Debug, Clone)]
pub struct Indicator {
    pub discipline: u8,
    pub edition: u8,
    pub message_length: u64,
}

/// Section 1: Identification Section
#[derive(Debug, Clone)]
pub struct Identification {
    pub center: u16,
    pub sub_center: u16,
    pub significance_of_reference_time: u8,
    pub reference_time: DateTime<Utc>,
    pub production_status: u8,
    pub data_type: u8,
}

/// Section 3: Grid Definition Section
///
/// Only template 3.0 (regular latitude/longitude) carries coordinates;
/// other templates keep their number so callers can report them.
#[derive(Debug, Clone)]
pub struct GridDefinition {
    pub template_number: u16,
    pub num_data_points: u32,
    pub num_points_longitude: u32,
    pub num_points_latitude: u32,
    pub first_latitude: f64,
    pub first_longitude: f64,
    pub last_latitude: f64,
    pub last_longitude: f64,
    pub longitude_increment: f64,
    pub latitude_increment: f64,
    pub scanning_mode: u8,
}

/// Section 4: Product Definition Section
#[derive(Debug, Clone)]
pub struct ProductDefinition {
    pub template_number: u16,
    pub parameter_category: u8,
    pub parameter_number: u8,
    pub time_unit: u8,
    pub forecast_time: u32,
    pub level_type: u8,
    pub level_value: u32,
    /// Type of statistical processing (templates 4.8 and 4.11)
    pub statistical_process: Option<u8>,
    /// Unit and length of the statistical time range
    pub time_range: Option<(u8, u32)>,
}

impl ProductDefinition {
    /// Forecast step at the end of the product's time range.
    ///
    /// For accumulations this is forecast time plus the length of the
    /// accumulation window; for instantaneous products it is the forecast
    /// time itself.
    pub fn step(&self) -> Result<Duration, Grib2Error> {
        let start = time_unit_duration(self.time_unit, self.forecast_time)?;
        match self.time_range {
            Some((unit, length)) => Ok(start + time_unit_duration(unit, length)?),
            None => Ok(start),
        }
    }
}

/// Section 5: Data Representation Section
#[derive(Debug, Clone)]
pub struct DataRepresentation {
    /// Number of packed values (excludes points masked by the bitmap)
    pub num_data_points: u32,
    pub template_number: u16,
    pub reference_value: f32,
    pub binary_scale_factor: i16,
    pub decimal_scale_factor: i16,
    pub bits_per_value: u8,
    pub original_data_type: u8,
}

/// Section 6: Bitmap Section
#[derive(Debug, Clone)]
pub struct Bitmap {
    pub indicator: u8,
    pub data: Bytes,
}

/// Section 7: Data Section
#[derive(Debug, Clone)]
pub struct DataSection {
    pub data: Bytes,
}

// ===== Parsing Functions =====

/// Parse Section 0 (Indicator) from start of message
pub fn parse_indicator(data: &[u8]) -> Result<Indicator, Grib2Error> {
    if data.len() < 16 {
        return Err(Grib2Error::InvalidFormat(
            "Not enough data for indicator section".to_string(),
        ));
    }

    if &data[0..4] != b"GRIB" {
        return Err(Grib2Error::InvalidFormat(
            "Invalid GRIB magic bytes".to_string(),
        ));
    }

    // Octets 5-6 reserved, 7 discipline, 8 edition, 9-16 total length.
    let discipline = data[6];
    let edition = data[7];

    if edition != 2 {
        return Err(Grib2Error::InvalidFormat(format!(
            "Expected GRIB edition 2, got {}",
            edition
        )));
    }

    Ok(Indicator {
        discipline,
        edition,
        message_length: read_u64(data, 8),
    })
}

/// Parse Section 1 (Identification)
pub fn parse_identification(data: &[u8]) -> Result<Identification, Grib2Error> {
    let sec = section_slice(data, 1, 21)?;

    let year = read_u16(sec, 12);
    let (month, day, hour, minute, second) = (sec[14], sec[15], sec[16], sec[17], sec[18]);

    let reference_time = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
        .and_then(|date| date.and_hms_opt(hour as u32, minute as u32, second as u32))
        .ok_or_else(|| Grib2Error::InvalidSection {
            section: 1,
            reason: format!(
                "Invalid date: {}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            ),
        })?;

    Ok(Identification {
        center: read_u16(sec, 5),
        sub_center: read_u16(sec, 7),
        significance_of_reference_time: sec[11],
        reference_time: DateTime::<Utc>::from_naive_utc_and_offset(reference_time, Utc),
        production_status: sec[19],
        data_type: sec[20],
    })
}

/// Parse Section 3 (Grid Definition)
pub fn parse_grid_definition(data: &[u8]) -> Result<GridDefinition, Grib2Error> {
    let sec = section_slice(data, 3, 14)?;

    let num_data_points = read_u32(sec, 6);
    let template_number = read_u16(sec, 12);

    // Template data starts at byte 14
    let gd = &sec[14..];

    if template_number != 0 {
        return Ok(GridDefinition {
            template_number,
            num_data_points,
            num_points_longitude: 0,
            num_points_latitude: 0,
            first_latitude: 0.0,
            first_longitude: 0.0,
            last_latitude: 0.0,
            last_longitude: 0.0,
            longitude_increment: 0.0,
            latitude_increment: 0.0,
            scanning_mode: 0,
        });
    }

    // Template 3.0: Ni at 16, Nj at 20, La1 at 32, Lo1 at 36, La2 at 41,
    // Lo2 at 45, Di at 49, Dj at 53, scanning mode at 57. Angles in 1e-6 deg.
    if gd.len() < 58 {
        return Err(Grib2Error::InvalidSection {
            section: 3,
            reason: format!("Template 0 needs at least 58 bytes, got {}", gd.len()),
        });
    }

    // Basic angle and subdivisions: 0 or all-ones means microdegrees.
    let basic_angle = read_u32(gd, 24);
    let subdivisions = read_u32(gd, 28);
    let microdegrees =
        basic_angle == 0 || basic_angle == u32::MAX || subdivisions == 0 || subdivisions == u32::MAX;
    let to_degrees = |v: f64| {
        if microdegrees {
            v / 1e6
        } else {
            v * basic_angle as f64 / subdivisions as f64
        }
    };

    Ok(GridDefinition {
        template_number,
        num_data_points,
        num_points_longitude: read_u32(gd, 16),
        num_points_latitude: read_u32(gd, 20),
        first_latitude: to_degrees(decode_grib2_signed(&gd[32..36]) as f64),
        first_longitude: to_degrees(decode_grib2_signed(&gd[36..40]) as f64),
        last_latitude: to_degrees(decode_grib2_signed(&gd[41..45]) as f64),
        last_longitude: to_degrees(decode_grib2_signed(&gd[45..49]) as f64),
        longitude_increment: to_degrees(read_u32(gd, 49) as f64),
        latitude_increment: to_degrees(read_u32(gd, 53) as f64),
        scanning_mode: gd[57],
    })
}

/// Parse Section 4 (Product Definition)
pub fn parse_product_definition(data: &[u8]) -> Result<ProductDefinition, Grib2Error> {
    let sec = section_slice(data, 4, 11)?;

    let template_number = read_u16(sec, 7);
    let parameter_category = sec[9];
    let parameter_number = sec[10];

    // Templates 4.0, 4.1, 4.8 and 4.11 share the layout up to the first
    // fixed surface: time unit at 17, forecast time at 18, level at 22.
    if !matches!(template_number, 0 | 1 | 8 | 11) {
        return Err(Grib2Error::UnsupportedTemplate {
            section: 4,
            template: template_number,
        });
    }
    if sec.len() < 28 {
        return Err(Grib2Error::InvalidSection {
            section: 4,
            reason: "Not enough data".to_string(),
        });
    }

    // Time range of the statistical processing; template 4.11 carries
    // three extra ensemble octets before it.
    let stats_offset = match template_number {
        8 => Some(34),
        11 => Some(37),
        _ => None,
    };
    let (statistical_process, time_range) = match stats_offset {
        Some(offset) if sec.len() >= offset + 24 => {
            let process = sec[offset + 12];
            let unit = sec[offset + 14];
            let length = read_u32(sec, offset + 15);
            (Some(process), Some((unit, length)))
        }
        Some(_) => {
            return Err(Grib2Error::InvalidSection {
                section: 4,
                reason: "Statistical time range truncated".to_string(),
            })
        }
        None => (None, None),
    };

    Ok(ProductDefinition {
        template_number,
        parameter_category,
        parameter_number,
        time_unit: sec[17],
        forecast_time: read_u32(sec, 18),
        level_type: sec[22],
        level_value: read_u32(sec, 24),
        statistical_process,
        time_range,
    })
}

/// Parse Section 5 (Data Representation)
pub fn parse_data_representation(data: &[u8]) -> Result<DataRepresentation, Grib2Error> {
    let sec = section_slice(data, 5, 11)?;

    let num_data_points = read_u32(sec, 5);
    let template_number = read_u16(sec, 9);

    // Templates 5.0, 5.2, 5.3, 5.40 and 5.41 all start with R, E, D and
    // the bit width.
    let (reference_value, binary_scale_factor, decimal_scale_factor, bits_per_value, original_data_type) =
        if sec.len() >= 21 {
            (
                f32::from_be_bytes([sec[11], sec[12], sec[13], sec[14]]),
                read_sign_magnitude_i16(sec, 15),
                read_sign_magnitude_i16(sec, 17),
                sec[19],
                sec[20],
            )
        } else {
            (0.0, 0, 0, 0, 0)
        };

    Ok(DataRepresentation {
        num_data_points,
        template_number,
        reference_value,
        binary_scale_factor,
        decimal_scale_factor,
        bits_per_value,
        original_data_type,
    })
}

/// Parse Section 6 (Bitmap). Returns `None` when no bitmap applies.
pub fn parse_bitmap(data: &[u8]) -> Result<Option<Bitmap>, Grib2Error> {
    let sec = section_slice(data, 6, 6)?;
    let indicator = sec[5];

    match indicator {
        255 => Ok(None),
        0 => Ok(Some(Bitmap {
            indicator,
            data: Bytes::copy_from_slice(&sec[6..]),
        })),
        other => Err(Grib2Error::InvalidSection {
            section: 6,
            reason: format!("Bitmap indicator {} is not supported", other),
        }),
    }
}

/// Parse Section 7 (Data)
pub fn parse_data_section(data: &[u8]) -> Result<DataSection, Grib2Error> {
    let sec = section_slice(data, 7, 5)?;
    Ok(DataSection {
        data: Bytes::copy_from_slice(&sec[5..]),
    })
}

// ===== Helper Functions =====

/// Locate section `section_num` and return it, checking a minimum length.
fn section_slice(data: &[u8], section_num: u8, min_len: usize) -> Result<&[u8], Grib2Error> {
    let offset = find_section(data, section_num)?;
    let length = read_u32(data, offset) as usize;
    let sec = &data[offset..offset + length];
    if sec.len() < min_len {
        return Err(Grib2Error::InvalidSection {
            section: section_num,
            reason: format!("Section needs at least {} bytes, got {}", min_len, sec.len()),
        });
    }
    Ok(sec)
}

/// Find a section by number within a message
fn find_section(data: &[u8], section_num: u8) -> Result<usize, Grib2Error> {
    let mut offset = 16; // After Section 0

    loop {
        if offset + 5 > data.len() || &data[offset..offset + 4] == b"7777" {
            return Err(Grib2Error::InvalidSection {
                section: section_num,
                reason: "Reached end of message without finding section".to_string(),
            });
        }

        let section_length = read_u32(data, offset) as usize;

        if section_length < 5 || offset + section_length > data.len() {
            return Err(Grib2Error::InvalidSection {
                section: section_num,
                reason: "Invalid section length".to_string(),
            });
        }

        if data[offset + 4] == section_num {
            return Ok(offset);
        }

        offset += section_length;
    }
}

/// Convert a GRIB2 time range (Code Table 4.4) into a duration.
pub fn time_unit_duration(unit: u8, value: u32) -> Result<Duration, Grib2Error> {
    let value = value as i64;
    let duration = match unit {
        0 => Duration::minutes(value),
        1 => Duration::hours(value),
        2 => Duration::days(value),
        10 => Duration::hours(3 * value),
        11 => Duration::hours(6 * value),
        12 => Duration::hours(12 * value),
        13 => Duration::seconds(value),
        other => {
            return Err(Grib2Error::InvalidSection {
                section: 4,
                reason: format!("Unsupported time unit {}", other),
            })
        }
    };
    Ok(duration)
}

fn read_u16(data: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([data[at], data[at + 1]])
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

fn read_u64(data: &[u8], at: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[at..at + 8]);
    u64::from_be_bytes(buf)
}

/// Decode a 4-byte GRIB2 signed integer.
///
/// GRIB2 encodes negative integers as sign bit plus magnitude, not two's
/// complement. Slices of any other length decode to 0.
pub fn decode_grib2_signed(bytes: &[u8]) -> i32 {
    if bytes.len() != 4 {
        return 0;
    }
    let raw = read_u32(bytes, 0);
    let magnitude = (raw & 0x7FFF_FFFF) as i32;
    if raw & 0x8000_0000 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

fn read_sign_magnitude_i16(data: &[u8], at: usize) -> i16 {
    let raw = read_u16(data, at);
    let magnitude = (raw & 0x7FFF) as i16;
    if raw & 0x8000 != 0 {
        -magnitude
    } else {
        magnitude
    }
}
