//! Forecast windows and catalog entry name parsing.
//!
//! ICON-D2 files are named like
//! `icon-d2_germany_regular-lat-lon_single-level_2024031012_024_2d_tot_prec.grib2.bz2`,
//! where `2024031012` is the issuance time (YYYYMMDDHH, UTC) and `024` is
//! the forecast horizon in hours.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Length of the `YYYYMMDDHH_HHH` block.
const BLOCK_LEN: usize = 14;

/// Time range a precipitation map covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForecastWindow {
    /// Model run (issuance) time
    pub issued_at: DateTime<Utc>,
    /// Forecast horizon in hours
    pub horizon_hours: u32,
    /// Start of the accumulation window (equals the issuance time)
    pub valid_from: DateTime<Utc>,
    /// End of the accumulation window
    pub valid_to: DateTime<Utc>,
}

impl ForecastWindow {
    pub fn new(issued_at: DateTime<Utc>, horizon_hours: u32) -> Self {
        Self {
            issued_at,
            horizon_hours,
            valid_from: issued_at,
            valid_to: issued_at + Duration::hours(horizon_hours as i64),
        }
    }

    /// `{YYYYMMDDHH}_{YYYYMMDDHH}` of the window bounds, used as image name.
    pub fn file_stem(&self) -> String {
        format!(
            "{}_{}",
            self.valid_from.format("%Y%m%d%H"),
            self.valid_to.format("%Y%m%d%H")
        )
    }
}

impl fmt::Display for ForecastWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}+{:03}h",
            self.issued_at.format("%Y%m%d%H"),
            self.horizon_hours
        )
    }
}

/// Where to find the `YYYYMMDDHH_HHH` block in an entry name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryNameFormat {
    /// Locate the block by its shape: ten digits, an underscore, three
    /// digits, not embedded in a longer digit run.
    #[default]
    Structural,
    /// The block starts at a fixed character offset.
    FixedOffset(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryNameError {
    #[error("'{0}' contains no YYYYMMDDHH_HHH block")]
    NoTimeBlock(String),

    #[error("'{name}' is too short for a time block at offset {offset}")]
    TooShort { name: String, offset: usize },

    #[error("'{name}' has an invalid time block '{block}'")]
    InvalidBlock { name: String, block: String },

    #[error("'{name}' has an invalid issuance time '{stamp}'")]
    InvalidDate { name: String, stamp: String },
}

/// Parse the forecast window out of a catalog entry name.
pub fn parse_entry_name(
    name: &str,
    format: EntryNameFormat,
) -> Result<ForecastWindow, EntryNameError> {
    let block = match format {
        EntryNameFormat::Structural => find_time_block(file_name(name))
            .ok_or_else(|| EntryNameError::NoTimeBlock(name.to_string()))?,
        EntryNameFormat::FixedOffset(offset) => {
            let block = name
                .get(offset..offset.saturating_add(BLOCK_LEN))
                .ok_or_else(|| EntryNameError::TooShort {
                    name: name.to_string(),
                    offset,
                })?;
            if !is_time_block(block.as_bytes()) {
                return Err(EntryNameError::InvalidBlock {
                    name: name.to_string(),
                    block: block.to_string(),
                });
            }
            block
        }
    };

    let stamp = &block[..10];
    let invalid_date = || EntryNameError::InvalidDate {
        name: name.to_string(),
        stamp: stamp.to_string(),
    };

    // chrono cannot parse a bare %H without minutes, so split date and hour.
    let date = NaiveDate::parse_from_str(&stamp[..8], "%Y%m%d").map_err(|_| invalid_date())?;
    let hour: u32 = stamp[8..10].parse().map_err(|_| invalid_date())?;
    let naive = date.and_hms_opt(hour, 0, 0).ok_or_else(invalid_date)?;

    let horizon_hours: u32 = block[11..]
        .parse()
        .map_err(|_| EntryNameError::InvalidBlock {
            name: name.to_string(),
            block: block.to_string(),
        })?;

    Ok(ForecastWindow::new(
        Utc.from_utc_datetime(&naive),
        horizon_hours,
    ))
}

/// Last path segment of a link, so directory names never match.
fn file_name(name: &str) -> &str {
    name.rsplit('/').find(|s| !s.is_empty()).unwrap_or(name)
}

/// Find the last well-formed time block in `name`.
fn find_time_block(name: &str) -> Option<&str> {
    let bytes = name.as_bytes();
    if bytes.len() < BLOCK_LEN {
        return None;
    }

    (0..=bytes.len() - BLOCK_LEN)
        .rev()
        .find(|&start| {
            let end = start + BLOCK_LEN;
            let left_ok = start == 0 || !bytes[start - 1].is_ascii_digit();
            let right_ok = end == bytes.len() || !bytes[end].is_ascii_digit();
            left_ok && right_ok && is_time_block(&bytes[start..end])
        })
        .map(|start| &name[start..start + BLOCK_LEN])
}

fn is_time_block(block: &[u8]) -> bool {
    block.len() == BLOCK_LEN
        && block[..10].iter().all(u8::is_ascii_digit)
        && block[10] == b'_'
        && block[11..].iter().all(u8::is_ascii_digit)
}
