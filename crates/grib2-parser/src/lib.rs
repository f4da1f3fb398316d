//! GRIB2 parser implementation (WMO FM 92 GRIB Edition 2).
//!
//! Reads regular latitude/longitude GRIB2 messages and turns a named
//! variable into a [`LabeledField`](precip_common::LabeledField).

pub mod dataset;
pub mod sections;
pub mod tables;
pub mod unpacking;

pub use dataset::Grib2Dataset;
pub use sections::{
    Bitmap, DataRepresentation, DataSection, GridDefinition, Identification, Indicator,
    ProductDefinition,
};
pub use tables::Grib2Tables;
pub use unpacking::unpack_simple;

use bytes::Bytes;
use chrono::Duration;
use precip_common::{GridSpec, PipelineError, ScanMode};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Grib2Error {
    #[error("Invalid GRIB2 data: {0}")]
    InvalidFormat(String),

    #[error("Invalid section {section}: {reason}")]
    InvalidSection { section: u8, reason: String },

    #[error("Section {section} template {template} is not supported")]
    UnsupportedTemplate { section: u8, template: u16 },

    #[error("Unpacking failed: {0}")]
    UnpackingError(String),

    #[error("Variable '{0}' not found")]
    VariableNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<Grib2Error> for PipelineError {
    fn from(err: Grib2Error) -> Self {
        PipelineError::UnsupportedGridFormat(err.to_string())
    }
}

/// One parsed GRIB2 message.
#[derive(Debug, Clone)]
pub struct Grib2Message {
    pub indicator: Indicator,
    pub identification: Identification,
    pub grid_definition: GridDefinition,
    pub product_definition: ProductDefinition,
    pub data_representation: DataRepresentation,
    pub bitmap: Option<Bitmap>,
    pub data_section: DataSection,
    parameter: String,
    raw: Bytes,
}

impl Grib2Message {
    /// Parse a complete message (Section 0 through "7777").
    pub fn parse(raw: Bytes, tables: &Grib2Tables) -> Result<Self, Grib2Error> {
        let indicator = sections::parse_indicator(&raw)?;
        let identification = sections::parse_identification(&raw)?;
        let grid_definition = sections::parse_grid_definition(&raw)?;
        let product_definition = sections::parse_product_definition(&raw)?;
        let data_representation = sections::parse_data_representation(&raw)?;
        let bitmap = sections::parse_bitmap(&raw)?;
        let data_section = sections::parse_data_section(&raw)?;

        let parameter = tables.get_parameter_name(
            indicator.discipline,
            product_definition.parameter_category,
            product_definition.parameter_number,
        );

        Ok(Self {
            indicator,
            identification,
            grid_definition,
            product_definition,
            data_representation,
            bitmap,
            data_section,
            parameter,
            raw,
        })
    }

    /// Short parameter name from the lookup tables.
    pub fn parameter(&self) -> &str {
        &self.parameter
    }

    /// `(nj, ni)`: rows and columns of the grid.
    pub fn grid_dims(&self) -> (usize, usize) {
        (
            self.grid_definition.num_points_latitude as usize,
            self.grid_definition.num_points_longitude as usize,
        )
    }

    /// Forecast step at the end of the product's time range.
    pub fn step(&self) -> Result<Duration, Grib2Error> {
        self.product_definition.step()
    }

    /// Geometry of the regular lat/lon grid.
    pub fn grid_spec(&self) -> Result<GridSpec, Grib2Error> {
        let gd = &self.grid_definition;
        if gd.template_number != 0 {
            return Err(Grib2Error::UnsupportedTemplate {
                section: 3,
                template: gd.template_number,
            });
        }
        let (nj, ni) = self.grid_dims();
        if ni == 0 || nj == 0 {
            return Err(Grib2Error::InvalidSection {
                section: 3,
                reason: format!("Grid has no points ({} x {})", ni, nj),
            });
        }
        Ok(GridSpec::from_corners(
            ni,
            nj,
            gd.first_longitude,
            gd.first_latitude,
            gd.longitude_increment,
            gd.latitude_increment,
            ScanMode::from_grib2_flag(gd.scanning_mode),
        ))
    }

    /// Decode all grid points in file scan order, NaN where missing.
    pub fn unpack_data(&self) -> Result<Vec<f32>, Grib2Error> {
        let (nj, ni) = self.grid_dims();
        let num_points = (ni * nj) as u32;
        let dr = &self.data_representation;

        let values = if dr.template_number == 0 {
            unpack_simple(
                &self.data_section.data,
                num_points,
                dr.bits_per_value,
                dr.reference_value,
                dr.binary_scale_factor,
                dr.decimal_scale_factor,
                self.bitmap.as_ref().map(|b| b.data.as_ref()),
            )?
            .into_iter()
            .map(|v| v.unwrap_or(f32::NAN))
            .collect()
        } else {
            unpacking::unpack_with_grib_crate(&self.raw)?
        };

        if values.len() != num_points as usize {
            return Err(Grib2Error::UnpackingError(format!(
                "Decoded {} values for a grid of {} points",
                values.len(),
                num_points
            )));
        }
        Ok(values)
    }

    /// Decode values and reorder them to `[row][column]` following the
    /// grid's latitude and longitude axes.
    pub fn field_values(&self) -> Result<Vec<f32>, Grib2Error> {
        let grid = self.grid_spec()?;
        let values = self.unpack_data()?;
        Ok(grid.to_row_major(&values))
    }
}

/// Sequential reader over the messages of a GRIB2 byte stream.
pub struct Grib2Reader {
    data: Bytes,
    offset: usize,
    tables: Arc<Grib2Tables>,
}

impl Grib2Reader {
    pub fn new(data: Bytes, tables: Arc<Grib2Tables>) -> Self {
        Self {
            data,
            offset: 0,
            tables,
        }
    }

    /// Parse the next message, or `None` once the stream is exhausted.
    pub fn next_message(&mut self) -> Result<Option<Grib2Message>, Grib2Error> {
        let remaining = &self.data[self.offset..];
        let start = match remaining.windows(4).position(|w| w == b"GRIB") {
            Some(pos) => self.offset + pos,
            None => {
                self.offset = self.data.len();
                return Ok(None);
            }
        };

        let indicator = sections::parse_indicator(&self.data[start..])?;
        let length = indicator.message_length as usize;
        let end = start
            .checked_add(length)
            .filter(|&end| length >= 20 && end <= self.data.len())
            .ok_or_else(|| {
                Grib2Error::InvalidFormat(format!(
                    "Message at offset {} claims {} bytes, {} available",
                    start,
                    length,
                    self.data.len() - start
                ))
            })?;

        if &self.data[end - 4..end] != b"7777" {
            return Err(Grib2Error::InvalidFormat(format!(
                "Message at offset {} is missing its end marker",
                start
            )));
        }

        self.offset = end;
        let raw = self.data.slice(start..end);
        Grib2Message::parse(raw, &self.tables).map(Some)
    }

    /// Parse every remaining message.
    pub fn read_all(&mut self) -> Result<Vec<Grib2Message>, Grib2Error> {
        let mut messages = Vec::new();
        while let Some(message) = self.next_message()? {
            messages.push(message);
        }
        Ok(messages)
    }
}
