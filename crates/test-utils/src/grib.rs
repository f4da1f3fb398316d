//! GRIB2 test data generator.
//!
//! Creates minimal synthetic GRIB2 messages: regular lat/lon grid,
//! simple packing, optional bitmap for NaN values.

use chrono::{Datelike, Duration, NaiveDate, Timelike};

/// Build a minimal GRIB2 message with the specified parameters
#[derive(Debug, Clone)]
pub struct Grib2Builder {
    discipline: u8,
    center: u16,
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    // Grid definition
    ni: u32,  // columns
    nj: u32,  // rows
    la1: i32, // first lat (microdegrees)
    lo1: i32, // first lon (microdegrees)
    di: u32,  // lon increment (microdegrees)
    dj: u32,  // lat increment (microdegrees)
    scanning_mode: u8,
    // Product definition
    param_category: u8,
    param_number: u8,
    level_type: u8,
    forecast_hour: u32,
    /// Accumulation length in hours; switches to template 4.8
    accumulation_hours: Option<u32>,
    // Data
    data_values: Vec<f32>,
}

impl Grib2Builder {
    /// ICON-D2-like total precipitation: DWD centre, (0,1,52) accumulated
    /// over 12 hours, 0.5 degree grid from 4E/45N to 16E/57N scanned south
    /// to north.
    pub fn new_icon_d2() -> Self {
        let ni = 25;
        let nj = 25;
        Self {
            discipline: 0, // Meteorological
            center: 78,    // DWD Offenbach
            year: 2023,
            month: 6,
            day: 1,
            hour: 0,
            ni,
            nj,
            la1: 45_000_000,
            lo1: 4_000_000,
            di: 500_000,
            dj: 500_000,
            scanning_mode: 0b0100_0000, // +i, +j, i consecutive
            param_category: 1,
            param_number: 52,
            level_type: 1, // surface
            forecast_hour: 0,
            accumulation_hours: Some(12),
            data_values: vec![0.0; (ni * nj) as usize],
        }
    }

    pub fn with_reference_time(mut self, year: u16, month: u8, day: u8, hour: u8) -> Self {
        self.year = year;
        self.month = month;
        self.day = day;
        self.hour = hour;
        self
    }

    pub fn with_grid(mut self, ni: u32, nj: u32) -> Self {
        self.ni = ni;
        self.nj = nj;
        self.data_values = vec![0.0; (ni * nj) as usize];
        self
    }

    /// First grid point and increment, in degrees.
    pub fn with_origin(mut self, lon: f64, lat: f64, increment: f64) -> Self {
        self.lo1 = (lon * 1e6).round() as i32;
        self.la1 = (lat * 1e6).round() as i32;
        self.di = (increment * 1e6).round() as u32;
        self.dj = self.di;
        self
    }

    pub fn with_scanning_mode(mut self, mode: u8) -> Self {
        self.scanning_mode = mode;
        self
    }

    pub fn with_parameter(mut self, category: u8, number: u8) -> Self {
        self.param_category = category;
        self.param_number = number;
        self
    }

    /// Instantaneous product (template 4.0) at `hour`.
    pub fn with_forecast_hour(mut self, hour: u32) -> Self {
        self.forecast_hour = hour;
        self.accumulation_hours = None;
        self
    }

    /// Accumulation from the reference time over `hours` (template 4.8).
    pub fn with_accumulation(mut self, hours: u32) -> Self {
        self.forecast_hour = 0;
        self.accumulation_hours = Some(hours);
        self
    }

    pub fn with_constant_value(mut self, value: f32) -> Self {
        self.data_values = vec![value; (self.ni * self.nj) as usize];
        self
    }

    pub fn with_gradient(mut self, min_val: f32, max_val: f32) -> Self {
        let n = (self.ni * self.nj) as usize;
        self.data_values = (0..n)
            .map(|i| min_val + (max_val - min_val) * (i as f32 / n as f32))
            .collect();
        self
    }

    /// Values in file scan order; NaN entries are encoded through a bitmap.
    pub fn with_data(mut self, data: Vec<f32>) -> Self {
        self.data_values = data;
        self
    }

    /// Build the complete GRIB2 message bytes
    pub fn build(&self) -> Vec<u8> {
        let sections = [
            self.build_section1(),
            self.build_section3(),
            self.build_section4(),
            self.build_section5(),
            self.build_section6(),
            self.build_section7(),
        ];

        let message_length = 16 + sections.iter().map(Vec::len).sum::<usize>() + 4;

        let mut message = Vec::with_capacity(message_length);

        // Section 0: Indicator
        message.extend_from_slice(b"GRIB");
        message.extend_from_slice(&[0, 0]); // Reserved
        message.push(self.discipline);
        message.push(2); // Edition 2
        message.extend_from_slice(&(message_length as u64).to_be_bytes());

        for section in &sections {
            message.extend_from_slice(section);
        }

        // Section 8: End
        message.extend_from_slice(b"7777");

        message
    }

    fn build_section1(&self) -> Vec<u8> {
        let mut section = Vec::new();
        let section_length: u32 = 21;

        section.extend_from_slice(&section_length.to_be_bytes());
        section.push(1); // Section number

        section.extend_from_slice(&self.center.to_be_bytes());
        section.extend_from_slice(&255u16.to_be_bytes()); // Sub-center
        section.push(2); // Master table version
        section.push(1); // Local table version
        section.push(1); // Significance of reference time (start of forecast)

        section.extend_from_slice(&self.year.to_be_bytes());
        section.push(self.month);
        section.push(self.day);
        section.push(self.hour);
        section.push(0); // Minute
        section.push(0); // Second

        section.push(0); // Production status (operational)
        section.push(1); // Type of data (forecast)

        section
    }

    fn build_section3(&self) -> Vec<u8> {
        let mut section = Vec::new();

        // Template 3.0: Latitude/Longitude
        let template_data_len = 58;
        let section_length: u32 = 14 + template_data_len;

        section.extend_from_slice(&section_length.to_be_bytes());
        section.push(3); // Section number

        section.push(0); // Source of grid definition
        section.extend_from_slice(&(self.ni * self.nj).to_be_bytes());
        section.push(0); // Number of octets for optional list
        section.push(0); // Interpretation of optional list
        section.extend_from_slice(&0u16.to_be_bytes()); // Grid definition template (0 = lat/lon)

        section.push(6); // Shape of Earth (spherical with radius 6371229m)
        section.push(0); // Scale factor of radius
        section.extend_from_slice(&0u32.to_be_bytes()); // Scaled value of radius
        section.push(0); // Scale factor of major axis
        section.extend_from_slice(&0u32.to_be_bytes()); // Scaled value of major axis
        section.push(0); // Scale factor of minor axis
        section.extend_from_slice(&0u32.to_be_bytes()); // Scaled value of minor axis

        section.extend_from_slice(&self.ni.to_be_bytes()); // Ni
        section.extend_from_slice(&self.nj.to_be_bytes()); // Nj
        section.extend_from_slice(&0u32.to_be_bytes()); // Basic angle
        section.extend_from_slice(&0xFFFFFFFFu32.to_be_bytes()); // Subdivisions

        let (la2, lo2) = self.last_point();
        section.extend_from_slice(&encode_signed(self.la1)); // La1
        section.extend_from_slice(&encode_signed(self.lo1)); // Lo1
        section.push(48); // Resolution and component flags
        section.extend_from_slice(&encode_signed(la2)); // La2
        section.extend_from_slice(&encode_signed(lo2)); // Lo2
        section.extend_from_slice(&self.di.to_be_bytes()); // Di
        section.extend_from_slice(&self.dj.to_be_bytes()); // Dj
        section.push(self.scanning_mode);

        section
    }

    /// Last grid point following the scanning directions.
    fn last_point(&self) -> (i32, i32) {
        let i_sign = if self.scanning_mode & 0x80 != 0 { -1 } else { 1 };
        let j_sign = if self.scanning_mode & 0x40 != 0 { 1 } else { -1 };
        let la2 = self.la1 + j_sign * (self.nj.saturating_sub(1) * self.dj) as i32;
        let lo2 = self.lo1 + i_sign * (self.ni.saturating_sub(1) * self.di) as i32;
        (la2, lo2)
    }

    fn build_section4(&self) -> Vec<u8> {
        let mut section = Vec::new();
        let template: u16 = if self.accumulation_hours.is_some() { 8 } else { 0 };
        let section_length: u32 = if template == 8 { 58 } else { 34 };

        section.extend_from_slice(&section_length.to_be_bytes());
        section.push(4); // Section number

        section.extend_from_slice(&0u16.to_be_bytes()); // Number of coordinate values
        section.extend_from_slice(&template.to_be_bytes());

        section.push(self.param_category);
        section.push(self.param_number);
        section.push(2); // Type of generating process (forecast)
        section.push(0); // Background generating process
        section.push(0); // Analysis or forecast process
        section.extend_from_slice(&0u16.to_be_bytes()); // Hours of cutoff
        section.push(0); // Minutes of cutoff
        section.push(1); // Time range unit (hours)
        section.extend_from_slice(&self.forecast_hour.to_be_bytes()); // Forecast time

        section.push(self.level_type); // Type of first fixed surface
        section.push(0); // Scale factor
        section.extend_from_slice(&0u32.to_be_bytes()); // Scaled value

        section.push(255); // Type of second fixed surface (none)
        section.push(0); // Scale factor
        section.extend_from_slice(&0u32.to_be_bytes()); // Scaled value

        if let Some(hours) = self.accumulation_hours {
            let end = NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)
                .and_then(|d| d.and_hms_opt(self.hour as u32, 0, 0))
                .expect("valid reference time")
                + Duration::hours((self.forecast_hour + hours) as i64);
            section.extend_from_slice(&(end.year() as u16).to_be_bytes());
            section.extend_from_slice(&[end.month() as u8, end.day() as u8, end.hour() as u8, 0, 0]);
            section.push(1); // Number of time ranges
            section.extend_from_slice(&0u32.to_be_bytes()); // Missing values in statistics
            section.push(1); // Statistical process: accumulation
            section.push(2); // Successive times, same start
            section.push(1); // Unit of time range (hours)
            section.extend_from_slice(&hours.to_be_bytes());
            section.push(255); // Unit of increment
            section.extend_from_slice(&0u32.to_be_bytes()); // Increment
        }

        section
    }

    fn present_values(&self) -> Vec<f32> {
        self.data_values
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .collect()
    }

    /// Reference value, binary scale factor and bit width.
    fn packing(&self) -> (f32, i16, u8) {
        let present = self.present_values();
        let (min_val, max_val) = present.iter().fold(
            (f32::INFINITY, f32::NEG_INFINITY),
            |(min, max), &v| (min.min(v), max.max(v)),
        );
        if present.is_empty() {
            return (0.0, 0, 0);
        }

        let range = max_val - min_val;
        if range == 0.0 {
            return (min_val, 0, 0);
        }

        // 16-bit packing: range = 65535 * 2^E
        let binary_scale_factor = (range / 65535.0).log2().ceil() as i16;
        (min_val, binary_scale_factor, 16)
    }

    fn build_section5(&self) -> Vec<u8> {
        let mut section = Vec::new();
        let (reference_value, binary_scale_factor, bits_per_value) = self.packing();

        let section_length: u32 = 21;

        section.extend_from_slice(&section_length.to_be_bytes());
        section.push(5); // Section number

        section.extend_from_slice(&(self.present_values().len() as u32).to_be_bytes());
        section.extend_from_slice(&0u16.to_be_bytes()); // Template 5.0

        section.extend_from_slice(&reference_value.to_be_bytes());
        section.extend_from_slice(&encode_signed_i16(binary_scale_factor));
        section.extend_from_slice(&0u16.to_be_bytes()); // Decimal scale factor
        section.push(bits_per_value);
        section.push(0); // Original field type (floating point)

        section
    }

    fn build_section6(&self) -> Vec<u8> {
        let mut section = Vec::new();

        if !self.data_values.iter().any(|v| v.is_nan()) {
            section.extend_from_slice(&6u32.to_be_bytes());
            section.push(6);
            section.push(255); // No bitmap
            return section;
        }

        let mut bitmap = vec![0u8; self.data_values.len().div_ceil(8)];
        for (i, v) in self.data_values.iter().enumerate() {
            if !v.is_nan() {
                bitmap[i / 8] |= 0x80 >> (i % 8);
            }
        }

        section.extend_from_slice(&(6 + bitmap.len() as u32).to_be_bytes());
        section.push(6);
        section.push(0); // Bitmap follows
        section.extend_from_slice(&bitmap);
        section
    }

    fn build_section7(&self) -> Vec<u8> {
        let mut section = Vec::new();
        let packed_data = self.pack_simple();
        let section_length: u32 = 5 + packed_data.len() as u32;

        section.extend_from_slice(&section_length.to_be_bytes());
        section.push(7); // Section number
        section.extend_from_slice(&packed_data);

        section
    }

    fn pack_simple(&self) -> Vec<u8> {
        let (reference_value, binary_scale_factor, bits_per_value) = self.packing();
        if bits_per_value == 0 {
            return Vec::new();
        }

        let binary_scale = 2.0_f32.powi(binary_scale_factor as i32);

        let mut packed = Vec::new();
        for val in self.present_values() {
            let packed_value = ((val - reference_value) / binary_scale).round() as u16;
            packed.extend_from_slice(&packed_value.to_be_bytes());
        }
        packed
    }
}

/// Sign-magnitude encoding used by GRIB2 for signed integers.
fn encode_signed(value: i32) -> [u8; 4] {
    let magnitude = value.unsigned_abs() & 0x7FFF_FFFF;
    let raw = if value < 0 { magnitude | 0x8000_0000 } else { magnitude };
    raw.to_be_bytes()
}

fn encode_signed_i16(value: i16) -> [u8; 2] {
    let magnitude = value.unsigned_abs() & 0x7FFF;
    let raw = if value < 0 { magnitude | 0x8000 } else { magnitude };
    raw.to_be_bytes()
}
