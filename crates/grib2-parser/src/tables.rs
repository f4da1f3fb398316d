//! GRIB2 parameter lookup tables.
//!
//! Tables translate numeric product codes into the short names callers
//! ask for (`tp`, `t2m`, ...). Several codes may share one name, which is
//! how centre-specific encodings of the same variable are unified.

use std::collections::HashMap;

/// Lookup key for parameter: (discipline, category, number)
pub type ParamKey = (u8, u8, u8);

/// GRIB2 parameter lookup tables.
#[derive(Debug, Clone, Default)]
pub struct Grib2Tables {
    /// (discipline, category, number) -> parameter short name
    parameters: HashMap<ParamKey, String>,
}

impl Grib2Tables {
    /// Create empty tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Names used for surface precipitation and a few companion fields.
    ///
    /// Total precipitation is `tp` both as WMO accumulation (0,1,8) and as
    /// the DWD encoding of TOT_PREC (0,1,52) with a statistical time range.
    pub fn precipitation() -> Self {
        let mut tables = Self::new();
        tables.add_parameter(0, 1, 8, "tp".to_string());
        tables.add_parameter(0, 1, 52, "tp".to_string());
        tables.add_parameter(0, 1, 7, "prate".to_string());
        tables.add_parameter(0, 1, 9, "lsp".to_string());
        tables.add_parameter(0, 1, 10, "cp".to_string());
        tables.add_parameter(0, 1, 29, "sf".to_string());
        tables.add_parameter(0, 0, 0, "t".to_string());
        tables
    }

    /// Add a parameter mapping
    pub fn add_parameter(&mut self, discipline: u8, category: u8, number: u8, name: String) {
        self.parameters.insert((discipline, category, number), name);
    }

    /// Look up parameter short name by GRIB2 codes.
    ///
    /// Returns "P{discipline}_{category}_{number}" if not found.
    pub fn get_parameter_name(&self, discipline: u8, category: u8, number: u8) -> String {
        self.parameters
            .get(&(discipline, category, number))
            .cloned()
            .unwrap_or_else(|| format!("P{}_{}_{}", discipline, category, number))
    }
}
