//! Pipeline configuration.
//!
//! Every field has a default matching the ICON-D2 Germany maps, so an empty
//! (or absent) YAML file is a valid configuration:
//!
//! ```yaml
//! catalog_url: https://opendata.dwd.de/weather/nwp/icon-d2/grib/12/tot_prec/
//! target_horizons: [6, 12, 24, 48]
//! entry_name_format: structural      # or `!fixed_offset 45`
//! layer_selection: minimum_step      # latest_step | sum_over_steps
//! region: { min_lon: 6, min_lat: 47, max_lon: 15, max_lat: 56 }
//! render:
//!   dpi: 300
//!   region_shapefile: ressources/DEU_adm1.shp
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use grid_processor::LayerSelection;
use precip_common::{BoundingBox, EntryNameFormat};
use renderer::MapStyle;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_CATALOG_URL: &str =
    "https://opendata.dwd.de/weather/nwp/icon-d2/grib/12/tot_prec/";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory listing of forecast files
    pub catalog_url: String,
    /// Horizons to render, in hours, in processing order
    pub target_horizons: Vec<u32>,
    pub entry_name_format: EntryNameFormat,
    /// Short name of the grid variable
    pub variable: String,
    pub layer_selection: LayerSelection,
    pub region: RegionConfig,
    /// Decompressed grid file, overwritten for every entry
    pub scratch_path: PathBuf,
    pub output_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub render: MapStyle,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            target_horizons: vec![6, 12, 24, 48],
            entry_name_format: EntryNameFormat::Structural,
            variable: "tp".to_string(),
            layer_selection: LayerSelection::MinimumStep,
            region: RegionConfig::default(),
            scratch_path: PathBuf::from("data/temp.grib2"),
            output_dir: PathBuf::from("images"),
            request_timeout_secs: 120,
            render: MapStyle::default(),
        }
    }
}

/// Region of interest in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct RegionConfig {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Default for RegionConfig {
    fn default() -> Self {
        let bbox = BoundingBox::germany();
        Self {
            min_lon: bbox.min_x,
            min_lat: bbox.min_y,
            max_lon: bbox.max_x,
            max_lat: bbox.max_y,
        }
    }
}

impl RegionConfig {
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(self.min_lon, self.min_lat, self.max_lon, self.max_lat)
    }
}

/// Command line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub catalog_url: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub scratch_path: Option<PathBuf>,
    pub horizons: Option<Vec<u32>>,
}

impl PipelineConfig {
    /// Load from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::from_yaml(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        // An empty document is null in YAML, not an empty mapping.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, otherwise start from the defaults, then apply
    /// command line overrides.
    pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply(overrides);
        config.validate()?;
        debug!(?config, "Effective configuration");
        Ok(config)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(url) = overrides.catalog_url {
            self.catalog_url = url;
        }
        if let Some(dir) = overrides.output_dir {
            self.output_dir = dir;
        }
        if let Some(path) = overrides.scratch_path {
            self.scratch_path = path;
        }
        if let Some(horizons) = overrides.horizons {
            self.target_horizons = horizons;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_horizons.is_empty() {
            anyhow::bail!("target_horizons must not be empty");
        }
        if !self.region.bbox().is_valid() {
            anyhow::bail!("Invalid region {:?}", self.region);
        }
        if self.variable.is_empty() {
            anyhow::bail!("variable must not be empty");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be positive");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
