//! Pipeline driver.
//!
//! ```text
//! catalog ─► select_entries ─► for each entry:
//!                                 retrieve ─► extract ─► render ─► images/{from}_{to}.png
//! ```
//!
//! Entries run strictly one after another. A failed entry is logged with
//! its error kind and the run moves on to the next one; only an unreachable
//! catalog stops the run.

use std::path::PathBuf;

use anyhow::Context;
use precip_common::{BoundingBox, PipelineError, PipelineResult};
use renderer::MapRenderer;
use reqwest::{Client, Url};
use tracing::{error, info, instrument};

use crate::catalog::{fetch_catalog, select_entries, CatalogEntry};
use crate::config::PipelineConfig;
use crate::retrieve::{Grib2Codec, GridCodec, GridRetriever};

/// Outcome of one run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Images written, in processing order
    pub written: Vec<PathBuf>,
    /// Entry name and error kind of every failed entry
    pub failed: Vec<(String, &'static str)>,
}

pub struct Pipeline<C = Grib2Codec> {
    config: PipelineConfig,
    client: Client,
    region: BoundingBox,
    retriever: GridRetriever<C>,
    renderer: MapRenderer,
}

impl Pipeline<Grib2Codec> {
    pub fn new(config: PipelineConfig) -> anyhow::Result<Self> {
        Self::with_codec(config, Grib2Codec)
    }
}

impl<C: GridCodec> Pipeline<C> {
    pub fn with_codec(config: PipelineConfig, codec: C) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to create HTTP client")?;
        let region = config.region.bbox();
        let retriever = GridRetriever::with_codec(client.clone(), config.scratch_path.clone(), codec);
        let renderer = MapRenderer::new(config.render.clone(), region)
            .context("Invalid render configuration")?;

        Ok(Self {
            config,
            client,
            region,
            retriever,
            renderer,
        })
    }

    /// Fetch the catalog and render every selected entry.
    pub async fn run(&self) -> PipelineResult<RunSummary> {
        let base = Url::parse(&self.config.catalog_url).map_err(|e| {
            PipelineError::CatalogUnavailable {
                url: self.config.catalog_url.clone(),
                message: e.to_string(),
            }
        })?;
        let links = fetch_catalog(&self.client, base.as_str()).await?;
        let entries = select_entries(
            &links,
            &base,
            &self.config.target_horizons,
            self.config.entry_name_format,
        );
        info!(selected = entries.len(), "Selected catalog entries");

        let mut summary = RunSummary::default();
        for entry in &entries {
            match self.process_entry(entry).await {
                Ok(path) => summary.written.push(path),
                Err(e) => {
                    error!(
                        entry = %entry.name,
                        kind = e.kind(),
                        error = %e,
                        "Failed to process entry"
                    );
                    summary.failed.push((entry.name.clone(), e.kind()));
                }
            }
        }

        info!(
            written = summary.written.len(),
            failed = summary.failed.len(),
            "Run complete"
        );
        Ok(summary)
    }

    /// Retrieve, extract and render one entry.
    #[instrument(skip(self, entry), fields(entry = %entry.name, horizon_hours = entry.window.horizon_hours))]
    pub async fn process_entry(&self, entry: &CatalogEntry) -> PipelineResult<PathBuf> {
        let field = self
            .retriever
            .retrieve(&entry.url, &self.config.variable)
            .await?;
        let field = grid_processor::extract(field, self.config.layer_selection, &self.region)?;
        let path = self
            .renderer
            .render_to_file(&field, &entry.window, &self.config.output_dir)?;
        Ok(path)
    }
}
