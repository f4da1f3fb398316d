//! Precipitation forecast maps from DWD ICON-D2 open data.
//!
//! The binary wires these modules together; they are exposed as a library
//! so the pipeline can be driven from integration tests against a local
//! catalog server.

pub mod catalog;
pub mod config;
pub mod pipeline;
pub mod retrieve;

pub use catalog::{fetch_catalog, parse_links, select_entries, CatalogEntry};
pub use config::{Overrides, PipelineConfig};
pub use pipeline::{Pipeline, RunSummary};
pub use retrieve::{decompress, Compression, Grib2Codec, GridCodec, GridRetriever};
