//! Grid retrieval: download, decompress, decode.
//!
//! The decompressed payload goes to a single scratch file which the grid
//! codec then opens. Entries are processed one at a time, so the file is
//! never shared between in-flight entries.

use std::io::Read;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use grib2_parser::Grib2Dataset;
use precip_common::{LabeledField, PipelineError, PipelineResult};
use reqwest::{Client, Url};
use tracing::{debug, info, instrument};

/// Compression wrapper of a catalog entry, known from its file suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Bzip2,
    Gzip,
    None,
}

impl Compression {
    pub fn from_name(name: &str) -> Self {
        if name.ends_with(".bz2") {
            Compression::Bzip2
        } else if name.ends_with(".gz") {
            Compression::Gzip
        } else {
            Compression::None
        }
    }
}

/// Undo the compression wrapper.
pub fn decompress(data: &[u8], compression: Compression) -> PipelineResult<Vec<u8>> {
    let mut out = Vec::new();
    let result = match compression {
        Compression::Bzip2 => bzip2::read::BzDecoder::new(data).read_to_end(&mut out),
        Compression::Gzip => flate2::read::GzDecoder::new(data).read_to_end(&mut out),
        Compression::None => return Ok(data.to_vec()),
    };
    result.map_err(|e| PipelineError::DecompressionFailed(format!("{:?}: {}", compression, e)))?;
    Ok(out)
}

/// Opens a decoded grid file and returns one named variable.
pub trait GridCodec {
    fn open_variable(&self, path: &Path, variable: &str) -> PipelineResult<LabeledField>;
}

/// GRIB2 through [`Grib2Dataset`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Grib2Codec;

impl GridCodec for Grib2Codec {
    fn open_variable(&self, path: &Path, variable: &str) -> PipelineResult<LabeledField> {
        let dataset = Grib2Dataset::open(path)?;
        Ok(dataset.variable(variable)?)
    }
}

pub struct GridRetriever<C = Grib2Codec> {
    client: Client,
    scratch_path: PathBuf,
    codec: C,
}

impl GridRetriever<Grib2Codec> {
    pub fn new(client: Client, scratch_path: impl Into<PathBuf>) -> Self {
        Self::with_codec(client, scratch_path, Grib2Codec)
    }
}

impl<C: GridCodec> GridRetriever<C> {
    pub fn with_codec(client: Client, scratch_path: impl Into<PathBuf>, codec: C) -> Self {
        Self {
            client,
            scratch_path: scratch_path.into(),
            codec,
        }
    }

    /// Fetch `url`, decompress according to its suffix and decode `variable`.
    #[instrument(skip(self, url), fields(url = %url))]
    pub async fn retrieve(&self, url: &Url, variable: &str) -> PipelineResult<LabeledField> {
        let payload = fetch(&self.client, url).await?;
        let compression = Compression::from_name(url.path());
        let raw = decompress(&payload, compression)?;
        debug!(
            compressed = payload.len(),
            decompressed = raw.len(),
            ?compression,
            "Decompressed payload"
        );

        self.write_scratch(&raw)?;
        drop(raw);
        self.codec.open_variable(&self.scratch_path, variable)
    }

    fn write_scratch(&self, data: &[u8]) -> PipelineResult<()> {
        let failed = |e: std::io::Error| PipelineError::RetrievalFailed {
            url: self.scratch_path.display().to_string(),
            message: format!("cannot write scratch file: {}", e),
        };
        if let Some(parent) = self.scratch_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(failed)?;
        }
        std::fs::write(&self.scratch_path, data).map_err(failed)
    }
}

/// Download the full body of `url`.
pub async fn fetch(client: &Client, url: &Url) -> PipelineResult<Bytes> {
    let failed = |message: String| PipelineError::RetrievalFailed {
        url: url.to_string(),
        message,
    };

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| failed(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(failed(format!("HTTP {}", status)));
    }
    let body = response.bytes().await.map_err(|e| failed(e.to_string()))?;
    info!(bytes = body.len(), "Downloaded grid file");
    Ok(body)
}
