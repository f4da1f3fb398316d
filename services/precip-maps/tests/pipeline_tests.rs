//! End-to-end pipeline tests against an in-process catalog server.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use precip_maps::{Pipeline, PipelineConfig};
use renderer::MapStyle;
use test_utils::{bzip2_compress, rectangle, write_polygon_shapefile, Grib2Builder};

const PREFIX: &str = "icon-d2_germany_regular-lat-lon_single-level_";

// ============================================================================
// Fixture server
// ============================================================================

#[derive(Clone)]
struct Catalog {
    listing: Option<String>,
    files: Arc<HashMap<String, Vec<u8>>>,
}

async fn listing(State(catalog): State<Catalog>) -> Response {
    match catalog.listing {
        Some(doc) => doc.into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn file(State(catalog): State<Catalog>, UrlPath(name): UrlPath<String>) -> Response {
    match catalog.files.get(&name) {
        Some(bytes) => bytes.clone().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Serve `names` in the listing; only those with content are downloadable.
async fn serve(names: &[String], files: HashMap<String, Vec<u8>>) -> String {
    let mut doc = String::from("<html><body><pre>\n<a href=\"../\">../</a>\n");
    for name in names {
        doc.push_str(&format!("<a href=\"{name}\">{name}</a>   01-Jun-2023 02:10   4242\n"));
    }
    doc.push_str("</pre></body></html>\n");
    serve_catalog(Catalog {
        listing: Some(doc),
        files: Arc::new(files),
    })
    .await
}

async fn serve_catalog(catalog: Catalog) -> String {
    let app = Router::new()
        .route("/", get(listing))
        .route("/:name", get(file))
        .with_state(catalog);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/", addr)
}

// ============================================================================
// Fixture data
// ============================================================================

fn entry_name(run: &str, horizon: u32) -> String {
    format!("{}{}_{:03}_2d_tot_prec.grib2.bz2", PREFIX, run, horizon)
}

/// Compressed ICON-D2-like grid accumulated over `hours` from 2023-06-01 00 UTC.
fn grid_file(hours: u32) -> Vec<u8> {
    let grib = Grib2Builder::new_icon_d2()
        .with_accumulation(hours)
        .with_gradient(0.0, 40.0)
        .build();
    bzip2_compress(&grib)
}

struct Workspace {
    _dir: tempfile::TempDir,
    root: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let resources = root.join("ressources");
        std::fs::create_dir_all(&resources).unwrap();
        write_polygon_shapefile(
            &resources.join("countries.shp"),
            &[vec![rectangle(5.0, 46.0, 15.5, 55.0)]],
        )
        .unwrap();
        write_polygon_shapefile(
            &resources.join("DEU_adm1.shp"),
            &[vec![rectangle(8.0, 49.0, 13.0, 53.0)]],
        )
        .unwrap();
        Self { _dir: dir, root }
    }

    fn config(&self, catalog_url: String, horizons: Vec<u32>) -> PipelineConfig {
        PipelineConfig {
            catalog_url,
            target_horizons: horizons,
            scratch_path: self.root.join("data/temp.grib2"),
            output_dir: self.root.join("images"),
            request_timeout_secs: 10,
            render: MapStyle {
                map_width: 200,
                dpi: 72,
                countries_shapefile: self.root.join("ressources/countries.shp"),
                region_shapefile: self.root.join("ressources/DEU_adm1.shp"),
                ..MapStyle::default()
            },
            ..PipelineConfig::default()
        }
    }

    fn images(&self) -> Vec<String> {
        let dir = self.root.join("images");
        if !dir.exists() {
            return Vec::new();
        }
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

fn is_png(path: &Path) -> bool {
    std::fs::read(path)
        .map(|bytes| bytes.starts_with(&[137, 80, 78, 71, 13, 10, 26, 10]))
        .unwrap_or(false)
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_single_entry_produces_one_image() {
    let ws = Workspace::new();
    let name = entry_name("2023060100", 12);
    let url = serve(
        &[entry_name("2023053118", 12), name.clone()],
        HashMap::from([(name.clone(), grid_file(12))]),
    )
    .await;

    let pipeline = Pipeline::new(ws.config(url, vec![12])).unwrap();
    let summary = pipeline.run().await.unwrap();

    assert!(summary.failed.is_empty(), "failed: {:?}", summary.failed);
    assert_eq!(summary.written, vec![ws.root.join("images/2023060100_2023060112.png")]);
    assert_eq!(ws.images(), vec!["2023060100_2023060112.png"]);
    assert!(is_png(&summary.written[0]));

    // The scratch file holds the decompressed grid
    let scratch = std::fs::read(ws.root.join("data/temp.grib2")).unwrap();
    assert!(scratch.starts_with(b"GRIB"));
}

#[tokio::test]
async fn test_failed_entry_is_skipped() {
    let ws = Workspace::new();
    let h6 = entry_name("2023060100", 6);
    let h12 = entry_name("2023060100", 12);
    let h24 = entry_name("2023060100", 24);
    let url = serve(
        &[h6.clone(), h12.clone(), h24.clone()],
        HashMap::from([
            // h6 is listed but missing on the server
            (h12.clone(), grid_file(12)),
            (h24.clone(), b"truncated download".to_vec()),
        ]),
    )
    .await;

    let pipeline = Pipeline::new(ws.config(url, vec![6, 12, 24])).unwrap();
    let summary = pipeline.run().await.unwrap();

    assert_eq!(
        summary.failed,
        vec![(h6, "retrieval_failed"), (h24, "decompression_failed")]
    );
    assert_eq!(ws.images(), vec!["2023060100_2023060112.png"]);
}

#[tokio::test]
async fn test_missing_shapefile_writes_nothing() {
    let ws = Workspace::new();
    std::fs::remove_file(ws.root.join("ressources/DEU_adm1.shp")).unwrap();
    let name = entry_name("2023060100", 12);
    let url = serve(&[name.clone()], HashMap::from([(name.clone(), grid_file(12))])).await;

    let pipeline = Pipeline::new(ws.config(url, vec![12])).unwrap();
    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.failed, vec![(name, "render_failed")]);
    assert!(ws.images().is_empty());
}

#[tokio::test]
async fn test_unreachable_catalog_aborts() {
    let ws = Workspace::new();
    let url = serve_catalog(Catalog {
        listing: None,
        files: Arc::new(HashMap::new()),
    })
    .await;

    let pipeline = Pipeline::new(ws.config(url, vec![12])).unwrap();
    let err = pipeline.run().await.unwrap_err();
    assert_eq!(err.kind(), "catalog_unavailable");
    assert!(ws.images().is_empty());
}
