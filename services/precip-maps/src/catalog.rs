//! Catalog discovery on the open data directory listing.
//!
//! The listing is a plain HTML index with one `<a href="...">` per line.
//! Entries are selected by their parsed forecast horizon, taking only the
//! most recent issuance present in the listing.

use chrono::{DateTime, Utc};
use precip_common::{parse_entry_name, EntryNameFormat, ForecastWindow, PipelineError, PipelineResult};
use reqwest::{Client, Url};
use tracing::{debug, info, instrument, warn};

/// One forecast file in the listing.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    /// Link text as it appears in the listing
    pub name: String,
    pub url: Url,
    pub window: ForecastWindow,
}

impl CatalogEntry {
    pub fn parse(name: &str, base: &Url, format: EntryNameFormat) -> PipelineResult<Self> {
        let window = parse_entry_name(name, format)?;
        let url = base
            .join(name)
            .map_err(|e| PipelineError::RetrievalFailed {
                url: name.to_string(),
                message: format!("cannot resolve against {}: {}", base, e),
            })?;
        Ok(Self {
            name: name.to_string(),
            url,
            window,
        })
    }
}

/// Link targets in document order.
///
/// A line carries a link when it contains `href=`; the target runs up to the
/// next `>` with quotes removed. At most one link is taken per line.
pub fn parse_links(document: &str) -> Vec<String> {
    document
        .lines()
        .filter_map(|line| {
            let (_, rest) = line.split_once("href=")?;
            let target = rest.split_once('>').map_or(rest, |(target, _)| target);
            Some(target.replace('"', ""))
        })
        .collect()
}

/// Download the listing and return its links.
#[instrument(skip(client))]
pub async fn fetch_catalog(client: &Client, url: &str) -> PipelineResult<Vec<String>> {
    let unavailable = |message: String| PipelineError::CatalogUnavailable {
        url: url.to_string(),
        message,
    };

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| unavailable(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(unavailable(format!("HTTP {}", status)));
    }
    let document = response.text().await.map_err(|e| unavailable(e.to_string()))?;

    let links = parse_links(&document);
    info!(links = links.len(), "Fetched catalog");
    Ok(links)
}

/// Pick one entry per target horizon from the latest issuance.
///
/// Links that do not parse as forecast files are skipped. The result follows
/// the order of `horizons`; a horizon without a file is logged and left out.
pub fn select_entries(
    links: &[String],
    base: &Url,
    horizons: &[u32],
    format: EntryNameFormat,
) -> Vec<CatalogEntry> {
    let entries: Vec<CatalogEntry> = links
        .iter()
        .filter_map(|link| match CatalogEntry::parse(link, base, format) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(link = %link, error = %e, "Skipping catalog link");
                None
            }
        })
        .collect();

    let Some(latest) = latest_issuance(&entries) else {
        warn!("Catalog contains no forecast files");
        return Vec::new();
    };

    horizons
        .iter()
        .filter_map(|&horizon| {
            let found = entries
                .iter()
                .find(|e| e.window.issued_at == latest && e.window.horizon_hours == horizon);
            if found.is_none() {
                warn!(horizon_hours = horizon, issued_at = %latest, "No catalog entry for horizon");
            }
            found.cloned()
        })
        .collect()
}

fn latest_issuance(entries: &[CatalogEntry]) -> Option<DateTime<Utc>> {
    entries.iter().map(|e| e.window.issued_at).max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PREFIX: &str = "icon-d2_germany_regular-lat-lon_single-level_";

    fn file(run: &str, horizon: u32) -> String {
        format!("{}{}_{:03}_2d_tot_prec.grib2.bz2", PREFIX, run, horizon)
    }

    fn listing(files: &[String]) -> String {
        let mut doc = String::from("<html>\n<head><title>Index of /tot_prec/</title></head>\n<body>\n<pre>\n<a href=\"../\">../</a>\n");
        for f in files {
            doc.push_str(&format!(
                "<a href=\"{f}\">{f}</a>                 10-Mar-2024 14:02    1234\n"
            ));
        }
        doc.push_str("</pre>\n</body>\n</html>\n");
        doc
    }

    fn base() -> Url {
        Url::parse("https://opendata.dwd.de/weather/nwp/icon-d2/grib/12/tot_prec/").unwrap()
    }

    #[test]
    fn test_parse_links_in_order() {
        let doc = "<a href=\"a\">a</a>\n<p>no link here</p>\n<a href=\"b\">b</a>\n<a href=\"c\">c</a>\n";
        assert_eq!(parse_links(doc), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_links_keeps_duplicates() {
        let doc = "<a href=\"x\">\n<a href=\"x\">\n";
        assert_eq!(parse_links(doc), vec!["x", "x"]);
    }

    #[test]
    fn test_parse_links_without_closing_bracket() {
        assert_eq!(parse_links("href=\"tail\""), vec!["tail"]);
        assert!(parse_links("").is_empty());
    }

    #[test]
    fn test_select_by_horizon_from_latest_run() {
        let mut files = Vec::new();
        for run in ["2024031006", "2024031012"] {
            for h in 0..=48 {
                files.push(file(run, h));
            }
        }
        let links = parse_links(&listing(&files));

        let selected = select_entries(&links, &base(), &[6, 12, 24, 48], EntryNameFormat::Structural);
        let horizons: Vec<u32> = selected.iter().map(|e| e.window.horizon_hours).collect();
        assert_eq!(horizons, vec![6, 12, 24, 48]);

        let run = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        assert!(selected.iter().all(|e| e.window.issued_at == run));
        assert_eq!(
            selected[2].url.as_str(),
            format!("{}{}", base(), file("2024031012", 24))
        );
    }

    #[test]
    fn test_selection_follows_configured_order() {
        let files = vec![file("2024031012", 6), file("2024031012", 12)];
        let links = parse_links(&listing(&files));
        let selected = select_entries(&links, &base(), &[12, 6], EntryNameFormat::Structural);
        assert_eq!(selected[0].window.horizon_hours, 12);
        assert_eq!(selected[1].window.horizon_hours, 6);
    }

    #[test]
    fn test_missing_horizon_is_left_out() {
        // The latest run is still being published.
        let files = vec![
            file("2024031006", 6),
            file("2024031006", 48),
            file("2024031012", 6),
        ];
        let links = parse_links(&listing(&files));
        let selected = select_entries(&links, &base(), &[6, 48], EntryNameFormat::Structural);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, file("2024031012", 6));
    }

    #[test]
    fn test_fixed_offset_format() {
        let links = vec![file("2024031012", 24)];
        let selected = select_entries(&links, &base(), &[24], EntryNameFormat::FixedOffset(45));
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].window.file_stem(), "2024031012_2024031112");
    }

    #[test]
    fn test_no_forecast_files() {
        let links = parse_links(&listing(&[]));
        assert_eq!(links, vec!["../"]);
        assert!(select_entries(&links, &base(), &[6], EntryNameFormat::Structural).is_empty());
    }

    #[test]
    fn test_absolute_links_kept() {
        let entry = CatalogEntry::parse(
            "https://mirror.example.org/tot_prec/x_2024031012_006_y.grib2.bz2",
            &base(),
            EntryNameFormat::Structural,
        )
        .unwrap();
        assert_eq!(entry.url.host_str(), Some("mirror.example.org"));
    }

    #[test]
    fn test_malformed_name() {
        let err = CatalogEntry::parse("README.txt", &base(), EntryNameFormat::Structural).unwrap_err();
        assert_eq!(err.kind(), "malformed_entry_name");
    }
}
