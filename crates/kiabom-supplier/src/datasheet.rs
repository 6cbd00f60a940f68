//! Datasheet downloads for a finished BOM.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rayon::prelude::*;
use reqwest::blocking::Client;
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

/// Directory datasheets land in, next to the BOM output.
pub const DATASHEET_DIR: &str = "datasheets";

#[derive(Debug, Error)]
#[error("Failed to download {url}: {reason}")]
pub struct DatasheetDownloadError {
    pub url: String,
    pub reason: String,
}

impl DatasheetDownloadError {
    fn new(url: &str, reason: impl ToString) -> Self {
        Self {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Outcome for one URL.
#[derive(Debug)]
pub enum Download {
    Saved { url: String, path: PathBuf },
    Skipped { url: String, reason: &'static str },
    Failed(DatasheetDownloadError),
}

impl Download {
    pub fn is_saved(&self) -> bool {
        matches!(self, Download::Saved { .. })
    }
}

/// File name for a datasheet URL: the last path segment tagged with a short
/// digest of the whole URL, so distinct URLs never share a file. `.pdf` is
/// used when the segment has no extension. Returns `None` for URLs that are
/// not downloadable (`~`, empty, or not http(s)).
pub fn file_name_for(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() || url == "~" {
        return None;
    }
    let parsed = Url::parse(url).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }

    let segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .map(sanitize)
        .filter(|s| !s.is_empty())
        .or_else(|| parsed.host_str().map(sanitize))?;

    let tag: String = Sha256::digest(url.as_bytes())
        .iter()
        .take(6)
        .map(|b| format!("{b:02x}"))
        .collect();
    let path = Path::new(&segment);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => Some(format!(
            "{}-{tag}.{}",
            stem.to_string_lossy(),
            ext.to_string_lossy()
        )),
        _ => Some(format!("{segment}-{tag}.pdf")),
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Download each distinct URL into `dest`, in parallel.
///
/// One result is returned per distinct input URL, in sorted URL order.
/// Individual failures never abort the batch.
pub fn download_all<'a>(
    urls: impl IntoIterator<Item = &'a str>,
    dest: &Path,
    timeout: Duration,
) -> Result<Vec<Download>, DatasheetDownloadError> {
    let urls: BTreeSet<&str> = urls.into_iter().map(str::trim).collect();
    if urls.is_empty() {
        return Ok(Vec::new());
    }

    fs::create_dir_all(dest)
        .map_err(|e| DatasheetDownloadError::new(&dest.display().to_string(), e))?;
    let client = Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DatasheetDownloadError::new("<client>", e))?;

    let results: Vec<Download> = urls
        .into_par_iter()
        .map(|url| {
            let Some(name) = file_name_for(url) else {
                log::warn!("Skipping datasheet '{url}': not an http(s) URL");
                return Download::Skipped {
                    url: url.to_string(),
                    reason: "not an http(s) URL",
                };
            };
            let path = dest.join(name);
            match fetch(&client, url, &path) {
                Ok(()) => {
                    log::info!("Saved {url} to {}", path.display());
                    Download::Saved {
                        url: url.to_string(),
                        path,
                    }
                }
                Err(err) => {
                    log::warn!("{err}");
                    Download::Failed(err)
                }
            }
        })
        .collect();

    Ok(results)
}

fn fetch(client: &Client, url: &str, path: &Path) -> Result<(), DatasheetDownloadError> {
    let response = client
        .get(url)
        .send()
        .map_err(|e| DatasheetDownloadError::new(url, e))?;
    if !response.status().is_success() {
        return Err(DatasheetDownloadError::new(
            url,
            format!("HTTP {}", response.status()),
        ));
    }
    let bytes = response
        .bytes()
        .map_err(|e| DatasheetDownloadError::new(url, e))?;
    fs::write(path, &bytes).map_err(|e| DatasheetDownloadError::new(url, e))
}
