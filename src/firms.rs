//! Fire-detection feed downloader
//!
//! Fetches the configured FIRMS country/sensor CSV and writes the body to
//! disk verbatim. The file only appears once the whole body was written.

use crate::config::FirmsConfig;
use crate::{FireWatchError, Result};
use reqwest::Client;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSummary {
    pub path: PathBuf,
    pub bytes: usize,
}

pub struct FirmsDownloader {
    client: Client,
    url: String,
    credentials: Option<(String, Option<String>)>,
}

impl FirmsDownloader {
    pub fn new(config: &FirmsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .build()
            .map_err(|e| FireWatchError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            credentials: config
                .username
                .clone()
                .map(|user| (user, config.password.clone())),
        })
    }

    /// Download the feed into `output`, replacing any previous file
    #[instrument(skip(self))]
    pub async fn download(&self, output: &Path) -> Result<DownloadSummary> {
        info!("Downloading fire data from {}", self.url);

        let mut request = self.client.get(&self.url);
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, password.as_ref());
        }

        let response = request.send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!("Fire feed returned {}", status);
            return Err(FireWatchError::Download {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        write_atomically(output, &body)?;

        info!("Downloaded {} bytes to {}", body.len(), output.display());
        Ok(DownloadSummary {
            path: output.to_path_buf(),
            bytes: body.len(),
        })
    }
}

fn write_atomically(output: &Path, contents: &[u8]) -> Result<()> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.persist(output).map_err(|e| FireWatchError::from(e.error))?;
    Ok(())
}
