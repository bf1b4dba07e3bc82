//! Template archive download with streaming progress
//!
//! The fetcher performs a single streaming GET and returns the whole
//! archive as an in-memory buffer. Each received chunk updates the
//! caller's [`ProgressTracker`] against the `Content-Length` header
//! (when present) and emits a rendered progress line into the
//! pipeline's progress sink. There are no automatic retries; transient
//! failures surface to the caller.

use crate::error::{Error, Result};
use brokkr_core::pipeline::ProgressSink;
use brokkr_core::progress::{human_size, ProgressTracker};
use futures_util::StreamExt;
use std::time::Duration;
use tracing::{debug, info};

/// Timeout for the whole archive download
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Downloads template archives over HTTP
#[derive(Clone)]
pub struct ArchiveFetcher {
    client: reqwest::Client,
}

impl ArchiveFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("brokkr/", env!("CARGO_PKG_VERSION")))
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(Error::HttpClient)?;
        Ok(Self { client })
    }

    /// Build a fetcher around an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Download `url` into memory.
    ///
    /// # Errors
    /// `Error::Download` on a non-2xx response, `Error::Network` on a
    /// connection-level failure. Both are fatal to the calling stage.
    pub async fn download(
        &self,
        url: &str,
        mut tracker: ProgressTracker,
        sink: &ProgressSink,
    ) -> Result<Vec<u8>> {
        debug!("downloading archive from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| Error::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Download {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        // absent Content-Length degrades to indeterminate progress
        let total = response.content_length().filter(|len| *len > 0);

        let mut buffer = Vec::with_capacity(total.unwrap_or(0) as usize);
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| Error::Network {
                url: url.to_string(),
                source,
            })?;
            buffer.extend_from_slice(&chunk);
            tracker.update(buffer.len() as u64, total);
            sink.send(tracker.render());
        }

        info!("downloaded {} from {}", human_size(buffer.len() as u64), url);
        Ok(buffer)
    }
}
