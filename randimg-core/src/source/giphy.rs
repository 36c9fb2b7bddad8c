//! Giphy random image client.
//!
//! Uses the public endpoint at https://api.giphy.com/v1/gifs/random.
//! Every request carries the configured `api_key` as a query parameter.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument};

use super::{RandomImage, RandomImageSource};
use crate::error::{Result, SourceError};

/// Default Giphy API base URL.
const DEFAULT_BASE_URL: &str = "https://api.giphy.com/v1";

/// Default path of the random image endpoint, relative to the base URL.
const DEFAULT_RANDOM_IMAGE_PATH: &str = "/gifs/random";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Envelope of the Giphy random endpoint.
#[derive(Debug, Deserialize)]
struct GiphyResponse {
    data: GiphyImage,
}

#[derive(Debug, Deserialize)]
struct GiphyImage {
    id: String,
    url: String,
    #[serde(default)]
    title: Option<String>,
    image_original_url: String,
}

impl From<GiphyImage> for RandomImage {
    fn from(image: GiphyImage) -> Self {
        Self {
            id: image.id,
            title: image.title,
            url: image.url,
            image_url: image.image_original_url,
        }
    }
}

/// Configuration for the Giphy client.
#[derive(Debug, Clone)]
pub struct GiphyConfig {
    /// API key sent as the `api_key` query parameter.
    pub api_key: String,
    /// API base URL.
    pub base_url: String,
    /// Random image endpoint path, appended to `base_url`.
    pub random_image_path: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for GiphyConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            random_image_path: DEFAULT_RANDOM_IMAGE_PATH.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl GiphyConfig {
    /// Full URL of the random image endpoint.
    pub fn random_image_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.random_image_path.trim_start_matches('/')
        )
    }
}

/// Giphy random image client.
pub struct GiphyClient {
    client: Client,
    config: GiphyConfig,
}

impl GiphyClient {
    /// Create a new Giphy client with custom configuration.
    #[instrument(level = "debug", skip_all, fields(
        base_url = %config.base_url,
        timeout_ms = config.timeout.as_millis() as u64
    ))]
    pub fn with_config(config: GiphyConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build().map_err(|e| {
            error!(error = %e, "Failed to create HTTP client");
            SourceError::Unavailable(format!("Failed to create HTTP client: {e}"))
        })?;

        if config.api_key.is_empty() {
            tracing::warn!("Giphy API key is empty, requests will likely be rejected");
        }

        info!("Giphy client created");
        Ok(Self { client, config })
    }

    async fn request_random(&self) -> Result<RandomImage> {
        let url = self.config.random_image_url();
        let start = Instant::now();

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.config.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        debug!(status = %status, "Received Giphy response");

        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let image = parse_random_response(&body)?;

        debug!(
            id = %image.id,
            latency_ms = start.elapsed().as_millis() as u64,
            "Random image fetched"
        );
        Ok(image)
    }
}

/// Extract the image descriptor from a random endpoint response body.
pub(crate) fn parse_random_response(body: &[u8]) -> Result<RandomImage> {
    serde_json::from_slice::<GiphyResponse>(body)
        .map(|response| response.data.into())
        .map_err(|e| SourceError::Parse(e.to_string()))
}

#[async_trait]
impl RandomImageSource for GiphyClient {
    async fn fetch_random(&self) -> Result<RandomImage> {
        self.request_random().await.map_err(|e| {
            error!(error = %e, "Error requesting random image from Giphy API");
            e
        })
    }

    fn source_name(&self) -> &'static str {
        "giphy"
    }
}
