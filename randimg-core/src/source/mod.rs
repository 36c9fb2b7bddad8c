//! Random image sources.
//!
//! A source hands out one candidate image per call. The server decides
//! whether the candidate is new and worth persisting.
//!
//! - **Giphy** - the public Giphy random endpoint (requires an API key)
//! - **Mock** - scripted images for tests and offline development

mod giphy;
mod mock;

pub use giphy::{GiphyClient, GiphyConfig};
pub use mock::MockImageSource;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Candidate image descriptor returned by a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomImage {
    /// Source-assigned identifier, used as the record's primary key
    pub id: String,
    /// Human readable title, may be empty
    pub title: Option<String>,
    /// Page URL of the image on the source's site
    pub url: String,
    /// Direct URL of the original binary content
    pub image_url: String,
}

/// Trait for random image sources.
///
/// Implementations must be thread-safe (`Send + Sync`) since a single
/// instance is shared by every request handler.
#[async_trait]
pub trait RandomImageSource: Send + Sync {
    /// Fetch one random image descriptor.
    ///
    /// Transport failures are returned as-is; implementations do not retry.
    async fn fetch_random(&self) -> Result<RandomImage>;

    /// Short name of the source, used in logs.
    fn source_name(&self) -> &'static str;
}
