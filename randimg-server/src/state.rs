//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;

use randimg_core::RandomImageSource;

use crate::cache::ResponseCache;
use crate::config::Config;
use crate::creator::ImageCreator;
use crate::store::ImageStore;

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// Image record storage
    pub store: Arc<dyn ImageStore>,
    /// Random image creation
    pub creator: Arc<ImageCreator>,
    /// Cache of listing responses, cleared on writes
    pub cache: Arc<ResponseCache>,
    /// HTTP client used to stream image content from its origin
    pub http_client: reqwest::Client,
}

impl AppState {
    /// Wire the state from a source, a store and the configuration.
    pub fn new(
        config: &Config,
        source: Arc<dyn RandomImageSource>,
        store: Arc<dyn ImageStore>,
    ) -> Self {
        let creator = ImageCreator::new(source, store.clone(), config.retry_count);
        Self {
            store,
            creator: Arc::new(creator),
            cache: Arc::new(ResponseCache::new(config.cache_ttl())),
            http_client: reqwest::Client::new(),
        }
    }
}
