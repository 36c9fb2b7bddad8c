//! Random image creation
//!
//! Fetches candidates from the image source and persists the first one whose
//! id is not stored yet. Duplicate ids are retried up to the configured
//! budget; every other failure aborts immediately.

use std::sync::Arc;

use randimg_core::RandomImageSource;

use crate::error::ApiError;
use crate::store::{ImageRecord, ImageStore, NewImage, StoreError};

/// Creates image records from a random image source.
pub struct ImageCreator {
    source: Arc<dyn RandomImageSource>,
    store: Arc<dyn ImageStore>,
    retry_count: u32,
}

impl ImageCreator {
    /// Create a new creator. At most `retry_count + 1` candidates are tried.
    pub fn new(
        source: Arc<dyn RandomImageSource>,
        store: Arc<dyn ImageStore>,
        retry_count: u32,
    ) -> Self {
        Self {
            source,
            store,
            retry_count,
        }
    }

    /// Fetch and persist a random image that is not stored yet.
    #[tracing::instrument(level = "debug", skip(self), fields(source = self.source.source_name()))]
    pub async fn create_random(&self) -> Result<ImageRecord, ApiError> {
        let mut failed_ids: Vec<String> = Vec::new();
        let mut last_error: Option<ApiError> = None;

        for attempt in 0..=self.retry_count {
            let candidate = self.source.fetch_random().await?;

            match self.store.insert(NewImage::from(candidate)).await {
                Ok(record) => {
                    tracing::info!(id = %record.id, attempt, "Stored random image");
                    return Ok(record);
                }
                Err(StoreError::UniqueConstraint { value, .. }) => {
                    tracing::warn!(id = %value, attempt, "Random image already stored, retrying");
                    failed_ids.push(value);
                    last_error = Some(ApiError::api(format!(
                        "Can't save random image, image exists. Failed ids: {}",
                        failed_ids.join(", ")
                    )));
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(last_error
            .unwrap_or_else(|| ApiError::internal("Image creation made no attempts")))
    }
}
