//! Image store module for persisting image records.
//!
//! This module owns the image collection:
//! - Insert new records, rejecting duplicate ids with a distinguishable error
//! - Look up a record by id
//! - List records filtered by creation date, sorted and paginated
//!
//! Two backends are available. PostgreSQL is used when `DATABASE_URL` is
//! set; otherwise records live in memory and are lost on restart.

pub mod error;
pub mod memory;
pub mod postgres;

pub use error::StoreError;
pub use memory::MemoryImageStore;
pub use postgres::PostgresImageStore;

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use randimg_core::RandomImage;
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Model name reported in uniqueness conflicts.
pub const IMAGE_MODEL: &str = "Image";

/// Default page size when the store is queried directly.
pub const DEFAULT_LIST_LIMIT: u32 = 30;

/// An image record stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Source-assigned identifier (primary key)
    pub id: String,
    /// Trimmed title, if the source provided one
    pub title: Option<String>,
    /// URL of the binary content
    pub image: String,
    /// Page URL on the source's site
    pub url: String,
    /// Creation timestamp, set once on insert
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new image record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewImage {
    pub id: String,
    pub title: Option<String>,
    pub image: String,
    pub url: String,
}

impl NewImage {
    /// Build an input, trimming the title.
    pub fn new(
        id: impl Into<String>,
        title: Option<String>,
        image: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.map(|t| t.trim().to_string()),
            image: image.into(),
            url: url.into(),
        }
    }

    /// Materialize the record with the given creation time.
    pub fn into_record(self, created_at: DateTime<Utc>) -> ImageRecord {
        ImageRecord {
            id: self.id,
            title: self.title,
            image: self.image,
            url: self.url,
            created_at,
        }
    }
}

impl From<RandomImage> for NewImage {
    fn from(image: RandomImage) -> Self {
        Self::new(image.id, image.title, image.image_url, image.url)
    }
}

/// Sort direction on `created_at`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

/// List query options.
///
/// `page` is zero-based: the store skips `limit * page` records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub sort: SortOrder,
    /// Inclusive lower bound on `created_at`
    pub date_start: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`
    pub date_end: Option<DateTime<Utc>>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 0,
            limit: DEFAULT_LIST_LIMIT,
            sort: SortOrder::Desc,
            date_start: None,
            date_end: None,
        }
    }
}

impl ListQuery {
    /// Number of records to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.limit) * u64::from(self.page)
    }

    /// Whether a record's creation time falls inside the date window.
    pub fn matches(&self, created_at: &DateTime<Utc>) -> bool {
        self.date_start.map_or(true, |start| *created_at >= start)
            && self.date_end.map_or(true, |end| *created_at < end)
    }
}

/// Persistence operations over the image collection.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store a new record.
    ///
    /// Fails with [`StoreError::UniqueConstraint`] when the id is taken.
    async fn insert(&self, input: NewImage) -> Result<ImageRecord, StoreError>;

    /// Find a record by id.
    async fn find_by_id(&self, id: &str) -> Result<Option<ImageRecord>, StoreError>;

    /// List records matching the query, sorted and paginated.
    async fn list(&self, query: &ListQuery) -> Result<Vec<ImageRecord>, StoreError>;

    /// Check backend health.
    async fn check_health(&self) -> Result<(), StoreError>;

    /// Whether records survive a restart.
    fn is_persistent(&self) -> bool;
}

/// Open the store selected by the configuration.
///
/// Uses PostgreSQL if `database_url` is set, otherwise falls back to in-memory.
pub async fn open_store(config: &Config) -> Result<Arc<dyn ImageStore>, StoreError> {
    match config.database_url.as_deref() {
        Some(url) if !url.is_empty() => {
            tracing::info!("Using PostgreSQL image storage");
            let store = PostgresImageStore::new(
                url,
                config.database_max_connections,
                config.database_min_connections,
            )
            .await?;
            Ok(Arc::new(store))
        }
        _ => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage");
            Ok(Arc::new(MemoryImageStore::new()))
        }
    }
}
