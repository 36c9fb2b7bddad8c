//! In-memory image store
//!
//! Used when no database is configured and by the test suite.
//! Records are lost on restart.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{ImageRecord, ImageStore, ListQuery, NewImage, SortOrder, StoreError, IMAGE_MODEL};

struct StoredImage {
    /// Insertion sequence, breaks ties between equal timestamps
    seq: u64,
    record: ImageRecord,
}

/// In-memory storage for image records keyed by id
#[derive(Default)]
pub struct MemoryImageStore {
    images: DashMap<String, StoredImage>,
    next_seq: AtomicU64,
}

impl MemoryImageStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record with an explicit creation time
    pub fn insert_at(
        &self,
        input: NewImage,
        created_at: DateTime<Utc>,
    ) -> Result<ImageRecord, StoreError> {
        match self.images.entry(input.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::UniqueConstraint {
                model: IMAGE_MODEL,
                field: "id",
                value: input.id,
            }),
            Entry::Vacant(slot) => {
                let record = input.into_record(created_at);
                slot.insert(StoredImage {
                    seq: self.next_seq.fetch_add(1, Ordering::SeqCst),
                    record: record.clone(),
                });
                Ok(record)
            }
        }
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn insert(&self, input: NewImage) -> Result<ImageRecord, StoreError> {
        let record = self.insert_at(input, Utc::now())?;
        tracing::debug!(id = %record.id, "Stored image");
        Ok(record)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ImageRecord>, StoreError> {
        Ok(self.images.get(id).map(|entry| entry.record.clone()))
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<ImageRecord>, StoreError> {
        let mut matching: Vec<(DateTime<Utc>, u64, ImageRecord)> = self
            .images
            .iter()
            .filter(|entry| query.matches(&entry.record.created_at))
            .map(|entry| (entry.record.created_at, entry.seq, entry.record.clone()))
            .collect();

        matching.sort_by(|a, b| {
            let ordering = a.0.cmp(&b.0).then(a.1.cmp(&b.1));
            match query.sort {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        Ok(matching
            .into_iter()
            .skip(offset)
            .take(query.limit as usize)
            .map(|(_, _, record)| record)
            .collect())
    }

    async fn check_health(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn is_persistent(&self) -> bool {
        false
    }
}

impl std::fmt::Debug for MemoryImageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryImageStore")
            .field("images", &self.images.len())
            .finish()
    }
}
