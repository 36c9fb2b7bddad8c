//! PostgreSQL implementation of the image store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::{ImageRecord, ImageStore, ListQuery, NewImage, StoreError, IMAGE_MODEL};

/// PostgreSQL-backed image store.
#[derive(Clone)]
pub struct PostgresImageStore {
    pool: PgPool,
}

/// Row type for database queries.
#[derive(FromRow)]
struct ImageRow {
    id: String,
    title: Option<String>,
    image: String,
    url: String,
    created_at: DateTime<Utc>,
}

impl From<ImageRow> for ImageRecord {
    fn from(row: ImageRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            image: row.image,
            url: row.url,
            created_at: row.created_at,
        }
    }
}

impl PostgresImageStore {
    /// Create a new image store with the given database URL.
    ///
    /// Runs migrations automatically on connection.
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        tracing::info!("Image store connected and migrations applied");

        Ok(Self { pool })
    }

    /// Create an image store from an existing pool (for testing).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build the list statement for a query.
    fn list_statement(query: &ListQuery) -> QueryBuilder<'static, Postgres> {
        let mut builder =
            QueryBuilder::new("SELECT id, title, image, url, created_at FROM images WHERE TRUE");

        if let Some(start) = query.date_start {
            builder.push(" AND created_at >= ").push_bind(start);
        }
        if let Some(end) = query.date_end {
            builder.push(" AND created_at < ").push_bind(end);
        }

        let direction = query.sort.as_sql();
        builder.push(format!(
            " ORDER BY created_at {direction}, id {direction} LIMIT "
        ));
        builder.push_bind(i64::from(query.limit));
        builder.push(" OFFSET ");
        builder.push_bind(i64::try_from(query.offset()).unwrap_or(i64::MAX));
        builder
    }
}

#[async_trait]
impl ImageStore for PostgresImageStore {
    async fn insert(&self, input: NewImage) -> Result<ImageRecord, StoreError> {
        let result = sqlx::query_as::<_, ImageRow>(
            r#"
            INSERT INTO images (id, title, image, url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, image, url, created_at
            "#,
        )
        .bind(&input.id)
        .bind(&input.title)
        .bind(&input.image)
        .bind(&input.url)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => {
                tracing::debug!(id = %row.id, "Stored image");
                Ok(row.into())
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StoreError::UniqueConstraint {
                    model: IMAGE_MODEL,
                    field: "id",
                    value: input.id,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ImageRecord>, StoreError> {
        let row: Option<ImageRow> = sqlx::query_as(
            r#"
            SELECT id, title, image, url, created_at
            FROM images
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<ImageRecord>, StoreError> {
        let rows: Vec<ImageRow> = Self::list_statement(query)
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn check_health(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(())
    }

    fn is_persistent(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SortOrder;
    use chrono::TimeZone;

    #[test]
    fn test_list_statement_without_filters() {
        let builder = PostgresImageStore::list_statement(&ListQuery::default());
        let sql = builder.sql();
        assert!(sql.contains("ORDER BY created_at DESC, id DESC"));
        assert!(!sql.contains("created_at >="));
        assert!(!sql.contains("created_at <"));
        assert!(sql.ends_with("LIMIT $1 OFFSET $2"));
    }

    #[test]
    fn test_list_statement_with_date_window() {
        let query = ListQuery {
            sort: SortOrder::Asc,
            date_start: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            date_end: Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        let builder = PostgresImageStore::list_statement(&query);
        let sql = builder.sql();
        assert!(sql.contains("AND created_at >= $1"));
        assert!(sql.contains("AND created_at < $2"));
        assert!(sql.contains("ORDER BY created_at ASC, id ASC"));
        assert!(sql.ends_with("LIMIT $3 OFFSET $4"));
    }

    /// Needs a reachable PostgreSQL:
    /// `DATABASE_URL=postgres://... cargo test -p randimg-server -- --ignored`
    #[tokio::test]
    #[ignore]
    async fn test_duplicate_insert_maps_to_unique_constraint() {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping");
            return;
        };
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        let store = PostgresImageStore::from_pool(pool.clone());

        let id = format!("dup-{}", Utc::now().timestamp_micros());
        let input = NewImage::new(
            id.as_str(),
            None,
            "https://i.example/a.gif",
            "https://example/a",
        );

        let record = store.insert(input.clone()).await.unwrap();
        assert_eq!(record.id, id);

        match store.insert(input).await {
            Err(StoreError::UniqueConstraint { model, field, value }) => {
                assert_eq!(model, IMAGE_MODEL);
                assert_eq!(field, "id");
                assert_eq!(value, id);
            }
            other => panic!("expected a uniqueness conflict, got {other:?}"),
        }
        assert!(store.find_by_id(&id).await.unwrap().is_some());

        sqlx::query("DELETE FROM images WHERE id = $1")
            .bind(&id)
            .execute(&pool)
            .await
            .unwrap();
    }
}
