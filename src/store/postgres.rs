use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::{postgres::{PgPoolOptions, PgRow}, PgPool, Row};
use std::time::Duration;
use uuid::Uuid;

use super::ModStore;
use crate::error::{classify_store_error, StoreError};
use crate::protocol::{ModDocument, ModDraft, Page, UpsertOutcome};

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS mods (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT '',
    image TEXT,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
)";

const LIST_ALL_SQL: &str = "SELECT id, name, description, image, created_at, updated_at
    FROM mods ORDER BY created_at ASC, name ASC";

const LIST_PAGE_SQL: &str = "SELECT id, name, description, image, created_at, updated_at
    FROM mods ORDER BY created_at ASC, name ASC LIMIT $1 OFFSET $2";

const FIND_SQL: &str = "SELECT id, name, description, image, created_at, updated_at
    FROM mods WHERE name = $1";

// xmax is 0 only on a freshly inserted row version. updated_at is monotonic
// so a request received earlier but applied later cannot precede created_at.
const UPSERT_SQL: &str = "INSERT INTO mods (id, name, description, image, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $5)
    ON CONFLICT (name) DO UPDATE SET
        description = EXCLUDED.description,
        image = EXCLUDED.image,
        updated_at = GREATEST(mods.updated_at, EXCLUDED.updated_at)
    RETURNING id, name, description, image, created_at, updated_at, (xmax = 0) AS inserted";

const DELETE_SQL: &str = "DELETE FROM mods WHERE name = $1
    RETURNING id, name, description, image, created_at, updated_at";

/// Postgres-backed collection. `name` carries a unique constraint, so the
/// upsert is one conflict-resolving statement rather than a lookup followed
/// by a write.
#[derive(Debug, Clone)]
pub struct PgModStore {
    pool: PgPool,
}

impl PgModStore {
    pub async fn connect(url: &str, max_connections: u32, acquire_timeout: Duration) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
            .map_err(classify_sqlx_error)?;
        Ok(Self { pool })
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE_SQL)
            .execute(&self.pool)
            .await
            .map_err(classify_sqlx_error)?;
        Ok(())
    }
}

#[async_trait]
impl ModStore for PgModStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(classify_sqlx_error)?;
        Ok(())
    }

    async fn list(&self, page: Option<Page>) -> Result<Vec<ModDocument>, StoreError> {
        let query = match page {
            Some(p) => sqlx::query(LIST_PAGE_SQL)
                .bind(i64::try_from(p.limit).unwrap_or(i64::MAX))
                .bind(i64::try_from(p.offset).unwrap_or(i64::MAX)),
            None => sqlx::query(LIST_ALL_SQL),
        };

        let mut rows = query.fetch(&self.pool);
        let mut docs = Vec::new();
        while let Some(row) = rows.try_next().await.map_err(classify_sqlx_error)? {
            docs.push(row_to_document(&row).map_err(classify_sqlx_error)?);
        }
        Ok(docs)
    }

    async fn find_by_name(&self, name: &str) -> Result<ModDocument, StoreError> {
        let row = sqlx::query(FIND_SQL)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify_sqlx_error)?
            .ok_or(StoreError::NotFound)?;
        row_to_document(&row).map_err(classify_sqlx_error)
    }

    async fn upsert(&self, draft: ModDraft) -> Result<UpsertOutcome, StoreError> {
        let row = sqlx::query(UPSERT_SQL)
            .bind(Uuid::new_v4())
            .bind(&draft.name)
            .bind(&draft.description)
            .bind(&draft.image)
            .bind(draft.received_at)
            .fetch_one(&self.pool)
            .await
            .map_err(classify_sqlx_error)?;

        let doc = row_to_document(&row).map_err(classify_sqlx_error)?;
        let inserted: bool = row.try_get("inserted").map_err(classify_sqlx_error)?;
        Ok(if inserted {
            UpsertOutcome::Created(doc)
        } else {
            UpsertOutcome::Updated(doc)
        })
    }

    async fn delete_by_name(&self, name: &str) -> Result<ModDocument, StoreError> {
        let row = sqlx::query(DELETE_SQL)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify_sqlx_error)?
            .ok_or(StoreError::NotFound)?;
        row_to_document(&row).map_err(classify_sqlx_error)
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

fn row_to_document(row: &PgRow) -> Result<ModDocument, sqlx::Error> {
    Ok(ModDocument {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        image: row.try_get("image")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub fn classify_sqlx_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
            StoreError::transient(e.to_string())
        }
        other => classify_store_error(&other),
    }
}
