//! PostgreSQL-backed document collections
//!
//! Each collection is a table of `(id TEXT, body JSONB)` rows. Liked-set
//! edits are single `UPDATE` statements on the JSONB array, so two devices
//! toggling likes at the same time cannot overwrite each other.

use async_trait::async_trait;
use listings::error::{RemoteError, RemoteResult};
use listings::models::user::LIKED_LISTINGS_KEY;
use listings::models::{Document, Fields};
use listings::remote::{ListingStore, UserDirectory};
use serde_json::Value;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::{info, warn};
use uuid::Uuid;

/// Create the document tables if they do not exist yet
pub async fn ensure_schema(pool: &PgPool) -> anyhow::Result<()> {
    for table in ["listings", "users"] {
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {} (id TEXT PRIMARY KEY, body JSONB NOT NULL DEFAULT '{{}}'::jsonb)",
            table
        ))
        .execute(pool)
        .await?;
    }

    info!("Remote document tables ready");
    Ok(())
}

fn remote_error(e: sqlx::Error) -> RemoteError {
    match e {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            RemoteError::Unavailable(e.to_string())
        }
        other => RemoteError::Backend(other.to_string()),
    }
}

/// Turn a row into a document, or `None` when its body is not a JSON object
fn document_from_row(row: &PgRow) -> RemoteResult<Option<Document>> {
    let id: String = row.try_get("id").map_err(remote_error)?;
    let body: Value = row.try_get("body").map_err(remote_error)?;

    match body {
        Value::Object(fields) => Ok(Some(Document::new(id, fields))),
        other => {
            warn!("Skipping document {}: body is not an object ({})", id, other);
            Ok(None)
        }
    }
}

/// Shared upsert used by both collections
async fn set_document(pool: &PgPool, table: &str, id: &str, fields: Fields) -> RemoteResult<()> {
    sqlx::query(&format!(
        r#"
        INSERT INTO {} (id, body)
        VALUES ($1, $2)
        ON CONFLICT (id) DO UPDATE SET body = EXCLUDED.body
        "#,
        table
    ))
    .bind(id)
    .bind(Value::Object(fields))
    .execute(pool)
    .await
    .map_err(remote_error)?;

    Ok(())
}

async fn get_document(pool: &PgPool, table: &str, id: &str) -> RemoteResult<Option<Document>> {
    let row = sqlx::query(&format!("SELECT id, body FROM {} WHERE id = $1", table))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(remote_error)?;

    match row {
        Some(row) => document_from_row(&row).and_then(|document| {
            document.ok_or_else(|| RemoteError::Malformed {
                id: id.to_string(),
                reason: "body is not an object".to_string(),
            }).map(Some)
        }),
        None => Ok(None),
    }
}

/// Listing collection repository
#[derive(Clone)]
pub struct PgListingStore {
    pool: PgPool,
}

impl PgListingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListingStore for PgListingStore {
    async fn list(&self) -> RemoteResult<Vec<Document>> {
        let rows = sqlx::query("SELECT id, body FROM listings ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(remote_error)?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(document) = document_from_row(row)? {
                documents.push(document);
            }
        }
        Ok(documents)
    }

    async fn get(&self, id: &str) -> RemoteResult<Option<Document>> {
        get_document(&self.pool, "listings", id).await
    }

    async fn set(&self, id: &str, fields: Fields) -> RemoteResult<()> {
        set_document(&self.pool, "listings", id, fields).await
    }

    async fn add(&self, fields: Fields) -> RemoteResult<String> {
        let id = Uuid::new_v4().simple().to_string();
        set_document(&self.pool, "listings", &id, fields).await?;
        Ok(id)
    }

    async fn delete(&self, id: &str) -> RemoteResult<()> {
        sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(remote_error)?;
        Ok(())
    }
}

/// User collection repository
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: &str) -> RemoteResult<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(remote_error)
    }

    fn not_found(id: &str) -> RemoteError {
        RemoteError::NotFound(format!("users/{}", id))
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn get(&self, id: &str) -> RemoteResult<Option<Document>> {
        get_document(&self.pool, "users", id).await
    }

    async fn set(&self, id: &str, fields: Fields) -> RemoteResult<()> {
        set_document(&self.pool, "users", id, fields).await
    }

    async fn update(&self, id: &str, fields: Fields) -> RemoteResult<()> {
        let result = sqlx::query("UPDATE users SET body = body || $2 WHERE id = $1")
            .bind(id)
            .bind(Value::Object(fields))
            .execute(&self.pool)
            .await
            .map_err(remote_error)?;

        if result.rows_affected() == 0 {
            return Err(Self::not_found(id));
        }
        Ok(())
    }

    async fn add_liked(&self, user_id: &str, listing_id: &str) -> RemoteResult<()> {
        let result = sqlx::query(&format!(
            r#"
            UPDATE users
            SET body = jsonb_set(
                body,
                '{{{key}}}',
                COALESCE(body->'{key}', '[]'::jsonb) || to_jsonb($2::text)
            )
            WHERE id = $1 AND NOT (COALESCE(body->'{key}', '[]'::jsonb) ? $2)
            "#,
            key = LIKED_LISTINGS_KEY
        ))
        .bind(user_id)
        .bind(listing_id)
        .execute(&self.pool)
        .await
        .map_err(remote_error)?;

        // Nothing updated means either already liked or no such user
        if result.rows_affected() == 0 && !self.exists(user_id).await? {
            return Err(Self::not_found(user_id));
        }
        Ok(())
    }

    async fn remove_liked(&self, user_id: &str, listing_id: &str) -> RemoteResult<()> {
        let result = sqlx::query(&format!(
            r#"
            UPDATE users
            SET body = jsonb_set(
                body,
                '{{{key}}}',
                COALESCE(body->'{key}', '[]'::jsonb) - $2::text
            )
            WHERE id = $1
            "#,
            key = LIKED_LISTINGS_KEY
        ))
        .bind(user_id)
        .bind(listing_id)
        .execute(&self.pool)
        .await
        .map_err(remote_error)?;

        if result.rows_affected() == 0 {
            return Err(Self::not_found(user_id));
        }
        Ok(())
    }

    async fn find_liking(&self, listing_id: &str) -> RemoteResult<Vec<String>> {
        let rows = sqlx::query(&format!(
            "SELECT id FROM users WHERE COALESCE(body->'{}', '[]'::jsonb) ? $1",
            LIKED_LISTINGS_KEY
        ))
        .bind(listing_id)
        .fetch_all(&self.pool)
        .await
        .map_err(remote_error)?;

        rows.iter()
            .map(|row| row.try_get("id").map_err(remote_error))
            .collect()
    }
}
