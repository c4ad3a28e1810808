//! The `webhooks` table: one CRM target per location.

use anyhow::{Context as _, Result};

use super::Db;
use crate::models::WebhookRegistration;

pub async fn list(db: &Db) -> Result<Vec<WebhookRegistration>> {
    sqlx::query_as::<_, WebhookRegistration>("SELECT * FROM webhooks ORDER BY location_id ASC")
        .fetch_all(db)
        .await
        .context("failed to fetch webhooks")
}

pub async fn find(db: &Db, location_id: &str) -> Result<Option<WebhookRegistration>> {
    sqlx::query_as::<_, WebhookRegistration>("SELECT * FROM webhooks WHERE location_id = ?")
        .bind(location_id)
        .fetch_optional(db)
        .await
        .context("failed to fetch webhook")
}

/// Register or replace the webhook for a location.
pub async fn upsert(db: &Db, location_id: &str, webhook_url: &str) -> Result<WebhookRegistration> {
    let now = super::now();

    sqlx::query_as::<_, WebhookRegistration>(
        r#"
        INSERT INTO webhooks (location_id, webhook_url, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            ON CONFLICT (location_id) DO UPDATE
                SET webhook_url = excluded.webhook_url, updated_at = excluded.updated_at
            RETURNING *
        "#,
    )
    .bind(location_id)
    .bind(webhook_url)
    .bind(now)
    .fetch_one(db)
    .await
    .context("failed to save webhook")
}

/// Returns whether a registration was removed.
pub async fn delete(db: &Db, location_id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM webhooks WHERE location_id = ?")
        .bind(location_id)
        .execute(db)
        .await
        .context("failed to delete webhook")?;

    Ok(result.rows_affected() > 0)
}
