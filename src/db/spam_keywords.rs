//! The `spam_keywords` table. Managed out of band through the `keywords` subcommand.

use anyhow::{Context as _, Result};

use super::Db;
use crate::models::{KeywordAction, SpamKeyword};

pub async fn list(db: &Db) -> Result<Vec<SpamKeyword>> {
    sqlx::query_as::<_, SpamKeyword>("SELECT keyword, action FROM spam_keywords")
        .fetch_all(db)
        .await
        .context("failed to fetch spam keywords")
}

/// Add a keyword, or change the action of an existing one.
pub async fn upsert(db: &Db, keyword: &str, action: KeywordAction) -> Result<()> {
    _ = sqlx::query(
        r#"
        INSERT INTO spam_keywords (keyword, action) VALUES (?, ?)
            ON CONFLICT (keyword) DO UPDATE SET action = excluded.action
        "#,
    )
    .bind(keyword)
    .bind(action.as_str())
    .execute(db)
    .await
    .context("failed to save spam keyword")?;

    Ok(())
}

/// Returns whether a keyword was removed.
pub async fn remove(db: &Db, keyword: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM spam_keywords WHERE keyword = ?")
        .bind(keyword)
        .execute(db)
        .await
        .context("failed to delete spam keyword")?;

    Ok(result.rows_affected() > 0)
}
