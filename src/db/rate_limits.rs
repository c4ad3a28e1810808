//! The `rate_limits` append log.

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};

use super::Db;

/// Count the events recorded for `ip_hash` at or after `since`.
pub async fn count_since(db: &Db, ip_hash: &str, since: DateTime<Utc>) -> Result<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM rate_limits
            WHERE ip_hash = ?
            AND created_at >= ?
        "#,
    )
    .bind(ip_hash)
    .bind(super::timestamp(since))
    .fetch_one(db)
    .await
    .context("failed to count rate limit events")
}

/// Append one event for `ip_hash` at `at`.
pub async fn record(db: &Db, ip_hash: &str, at: DateTime<Utc>) -> Result<()> {
    _ = sqlx::query("INSERT INTO rate_limits (ip_hash, created_at) VALUES (?, ?)")
        .bind(ip_hash)
        .bind(super::timestamp(at))
        .execute(db)
        .await
        .context("failed to record rate limit event")?;

    Ok(())
}
