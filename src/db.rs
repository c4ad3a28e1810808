//! SQLite persistence.
//!
//! Every table lives in a single database file managed through `sqlx`. The schema is
//! embedded from `migrations/` and applied on startup.

use std::str::FromStr as _;

use anyhow::{Context as _, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

pub mod comments;
pub mod rate_limits;
pub mod spam_keywords;
pub mod webhooks;

/// The database connection pool.
pub type Db = SqlitePool;

/// Embedded migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// Open the database, creating the file and its directory if needed, and apply pending migrations.
pub async fn establish_pool(url: &str) -> Result<Db> {
    let opts = SqliteConnectOptions::from_str(url)
        .context("failed to parse database options")?
        .create_if_missing(true);

    if let Some(parent) = opts.get_filename().parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }

    let db = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await
        .context("failed to connect to SQLite database")?;

    MIGRATOR
        .run(&db)
        .await
        .context("failed to apply migrations")?;

    Ok(db)
}

/// Render a timestamp the way it is stored.
///
/// Fixed width with microseconds, so string order is time order.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// The current time, formatted for storage.
pub fn now() -> String {
    timestamp(Utc::now())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    #[test]
    fn timestamps_are_fixed_width() {
        let a = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let b = a + chrono::Duration::microseconds(1);

        assert_eq!(timestamp(a), "2024-01-02T03:04:05.000000Z");
        assert_eq!(timestamp(a).len(), timestamp(b).len());
        assert!(timestamp(a) < timestamp(b));
    }
}
