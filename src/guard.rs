//! Abuse controls for public submissions: IP pseudonymization, rate limiting and
//! keyword-based spam classification.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};
use sha2::{Digest as _, Sha256};
use tracing::{debug, warn};

use crate::{
    config::AppConfig,
    db::{self, Db},
    models::{CommentStatus, KeywordAction, SpamKeyword},
};

/// Outcome of scanning a submission against the keyword list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Clean,
    Matched {
        keyword: String,
        action: KeywordAction,
    },
}

impl Classification {
    pub const fn is_spam(&self) -> bool {
        matches!(*self, Self::Matched { .. })
    }

    pub const fn action(&self) -> Option<KeywordAction> {
        match *self {
            Self::Clean => None,
            Self::Matched { action, .. } => Some(action),
        }
    }

    /// The status a new comment with this classification is stored under.
    pub const fn initial_status(&self) -> CommentStatus {
        match self.action() {
            Some(KeywordAction::AutoReject) => CommentStatus::Spam,
            Some(KeywordAction::Flag) | None => CommentStatus::Pending,
        }
    }
}

/// Scan `text` for the first keyword it contains, ignoring case.
///
/// Keywords are matched as stored, surrounding spaces included, so `" ass "` does
/// not hit "classic". Blank keywords never match.
pub fn classify_with(keywords: &[SpamKeyword], text: &str) -> Classification {
    let text = text.to_lowercase();

    keywords
        .iter()
        .filter(|kw| !kw.keyword.trim().is_empty())
        .find(|kw| text.contains(&kw.keyword.to_lowercase()))
        .map_or(Classification::Clean, |kw| Classification::Matched {
            keyword: kw.keyword.clone(),
            action: kw.action(),
        })
}

/// Hex SHA-256 of `ip` followed by `salt`.
pub fn hash_ip_with(salt: &str, ip: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ip.as_bytes());
    hasher.update(salt.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Clone)]
pub struct AbuseGuard {
    db: Db,
    salt: Arc<str>,
    max_events: u32,
    window: TimeDelta,
}

impl AbuseGuard {
    pub fn new(db: Db, config: &AppConfig) -> Self {
        Self {
            db,
            salt: Arc::from(config.ip_salt.as_str()),
            max_events: config.rate_limit.max_events,
            window: TimeDelta::from_std(config.rate_limit.window()).unwrap_or(TimeDelta::MAX),
        }
    }

    /// Pseudonymous identifier for a client IP. The raw IP is never stored.
    pub fn hash_ip(&self, ip: &str) -> String {
        hash_ip_with(&self.salt, ip)
    }

    /// Whether `ip_hash` has used up its submissions for the trailing window.
    pub async fn is_rate_limited(&self, ip_hash: &str) -> Result<bool> {
        self.is_rate_limited_at(ip_hash, Utc::now()).await
    }

    async fn is_rate_limited_at(&self, ip_hash: &str, now: DateTime<Utc>) -> Result<bool> {
        let since = now
            .checked_sub_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let count = db::rate_limits::count_since(&self.db, ip_hash, since).await?;

        debug!(count, max = self.max_events, "rate limit lookup");
        Ok(count >= i64::from(self.max_events))
    }

    /// Record one submission for `ip_hash`. Failures are logged and otherwise ignored.
    pub async fn record_event(&self, ip_hash: &str) {
        if let Err(e) = db::rate_limits::record(&self.db, ip_hash, Utc::now()).await {
            warn!("failed to record rate limit event: {e:#}");
        }
    }

    /// Classify a submission against the stored keyword list.
    ///
    /// If the keyword list cannot be read the text is treated as clean.
    pub async fn classify(&self, text: &str) -> Classification {
        match db::spam_keywords::list(&self.db).await {
            Ok(keywords) => classify_with(&keywords, text),
            Err(e) => {
                warn!("spam keyword lookup failed, skipping classification: {e:#}");
                Classification::Clean
            }
        }
    }
}
