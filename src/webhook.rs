//! Best-effort forwarding of new comments to a CRM webhook.

use anyhow::{bail, Context as _, Result};
use metrics::counter;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    config::AppConfig,
    db::{self, Db},
    metrics::{WEBHOOK_FAILED, WEBHOOK_SENT},
    models::{Comment, CommentStatus},
};

/// Value of the `source` field on every payload.
pub const PAYLOAD_SOURCE: &str = "blog_comments";

/// The body POSTed to the CRM.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload<'a> {
    pub comment_id: &'a str,
    pub location_id: Option<&'a str>,
    pub blog_slug: &'a str,
    pub blog_title: &'a str,
    pub author_name: &'a str,
    pub author_email: &'a str,
    pub comment_text: &'a str,
    pub status: CommentStatus,
    pub created_at: &'a str,
    pub source: &'static str,
}

impl<'a> From<&'a Comment> for WebhookPayload<'a> {
    fn from(comment: &'a Comment) -> Self {
        Self {
            comment_id: &comment.id,
            location_id: comment.location_id.as_deref(),
            blog_slug: &comment.blog_slug,
            blog_title: comment.blog_title.as_deref().unwrap_or_default(),
            author_name: &comment.author_name,
            author_email: &comment.author_email,
            comment_text: &comment.comment_text,
            status: comment.status,
            created_at: &comment.created_at,
            source: PAYLOAD_SOURCE,
        }
    }
}

#[derive(Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    db: Db,
    default_url: Option<Url>,
}

impl WebhookNotifier {
    pub fn new(client: reqwest::Client, db: Db, config: &AppConfig) -> Self {
        Self {
            client,
            db,
            default_url: config.webhook_url.clone(),
        }
    }

    /// Deliver `comment` in the background. The caller never observes the outcome;
    /// failures go to the log only.
    pub fn notify(&self, comment: Comment) -> tokio::task::JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            match this.deliver(&comment).await {
                Ok(true) => {
                    counter!(WEBHOOK_SENT).increment(1);
                    info!(comment = %comment.id, "webhook delivered");
                }
                Ok(false) => {}
                Err(e) => {
                    counter!(WEBHOOK_FAILED).increment(1);
                    warn!(comment = %comment.id, "webhook delivery failed: {e:#}");
                }
            }
        })
    }

    /// The registration for the comment's location wins over the global URL.
    async fn target(&self, comment: &Comment) -> Result<Option<Url>> {
        if let Some(location_id) = comment.location_id.as_deref() {
            if let Some(registration) = db::webhooks::find(&self.db, location_id).await? {
                let url = Url::parse(&registration.webhook_url)
                    .with_context(|| format!("invalid webhook url for location {location_id}"))?;
                return Ok(Some(url));
            }
        }

        Ok(self.default_url.clone())
    }

    /// Returns `Ok(false)` when there is nowhere to deliver to.
    async fn deliver(&self, comment: &Comment) -> Result<bool> {
        let Some(url) = self.target(comment).await? else {
            debug!(comment = %comment.id, "no webhook configured, skipping");
            return Ok(false);
        };

        let res = self
            .client
            .post(url)
            .json(&WebhookPayload::from(comment))
            .send()
            .await
            .context("failed to send webhook request")?;

        let status = res.status();
        if !status.is_success() {
            bail!("webhook responded with {status}");
        }

        db::comments::mark_webhook_sent(&self.db, &comment.id).await?;
        Ok(true)
    }
}
