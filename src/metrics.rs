//! Metric name constants.

use std::time::Duration;

use anyhow::Context;
use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::config;

pub const AUTH_FAILED: &str = "blogcomments.auth.failed"; // Counter.

pub const COMMENT_SUBMITTED: &str = "blogcomments.comment.submitted"; // Counter.
pub const COMMENT_HONEYPOT: &str = "blogcomments.comment.honeypot"; // Counter.
pub const COMMENT_RATE_LIMITED: &str = "blogcomments.comment.rate_limited"; // Counter.
pub const COMMENT_SPAM: &str = "blogcomments.comment.spam"; // Counter.
pub const COMMENT_FLAGGED: &str = "blogcomments.comment.flagged"; // Counter.
pub const COMMENT_MODERATED: &str = "blogcomments.comment.moderated"; // Counter.

pub const WEBHOOK_SENT: &str = "blogcomments.webhook.sent"; // Counter.
pub const WEBHOOK_FAILED: &str = "blogcomments.webhook.failed"; // Counter.

/// Must be ran exactly once on startup. This will declare all of the instruments for `metrics`.
pub fn setup(config: Option<&config::MetricConfig>) -> anyhow::Result<()> {
    describe_counter!(AUTH_FAILED, "The number of failed admin authentication attempts.");

    describe_counter!(COMMENT_SUBMITTED, "Comments persisted from public submissions.");
    describe_counter!(
        COMMENT_HONEYPOT,
        "Submissions silently dropped because the honeypot field was filled."
    );
    describe_counter!(
        COMMENT_RATE_LIMITED,
        "Submissions rejected by the per-IP rate limiter."
    );
    describe_counter!(COMMENT_SPAM, "Comments auto-classified as spam.");
    describe_counter!(
        COMMENT_FLAGGED,
        "Comments that matched a flag-only spam keyword."
    );
    describe_counter!(COMMENT_MODERATED, "Moderation actions applied by admins.");

    describe_counter!(WEBHOOK_SENT, "Webhook deliveries acknowledged with a 2xx.");
    describe_counter!(
        WEBHOOK_FAILED,
        "Webhook deliveries that failed or were rejected."
    );

    if let Some(config) = config {
        match config {
            config::MetricConfig::PrometheusPush(prometheus_config) => {
                PrometheusBuilder::new()
                    .with_push_gateway(
                        prometheus_config.url.clone(),
                        Duration::from_secs(10),
                        None,
                        None,
                    )
                    .context("failed to set up push gateway")?
                    .install()
                    .context("failed to install metrics exporter")?;
            }
        }
    }

    Ok(())
}
