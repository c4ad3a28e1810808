//! Admin-only operations: comment moderation and webhook registration.

use anyhow::anyhow;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse as _, Response},
    Json,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use super::non_empty;
use crate::{
    auth::AdminUser,
    db::{self, Db},
    metrics::COMMENT_MODERATED,
    models::{Comment, ModerationAction, WebhookRegistration},
    Error, Result,
};

/// Reviewer recorded when the request does not name one.
const DEFAULT_REVIEWER: &str = "admin";

/// Body of an admin `PATCH`. Which fields matter depends on `action`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ManageInput {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    comment_id: Option<String>,
    #[serde(default)]
    reviewed_by: Option<String>,
    #[serde(default)]
    location_id: Option<String>,
    #[serde(default)]
    webhook_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ModerateOutput {
    pub success: bool,
    pub comment: Comment,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SetWebhookOutput {
    pub success: bool,
    pub webhook: WebhookRegistration,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct DeleteWebhookOutput {
    pub success: bool,
    pub deleted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct WebhookList {
    pub webhooks: Vec<WebhookRegistration>,
}

/// `PATCH /`. The admin check runs before the body is parsed.
pub(crate) async fn manage(
    _admin: AdminUser,
    State(db): State<Db>,
    input: std::result::Result<Json<ManageInput>, JsonRejection>,
) -> Result<Response> {
    let Json(input) = input?;

    match input.action.as_deref() {
        Some("set_webhook") => Ok(set_webhook(&db, &input).await?.into_response()),
        Some("delete_webhook") => Ok(delete_webhook(&db, &input).await?.into_response()),
        _ => Ok(moderate(&db, &input).await?.into_response()),
    }
}

async fn moderate(db: &Db, input: &ManageInput) -> Result<Json<ModerateOutput>> {
    let invalid =
        || Error::bad_request(anyhow!("comment_id and valid action (approve/reject/spam) required"));

    let comment_id = non_empty(input.comment_id.as_deref()).ok_or_else(invalid)?;
    let action: ModerationAction = input
        .action
        .as_deref()
        .and_then(|a| a.parse().ok())
        .ok_or_else(invalid)?;
    let reviewed_by = non_empty(input.reviewed_by.as_deref()).unwrap_or(DEFAULT_REVIEWER);

    let status = action.target();

    let comment = db::comments::set_status(db, comment_id, status, reviewed_by)
        .await?
        .ok_or_else(|| Error::not_found(anyhow!("Comment not found")))?;

    counter!(COMMENT_MODERATED, "status" => status.as_str()).increment(1);
    info!(comment = %comment.id, %status, reviewed_by, "comment moderated");

    Ok(Json(ModerateOutput {
        success: true,
        comment,
    }))
}

/// Only absolute `http` and `https` URLs are accepted.
fn parse_webhook_url(raw: &str) -> Option<Url> {
    Url::parse(raw)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
}

async fn set_webhook(db: &Db, input: &ManageInput) -> Result<Json<SetWebhookOutput>> {
    let (Some(location_id), Some(raw_url)) = (
        non_empty(input.location_id.as_deref()),
        non_empty(input.webhook_url.as_deref()),
    ) else {
        return Err(Error::bad_request(anyhow!(
            "location_id and webhook_url required"
        )));
    };

    let url = parse_webhook_url(raw_url).ok_or_else(|| {
        Error::bad_request(anyhow!("webhook_url must be an absolute http(s) URL"))
    })?;

    let webhook = db::webhooks::upsert(db, location_id, url.as_str()).await?;
    info!(location = %location_id, "webhook registered");

    Ok(Json(SetWebhookOutput {
        success: true,
        webhook,
    }))
}

async fn delete_webhook(db: &Db, input: &ManageInput) -> Result<Json<DeleteWebhookOutput>> {
    let location_id = non_empty(input.location_id.as_deref())
        .ok_or_else(|| Error::bad_request(anyhow!("location_id required")))?;

    let deleted = db::webhooks::delete(db, location_id).await?;
    info!(location = %location_id, deleted, "webhook removed");

    Ok(Json(DeleteWebhookOutput {
        success: true,
        deleted,
    }))
}

pub(super) async fn list_webhooks(db: &Db) -> Result<Json<WebhookList>> {
    let webhooks = db::webhooks::list(db).await?;
    Ok(Json(WebhookList { webhooks }))
}
