//! Public comment endpoints: submission and the comment feed.

use anyhow::anyhow;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse as _, Response},
    Json,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use super::non_empty;
use crate::{
    auth,
    config::AppConfig,
    db::{self, comments::ADMIN_LIST_LIMIT, Db},
    guard::{AbuseGuard, Classification},
    metrics::{
        COMMENT_FLAGGED, COMMENT_HONEYPOT, COMMENT_RATE_LIMITED, COMMENT_SPAM, COMMENT_SUBMITTED,
    },
    models::{Comment, CommentStatus, KeywordAction, PublicComment},
    submission::{self, SubmitInput},
    webhook::WebhookNotifier,
    Error, Result,
};

/// Header an anonymous author can use instead of the `commenter_token` query parameter.
const COMMENTER_TOKEN_HEADER: &str = "x-commenter-token";

const AWAITING_MODERATION: &str = "Your comment has been submitted and is awaiting moderation.";

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SubmitOutput {
    pub success: bool,
    pub commenter_token: String,
    pub status: CommentStatus,
    pub message: String,
}

impl SubmitOutput {
    fn accepted(commenter_token: String, status: CommentStatus) -> (StatusCode, Json<Self>) {
        (
            StatusCode::CREATED,
            Json(Self {
                success: true,
                commenter_token,
                status: status.public(),
                message: AWAITING_MODERATION.to_owned(),
            }),
        )
    }
}

pub(crate) async fn submit(
    State(db): State<Db>,
    State(guard): State<AbuseGuard>,
    State(notifier): State<WebhookNotifier>,
    headers: HeaderMap,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitOutput>)> {
    let Json(body) = body?;

    // Bots get a convincing success and nothing is stored.
    if submission::is_bot(&body) {
        counter!(COMMENT_HONEYPOT).increment(1);
        debug!("honeypot filled, dropping submission");
        return Ok(SubmitOutput::accepted(
            Uuid::new_v4().to_string(),
            CommentStatus::Pending,
        ));
    }

    let input = SubmitInput::from_body(body)
        .map_err(|e| Error::bad_request(anyhow!("Invalid request body: {e}")))?;
    input.validate()?;

    let ip_hash = guard.hash_ip(submission::client_ip(&headers));
    if guard.is_rate_limited(&ip_hash).await? {
        counter!(COMMENT_RATE_LIMITED).increment(1);
        return Err(Error::rate_limited());
    }

    let classification = guard.classify(&input.spam_text()).await;
    let status = classification.initial_status();
    if let Classification::Matched { ref keyword, action } = classification {
        match action {
            KeywordAction::AutoReject => counter!(COMMENT_SPAM).increment(1),
            KeywordAction::Flag => counter!(COMMENT_FLAGGED).increment(1),
        }
        info!(keyword = %keyword, action = action.as_str(), "spam keyword matched");
    }

    let comment = db::comments::insert(&db, &input.sanitize(), status, &ip_hash).await?;
    counter!(COMMENT_SUBMITTED).increment(1);
    info!(
        comment = %comment.id,
        slug = %comment.blog_slug,
        status = %comment.status,
        "comment submitted"
    );

    // The check above and this record are not atomic. Concurrent submissions from one
    // address can briefly exceed the limit.
    guard.record_event(&ip_hash).await;

    let commenter_token = comment.commenter_token.clone();
    if comment.status != CommentStatus::Spam {
        drop(notifier.notify(comment));
    }

    Ok(SubmitOutput::accepted(commenter_token, status))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FetchParams {
    admin: Option<String>,
    webhooks: Option<String>,
    blog_slug: Option<String>,
    location_id: Option<String>,
    commenter_token: Option<String>,
}

fn flag(value: Option<&str>) -> bool {
    value == Some("true")
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct PublicFeed {
    pub comments: Vec<PublicComment>,
    pub pending_own: Vec<PublicComment>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AdminFeed {
    pub comments: Vec<Comment>,
}

pub(crate) async fn fetch(
    State(db): State<Db>,
    State(config): State<AppConfig>,
    headers: HeaderMap,
    params: std::result::Result<Query<FetchParams>, QueryRejection>,
) -> Result<Response> {
    let Query(params) = params?;

    if flag(params.admin.as_deref()) {
        let _admin = auth::authorize(&headers, &config)?;

        if flag(params.webhooks.as_deref()) {
            return Ok(super::admin::list_webhooks(&db).await?.into_response());
        }

        let comments = db::comments::recent(&db, ADMIN_LIST_LIMIT).await?;
        return Ok(Json(AdminFeed { comments }).into_response());
    }

    let blog_slug = non_empty(params.blog_slug.as_deref())
        .ok_or_else(|| Error::bad_request(anyhow!("blog_slug is required")))?;
    let location_id = non_empty(params.location_id.as_deref());
    let commenter_token = non_empty(params.commenter_token.as_deref()).or_else(|| {
        non_empty(
            headers
                .get(COMMENTER_TOKEN_HEADER)
                .and_then(|v| v.to_str().ok()),
        )
    });

    let comments = db::comments::approved_for_post(&db, blog_slug, location_id).await?;
    let pending_own = match commenter_token {
        Some(token) => {
            db::comments::own_pending_for_post(&db, blog_slug, location_id, token).await?
        }
        None => Vec::new(),
    };

    Ok(Json(PublicFeed {
        comments,
        pending_own,
    })
    .into_response())
}
