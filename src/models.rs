//! Records stored by the service and the enums that describe them.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Moderation status of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum CommentStatus {
    Pending,
    Approved,
    Rejected,
    Spam,
}

impl CommentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Spam => "spam",
        }
    }

    /// Status as reported back to the submitter. Spam is never revealed.
    pub const fn public(self) -> Self {
        match self {
            Self::Spam => Self::Pending,
            other => other,
        }
    }
}

impl std::fmt::Display for CommentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An admin decision on a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationAction {
    Approve,
    Reject,
    Spam,
}

impl ModerationAction {
    /// The status a comment ends up in after this action.
    ///
    /// The result does not depend on the current status: a comment that was already
    /// reviewed can be reviewed again.
    pub const fn target(self) -> CommentStatus {
        match self {
            Self::Approve => CommentStatus::Approved,
            Self::Reject => CommentStatus::Rejected,
            Self::Spam => CommentStatus::Spam,
        }
    }
}

impl std::str::FromStr for ModerationAction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "spam" => Ok(Self::Spam),
            other => Err(anyhow::anyhow!("unknown moderation action: {other}")),
        }
    }
}

/// What happens to a submission that matches a spam keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordAction {
    /// Store the comment as spam.
    AutoReject,
    /// Keep the comment pending; the match is only logged.
    Flag,
}

impl KeywordAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AutoReject => "auto_reject",
            Self::Flag => "flag",
        }
    }

    /// Anything other than `auto_reject` is treated as a flag.
    pub fn from_stored(action: &str) -> Self {
        if action == "auto_reject" {
            Self::AutoReject
        } else {
            Self::Flag
        }
    }
}

/// A comment row with every column.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: String,
    pub location_id: Option<String>,
    pub blog_slug: String,
    pub blog_title: Option<String>,
    pub author_name: String,
    pub author_email: String,
    pub comment_text: String,
    pub status: CommentStatus,
    pub commenter_token: String,
    pub ip_hash: String,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<String>,
    pub webhook_sent: bool,
    pub created_at: String,
}

/// The display-only projection served to the public widget.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PublicComment {
    pub id: String,
    pub author_name: String,
    pub comment_text: String,
    pub created_at: String,
    pub status: CommentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SpamKeyword {
    pub keyword: String,
    pub action: String,
}

impl SpamKeyword {
    pub fn action(&self) -> KeywordAction {
        KeywordAction::from_stored(&self.action)
    }
}

/// Per-location CRM webhook target.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WebhookRegistration {
    pub location_id: String,
    pub webhook_url: String,
    pub created_at: String,
    pub updated_at: String,
}
