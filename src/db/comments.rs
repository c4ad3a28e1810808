//! The `comments` table.

use anyhow::{Context as _, Result};
use uuid::Uuid;

use super::Db;
use crate::models::{Comment, CommentStatus, PublicComment};

/// Hard cap on the admin listing.
pub const ADMIN_LIST_LIMIT: u32 = 200;

/// A sanitized submission, ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub location_id: Option<String>,
    pub blog_slug: String,
    pub blog_title: Option<String>,
    pub author_name: String,
    pub author_email: String,
    pub comment_text: String,
}

/// Insert a comment. The identifier and commenter token are generated here.
pub async fn insert(
    db: &Db,
    comment: &NewComment,
    status: CommentStatus,
    ip_hash: &str,
) -> Result<Comment> {
    let id = Uuid::new_v4().to_string();
    let commenter_token = Uuid::new_v4().to_string();

    sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (
            id, location_id, blog_slug, blog_title, author_name, author_email,
            comment_text, status, commenter_token, ip_hash, created_at
        )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
        "#,
    )
    .bind(id)
    .bind(&comment.location_id)
    .bind(&comment.blog_slug)
    .bind(&comment.blog_title)
    .bind(&comment.author_name)
    .bind(&comment.author_email)
    .bind(&comment.comment_text)
    .bind(status)
    .bind(commenter_token)
    .bind(ip_hash)
    .bind(super::now())
    .fetch_one(db)
    .await
    .context("failed to insert comment")
}

/// Approved comments on a post, oldest first.
pub async fn approved_for_post(
    db: &Db,
    blog_slug: &str,
    location_id: Option<&str>,
) -> Result<Vec<PublicComment>> {
    sqlx::query_as::<_, PublicComment>(
        r#"
        SELECT id, author_name, comment_text, created_at, status
            FROM comments
            WHERE blog_slug = ?1
            AND status = 'approved'
            AND (?2 IS NULL OR location_id = ?2)
            ORDER BY created_at ASC, rowid ASC
        "#,
    )
    .bind(blog_slug)
    .bind(location_id)
    .fetch_all(db)
    .await
    .context("failed to fetch approved comments")
}

/// Pending comments on a post that were submitted under `commenter_token`, oldest first.
pub async fn own_pending_for_post(
    db: &Db,
    blog_slug: &str,
    location_id: Option<&str>,
    commenter_token: &str,
) -> Result<Vec<PublicComment>> {
    sqlx::query_as::<_, PublicComment>(
        r#"
        SELECT id, author_name, comment_text, created_at, status
            FROM comments
            WHERE blog_slug = ?1
            AND commenter_token = ?2
            AND status = 'pending'
            AND (?3 IS NULL OR location_id = ?3)
            ORDER BY created_at ASC, rowid ASC
        "#,
    )
    .bind(blog_slug)
    .bind(commenter_token)
    .bind(location_id)
    .fetch_all(db)
    .await
    .context("failed to fetch pending comments")
}

/// The most recent comments across all posts, newest first.
pub async fn recent(db: &Db, limit: u32) -> Result<Vec<Comment>> {
    let limit = limit.min(ADMIN_LIST_LIMIT);

    sqlx::query_as::<_, Comment>(
        r#"
        SELECT * FROM comments
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(db)
    .await
    .context("failed to fetch comments")
}

/// Set a comment's status and review metadata. Returns `None` if no such comment exists.
pub async fn set_status(
    db: &Db,
    id: &str,
    status: CommentStatus,
    reviewed_by: &str,
) -> Result<Option<Comment>> {
    sqlx::query_as::<_, Comment>(
        r#"
        UPDATE comments
            SET status = ?, reviewed_by = ?, reviewed_at = ?
            WHERE id = ?
            RETURNING *
        "#,
    )
    .bind(status)
    .bind(reviewed_by)
    .bind(super::now())
    .bind(id)
    .fetch_optional(db)
    .await
    .context("failed to update comment")
}

pub async fn mark_webhook_sent(db: &Db, id: &str) -> Result<()> {
    _ = sqlx::query("UPDATE comments SET webhook_sent = 1 WHERE id = ?")
        .bind(id)
        .execute(db)
        .await
        .context("failed to mark webhook as sent")?;

    Ok(())
}
