//! Validation and sanitization of public comment submissions.

use std::sync::LazyLock;

use axum::http::HeaderMap;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::db::comments::NewComment;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_TEXT_LEN: usize = 5000;

/// Permissive single-`@` address check.
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern should compile")
});

/// Client IP headers, in order of preference.
const CLIENT_IP_HEADERS: [&str; 2] = ["x-forwarded-for", "cf-connecting-ip"];

/// Reasons a submission is turned away with a 400.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("All fields are required: blog_slug, author_name, author_email, comment_text")]
    MissingFields,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Input exceeds maximum length")]
    TooLong,
}

impl From<InputError> for crate::Error {
    fn from(err: InputError) -> Self {
        Self::bad_request(err)
    }
}

/// Request body for a new comment.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SubmitInput {
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub blog_slug: Option<String>,
    #[serde(default)]
    pub blog_title: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_email: Option<String>,
    #[serde(default)]
    pub comment_text: Option<String>,
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

/// Hidden form field. Humans leave it empty.
const HONEYPOT_FIELD: &str = "honeypot";

/// Whether the raw request body has the honeypot filled in.
///
/// Checked before the body is typed, so a bot never sees a validation error. Any
/// non-empty string, `true`, non-zero number, array or object counts as filled.
pub fn is_bot(body: &Value) -> bool {
    match body.get(HONEYPOT_FIELD) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(filled)) => *filled,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

impl SubmitInput {
    /// Type a request body that already passed the honeypot check.
    pub fn from_body(body: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(body)
    }

    pub fn validate(&self) -> Result<(), InputError> {
        let slug = field(&self.blog_slug);
        let name = field(&self.author_name);
        let email = field(&self.author_email);
        let text = field(&self.comment_text);

        if [slug, name, email, text].iter().any(|f| f.trim().is_empty()) {
            return Err(InputError::MissingFields);
        }

        if !EMAIL.is_match(email) {
            return Err(InputError::InvalidEmail);
        }

        if name.chars().count() > MAX_NAME_LEN
            || email.chars().count() > MAX_EMAIL_LEN
            || text.chars().count() > MAX_TEXT_LEN
        {
            return Err(InputError::TooLong);
        }

        Ok(())
    }

    /// The text run through spam classification.
    pub fn spam_text(&self) -> String {
        format!("{} {}", field(&self.comment_text), field(&self.author_name))
    }

    /// Escape and trim every free-text field; normalize the email.
    pub fn sanitize(&self) -> NewComment {
        let optional = |value: &Option<String>| {
            value
                .as_deref()
                .map(sanitize_text)
                .filter(|v| !v.is_empty())
        };

        NewComment {
            location_id: optional(&self.location_id),
            blog_slug: sanitize_text(field(&self.blog_slug)),
            blog_title: optional(&self.blog_title),
            author_name: sanitize_text(field(&self.author_name)),
            author_email: field(&self.author_email).trim().to_lowercase(),
            comment_text: sanitize_text(field(&self.comment_text)),
        }
    }
}

/// Escape characters that would let stored text break out of HTML, then trim.
pub fn sanitize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.trim().chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

/// The caller's address as reported by the fronting proxy, or `"unknown"`.
pub fn client_ip(headers: &HeaderMap) -> &str {
    CLIENT_IP_HEADERS
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .find(|value| !value.is_empty())
        .unwrap_or("unknown")
}
