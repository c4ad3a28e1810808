use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, info};

/// Message returned for every 5xx. Details stay in the server log.
const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// `axum`-compatible error handler.
pub struct Error {
    status: StatusCode,
    err: anyhow::Error,
}

impl Error {
    pub fn with_status(status: StatusCode, err: impl Into<anyhow::Error>) -> Self {
        Self {
            status,
            err: err.into(),
        }
    }

    pub fn bad_request(err: impl Into<anyhow::Error>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, err)
    }

    pub fn not_found(err: impl Into<anyhow::Error>) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, err)
    }

    pub fn unauthorized() -> Self {
        Self::with_status(StatusCode::UNAUTHORIZED, anyhow::anyhow!("Unauthorized"))
    }

    pub fn rate_limited() -> Self {
        Self::with_status(
            StatusCode::TOO_MANY_REQUESTS,
            anyhow::anyhow!("You're commenting too frequently. Please wait a few minutes."),
        )
    }

    pub fn method_not_allowed() -> Self {
        Self::with_status(
            StatusCode::METHOD_NOT_ALLOWED,
            anyhow::anyhow!("Method not allowed"),
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The message the caller gets to see.
    fn public_message(&self) -> String {
        if self.status.is_server_error() {
            INTERNAL_ERROR_MESSAGE.to_owned()
        } else {
            self.err.to_string()
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            err,
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(anyhow::anyhow!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(anyhow::anyhow!(
            "Invalid query string: {}",
            rejection.body_text()
        ))
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:?}", self.status, self.err)
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.err.fmt(f)
    }
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("{:?}", self.err);
        } else {
            info!(status = %self.status, "request rejected: {}", self.err);
        }

        (self.status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}
