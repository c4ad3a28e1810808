use axum::{http::StatusCode, routing::get, Router};

use crate::{AppState, Error};

mod admin;
mod comments;

/// A parameter with surrounding whitespace removed, or `None` if nothing is left.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Answer a bare `OPTIONS`. Browser preflights are handled by the CORS layer.
async fn options() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn method_not_allowed() -> Error {
    Error::method_not_allowed()
}

#[rustfmt::skip]
pub(crate) fn routes() -> Router<AppState> {
    // UG      /  public feed (admin listing with ?admin=true)
    // UP      /  submit a comment
    // APATCH  /  moderate a comment, or manage webhooks
    Router::new()
        .route("/",
            get(comments::fetch)
                .post(comments::submit)
                .patch(admin::manage)
                .options(options)
                .fallback(method_not_allowed),
        )
}
