//! Ready-made handlers.
use crate::context::Context;

use hyper::StatusCode;
use serde_json::json;

pub const NOT_FOUND_MESSAGE: &str = "The URL you requested was not found.";

/// The handler a [`Router`](crate::Router) falls back to when no route
/// matches: a `404 Not Found` with a JSON body.
pub fn not_found(c: &mut Context<'_>) {
    if let Err(err) = c.json(StatusCode::NOT_FOUND, &json!({ "message": NOT_FOUND_MESSAGE })) {
        tracing::warn!(error = %err, "failed to write the not found response");
    }
}

/// Logs the outcome of every request at `INFO` level. Install it with
/// [`Router::logger`](crate::Router::logger).
pub fn logger(c: &mut Context<'_>) {
    let status = c.status();
    tracing::info!(
        status = status.as_u16(),
        reason = status.canonical_reason().unwrap_or(""),
        method = %c.request().method(),
        path = c.request().uri().path(),
        "request handled"
    );
}
