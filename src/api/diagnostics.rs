//! Error detail outside production.
//!
//! Error responses carry an [`ErrorReport`] extension. Unless the service runs
//! in production, the `stack` field of the body is replaced with its detail.

use crate::{types::ErrorReport, AppState};
use axum::{
    body::Body,
    extract::State,
    http::header::CONTENT_LENGTH,
    response::Response,
};

pub async fn expose_error_detail(State(state): State<AppState>, mut response: Response) -> Response {
    let Some(report) = response.extensions_mut().remove::<ErrorReport>() else {
        return response;
    };

    if state.config.is_production() {
        return response;
    }

    let body = serde_json::json!({
        "message": report.message,
        "stack": report.detail,
    });

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(body.to_string()))
}
