//! Task document endpoints
//!
//! `GET` serves the current document, row store first with local fallback.
//! `PUT` accepts a full replacement and fans it out through the broker.
//! A read failure is reported inside a 200 body so the board always renders
//! something; "saved" is the only acknowledgement that a write reached a
//! known-good state.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::config::AppState;
use crate::error::{Error, Result};

/// GET /api/tasks
pub async fn get_tasks(State(state): State<AppState>) -> impl IntoResponse {
    let body = match state.broker.read().await {
        Ok(body) => body,
        Err(e) => {
            error!("[Tasks] read failed: {:#}", e);
            json!({ "error": format!("{e:#}") }).to_string()
        }
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
}

/// PUT /api/tasks
///
/// Malformed input aborts before any store is touched.
pub async fn put_tasks(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>> {
    let doc: Value =
        serde_json::from_slice(&body).map_err(|e| Error::BadRequest(e.to_string()))?;

    state.broker.write(&doc).await?;

    info!("[Tasks] document saved");
    Ok(Json(json!({ "status": "saved" })))
}
