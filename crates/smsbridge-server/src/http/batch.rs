//! Direct batch ingestion — POST /activity/receive-batch.
//!
//! Bypasses the signed-token path: trusted internal tooling posts a JSON
//! array of records and gets the dispatch result back, including the
//! artifact's retrievable path when publish retention is on.

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use smsbridge_dispatch::normalize_arguments;

use crate::app::AppState;

pub async fn receive_batch_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let entries = body.as_array().ok_or_else(|| {
        validation_error("body must be a JSON array of records".to_string())
    })?;
    if entries.is_empty() {
        return Err(validation_error("batch is empty".to_string()));
    }

    let max_len = state.config.gateway.max_text_len;
    let mut requests = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        // Arrays and nulls inside the batch are malformed input, not
        // records to skip.
        if !entry.is_object() {
            return Err(validation_error(format!("record {i} is not an object")));
        }
        let req = normalize_arguments(entry, max_len)
            .map_err(|e| validation_error(format!("record {i}: {e}")))?;
        requests.push(req);
    }

    info!(records = requests.len(), "batch accepted for dispatch");

    let dispatcher = state.dispatcher.clone();
    let report = match tokio::spawn(async move { dispatcher.dispatch(requests).await }).await {
        Ok(report) => report,
        Err(e) => {
            warn!(error = %e, "dispatch task panicked");
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "internal error"})),
            ));
        }
    };

    let mut response = json!({
        "success": report.outcome.is_success(),
        "outcome": report.outcome.to_string(),
    });
    if let Some(path) = report.artifact_path {
        response["artifactPath"] = json!(path);
    }
    if let Some(detail) = report.detail {
        response["detail"] = json!(detail);
    }
    Ok(Json(response))
}

fn validation_error(message: String) -> (StatusCode, Json<Value>) {
    warn!(error = %message, "batch rejected");
    (StatusCode::BAD_REQUEST, Json(json!({"error": message})))
}
