//! Activity lifecycle endpoints — the fixed surface the journey
//! orchestrator drives: save, validate, publish, execute, stop.
//!
//! Only execute does real work. The rest must answer fast with a 2xx and an
//! empty object no matter what the body says, or the orchestrator marks the
//! whole activity as broken.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use smsbridge_core::{BridgeError, DispatchOutcome};
use smsbridge_dispatch::normalize_arguments;

use crate::app::AppState;
use crate::auth::{classify_body, resolve_arguments};

/// Lifecycle callbacks that acknowledge without doing anything.
const ACK_ACTIONS: &[&str] = &["save", "validate", "publish", "stop", "edit"];

/// POST /activity/{action} — the no-op lifecycle transitions.
pub async fn lifecycle_handler(
    Path(action): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, StatusCode> {
    if !ACK_ACTIONS.contains(&action.as_str()) {
        return Err(StatusCode::NOT_FOUND);
    }
    info!(action = %action, bytes = body.len(), "lifecycle event acknowledged");
    Ok(Json(json!({})))
}

/// POST /activity/execute
///
/// Resolves the body (signed token or plain JSON) into inArguments,
/// normalizes every entry, dispatches, and answers with the branch
/// discriminator the configured journey vocabulary expects. Auth failures
/// are 401 and are never rendered as a failure branch.
pub async fn execute_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let content_type = headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let raw = classify_body(content_type, &body);
    let args = resolve_arguments(raw, &state.config.auth.jwt_secret).map_err(|e| match e {
        BridgeError::AuthFailed(_) => {
            warn!(error = %e, "execute token rejected");
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "authentication failed", "code": e.code()})),
            )
        }
        other => {
            warn!(error = %other, "execute body unusable");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": other.to_string(), "code": other.code()})),
            )
        }
    })?;

    info!(args = args.len(), "execute arguments resolved");

    let style = state.config.gateway.branch_style;
    let max_len = state.config.gateway.max_text_len;

    // Bad arguments render the failure branch with a 200 — the journey
    // takes its failure path instead of retrying the callback.
    let mut requests = Vec::with_capacity(args.len());
    for (i, arg) in args.iter().enumerate() {
        match normalize_arguments(arg, max_len) {
            Ok(req) => requests.push(req),
            Err(e) => {
                warn!(record = i, error = %e, "invalid inArguments entry");
                return Ok(Json(json!({
                    "branchResult": DispatchOutcome::Failed.branch_value(style)
                })));
            }
        }
    }

    // Spawned so a dropped client connection can't abandon the gateway
    // call mid-flight or leak a written artifact.
    let dispatcher = state.dispatcher.clone();
    let report = match tokio::spawn(async move { dispatcher.dispatch(requests).await }).await {
        Ok(report) => report,
        Err(e) => {
            warn!(error = %e, "dispatch task panicked");
            return Ok(Json(json!({
                "branchResult": DispatchOutcome::Failed.branch_value(style)
            })));
        }
    };

    info!(outcome = %report.outcome, branch = report.outcome.branch_value(style), "execute complete");
    Ok(Json(json!({
        "branchResult": report.outcome.branch_value(style)
    })))
}
