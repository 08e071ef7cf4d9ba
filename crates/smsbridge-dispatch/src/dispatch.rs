//! Dispatch orchestration — the single-pass state machine between the
//! normalized requests and the gateway client.
//!
//! Validate, pick the single or batch path, run the one outbound call,
//! release the artifact, classify. No retries, and no error ever crosses
//! this boundary: every exit is a [`DispatchReport`].

use std::sync::Arc;
use tracing::{error, info, warn};

use smsbridge_core::config::SingleSendMode;
use smsbridge_core::{BridgeError, DispatchBatch, DispatchOutcome, SmsRequest};

use crate::artifact::ArtifactStore;
use crate::client::{GatewayClient, GatewayResponse};
use crate::encode::encode_batch;

/// Everything the execute caller learns about one dispatch.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub outcome: DispatchOutcome,
    /// Public-relative artifact path, only in publish retention mode.
    pub artifact_path: Option<String>,
    /// Gateway response payload on success, for the response body.
    pub gateway_payload: Option<serde_json::Value>,
    /// Failure cause, for logs and error bodies. Never set on success.
    pub detail: Option<String>,
}

impl DispatchReport {
    fn success(response: GatewayResponse, scheduled: bool, artifact_path: Option<String>) -> Self {
        Self {
            outcome: if scheduled {
                DispatchOutcome::Scheduled
            } else {
                DispatchOutcome::Sent
            },
            artifact_path,
            gateway_payload: Some(response.payload),
            detail: None,
        }
    }

    fn failed(err: &BridgeError, artifact_path: Option<String>) -> Self {
        Self {
            outcome: DispatchOutcome::Failed,
            artifact_path,
            gateway_payload: None,
            detail: Some(format!("{}: {}", err.code(), err)),
        }
    }
}

pub struct Dispatcher {
    client: Arc<dyn GatewayClient>,
    artifacts: ArtifactStore,
    default_campaign: String,
    single_send_mode: SingleSendMode,
}

impl Dispatcher {
    pub fn new(
        client: Arc<dyn GatewayClient>,
        artifacts: ArtifactStore,
        default_campaign: impl Into<String>,
        single_send_mode: SingleSendMode,
    ) -> Self {
        Self {
            client,
            artifacts,
            default_campaign: default_campaign.into(),
            single_send_mode,
        }
    }

    /// Dispatch a set of normalized requests in one pass.
    pub async fn dispatch(&self, requests: Vec<SmsRequest>) -> DispatchReport {
        if let Err(e) = validate(&requests) {
            warn!(error = %e, "dispatch rejected before any gateway call");
            return DispatchReport::failed(&e, None);
        }

        let scheduled = requests.iter().any(SmsRequest::is_scheduled);

        // One record takes the lighter inline path (unless this deployment's
        // gateway only speaks files) — no temp-file I/O for the common case.
        let result = if requests.len() == 1 && self.single_send_mode == SingleSendMode::Query {
            let req = &requests[0];
            let campaign = req
                .campaign_ref
                .as_deref()
                .unwrap_or(&self.default_campaign)
                .to_string();
            (self.client.send_single(req, &campaign).await, None)
        } else {
            self.dispatch_as_file(requests).await
        };

        match result {
            (Ok(response), artifact_path) => {
                info!(
                    estado = %response.status,
                    scheduled,
                    artifact = artifact_path.as_deref().unwrap_or(""),
                    "dispatch succeeded"
                );
                DispatchReport::success(response, scheduled, artifact_path)
            }
            (Err(e), artifact_path) => {
                // Transport and business failures collapse to one outcome
                // but stay distinguishable in the logs.
                if e.is_retryable() {
                    error!(cause = e.code(), error = %e, "dispatch failed: gateway unreachable");
                } else {
                    warn!(cause = e.code(), error = %e, "dispatch failed: gateway rejected");
                }
                DispatchReport::failed(&e, artifact_path)
            }
        }
    }

    /// File path: encode in input order, write one artifact, upload,
    /// release. Used for every multi-record batch and for single records in
    /// file mode.
    async fn dispatch_as_file(
        &self,
        requests: Vec<SmsRequest>,
    ) -> (
        smsbridge_core::Result<GatewayResponse>,
        Option<String>,
    ) {
        let campaign = requests
            .iter()
            .find_map(|r| r.campaign_ref.clone())
            .unwrap_or_else(|| self.default_campaign.clone());

        let content = encode_batch(&requests);
        let handle = match self.artifacts.write(content.as_bytes()).await {
            Ok(h) => h,
            // Without the artifact there is nothing to upload — this is a
            // terminal, transport-class failure for the dispatch.
            Err(e) => return (Err(e), None),
        };

        let batch = DispatchBatch::new(requests, campaign);
        let result = self.client.send_batch(&batch, &handle).await;

        // Released whether the upload succeeded or not.
        let artifact_path = self.artifacts.release(handle).await;

        (result, artifact_path)
    }
}

fn validate(requests: &[SmsRequest]) -> smsbridge_core::Result<()> {
    if requests.is_empty() {
        return Err(BridgeError::Validation("no requests to dispatch".into()));
    }
    for (i, req) in requests.iter().enumerate() {
        if req.phone.trim().is_empty() {
            return Err(BridgeError::Validation(format!(
                "record {i}: telefono is empty"
            )));
        }
        if req.text.trim().is_empty() {
            return Err(BridgeError::Validation(format!(
                "record {i}: texto is empty"
            )));
        }
    }
    Ok(())
}
