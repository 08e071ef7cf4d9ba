//! Outbound gateway client.
//!
//! Two wire shapes, one success contract. Single sends go out as GET with
//! query parameters; batch sends upload the encoded artifact as a multipart
//! file. Either way the gateway answers with a JSON payload whose status
//! field (`estado`, historically also `status`) carries the business result:
//! a 2xx only means "gateway reachable".
//!
//! Failure taxonomy: [`BridgeError::Transport`] / [`BridgeError::Timeout`]
//! for network-level problems (retry-worthy for an external caller),
//! [`BridgeError::GatewayRejected`] for a reachable gateway that reported no
//! recognized success marker. The bridge itself never retries.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use smsbridge_core::config::GatewayConfig;
use smsbridge_core::{BridgeError, DispatchBatch, Result, SmsRequest};

use crate::artifact::ArtifactHandle;

/// Status markers the gateway uses for accepted dispatches, matched
/// case-insensitively and exactly. Anything else is a rejection, even on a
/// 2xx — the set grows only when the gateway's parser contract confirms a
/// new word.
const SUCCESS_MARKERS: &[&str] = &["PROGRAMADO", "ENVIADO", "OK"];

/// Parsed gateway reply for an accepted dispatch.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    /// The recognized status marker, uppercased.
    pub status: String,
    /// Full response payload, for the execute response and the logs.
    pub payload: Value,
}

/// Seam between the dispatcher and the wire — mocked in tests.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// Dispatch one record as inline request parameters.
    async fn send_single(&self, req: &SmsRequest, campaign: &str) -> Result<GatewayResponse>;

    /// Dispatch an encoded batch as a multipart file upload.
    async fn send_batch(
        &self,
        batch: &DispatchBatch,
        artifact: &ArtifactHandle,
    ) -> Result<GatewayResponse>;
}

// ── BitMessage implementation ────────────────────────────────────────────────

pub struct BitmessageClient {
    client: reqwest::Client,
    single_url: String,
    batch_url: String,
    username: String,
    password: String,
    timeout_secs: u64,
}

impl BitmessageClient {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BridgeError::Config(format!("building HTTP client: {e}")))?;

        Ok(Self {
            client,
            single_url: config.single_url.clone(),
            batch_url: config.batch_url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> BridgeError {
        if e.is_timeout() {
            BridgeError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            BridgeError::Transport(e.to_string())
        }
    }

    /// Build the single-send URL. BitMessage's query parser rejects `+` as
    /// a space, so the encoded query is rewritten to `%20` before sending.
    fn single_send_url(&self, req: &SmsRequest, campaign: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.single_url)
            .map_err(|e| BridgeError::Config(format!("bad single_url: {e}")))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("telefono", &req.phone);
            pairs.append_pair("texto", &req.text);
            pairs.append_pair("campanyaReferencia", campaign);
            if let Some(at) = req.scheduled_at {
                pairs.append_pair("fechaEnvio", &at.format("%d/%m/%Y %H:%M").to_string());
            }
        }

        let rewritten = url.query().map(|q| q.replace('+', "%20"));
        url.set_query(rewritten.as_deref());
        Ok(url)
    }
}

#[async_trait]
impl GatewayClient for BitmessageClient {
    async fn send_single(&self, req: &SmsRequest, campaign: &str) -> Result<GatewayResponse> {
        let url = self.single_send_url(req, campaign)?;
        debug!(phone = %req.phone, scheduled = req.is_scheduled(), "calling gateway single-send");

        let response = self
            .client
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        interpret_response(response).await
    }

    async fn send_batch(
        &self,
        batch: &DispatchBatch,
        artifact: &ArtifactHandle,
    ) -> Result<GatewayResponse> {
        // Read once — the artifact exists solely for this upload.
        let content = tokio::fs::read(&artifact.path)
            .await
            .map_err(|e| BridgeError::Artifact(format!("reading {}: {e}", artifact.path.display())))?;

        let part = reqwest::multipart::Part::bytes(content)
            .file_name(artifact.file_name.clone())
            .mime_str("text/plain")
            .map_err(|e| BridgeError::Transport(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        debug!(
            records = batch.len(),
            file = %artifact.file_name,
            campaign = %batch.campaign_ref,
            "calling gateway batch-send"
        );

        let response = self
            .client
            .post(&self.batch_url)
            .query(&[("campanya", batch.campaign_ref.as_str())])
            .basic_auth(&self.username, Some(&self.password))
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        interpret_response(response).await
    }
}

/// Apply the shared success contract to a gateway reply.
async fn interpret_response(response: reqwest::Response) -> Result<GatewayResponse> {
    let http_status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| BridgeError::Transport(format!("reading gateway response: {e}")))?;

    if !http_status.is_success() {
        warn!(status = %http_status, body = %body, "gateway returned non-2xx");
        return Err(BridgeError::Transport(format!(
            "gateway returned {http_status}: {body}"
        )));
    }

    let payload: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    interpret_payload(payload)
}

/// Business-level interpretation of a 2xx payload. Split out so it is
/// testable without a live socket.
pub fn interpret_payload(payload: Value) -> Result<GatewayResponse> {
    let status = payload
        .get("estado")
        .or_else(|| payload.get("status"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_uppercase();

    if SUCCESS_MARKERS.contains(&status.as_str()) {
        info!(estado = %status, "gateway accepted dispatch");
        Ok(GatewayResponse { status, payload })
    } else {
        warn!(estado = %status, payload = %payload, "gateway reported no success marker");
        Err(BridgeError::GatewayRejected {
            status: if status.is_empty() {
                "<missing>".to_string()
            } else {
                status
            },
        })
    }
}

// ── Mock implementation for tests ────────────────────────────────────────────

/// Record of one call made against [`MockGatewayClient`].
#[derive(Debug, Clone)]
pub enum MockCall {
    Single {
        phone: String,
        text: String,
        campaign: String,
        scheduled: bool,
    },
    Batch {
        records: usize,
        campaign: String,
        file_content: String,
    },
}

/// Gateway client that answers from a FIFO queue of canned payloads and
/// records every call, including the artifact content as it existed at call
/// time (the dispatcher may delete the file afterwards).
#[derive(Default)]
pub struct MockGatewayClient {
    responses: std::sync::Mutex<std::collections::VecDeque<Result<GatewayResponse>>>,
    calls: std::sync::Mutex<Vec<MockCall>>,
}

impl MockGatewayClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: Result<GatewayResponse>) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Shorthand: queue a 2xx payload with the given estado.
    pub fn push_estado(&self, estado: &str) {
        let payload = serde_json::json!({ "estado": estado });
        self.push_response(interpret_payload(payload));
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next_response(&self) -> Result<GatewayResponse> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BridgeError::Transport("mock: no response queued".into())))
    }
}

#[async_trait]
impl GatewayClient for MockGatewayClient {
    async fn send_single(&self, req: &SmsRequest, campaign: &str) -> Result<GatewayResponse> {
        self.calls.lock().unwrap().push(MockCall::Single {
            phone: req.phone.clone(),
            text: req.text.clone(),
            campaign: campaign.to_string(),
            scheduled: req.is_scheduled(),
        });
        self.next_response()
    }

    async fn send_batch(
        &self,
        batch: &DispatchBatch,
        artifact: &ArtifactHandle,
    ) -> Result<GatewayResponse> {
        let file_content = tokio::fs::read_to_string(&artifact.path)
            .await
            .unwrap_or_default();
        self.calls.lock().unwrap().push(MockCall::Batch {
            records: batch.len(),
            campaign: batch.campaign_ref.clone(),
            file_content,
        });
        self.next_response()
    }
}
