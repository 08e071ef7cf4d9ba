use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Gateway unreachable: network error, timeout, or non-2xx transport
    /// status. The only failure class an external caller may want to retry.
    #[error("Gateway transport failure: {0}")]
    Transport(String),

    /// Gateway reachable (2xx) but the response payload carried no
    /// recognized success marker.
    #[error("Gateway rejected dispatch: status {status}")]
    GatewayRejected { status: String },

    /// Local artifact write/read problem. When it prevents producing the
    /// upload file at all, the dispatch fails the same way an unreachable
    /// gateway does — transport-class, worth a caller retry.
    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Gateway call timed out after {secs}s")]
    Timeout { secs: u64 },
}

impl BridgeError {
    /// Short error code string included in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::Config(_) => "CONFIG_ERROR",
            BridgeError::AuthFailed(_) => "AUTH_FAILED",
            BridgeError::Validation(_) => "VALIDATION_ERROR",
            BridgeError::Transport(_) => "TRANSPORT_FAILURE",
            BridgeError::GatewayRejected { .. } => "GATEWAY_REJECTED",
            BridgeError::Artifact(_) => "ARTIFACT_ERROR",
            BridgeError::Serialization(_) => "SERIALIZATION_ERROR",
            BridgeError::Io(_) => "IO_ERROR",
            BridgeError::Timeout { .. } => "TIMEOUT",
        }
    }

    /// True for failures where retrying the same dispatch could succeed
    /// (the bridge itself never retries; callers decide).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BridgeError::Transport(_)
                | BridgeError::Timeout { .. }
                | BridgeError::Io(_)
                | BridgeError::Artifact(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
