use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIND: &str = "0.0.0.0";
/// Default per-dispatch gateway timeout. Large batches take the gateway a
/// while to ingest, so this is deliberately generous.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
/// Default maximum SMS text length enforced at validation time.
pub const DEFAULT_MAX_TEXT_LEN: usize = 160;

/// Top-level config (smsbridge.toml + SMSBRIDGE_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub artifacts: ArtifactConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret the orchestrator signs execute tokens with (HS256).
    pub jwt_secret: String,
}

/// Outbound SMS gateway settings. Single-send and batch-send endpoints may
/// live on different hosts, hence two URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub single_url: String,
    pub batch_url: String,
    pub username: String,
    pub password: String,
    /// Campaign reference applied when the inbound arguments carry none.
    pub campaign: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_text_len")]
    pub max_text_len: usize,
    /// How a single-record dispatch reaches the gateway. Both are valid
    /// renditions of the same external contract; which one a deployment
    /// needs depends on its gateway endpoint.
    #[serde(default)]
    pub single_send_mode: SingleSendMode,
    /// Branch vocabulary the journey expects back from execute.
    #[serde(default)]
    pub branch_style: BranchStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SingleSendMode {
    /// GET with query parameters — the instant-SMS endpoint.
    #[default]
    Query,
    /// One-line artifact uploaded like a batch — the sendfile endpoint.
    File,
}

/// Which success/failure word pair the execute response uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BranchStyle {
    /// sent / notsent — legacy instant-SMS journeys.
    Instant,
    /// sent / scheduled / failed — current journeys.
    #[default]
    Scheduled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Directory batch files are written to. Created on first write.
    #[serde(default = "default_artifact_dir")]
    pub dir: String,
    #[serde(default)]
    pub retention: RetentionMode,
    /// URL path prefix artifacts are served under in publish mode.
    #[serde(default = "default_public_base")]
    pub public_base: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: default_artifact_dir(),
            retention: RetentionMode::default(),
            public_base: default_public_base(),
        }
    }
}

impl ArtifactConfig {
    /// Normalized serve prefix: leading slash, no trailing slash. A bare
    /// "/" or empty value falls back to the default — axum's `nest_service`
    /// rejects the root path.
    pub fn public_prefix(&self) -> String {
        let trimmed = self.public_base.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return default_public_base();
        }
        if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        }
    }
}

/// What happens to a batch artifact once the gateway call returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RetentionMode {
    /// Delete after the call completes, success or failure.
    #[default]
    Delete,
    /// Keep the file and report its public-relative path. No automatic
    /// expiry — an external janitor garbage-collects by creation time.
    Publish,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_max_text_len() -> usize {
    DEFAULT_MAX_TEXT_LEN
}
fn default_artifact_dir() -> String {
    "./tmp".to_string()
}
fn default_public_base() -> String {
    "/files".to_string()
}

impl BridgeConfig {
    /// Load config from a TOML file with SMSBRIDGE_* env var overrides.
    /// Nested keys use double underscores: SMSBRIDGE_GATEWAY__CAMPAIGN.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path.unwrap_or("smsbridge.toml");

        let config: BridgeConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("SMSBRIDGE_").split("__"))
            .extract()
            .map_err(|e| crate::error::BridgeError::Config(e.to_string()))?;

        Ok(config)
    }
}
