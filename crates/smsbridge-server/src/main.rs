use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

mod app;
mod auth;
mod http;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "smsbridge_server=info,smsbridge_dispatch=info,tower_http=debug".into()
                }),
        )
        .init();

    // load config: SMSBRIDGE_CONFIG path > ./smsbridge.toml, env overrides on top
    let config_path = std::env::var("SMSBRIDGE_CONFIG").ok();
    let config = smsbridge_core::BridgeConfig::load(config_path.as_deref())?;

    let bind = config.server.bind.clone();
    let port = config.server.port;

    let client = smsbridge_dispatch::BitmessageClient::new(&config.gateway)?;
    let artifacts = smsbridge_dispatch::ArtifactStore::new(&config.artifacts);
    info!(
        dir = %artifacts.dir().display(),
        retention = ?artifacts.retention(),
        single_send_mode = ?config.gateway.single_send_mode,
        "dispatch engine configured"
    );

    let dispatcher = smsbridge_dispatch::Dispatcher::new(
        Arc::new(client),
        artifacts,
        config.gateway.campaign.clone(),
        config.gateway.single_send_mode,
    );

    let state = Arc::new(app::AppState::new(config, dispatcher));
    let router = app::build_router(state);

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("SMS bridge listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
