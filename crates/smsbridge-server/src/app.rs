use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;

use smsbridge_core::config::RetentionMode;
use smsbridge_core::BridgeConfig;
use smsbridge_dispatch::Dispatcher;

/// Shared state — passed as Arc<AppState> to all Axum handlers. Read-only
/// after startup; each dispatch is independent.
pub struct AppState {
    pub config: BridgeConfig,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(config: BridgeConfig, dispatcher: Dispatcher) -> Self {
        Self {
            config,
            dispatcher: Arc::new(dispatcher),
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route(
            "/activity/execute",
            post(crate::http::activity::execute_handler),
        )
        .route(
            "/activity/receive-batch",
            post(crate::http::batch::receive_batch_handler),
        )
        .route(
            "/activity/{action}",
            post(crate::http::activity::lifecycle_handler),
        );

    // Publish retention: retained batch files stay fetchable until the
    // external janitor collects them.
    if state.config.artifacts.retention == RetentionMode::Publish {
        router = router.nest_service(
            &state.config.artifacts.public_prefix(),
            ServeDir::new(&state.config.artifacts.dir),
        );
    }

    router
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
