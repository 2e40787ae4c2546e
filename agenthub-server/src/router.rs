//! Router builder for the hub's HTTP endpoints.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use agenthub_core::Hub;

use crate::error::BuildError;
use crate::handlers::{chat::chat_handler, config::config_handler, functions};
use crate::state::AppState;

/// Default mount point for all endpoints.
pub const DEFAULT_API_PREFIX: &str = "/api";

/// Builder for the hub router.
///
/// # Example
///
/// ```rust,no_run
/// use agenthub_core::{Hub, HubConfig};
/// use agenthub_server::HubRouter;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hub = Hub::from_config(&HubConfig::default()).await?;
/// let app = HubRouter::new(hub).with_cors().build()?;
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub struct HubRouter {
    hub: Arc<Hub>,
    prefix: String,
    cors: bool,
}

impl HubRouter {
    pub fn new(hub: Hub) -> Self {
        Self::from_arc(Arc::new(hub))
    }

    /// Use this when the hub is shared with other parts of the application.
    pub fn from_arc(hub: Arc<Hub>) -> Self {
        Self {
            hub,
            prefix: DEFAULT_API_PREFIX.to_string(),
            cors: false,
        }
    }

    /// Mount the endpoints under `prefix` instead of `/api`.
    pub fn api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Allow cross-origin requests from browser front-ends.
    pub fn with_cors(mut self) -> Self {
        self.cors = true;
        self
    }

    /// Build the router.
    ///
    /// Routes, relative to the prefix:
    ///
    /// - `GET /config`
    /// - `POST /chat`
    /// - `POST /chaos/:action`
    /// - `POST /fault/:action`
    pub fn build(self) -> Result<Router, BuildError> {
        if !self.prefix.starts_with('/') {
            return Err(BuildError::InvalidPrefix(self.prefix));
        }
        let prefix = self.prefix.trim_end_matches('/');

        let state = AppState::from_arc(self.hub);
        let mut router = Router::new()
            .route(&format!("{}/config", prefix), get(config_handler))
            .route(&format!("{}/chat", prefix), post(chat_handler))
            .route(
                &format!("{}/chaos/:action", prefix),
                post(functions::chaos_handler),
            )
            .route(
                &format!("{}/fault/:action", prefix),
                post(functions::fault_handler),
            )
            .with_state(state)
            .layer(TraceLayer::new_for_http());

        if self.cors {
            router = router.layer(CorsLayer::permissive());
        }

        Ok(router)
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
