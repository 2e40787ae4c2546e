//! Application state for the hub server.

use std::sync::Arc;

use agenthub_core::Hub;

/// Shared application state, cloned into each handler.
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<Hub>,
}

impl AppState {
    pub fn from_arc(hub: Arc<Hub>) -> Self {
        Self { hub }
    }
}
