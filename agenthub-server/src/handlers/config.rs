//! `GET /api/config`: region and agents, no secrets.

use axum::{extract::State, Json};

use agenthub_core::HubInfo;

use crate::state::AppState;

pub async fn config_handler(State(state): State<AppState>) -> Json<HubInfo> {
    Json(state.hub.info())
}
