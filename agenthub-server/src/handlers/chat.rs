//! `POST /api/chat`: relay an agent's answer as Server-Sent Events.

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::ServerError;
use crate::state::AppState;

/// Bound on chunks waiting to be written to the client.
const RELAY_CAPACITY: usize = 100;

/// Final event payload.
pub const DONE_EVENT: &str = "[DONE]";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub actor_id: Option<String>,
}

/// One relayed chunk as a `{"content": ...}` event.
pub(crate) fn content_event(chunk: &str) -> Event {
    Event::default().data(serde_json::json!({ "content": chunk }).to_string())
}

/// Resolve the agent and token up front, then stream the runtime's chunks.
///
/// Authentication and lookup failures are returned as JSON errors before any
/// event is sent. Once streaming starts, runtime failures arrive as ordinary
/// content chunks and the stream still ends with `[DONE]`.
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ServerError> {
    if request.message.trim().is_empty() {
        return Err(ServerError::InvalidRequest("message must not be empty".to_string()));
    }

    let hub = state.hub.clone();
    let session = hub
        .open_session(
            request.agent_id.as_deref(),
            request.session_id,
            request.actor_id,
        )
        .await?;

    tracing::info!(
        agent = %session.agent.id,
        session = %session.context.session_id,
        "chat request"
    );

    let (tx, rx) = mpsc::channel::<Event>(RELAY_CAPACITY);
    let message = request.message;

    tokio::spawn(async move {
        let mut chunks = match hub.chat_stream(&session, &message).await {
            Ok(chunks) => chunks,
            Err(e) => {
                let _ = tx.send(content_event(&format!("Error: {}", e))).await;
                let _ = tx.send(Event::default().data(DONE_EVENT)).await;
                return;
            }
        };

        while let Some(chunk) = chunks.next().await {
            if tx.send(content_event(&chunk)).await.is_err() {
                tracing::debug!(agent = %session.agent.id, "client disconnected");
                return;
            }
        }
        let _ = tx.send(Event::default().data(DONE_EVENT)).await;
    });

    let stream = ReceiverStream::new(rx).map(Ok::<_, Infallible>);
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
#[path = "chat_tests.rs"]
mod tests;
