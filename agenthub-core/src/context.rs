//! Per-request state for one agent invocation.

use uuid::Uuid;

/// Actor id sent when the caller supplies none.
pub const DEFAULT_ACTOR_ID: &str = "default-user";

/// Everything one chat request needs to reach an agent runtime.
///
/// Built per request and passed by reference; nothing here is shared between
/// requests.
#[derive(Clone)]
pub struct RequestContext {
    pub agent_id: String,
    pub bearer_token: String,
    /// AgentCore runtime session (at least 33 characters).
    pub session_id: String,
    pub actor_id: String,
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("agent_id", &self.agent_id)
            .field("bearer_token", &"[REDACTED]")
            .field("session_id", &self.session_id)
            .field("actor_id", &self.actor_id)
            .finish()
    }
}

impl RequestContext {
    /// Context with a fresh session id and the default actor.
    pub fn new(agent_id: impl Into<String>, bearer_token: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            bearer_token: bearer_token.into(),
            session_id: new_session_id(),
            actor_id: DEFAULT_ACTOR_ID.to_string(),
        }
    }

    /// Continue an existing session; `None` or an empty id keeps the generated one.
    pub fn with_session_id(mut self, session_id: Option<String>) -> Self {
        if let Some(id) = session_id.filter(|id| !id.is_empty()) {
            self.session_id = id;
        }
        self
    }

    pub fn with_actor_id(mut self, actor_id: Option<String>) -> Self {
        if let Some(id) = actor_id.filter(|id| !id.is_empty()) {
            self.actor_id = id;
        }
        self
    }
}

/// New random runtime session id.
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}
