//! Streaming client for the AgentCore runtime data plane.

use futures::stream::{self, Stream};
use std::pin::Pin;
use std::time::Duration;

use crate::aws::{encode_path_segment, DEFAULT_REGION};
use crate::context::RequestContext;
use crate::sse::decode_stream;

/// Whole-invocation timeout, including the streamed body.
pub const DEFAULT_INVOKE_TIMEOUT: Duration = Duration::from_secs(300);

/// Runtime endpoint qualifier.
pub const DEFAULT_QUALIFIER: &str = "DEFAULT";

/// Header carrying the runtime session id.
pub const SESSION_ID_HEADER: &str = "X-Amzn-Bedrock-AgentCore-Runtime-Session-Id";

/// Text chunks from one invocation, in arrival order.
pub type ChunkStream = Pin<Box<dyn Stream<Item = String> + Send>>;

#[derive(Debug, thiserror::Error)]
#[error("failed to create HTTP client: {0}")]
pub struct RuntimeBuildError(String);

/// Builder for [`AgentCoreRuntime`].
#[derive(Debug, Clone)]
pub struct AgentCoreRuntimeBuilder {
    region: String,
    endpoint: Option<String>,
    timeout: Duration,
    qualifier: String,
}

impl Default for AgentCoreRuntimeBuilder {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            timeout: DEFAULT_INVOKE_TIMEOUT,
            qualifier: DEFAULT_QUALIFIER.to_string(),
        }
    }
}

impl AgentCoreRuntimeBuilder {
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Replace `https://bedrock-agentcore.<region>.amazonaws.com`.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = qualifier.into();
        self
    }

    pub fn build(self) -> Result<AgentCoreRuntime, RuntimeBuildError> {
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| RuntimeBuildError(e.to_string()))?;

        let base_url = match self.endpoint {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://bedrock-agentcore.{}.amazonaws.com", self.region),
        };

        Ok(AgentCoreRuntime {
            http,
            base_url,
            qualifier: self.qualifier,
        })
    }
}

/// Invokes agent runtimes with a bearer token and relays their SSE output.
#[derive(Debug, Clone)]
pub struct AgentCoreRuntime {
    http: reqwest::Client,
    base_url: String,
    qualifier: String,
}

impl AgentCoreRuntime {
    pub fn builder() -> AgentCoreRuntimeBuilder {
        AgentCoreRuntimeBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Invocation URL with the ARN encoded as a single path segment.
    pub fn invocation_url(&self, runtime_arn: &str) -> String {
        format!(
            "{}/runtimes/{}/invocations?qualifier={}",
            self.base_url,
            encode_path_segment(runtime_arn),
            self.qualifier
        )
    }

    /// Send `prompt` to the runtime and stream back its text chunks.
    ///
    /// Never fails: transport errors, timeouts and non-2xx answers each come
    /// back as a single human-readable chunk.
    pub async fn invoke_stream(
        &self,
        runtime_arn: &str,
        ctx: &RequestContext,
        prompt: &str,
    ) -> ChunkStream {
        let url = self.invocation_url(runtime_arn);
        let body = serde_json::json!({
            "prompt": prompt,
            "actor_id": ctx.actor_id,
        });

        tracing::info!(
            agent = %ctx.agent_id,
            session = %ctx.session_id,
            "invoking agent runtime"
        );

        let response = match self
            .http
            .post(&url)
            .bearer_auth(&ctx.bearer_token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .header(SESSION_ID_HEADER, &ctx.session_id)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(agent = %ctx.agent_id, error = %e, "agent runtime request failed");
                return single_chunk(describe_transport_error(&e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(agent = %ctx.agent_id, status = status.as_u16(), "agent runtime returned error");
            return single_chunk(format!(
                "Error: agent runtime returned HTTP {}: {}",
                status.as_u16(),
                text
            ));
        }

        // Only a JSON answer is read whole; every other body is decoded as SSE.
        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("application/json"))
            .unwrap_or(false);

        if is_json {
            return match response.text().await {
                Ok(text) => single_chunk(plain_body_text(&text)),
                Err(e) => single_chunk(describe_transport_error(&e)),
            };
        }

        Box::pin(decode_stream(response.bytes_stream(), |e: reqwest::Error| {
            describe_transport_error(&e)
        }))
    }
}

fn single_chunk(text: String) -> ChunkStream {
    Box::pin(stream::once(async move { text }))
}

/// A JSON string body becomes its value; anything else is passed through.
fn plain_body_text(text: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::String(s)) => s,
        _ => text.to_string(),
    }
}

fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Error: agent runtime timed out".to_string()
    } else if e.is_connect() {
        format!("Error: could not connect to agent runtime: {}", e)
    } else {
        format!("Error: agent runtime stream failed: {}", e)
    }
}
