//! The hub: registry, token cache and runtime client behind one handle.

use serde::Serialize;
use std::sync::Arc;

use crate::aws::{
    AwsClient, FunctionInvoker, LambdaInvoker, MemoryParameterStore, ParameterStore,
    SsmParameterStore,
};
use crate::config::HubConfig;
use crate::context::RequestContext;
use crate::error::{Error, Result};
use crate::registry::{AgentEntry, AgentRegistry};
use crate::runtime::{AgentCoreRuntime, ChunkStream};
use crate::sse::collect_text;
use crate::token::TokenCache;

/// Which operations Lambda a pass-through request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Chaos,
    Fault,
}

impl FunctionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chaos => "chaos",
            Self::Fault => "fault",
        }
    }
}

/// Public view of one agent (no secrets).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentInfo {
    pub id: String,
    pub name: String,
    pub runtime_arn: Option<String>,
}

/// Public view of the hub configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubInfo {
    pub region: String,
    pub default_agent: Option<String>,
    pub agents: Vec<AgentInfo>,
}

/// A resolved agent plus the context for one invocation.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub agent: AgentEntry,
    pub context: RequestContext,
}

/// AWS client configured from `config` (region, profile, AWS timeout).
pub async fn connect_aws(config: &HubConfig) -> Result<AwsClient> {
    let mut builder = AwsClient::builder()
        .region(config.region.clone())
        .timeout(config.timeouts.aws());
    if let Some(profile) = &config.profile {
        builder = builder.profile(profile.clone());
    }
    Ok(builder.build().await?)
}

/// Parameter store for `config`: in-memory when parameters are inlined, SSM otherwise.
pub fn parameter_store(config: &HubConfig, aws: &AwsClient) -> Arc<dyn ParameterStore> {
    if config.parameters.is_empty() {
        Arc::new(SsmParameterStore::new(aws.clone()))
    } else {
        tracing::info!(
            count = config.parameters.len(),
            "serving parameters from configuration"
        );
        Arc::new(MemoryParameterStore::with_values(config.parameters.clone()))
    }
}

/// Builder for [`Hub`].
pub struct HubBuilder {
    registry: AgentRegistry,
    store: Arc<dyn ParameterStore>,
    region: String,
    tokens: Option<TokenCache>,
    runtime: Option<AgentCoreRuntime>,
    functions: Option<Arc<dyn FunctionInvoker>>,
    chaos_function: Option<String>,
    fault_function: Option<String>,
}

impl HubBuilder {
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn token_cache(mut self, tokens: TokenCache) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn runtime(mut self, runtime: AgentCoreRuntime) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn function_invoker(mut self, invoker: Arc<dyn FunctionInvoker>) -> Self {
        self.functions = Some(invoker);
        self
    }

    pub fn chaos_function(mut self, name: impl Into<String>) -> Self {
        self.chaos_function = Some(name.into());
        self
    }

    pub fn fault_function(mut self, name: impl Into<String>) -> Self {
        self.fault_function = Some(name.into());
        self
    }

    pub fn build(self) -> Result<Hub> {
        let tokens = match self.tokens {
            Some(tokens) => tokens,
            None => TokenCache::new(self.store.clone())?,
        };
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => AgentCoreRuntime::builder().region(self.region.clone()).build()?,
        };

        Ok(Hub {
            region: self.region,
            registry: self.registry,
            store: self.store,
            tokens,
            runtime,
            functions: self.functions,
            chaos_function: self.chaos_function,
            fault_function: self.fault_function,
        })
    }
}

/// Everything the HTTP and CLI front-ends need to reach agents.
pub struct Hub {
    region: String,
    registry: AgentRegistry,
    store: Arc<dyn ParameterStore>,
    tokens: TokenCache,
    runtime: AgentCoreRuntime,
    functions: Option<Arc<dyn FunctionInvoker>>,
    chaos_function: Option<String>,
    fault_function: Option<String>,
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("region", &self.region)
            .field("agents", &self.registry.len())
            .field("runtime", &self.runtime.base_url())
            .field("chaos_function", &self.chaos_function)
            .field("fault_function", &self.fault_function)
            .finish()
    }
}

impl Hub {
    pub fn builder(registry: AgentRegistry, store: Arc<dyn ParameterStore>) -> HubBuilder {
        HubBuilder {
            registry,
            store,
            region: crate::aws::DEFAULT_REGION.to_string(),
            tokens: None,
            runtime: None,
            functions: None,
            chaos_function: None,
            fault_function: None,
        }
    }

    /// Wire up AWS clients, the registry and the token cache from `config`.
    pub async fn from_config(config: &HubConfig) -> Result<Self> {
        let aws = connect_aws(config).await?;
        let store = parameter_store(config, &aws);

        let mut registry = AgentRegistry::from_config(config)?;
        registry.fill_runtime_arns(store.as_ref()).await;

        let tokens = TokenCache::builder(store.clone())
            .timeout(config.timeouts.token())
            .build()?;

        let mut runtime = AgentCoreRuntime::builder()
            .region(config.region.clone())
            .timeout(config.timeouts.invoke());
        if let Some(endpoint) = &config.agentcore_endpoint {
            runtime = runtime.endpoint(endpoint.clone());
        }

        let mut builder = Hub::builder(registry, store)
            .region(config.region.clone())
            .token_cache(tokens)
            .runtime(runtime.build()?)
            .function_invoker(Arc::new(LambdaInvoker::new(aws)));
        if let Some(name) = &config.chaos_function {
            builder = builder.chaos_function(name.clone());
        }
        if let Some(name) = &config.fault_function {
            builder = builder.fault_function(name.clone());
        }

        let hub = builder.build()?;
        tracing::info!(
            region = %hub.region,
            agents = hub.registry.len(),
            default_agent = ?hub.registry.default_agent(),
            "hub ready"
        );
        Ok(hub)
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn parameter_store(&self) -> &Arc<dyn ParameterStore> {
        &self.store
    }

    pub fn tokens(&self) -> &TokenCache {
        &self.tokens
    }

    pub fn info(&self) -> HubInfo {
        HubInfo {
            region: self.region.clone(),
            default_agent: self.registry.default_agent().map(str::to_string),
            agents: self
                .registry
                .agents()
                .map(|a| AgentInfo {
                    id: a.id.clone(),
                    name: a.name.clone(),
                    runtime_arn: a.runtime_arn.clone(),
                })
                .collect(),
        }
    }

    /// Resolve the agent and obtain its bearer token.
    ///
    /// Fails with [`Error::Auth`] when no token can be obtained, before any
    /// call to the runtime is made.
    pub async fn open_session(
        &self,
        agent_id: Option<&str>,
        session_id: Option<String>,
        actor_id: Option<String>,
    ) -> Result<ChatSession> {
        let agent = self.registry.resolve(agent_id)?.clone();
        agent.runtime_arn()?;

        let token = self
            .tokens
            .token(&agent.id, &agent.ssm_prefix)
            .await
            .ok_or_else(|| {
                Error::Auth(format!("no access token available for agent {}", agent.id))
            })?;

        let context = RequestContext::new(agent.id.clone(), token)
            .with_session_id(session_id)
            .with_actor_id(actor_id);
        Ok(ChatSession { agent, context })
    }

    /// Stream the agent's answer to `prompt`.
    pub async fn chat_stream(&self, session: &ChatSession, prompt: &str) -> Result<ChunkStream> {
        let arn = session.agent.runtime_arn()?;
        Ok(self.runtime.invoke_stream(arn, &session.context, prompt).await)
    }

    /// Open a session and collect the whole answer.
    pub async fn chat(&self, agent_id: Option<&str>, prompt: &str) -> Result<String> {
        let session = self.open_session(agent_id, None, None).await?;
        let stream = self.chat_stream(&session, prompt).await?;
        Ok(collect_text(stream).await)
    }

    /// Invoke the chaos or fault Lambda with `{"action": action, ...body}`.
    pub async fn invoke_function(
        &self,
        kind: FunctionKind,
        action: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let function = match kind {
            FunctionKind::Chaos => self.chaos_function.as_deref(),
            FunctionKind::Fault => self.fault_function.as_deref(),
        }
        .ok_or_else(|| Error::Unavailable(format!("no {} function configured", kind.as_str())))?;

        let invoker = self
            .functions
            .as_ref()
            .ok_or_else(|| Error::Unavailable("function invocation is not configured".into()))?;

        let payload = action_payload(action, body)?;
        tracing::info!(kind = kind.as_str(), action, function, "invoking operations function");
        Ok(invoker.invoke(function, &payload).await?)
    }
}

/// Merge `body` into an object carrying `action`; `action` always wins.
fn action_payload(action: &str, body: serde_json::Value) -> Result<serde_json::Value> {
    if action.is_empty() {
        return Err(Error::InvalidRequest("action must not be empty".into()));
    }

    let mut payload = match body {
        serde_json::Value::Object(map) => map,
        serde_json::Value::Null => serde_json::Map::new(),
        other => {
            return Err(Error::InvalidRequest(format!(
                "request body must be a JSON object, got {}",
                other
            )))
        }
    };
    payload.insert("action".to_string(), serde_json::Value::String(action.to_string()));
    Ok(serde_json::Value::Object(payload))
}

#[cfg(test)]
#[path = "hub_tests.rs"]
mod tests;
