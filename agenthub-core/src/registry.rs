//! Agent registry: which runtimes the hub can talk to and where their settings live.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::aws::ParameterStore;
use crate::config::HubConfig;

/// Parameter holding an agent's runtime ARN when it is not in the YAML file.
pub const RUNTIME_ARN_FIELD: &str = "agent_runtime_arn";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    #[error("no agent requested and no default agent configured")]
    NoDefaultAgent,

    #[error("agent {0} has no runtime ARN")]
    MissingRuntimeArn(String),

    #[error("failed to read {path}: {message}")]
    AgentcoreYaml { path: String, message: String },
}

/// One agent runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentEntry {
    pub id: String,
    pub name: String,
    pub runtime_arn: Option<String>,
    pub ssm_prefix: String,
}

impl AgentEntry {
    pub fn runtime_arn(&self) -> Result<&str, RegistryError> {
        self.runtime_arn
            .as_deref()
            .ok_or_else(|| RegistryError::MissingRuntimeArn(self.id.clone()))
    }
}

#[derive(Debug, Deserialize)]
struct AgentcoreYaml {
    #[serde(default)]
    default_agent: Option<String>,
    #[serde(default)]
    agents: BTreeMap<String, YamlAgent>,
}

#[derive(Debug, Deserialize)]
struct YamlAgent {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    bedrock_agentcore: Option<YamlRuntime>,
}

#[derive(Debug, Deserialize)]
struct YamlRuntime {
    #[serde(default)]
    agent_arn: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: BTreeMap<String, AgentEntry>,
    default_agent: Option<String>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `.bedrock_agentcore.yaml` (if it exists) plus agents declared in `config`.
    ///
    /// Config entries win over YAML entries with the same id; a configured
    /// `default_agent` wins over the YAML one.
    pub fn from_config(config: &HubConfig) -> Result<Self, RegistryError> {
        let mut registry = if config.agentcore_yaml.exists() {
            Self::from_agentcore_yaml(&config.agentcore_yaml, config)?
        } else {
            tracing::debug!(path = %config.agentcore_yaml.display(), "no agentcore yaml found");
            Self::new()
        };

        for (id, agent) in &config.agents {
            let existing = registry.agents.get(id).cloned();
            let entry = AgentEntry {
                id: id.clone(),
                name: agent
                    .name
                    .clone()
                    .or_else(|| existing.as_ref().map(|e| e.name.clone()))
                    .unwrap_or_else(|| id.clone()),
                runtime_arn: agent
                    .runtime_arn
                    .clone()
                    .or_else(|| existing.as_ref().and_then(|e| e.runtime_arn.clone())),
                ssm_prefix: agent
                    .ssm_prefix
                    .clone()
                    .unwrap_or_else(|| config.ssm_prefix_for(id)),
            };
            registry.insert(entry);
        }

        if let Some(default) = &config.default_agent {
            registry.default_agent = Some(default.clone());
        }

        Ok(registry)
    }

    pub fn from_agentcore_yaml(path: &Path, config: &HubConfig) -> Result<Self, RegistryError> {
        let text = std::fs::read_to_string(path).map_err(|e| RegistryError::AgentcoreYaml {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse_agentcore_yaml(&text, config).map_err(|message| {
            RegistryError::AgentcoreYaml {
                path: path.display().to_string(),
                message,
            }
        })
    }

    /// Parse the starter-toolkit YAML: `agents.<id>.bedrock_agentcore.agent_arn`.
    pub fn parse_agentcore_yaml(text: &str, config: &HubConfig) -> Result<Self, String> {
        let parsed: AgentcoreYaml = serde_yaml::from_str(text).map_err(|e| e.to_string())?;

        let mut registry = Self::new();
        for (id, agent) in parsed.agents {
            registry.insert(AgentEntry {
                name: agent.name.unwrap_or_else(|| id.clone()),
                runtime_arn: agent
                    .bedrock_agentcore
                    .and_then(|rt| rt.agent_arn)
                    .filter(|arn| !arn.is_empty()),
                ssm_prefix: config.ssm_prefix_for(&id),
                id,
            });
        }
        registry.default_agent = parsed.default_agent;
        Ok(registry)
    }

    pub fn insert(&mut self, entry: AgentEntry) {
        self.agents.insert(entry.id.clone(), entry);
    }

    pub fn set_default_agent(&mut self, id: impl Into<String>) {
        self.default_agent = Some(id.into());
    }

    /// Configured default, or the only agent if there is exactly one.
    pub fn default_agent(&self) -> Option<&str> {
        match &self.default_agent {
            Some(id) => Some(id.as_str()),
            None if self.agents.len() == 1 => self.agents.keys().next().map(String::as_str),
            None => None,
        }
    }

    pub fn get(&self, id: &str) -> Option<&AgentEntry> {
        self.agents.get(id)
    }

    /// Look up `id`, falling back to the default agent when `id` is `None` or empty.
    pub fn resolve(&self, id: Option<&str>) -> Result<&AgentEntry, RegistryError> {
        let id = match id.filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => self.default_agent().ok_or(RegistryError::NoDefaultAgent)?,
        };
        self.agents
            .get(id)
            .ok_or_else(|| RegistryError::UnknownAgent(id.to_string()))
    }

    pub fn agents(&self) -> impl Iterator<Item = &AgentEntry> {
        self.agents.values()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Fill missing runtime ARNs from `<prefix>/agent_runtime_arn`.
    ///
    /// Lookup failures are logged and leave the entry without an ARN.
    pub async fn fill_runtime_arns(&mut self, store: &dyn ParameterStore) {
        for entry in self.agents.values_mut() {
            if entry.runtime_arn.is_some() {
                continue;
            }
            let name = format!("{}/{}", entry.ssm_prefix, RUNTIME_ARN_FIELD);
            match store.get_optional(&name).await {
                Ok(Some(arn)) if !arn.is_empty() => {
                    tracing::debug!(agent = %entry.id, "runtime ARN loaded from parameter store");
                    entry.runtime_arn = Some(arn);
                }
                Ok(_) => {
                    tracing::warn!(agent = %entry.id, parameter = %name, "no runtime ARN configured");
                }
                Err(e) => {
                    tracing::warn!(agent = %entry.id, error = %e, "failed to read runtime ARN");
                }
            }
        }
    }
}
