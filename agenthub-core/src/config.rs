//! Hub configuration.
//!
//! Values come from, in increasing precedence: built-in defaults, an optional
//! TOML file (`agenthub.toml`), environment variables, then whatever the
//! caller sets on the struct (CLI flags).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::aws::DEFAULT_REGION;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "agenthub.toml";

/// Agent-name to runtime-ARN map written by the AgentCore starter toolkit.
pub const DEFAULT_AGENTCORE_YAML: &str = ".bedrock_agentcore.yaml";

/// `{agent}` is replaced by the agent id.
pub const DEFAULT_SSM_PREFIX_TEMPLATE: &str = "/app/{agent}/agentcore";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// Timeouts in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// OAuth2 token endpoint.
    pub token_secs: u64,
    /// AgentCore runtime invocation (whole streamed response).
    pub invoke_secs: u64,
    /// SSM, Lambda and control-plane calls.
    pub aws_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            token_secs: 15,
            invoke_secs: 300,
            aws_secs: 30,
        }
    }
}

impl Timeouts {
    pub fn token(&self) -> Duration {
        Duration::from_secs(self.token_secs)
    }

    pub fn invoke(&self) -> Duration {
        Duration::from_secs(self.invoke_secs)
    }

    pub fn aws(&self) -> Duration {
        Duration::from_secs(self.aws_secs)
    }
}

/// An agent declared directly in the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Display name (defaults to the id).
    pub name: Option<String>,
    pub runtime_arn: Option<String>,
    /// Overrides the prefix derived from `ssm_prefix_template`.
    pub ssm_prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub region: String,
    /// Named AWS profile; default credential chain when unset.
    pub profile: Option<String>,
    /// Listen address for `serve`.
    pub bind: String,
    /// Path to `.bedrock_agentcore.yaml`.
    pub agentcore_yaml: PathBuf,
    pub ssm_prefix_template: String,
    /// Agent used when a request names none.
    pub default_agent: Option<String>,
    pub agents: BTreeMap<String, AgentConfig>,
    /// Lambda invoked by `POST /api/chaos/{action}`.
    pub chaos_function: Option<String>,
    /// Lambda invoked by `POST /api/fault/{action}`.
    pub fault_function: Option<String>,
    /// Override for the AgentCore data-plane base URL.
    pub agentcore_endpoint: Option<String>,
    pub timeouts: Timeouts,
    /// When non-empty, parameters are served from memory instead of SSM.
    pub parameters: BTreeMap<String, String>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            profile: None,
            bind: "0.0.0.0:8000".to_string(),
            agentcore_yaml: PathBuf::from(DEFAULT_AGENTCORE_YAML),
            ssm_prefix_template: DEFAULT_SSM_PREFIX_TEMPLATE.to_string(),
            default_agent: None,
            agents: BTreeMap::new(),
            chaos_function: None,
            fault_function: None,
            agentcore_endpoint: None,
            timeouts: Timeouts::default(),
            parameters: BTreeMap::new(),
        }
    }
}

impl HubConfig {
    /// Load from `path`, or from `agenthub.toml` if present, then apply the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply environment overrides using `lookup` (injectable for tests).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(region) = get("AGENTHUB_REGION")
            .or_else(|| get("AWS_REGION"))
            .or_else(|| get("AWS_DEFAULT_REGION"))
        {
            self.region = region;
        }
        if let Some(profile) = get("AWS_PROFILE") {
            self.profile = Some(profile);
        }
        if let Some(bind) = get("AGENTHUB_BIND") {
            self.bind = bind;
        }
        if let Some(path) = get("AGENTHUB_AGENTCORE_YAML") {
            self.agentcore_yaml = PathBuf::from(path);
        }
        if let Some(agent) = get("AGENTHUB_DEFAULT_AGENT") {
            self.default_agent = Some(agent);
        }
        if let Some(function) = get("AGENTHUB_CHAOS_FUNCTION") {
            self.chaos_function = Some(function);
        }
        if let Some(function) = get("AGENTHUB_FAULT_FUNCTION") {
            self.fault_function = Some(function);
        }
        if let Some(endpoint) = get("AGENTHUB_AGENTCORE_ENDPOINT") {
            self.agentcore_endpoint = Some(endpoint);
        }
        if let Some(secs) = get("AGENTHUB_INVOKE_TIMEOUT_SECS") {
            self.timeouts.invoke_secs = parse_secs("AGENTHUB_INVOKE_TIMEOUT_SECS", &secs)?;
        }

        Ok(())
    }

    /// SSM prefix for `agent_id` from the template.
    pub fn ssm_prefix_for(&self, agent_id: &str) -> String {
        self.ssm_prefix_template
            .replace("{agent}", agent_id)
            .trim_end_matches('/')
            .to_string()
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|e| ConfigError::Invalid {
        key: key.to_string(),
        message: format!("{} ({})", value, e),
    })
}
