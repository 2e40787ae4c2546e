//! SSM Parameter Store access.
//!
//! The hub treats Parameter Store as its service registry: every agent keeps
//! its Cognito client, token URL and runtime ARN under
//! `/app/<agent>/agentcore/<field>`.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::client::{AwsClient, Service};
use super::error::AwsError;

const SSM_TARGET: &str = "AmazonSSM";

/// Read/write access to flat string parameters.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Fetch a parameter, decrypting `SecureString` values.
    ///
    /// A missing parameter is an error; use [`get_optional`](Self::get_optional)
    /// when absence is expected.
    async fn get(&self, name: &str) -> Result<String, AwsError>;

    /// Create or overwrite a parameter.
    async fn put(&self, name: &str, value: &str, secure: bool) -> Result<(), AwsError>;

    /// Fetch a parameter, mapping "not found" to `None`.
    async fn get_optional(&self, name: &str) -> Result<Option<String>, AwsError> {
        match self.get(name).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// [`ParameterStore`] backed by AWS SSM.
#[derive(Debug, Clone)]
pub struct SsmParameterStore {
    client: AwsClient,
}

impl SsmParameterStore {
    pub fn new(client: AwsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn get(&self, name: &str) -> Result<String, AwsError> {
        let response = self
            .client
            .json_target(
                Service::SSM,
                SSM_TARGET,
                "GetParameter",
                &serde_json::json!({ "Name": name, "WithDecryption": true }),
            )
            .await?;

        response
            .get("Parameter")
            .and_then(|p| p.get("Value"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                AwsError::InvalidResponse(format!("ssm.GetParameter: no value for {}", name))
            })
    }

    async fn put(&self, name: &str, value: &str, secure: bool) -> Result<(), AwsError> {
        let parameter_type = if secure { "SecureString" } else { "String" };
        self.client
            .json_target(
                Service::SSM,
                SSM_TARGET,
                "PutParameter",
                &serde_json::json!({
                    "Name": name,
                    "Value": value,
                    "Type": parameter_type,
                    "Overwrite": true,
                }),
            )
            .await?;

        tracing::info!(parameter = name, "stored SSM parameter");
        Ok(())
    }
}

/// In-process [`ParameterStore`].
///
/// Used for offline runs (parameters seeded from the config file) and tests.
#[derive(Debug, Default)]
pub struct MemoryParameterStore {
    values: RwLock<BTreeMap<String, String>>,
}

impl MemoryParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store from name/value pairs.
    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            values: RwLock::new(values),
        }
    }

    /// Snapshot of all stored parameters, sorted by name.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.values.read().clone()
    }
}

#[async_trait]
impl ParameterStore for MemoryParameterStore {
    async fn get(&self, name: &str) -> Result<String, AwsError> {
        self.values
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| AwsError::Service {
                service: "ssm".to_string(),
                operation: "GetParameter".to_string(),
                status: 400,
                code: "ParameterNotFound".to_string(),
                message: format!("parameter {} not found", name),
            })
    }

    async fn put(&self, name: &str, value: &str, _secure: bool) -> Result<(), AwsError> {
        self.values
            .write()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }
}
