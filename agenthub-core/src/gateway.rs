//! Idempotent MCP gateway provisioning.

use thiserror::Error;

use crate::aws::{AwsError, CreateGatewayRequest, Gateway, GatewayControl, ParameterStore};

/// Parameter names written under the agent's prefix.
pub mod fields {
    pub const GATEWAY_ID: &str = "gateway_id";
    pub const GATEWAY_ARN: &str = "gateway_arn";
    pub const GATEWAY_URL: &str = "gateway_url";
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Aws(#[from] AwsError),

    #[error("gateway {0} has no URL")]
    MissingUrl(String),

    #[error("gateway name must not be empty")]
    EmptyName,
}

/// Result of [`ensure_gateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayOutcome {
    pub gateway: Gateway,
    /// `false` when a gateway with the same name already existed.
    pub created: bool,
}

/// Reuse the gateway named `request.name` or create it, then record it in SSM.
///
/// The three gateway parameters under `ssm_prefix` are overwritten in both
/// cases, so running this twice leaves one gateway and current parameters.
pub async fn ensure_gateway(
    control: &dyn GatewayControl,
    store: &dyn ParameterStore,
    ssm_prefix: &str,
    request: &CreateGatewayRequest,
) -> Result<GatewayOutcome, GatewayError> {
    if request.name.trim().is_empty() {
        return Err(GatewayError::EmptyName);
    }

    let existing = control
        .list_gateways()
        .await?
        .into_iter()
        .find(|g| g.name == request.name);

    let (gateway, created) = match existing {
        Some(summary) => {
            tracing::info!(name = %request.name, id = %summary.gateway_id, "gateway already exists");
            (control.get_gateway(&summary.gateway_id).await?, false)
        }
        None => {
            tracing::info!(name = %request.name, "creating gateway");
            (control.create_gateway(request).await?, true)
        }
    };

    let url = gateway
        .gateway_url
        .clone()
        .ok_or_else(|| GatewayError::MissingUrl(gateway.gateway_id.clone()))?;

    let prefix = ssm_prefix.trim_end_matches('/');
    store
        .put(&format!("{}/{}", prefix, fields::GATEWAY_ID), &gateway.gateway_id, false)
        .await?;
    store
        .put(&format!("{}/{}", prefix, fields::GATEWAY_ARN), &gateway.gateway_arn, false)
        .await?;
    store
        .put(&format!("{}/{}", prefix, fields::GATEWAY_URL), &url, false)
        .await?;

    Ok(GatewayOutcome { gateway, created })
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod tests;
