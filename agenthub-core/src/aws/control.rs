//! AgentCore control-plane calls for MCP gateways.

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::client::{encode_path_segment, AwsClient, Service};
use super::error::AwsError;

/// Entry returned by `ListGateways`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewaySummary {
    pub gateway_id: String,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Full gateway description (`GetGateway` / `CreateGateway`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gateway {
    pub gateway_id: String,
    pub gateway_arn: String,
    #[serde(default)]
    pub gateway_url: Option<String>,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Inputs for creating an MCP gateway fronted by a Cognito JWT authorizer.
#[derive(Debug, Clone)]
pub struct CreateGatewayRequest {
    pub name: String,
    pub role_arn: String,
    /// OIDC discovery URL of the Cognito user pool.
    pub discovery_url: String,
    /// App client ids allowed to call the gateway.
    pub allowed_clients: Vec<String>,
    pub description: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateGatewayBody<'a> {
    name: &'a str,
    role_arn: &'a str,
    protocol_type: &'static str,
    authorizer_type: &'static str,
    authorizer_configuration: AuthorizerConfiguration<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizerConfiguration<'a> {
    #[serde(rename = "customJWTAuthorizer")]
    custom_jwt_authorizer: CustomJwtAuthorizer<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CustomJwtAuthorizer<'a> {
    discovery_url: &'a str,
    allowed_clients: &'a [String],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListGatewaysPage {
    #[serde(default)]
    items: Vec<GatewaySummary>,
    #[serde(default)]
    next_token: Option<String>,
}

/// Gateway operations the provisioning flow needs.
#[async_trait]
pub trait GatewayControl: Send + Sync {
    async fn list_gateways(&self) -> Result<Vec<GatewaySummary>, AwsError>;
    async fn get_gateway(&self, gateway_id: &str) -> Result<Gateway, AwsError>;
    async fn create_gateway(&self, request: &CreateGatewayRequest) -> Result<Gateway, AwsError>;
}

/// [`GatewayControl`] against the `bedrock-agentcore-control` REST API.
#[derive(Debug, Clone)]
pub struct AgentCoreControl {
    client: AwsClient,
}

impl AgentCoreControl {
    pub fn new(client: AwsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GatewayControl for AgentCoreControl {
    async fn list_gateways(&self) -> Result<Vec<GatewaySummary>, AwsError> {
        let mut gateways = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let mut path = "/gateways/?maxResults=100".to_string();
            if let Some(token) = &next_token {
                path.push_str("&nextToken=");
                path.push_str(&encode_path_segment(token));
            }

            let response = self
                .client
                .rest_json(
                    Service::AGENTCORE_CONTROL,
                    "ListGateways",
                    Method::GET,
                    &path,
                    None,
                )
                .await?;

            let page: ListGatewaysPage = serde_json::from_value(response.body)
                .map_err(|e| AwsError::InvalidResponse(format!("ListGateways: {}", e)))?;
            gateways.extend(page.items);

            match page.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        Ok(gateways)
    }

    async fn get_gateway(&self, gateway_id: &str) -> Result<Gateway, AwsError> {
        let path = format!("/gateways/{}/", encode_path_segment(gateway_id));
        let response = self
            .client
            .rest_json(
                Service::AGENTCORE_CONTROL,
                "GetGateway",
                Method::GET,
                &path,
                None,
            )
            .await?;

        serde_json::from_value(response.body)
            .map_err(|e| AwsError::InvalidResponse(format!("GetGateway: {}", e)))
    }

    async fn create_gateway(&self, request: &CreateGatewayRequest) -> Result<Gateway, AwsError> {
        let body = CreateGatewayBody {
            name: &request.name,
            role_arn: &request.role_arn,
            protocol_type: "MCP",
            authorizer_type: "CUSTOM_JWT",
            authorizer_configuration: AuthorizerConfiguration {
                custom_jwt_authorizer: CustomJwtAuthorizer {
                    discovery_url: &request.discovery_url,
                    allowed_clients: &request.allowed_clients,
                },
            },
            description: request.description.as_deref(),
        };
        let body = serde_json::to_value(&body)
            .map_err(|e| AwsError::Request(format!("CreateGateway: {}", e)))?;

        let response = self
            .client
            .rest_json(
                Service::AGENTCORE_CONTROL,
                "CreateGateway",
                Method::POST,
                "/gateways/",
                Some(&body),
            )
            .await?;

        serde_json::from_value(response.body)
            .map_err(|e| AwsError::InvalidResponse(format!("CreateGateway: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_credential_types::Credentials;
    use std::sync::Arc;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn control_for(server: &MockServer) -> AgentCoreControl {
        let client = AwsClient::builder()
            .credentials_provider(Arc::new(Credentials::new("AKID", "secret", None, None, "test")))
            .endpoint_url(Service::AGENTCORE_CONTROL, server.uri())
            .build()
            .await
            .unwrap();
        AgentCoreControl::new(client)
    }

    #[tokio::test]
    async fn test_list_gateways_follows_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gateways/"))
            .and(query_param("nextToken", "page2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{"gatewayId": "gw-2", "name": "second", "status": "READY"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gateways/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{"gatewayId": "gw-1", "name": "first", "status": "READY"}],
                "nextToken": "page2"
            })))
            .mount(&server)
            .await;

        let control = control_for(&server).await;
        let gateways = control.list_gateways().await.unwrap();

        let names: Vec<_> = gateways.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_create_gateway_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/gateways/"))
            .and(body_partial_json(serde_json::json!({
                "name": "netops-gw",
                "roleArn": "arn:aws:iam::123:role/gw",
                "protocolType": "MCP",
                "authorizerType": "CUSTOM_JWT",
                "authorizerConfiguration": {
                    "customJWTAuthorizer": {
                        "discoveryUrl": "https://cognito/.well-known/openid-configuration",
                        "allowedClients": ["client-1"]
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(202).set_body_json(serde_json::json!({
                "gatewayId": "gw-1",
                "gatewayArn": "arn:aws:bedrock-agentcore:us-east-1:123:gateway/gw-1",
                "gatewayUrl": "https://gw-1.gateway.example/mcp",
                "name": "netops-gw",
                "status": "CREATING"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let control = control_for(&server).await;
        let gateway = control
            .create_gateway(&CreateGatewayRequest {
                name: "netops-gw".to_string(),
                role_arn: "arn:aws:iam::123:role/gw".to_string(),
                discovery_url: "https://cognito/.well-known/openid-configuration".to_string(),
                allowed_clients: vec!["client-1".to_string()],
                description: None,
            })
            .await
            .unwrap();

        assert_eq!(gateway.gateway_id, "gw-1");
        assert_eq!(
            gateway.gateway_url.as_deref(),
            Some("https://gw-1.gateway.example/mcp")
        );
    }

    #[tokio::test]
    async fn test_get_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gateways/gw-9/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "gatewayId": "gw-9",
                "gatewayArn": "arn:gw-9",
                "gatewayUrl": "https://gw-9/mcp",
                "name": "nine"
            })))
            .mount(&server)
            .await;

        let control = control_for(&server).await;
        let gateway = control.get_gateway("gw-9").await.unwrap();
        assert_eq!(gateway.name, "nine");
        assert!(gateway.status.is_none());
    }
}
