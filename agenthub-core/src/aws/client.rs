//! SigV4-signed HTTP client for the AWS APIs the hub talks to.
//!
//! Only two wire protocols are needed here: the JSON-1.1 "target" protocol
//! (SSM) and REST-JSON (Lambda, AgentCore control plane). Both are plain HTTPS
//! POST/GET with a JSON body, so one reqwest client plus `aws-sigv4` covers
//! them without pulling in a generated SDK crate per service.

use aws_config::BehaviorVersion;
use aws_credential_types::provider::ProvideCredentials;
use aws_sigv4::http_request::{sign, SignableBody, SignableRequest, SigningSettings};
use aws_sigv4::sign::v4;
use aws_types::region::Region;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use super::error::{parse_service_error, AwsError};

/// Default region when none is configured.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default timeout for SSM, Lambda and control-plane calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Identifies an AWS service on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Service {
    /// Hostname prefix (`ssm` in `ssm.us-east-1.amazonaws.com`).
    pub endpoint_prefix: &'static str,
    /// Name used in the SigV4 credential scope.
    pub signing_name: &'static str,
}

impl Service {
    pub const SSM: Service = Service {
        endpoint_prefix: "ssm",
        signing_name: "ssm",
    };

    pub const LAMBDA: Service = Service {
        endpoint_prefix: "lambda",
        signing_name: "lambda",
    };

    pub const AGENTCORE_CONTROL: Service = Service {
        endpoint_prefix: "bedrock-agentcore-control",
        signing_name: "bedrock-agentcore",
    };
}

/// Response of a REST-JSON call: headers plus the parsed body.
#[derive(Debug)]
pub struct AwsResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

/// Signed AWS client shared by the SSM, Lambda and gateway wrappers.
///
/// Cheap to clone; the reqwest client and credentials provider are shared.
#[derive(Clone)]
pub struct AwsClient {
    client: Client,
    credentials_provider: Arc<dyn ProvideCredentials>,
    region: String,
    endpoint_overrides: HashMap<String, String>,
}

impl std::fmt::Debug for AwsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsClient")
            .field("region", &self.region)
            .field("endpoint_overrides", &self.endpoint_overrides)
            .field("credentials_provider", &"[REDACTED]")
            .finish()
    }
}

/// Builder for [`AwsClient`].
#[derive(Default)]
pub struct AwsClientBuilder {
    profile: Option<String>,
    region: Option<String>,
    timeout: Option<Duration>,
    credentials_provider: Option<Arc<dyn ProvideCredentials>>,
    endpoint_overrides: HashMap<String, String>,
}

impl AwsClientBuilder {
    /// Use a named profile from `~/.aws/config`.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Region for endpoints and signing (default: `us-east-1`).
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// HTTP timeout for every call made through this client (default: 30s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Inject a credentials provider, skipping the default chain.
    pub fn credentials_provider(mut self, provider: Arc<dyn ProvideCredentials>) -> Self {
        self.credentials_provider = Some(provider);
        self
    }

    /// Send requests for `service` to `url` instead of the public endpoint.
    pub fn endpoint_url(mut self, service: Service, url: impl Into<String>) -> Self {
        self.endpoint_overrides
            .insert(service.endpoint_prefix.to_string(), url.into());
        self
    }

    /// Build the client, loading credentials from the default chain if none were injected.
    pub async fn build(self) -> Result<AwsClient, AwsError> {
        let region = self.region.unwrap_or_else(|| DEFAULT_REGION.to_string());
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);

        let credentials_provider: Arc<dyn ProvideCredentials> = match self.credentials_provider {
            Some(provider) => provider,
            None => {
                let mut loader = aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(region.clone()));
                if let Some(profile) = &self.profile {
                    loader = loader.profile_name(profile);
                }
                let config = loader.load().await;
                config
                    .credentials_provider()
                    .map(|provider| Arc::new(provider) as Arc<dyn ProvideCredentials>)
                    .ok_or_else(|| {
                        AwsError::Credentials(
                            "no AWS credentials found; configure environment variables, a profile or an IAM role"
                                .to_string(),
                        )
                    })?
            }
        };

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AwsError::Request(format!("failed to create HTTP client: {}", e)))?;

        Ok(AwsClient {
            client,
            credentials_provider,
            region,
            endpoint_overrides: self.endpoint_overrides,
        })
    }
}

impl AwsClient {
    pub fn builder() -> AwsClientBuilder {
        AwsClientBuilder::default()
    }

    /// Client for `region` using the default credential chain.
    pub async fn from_env(region: impl Into<String>) -> Result<Self, AwsError> {
        Self::builder().region(region).build().await
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Base URL (no trailing slash) for `service` in this client's region.
    pub fn endpoint(&self, service: Service) -> String {
        match self.endpoint_overrides.get(service.endpoint_prefix) {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => default_endpoint(service, &self.region),
        }
    }

    /// Call a JSON-1.1 target-protocol operation (`x-amz-target: <prefix>.<operation>`).
    pub async fn json_target(
        &self,
        service: Service,
        target_prefix: &str,
        operation: &str,
        params: &serde_json::Value,
    ) -> Result<serde_json::Value, AwsError> {
        let url = format!("{}/", self.endpoint(service));
        let body = serde_json::to_string(params)
            .map_err(|e| AwsError::Request(format!("failed to serialize parameters: {}", e)))?;
        let target = format!("{}.{}", target_prefix, operation);

        let request = self
            .signed_request(
                service,
                Method::POST,
                &url,
                &[
                    ("content-type", "application/x-amz-json-1.1"),
                    ("x-amz-target", target.as_str()),
                ],
                body,
            )
            .await?;

        tracing::debug!(service = service.endpoint_prefix, operation, "AWS JSON call");
        let response = self.send(service, operation, request).await?;
        Ok(response.body)
    }

    /// Call a REST-JSON operation at `path` (which must start with `/` and may carry a query).
    pub async fn rest_json(
        &self,
        service: Service,
        operation: &str,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<AwsResponse, AwsError> {
        let url = format!("{}{}", self.endpoint(service), path);
        let body = match body {
            Some(value) => serde_json::to_string(value)
                .map_err(|e| AwsError::Request(format!("failed to serialize body: {}", e)))?,
            None => String::new(),
        };

        let request = self
            .signed_request(
                service,
                method,
                &url,
                &[("content-type", "application/json")],
                body,
            )
            .await?;

        tracing::debug!(service = service.endpoint_prefix, operation, %url, "AWS REST call");
        self.send(service, operation, request).await
    }

    async fn send(
        &self,
        service: Service,
        operation: &str,
        request: reqwest::Request,
    ) -> Result<AwsResponse, AwsError> {
        let response = self
            .client
            .execute(request)
            .await
            .map_err(AwsError::from_reqwest)?;

        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await.map_err(AwsError::from_reqwest)?;

        if !status.is_success() {
            let error_type = headers
                .get("x-amzn-errortype")
                .and_then(|v| v.to_str().ok());
            return Err(parse_service_error(
                service.endpoint_prefix,
                operation,
                status.as_u16(),
                error_type,
                &text,
            ));
        }

        let body = if text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| {
                AwsError::InvalidResponse(format!(
                    "{}.{}: {}",
                    service.endpoint_prefix, operation, e
                ))
            })?
        };

        Ok(AwsResponse {
            status: status.as_u16(),
            headers,
            body,
        })
    }

    async fn signed_request(
        &self,
        service: Service,
        method: Method,
        url: &str,
        extra_headers: &[(&str, &str)],
        body: String,
    ) -> Result<reqwest::Request, AwsError> {
        let credentials = self
            .credentials_provider
            .provide_credentials()
            .await
            .map_err(|e| AwsError::Credentials(e.to_string()))?;

        let parsed = url::Url::parse(url)
            .map_err(|e| AwsError::Request(format!("invalid endpoint URL {}: {}", url, e)))?;
        let host = match (parsed.host_str(), parsed.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(AwsError::Request(format!("endpoint has no host: {}", url))),
        };

        let mut headers: Vec<(&str, &str)> = vec![("host", host.as_str())];
        headers.extend_from_slice(extra_headers);

        let identity = credentials.into();
        let signing_params = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.region)
            .name(service.signing_name)
            .time(SystemTime::now())
            .settings(SigningSettings::default())
            .build()
            .map_err(|e| AwsError::Request(format!("failed to build signing params: {}", e)))?;

        let signable = SignableRequest::new(
            method.as_str(),
            url,
            headers.iter().copied(),
            SignableBody::Bytes(body.as_bytes()),
        )
        .map_err(|e| AwsError::Request(format!("failed to create signable request: {}", e)))?;

        let (instructions, _signature) = sign(signable, &signing_params.into())
            .map_err(|e| AwsError::Request(format!("failed to sign request: {}", e)))?
            .into_parts();

        let mut builder = self.client.request(method, url).body(body);
        for (name, value) in &headers {
            builder = builder.header(*name, *value);
        }
        for (name, value) in instructions.headers() {
            builder = builder.header(name, value);
        }

        builder
            .build()
            .map_err(|e| AwsError::Request(format!("failed to build request: {}", e)))
    }
}

/// Public endpoint for `service` in `region`.
fn default_endpoint(service: Service, region: &str) -> String {
    let suffix = if region.starts_with("cn-") {
        "amazonaws.com.cn"
    } else {
        "amazonaws.com"
    };
    format!("https://{}.{}.{}", service.endpoint_prefix, region, suffix)
}

/// Percent-encode `value` as a single URL path segment (`:` and `/` included).
pub fn encode_path_segment(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_credential_types::Credentials;
    use wiremock::matchers::{body_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_credentials() -> Arc<dyn ProvideCredentials> {
        Arc::new(Credentials::new("AKIDTEST", "secret", None, None, "test"))
    }

    async fn client_for(server: &MockServer) -> AwsClient {
        AwsClient::builder()
            .region("us-west-2")
            .credentials_provider(test_credentials())
            .endpoint_url(Service::SSM, server.uri())
            .endpoint_url(Service::LAMBDA, server.uri())
            .build()
            .await
            .unwrap()
    }

    #[test]
    fn test_default_endpoint() {
        assert_eq!(
            default_endpoint(Service::SSM, "us-east-1"),
            "https://ssm.us-east-1.amazonaws.com"
        );
        assert_eq!(
            default_endpoint(Service::AGENTCORE_CONTROL, "eu-west-1"),
            "https://bedrock-agentcore-control.eu-west-1.amazonaws.com"
        );
        assert_eq!(
            default_endpoint(Service::LAMBDA, "cn-north-1"),
            "https://lambda.cn-north-1.amazonaws.com.cn"
        );
    }

    #[test]
    fn test_encode_path_segment() {
        assert_eq!(
            encode_path_segment("arn:aws:lambda:us-east-1:123:function/x"),
            "arn%3Aaws%3Alambda%3Aus-east-1%3A123%3Afunction%2Fx"
        );
        assert_eq!(encode_path_segment("plain-name_1"), "plain-name_1");
        assert_eq!(encode_path_segment("a b"), "a%20b");
    }

    #[tokio::test]
    async fn test_endpoint_override_trims_slash() {
        let client = AwsClient::builder()
            .credentials_provider(test_credentials())
            .endpoint_url(Service::SSM, "http://localhost:4566/")
            .build()
            .await
            .unwrap();

        assert_eq!(client.endpoint(Service::SSM), "http://localhost:4566");
        assert_eq!(client.region(), DEFAULT_REGION);
        assert_eq!(
            client.endpoint(Service::LAMBDA),
            "https://lambda.us-east-1.amazonaws.com"
        );
    }

    #[tokio::test]
    async fn test_json_target_is_signed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("x-amz-target", "AmazonSSM.GetParameter"))
            .and(header("content-type", "application/x-amz-json-1.1"))
            .and(header_exists("authorization"))
            .and(header_exists("x-amz-date"))
            .and(body_json(serde_json::json!({"Name": "/a"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"Parameter": {"Value": "v"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let body = client
            .json_target(
                Service::SSM,
                "AmazonSSM",
                "GetParameter",
                &serde_json::json!({"Name": "/a"}),
            )
            .await
            .unwrap();

        assert_eq!(body["Parameter"]["Value"], "v");
    }

    #[tokio::test]
    async fn test_service_error_is_typed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "__type": "ParameterNotFound",
                "message": "missing"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .json_target(Service::SSM, "AmazonSSM", "GetParameter", &serde_json::json!({}))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(err.code(), Some("ParameterNotFound"));
    }

    #[tokio::test]
    async fn test_rest_json_returns_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2015-03-31/functions/fn/invocations"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-amz-executed-version", "$LATEST")
                    .set_body_json(serde_json::json!({"ok": true})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let response = client
            .rest_json(
                Service::LAMBDA,
                "Invoke",
                Method::POST,
                "/2015-03-31/functions/fn/invocations",
                Some(&serde_json::json!({})),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body["ok"], true);
        assert_eq!(
            response.headers.get("x-amz-executed-version").unwrap(),
            "$LATEST"
        );
    }
}
