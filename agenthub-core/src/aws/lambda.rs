//! Synchronous Lambda invocation.

use async_trait::async_trait;
use reqwest::Method;

use super::client::{encode_path_segment, AwsClient, Service};
use super::error::AwsError;

/// Invokes a function by name and returns its JSON result.
#[async_trait]
pub trait FunctionInvoker: Send + Sync {
    async fn invoke(
        &self,
        function: &str,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, AwsError>;
}

/// [`FunctionInvoker`] for AWS Lambda (`RequestResponse` invocation type).
#[derive(Debug, Clone)]
pub struct LambdaInvoker {
    client: AwsClient,
}

impl LambdaInvoker {
    pub fn new(client: AwsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FunctionInvoker for LambdaInvoker {
    async fn invoke(
        &self,
        function: &str,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, AwsError> {
        let path = format!(
            "/2015-03-31/functions/{}/invocations",
            encode_path_segment(function)
        );

        tracing::info!(function, "invoking Lambda function");
        let response = self
            .client
            .rest_json(Service::LAMBDA, "Invoke", Method::POST, &path, Some(payload))
            .await?;

        // Handler exceptions come back as 200 with this header set.
        if let Some(kind) = response
            .headers
            .get("x-amz-function-error")
            .and_then(|v| v.to_str().ok())
        {
            let message = response
                .body
                .get("errorMessage")
                .and_then(|m| m.as_str())
                .unwrap_or("function raised an error")
                .to_string();
            return Err(AwsError::Service {
                service: "lambda".to_string(),
                operation: "Invoke".to_string(),
                status: response.status,
                code: format!("FunctionError.{}", kind),
                message,
            });
        }

        Ok(response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_credential_types::Credentials;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn invoker_for(server: &MockServer) -> LambdaInvoker {
        let client = AwsClient::builder()
            .credentials_provider(Arc::new(Credentials::new("AKID", "secret", None, None, "test")))
            .endpoint_url(Service::LAMBDA, server.uri())
            .build()
            .await
            .unwrap();
        LambdaInvoker::new(client)
    }

    #[tokio::test]
    async fn test_invoke_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2015-03-31/functions/chaos-tool/invocations"))
            .and(body_json(serde_json::json!({"action": "stop"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"success": true, "stopped": 2})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let invoker = invoker_for(&server).await;
        let result = invoker
            .invoke("chaos-tool", &serde_json::json!({"action": "stop"}))
            .await
            .unwrap();

        assert_eq!(result["success"], true);
        assert_eq!(result["stopped"], 2);
    }

    #[tokio::test]
    async fn test_invoke_function_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-amz-function-error", "Unhandled")
                    .set_body_json(serde_json::json!({
                        "errorMessage": "boom",
                        "errorType": "KeyError"
                    })),
            )
            .mount(&server)
            .await;

        let invoker = invoker_for(&server).await;
        let err = invoker
            .invoke("fault-tool", &serde_json::json!({}))
            .await
            .unwrap_err();

        assert_eq!(err.code(), Some("FunctionError.Unhandled"));
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_invoke_missing_function() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(404)
                    .insert_header("x-amzn-errortype", "ResourceNotFoundException")
                    .set_body_json(serde_json::json!({"Message": "Function not found"})),
            )
            .mount(&server)
            .await;

        let invoker = invoker_for(&server).await;
        let err = invoker
            .invoke("nope", &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
