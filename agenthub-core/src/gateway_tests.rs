use super::*;
use crate::aws::MemoryParameterStore;
use crate::test_utils::MemoryGatewayControl;

const PREFIX: &str = "/app/netops/agentcore";

fn request() -> CreateGatewayRequest {
    CreateGatewayRequest {
        name: "netops-gateway".to_string(),
        role_arn: "arn:aws:iam::123456789012:role/gateway".to_string(),
        discovery_url: "https://cognito-idp.us-east-1.amazonaws.com/pool/.well-known/openid-configuration"
            .to_string(),
        allowed_clients: vec!["client-1".to_string()],
        description: None,
    }
}

#[tokio::test]
async fn test_second_call_reuses_gateway() {
    let control = MemoryGatewayControl::new();
    let store = MemoryParameterStore::new();

    let first = ensure_gateway(&control, &store, PREFIX, &request()).await.unwrap();
    assert!(first.created);

    // Stale value that the second run must overwrite.
    store
        .put(&format!("{}/gateway_url", PREFIX), "https://stale", false)
        .await
        .unwrap();

    let second = ensure_gateway(&control, &store, PREFIX, &request()).await.unwrap();
    assert!(!second.created);
    assert_eq!(second.gateway, first.gateway);

    assert_eq!(control.create_calls(), 1);
    assert_eq!(control.gateways().len(), 1);

    let params = store.snapshot();
    assert_eq!(params[&format!("{}/gateway_id", PREFIX)], first.gateway.gateway_id);
    assert_eq!(params[&format!("{}/gateway_arn", PREFIX)], first.gateway.gateway_arn);
    assert_eq!(
        Some(&params[&format!("{}/gateway_url", PREFIX)]),
        first.gateway.gateway_url.as_ref()
    );
}

#[tokio::test]
async fn test_distinct_names_create_distinct_gateways() {
    let control = MemoryGatewayControl::new();
    let store = MemoryParameterStore::new();

    ensure_gateway(&control, &store, PREFIX, &request()).await.unwrap();
    let other = CreateGatewayRequest {
        name: "k8s-gateway".to_string(),
        ..request()
    };
    let outcome = ensure_gateway(&control, &store, "/app/k8s/agentcore/", &other)
        .await
        .unwrap();

    assert!(outcome.created);
    assert_eq!(control.create_calls(), 2);
    assert!(store
        .snapshot()
        .contains_key("/app/k8s/agentcore/gateway_id"));
}

#[tokio::test]
async fn test_empty_name_rejected() {
    let control = MemoryGatewayControl::new();
    let store = MemoryParameterStore::new();
    let req = CreateGatewayRequest {
        name: " ".to_string(),
        ..request()
    };

    let err = ensure_gateway(&control, &store, PREFIX, &req).await.unwrap_err();
    assert!(matches!(err, GatewayError::EmptyName));
    assert_eq!(control.create_calls(), 0);
    assert!(store.snapshot().is_empty());
}
