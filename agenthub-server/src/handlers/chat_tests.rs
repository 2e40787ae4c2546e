use super::*;

#[test]
fn test_chat_request_minimal() {
    let request: ChatRequest = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
    assert_eq!(request.message, "hi");
    assert!(request.agent_id.is_none());
    assert!(request.session_id.is_none());
    assert!(request.actor_id.is_none());
}

#[test]
fn test_chat_request_full() {
    let request: ChatRequest = serde_json::from_str(
        r#"{"message": "hi", "agent_id": "k8s", "session_id": "s", "actor_id": "alice"}"#,
    )
    .unwrap();
    assert_eq!(request.agent_id.as_deref(), Some("k8s"));
    assert_eq!(request.actor_id.as_deref(), Some("alice"));
}

#[test]
fn test_chat_request_requires_message() {
    assert!(serde_json::from_str::<ChatRequest>(r#"{"agent_id": "k8s"}"#).is_err());
}
