//! In-memory fakes for tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::aws::{
    AwsError, CreateGatewayRequest, FunctionInvoker, Gateway, GatewayControl, GatewaySummary,
};
use crate::token::Clock;

/// [`GatewayControl`] keeping gateways in a vector.
#[derive(Debug, Default)]
pub struct MemoryGatewayControl {
    gateways: Mutex<Vec<Gateway>>,
    create_calls: AtomicUsize,
}

impl MemoryGatewayControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `create_gateway` calls made so far.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn gateways(&self) -> Vec<Gateway> {
        self.gateways.lock().clone()
    }
}

#[async_trait]
impl GatewayControl for MemoryGatewayControl {
    async fn list_gateways(&self) -> Result<Vec<GatewaySummary>, AwsError> {
        Ok(self
            .gateways
            .lock()
            .iter()
            .map(|g| GatewaySummary {
                gateway_id: g.gateway_id.clone(),
                name: g.name.clone(),
                status: g.status.clone(),
            })
            .collect())
    }

    async fn get_gateway(&self, gateway_id: &str) -> Result<Gateway, AwsError> {
        self.gateways
            .lock()
            .iter()
            .find(|g| g.gateway_id == gateway_id)
            .cloned()
            .ok_or_else(|| AwsError::Service {
                service: "bedrock-agentcore".to_string(),
                operation: "GetGateway".to_string(),
                status: 404,
                code: "ResourceNotFoundException".to_string(),
                message: format!("gateway {} not found", gateway_id),
            })
    }

    async fn create_gateway(&self, request: &CreateGatewayRequest) -> Result<Gateway, AwsError> {
        let n = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("{}-{:04}", request.name, n);
        let gateway = Gateway {
            gateway_arn: format!(
                "arn:aws:bedrock-agentcore:us-east-1:123456789012:gateway/{}",
                id
            ),
            gateway_url: Some(format!(
                "https://{}.gateway.bedrock-agentcore.us-east-1.amazonaws.com/mcp",
                id
            )),
            name: request.name.clone(),
            status: Some("READY".to_string()),
            gateway_id: id,
        };
        self.gateways.lock().push(gateway.clone());
        Ok(gateway)
    }
}

/// [`FunctionInvoker`] that records calls and echoes a canned response.
#[derive(Debug)]
pub struct RecordingInvoker {
    calls: Mutex<Vec<(String, Value)>>,
    response: Value,
}

impl RecordingInvoker {
    pub fn new(response: Value) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            response,
        }
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl FunctionInvoker for RecordingInvoker {
    async fn invoke(&self, function: &str, payload: &Value) -> Result<Value, AwsError> {
        self.calls
            .lock()
            .push((function.to_string(), payload.clone()));
        Ok(self.response.clone())
    }
}

/// [`Clock`] that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let delta = chrono::Duration::milliseconds(by.as_millis() as i64);
        let mut now = self.now.lock();
        *now += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
