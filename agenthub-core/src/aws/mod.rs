//! Minimal AWS plumbing: a SigV4 client and the three services the hub uses.

mod client;
mod control;
mod error;
mod lambda;
mod ssm;

pub use client::{
    encode_path_segment, AwsClient, AwsClientBuilder, AwsResponse, Service, DEFAULT_REGION,
    DEFAULT_TIMEOUT,
};
pub use control::{AgentCoreControl, CreateGatewayRequest, Gateway, GatewayControl, GatewaySummary};
pub use error::AwsError;
pub use lambda::{FunctionInvoker, LambdaInvoker};
pub use ssm::{MemoryParameterStore, ParameterStore, SsmParameterStore};
