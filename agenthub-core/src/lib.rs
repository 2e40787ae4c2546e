//! # AgentHub
//!
//! Chat relay for Amazon Bedrock AgentCore agent runtimes.
//!
//! The hub resolves an agent, obtains an OAuth2 machine token for it from the
//! Cognito client stored in SSM Parameter Store, invokes the agent runtime and
//! relays its Server-Sent Events output as plain text chunks.
//!
//! ## Quick Start
//!
//! ```ignore
//! use agenthub_core::{Hub, HubConfig};
//!
//! #[tokio::main]
//! async fn main() -> agenthub_core::Result<()> {
//!     let config = HubConfig::load(None)?;
//!     let hub = Hub::from_config(&config).await?;
//!
//!     let answer = hub.chat(Some("netops_agent"), "Why is checkout slow?").await?;
//!     println!("{}", answer);
//!     Ok(())
//! }
//! ```
//!
//! ## Streaming
//!
//! ```ignore
//! use futures::StreamExt;
//!
//! # async fn example(hub: agenthub_core::Hub) -> agenthub_core::Result<()> {
//! let session = hub.open_session(None, None, None).await?;
//! let mut chunks = hub.chat_stream(&session, "List unhealthy pods").await?;
//! while let Some(chunk) = chunks.next().await {
//!     print!("{}", chunk);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`token`] - cached client-credentials tokens
//! - [`sse`] - SSE line decoding
//! - [`runtime`] - AgentCore runtime invocation
//! - [`registry`] - agent lookup from `.bedrock_agentcore.yaml` and config
//! - [`gateway`] - idempotent MCP gateway provisioning
//! - [`aws`] - SigV4 client, Parameter Store, Lambda and AgentCore control plane

pub mod aws;
pub mod config;
pub mod context;
pub mod error;
pub mod gateway;
pub mod hub;
pub mod registry;
pub mod runtime;
pub mod sse;
pub mod token;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{AgentConfig, ConfigError, HubConfig, Timeouts};
pub use context::RequestContext;
pub use error::{Error, Result};
pub use gateway::{ensure_gateway, GatewayError, GatewayOutcome};
pub use hub::{AgentInfo, ChatSession, FunctionKind, Hub, HubBuilder, HubInfo};
pub use registry::{AgentEntry, AgentRegistry, RegistryError};
pub use runtime::{AgentCoreRuntime, ChunkStream};
pub use token::{AuthError, TokenCache};
