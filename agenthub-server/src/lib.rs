//! HTTP front-end for the agent hub.
//!
//! Exposes the hub's chat relay as Server-Sent Events plus a few JSON
//! endpoints for configuration and operations Lambdas.
//!
//! # Example
//!
//! ```rust,no_run
//! use agenthub_core::{Hub, HubConfig};
//! use agenthub_server::HubRouter;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HubConfig::load(None)?;
//! let app = HubRouter::new(Hub::from_config(&config).await?).build()?;
//!
//! let listener = tokio::net::TcpListener::bind(&config.bind).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub(crate) mod handlers;
pub mod router;
pub(crate) mod state;

pub use error::{BuildError, ServerError, ServerResult};
pub use router::{HubRouter, DEFAULT_API_PREFIX};
