//! Top-level error type for the hub.
//!
//! Flattens the per-module errors into the categories a caller acts on:
//!
//! - [`Error::Auth`] - no usable credentials or bearer token
//! - [`Error::NotFound`] - unknown agent or missing resource
//! - [`Error::Unavailable`] - the feature is not configured
//! - [`Error::InvalidRequest`] - bad input from the caller
//! - [`Error::Network`] / [`Error::Upstream`] - an AWS or identity service failed
//! - [`Error::Config`] - fix the configuration and restart

use thiserror::Error;

use crate::aws::AwsError;
use crate::config::ConfigError;
use crate::gateway::GatewayError;
use crate::registry::RegistryError;
use crate::runtime::RuntimeBuildError;
use crate::token::AuthError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("network error: {0}")]
    Network(String),

    /// An upstream service answered with an error.
    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<AwsError> for Error {
    fn from(err: AwsError) -> Self {
        match err {
            AwsError::Credentials(msg) => Error::Auth(msg),
            AwsError::Network(msg) => Error::Network(msg),
            ref e if e.is_not_found() => Error::NotFound(e.to_string()),
            e => Error::Upstream(e.to_string()),
        }
    }
}

impl From<AuthError> for Error {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::ParameterStore(e) => Error::from(e),
            AuthError::Network(msg) => Error::Network(msg),
            AuthError::Configuration(msg) => Error::Config(msg),
            e => Error::Auth(e.to_string()),
        }
    }
}

impl From<RegistryError> for Error {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownAgent(_) => Error::NotFound(err.to_string()),
            RegistryError::NoDefaultAgent => Error::InvalidRequest(err.to_string()),
            RegistryError::MissingRuntimeArn(_) | RegistryError::AgentcoreYaml { .. } => {
                Error::Config(err.to_string())
            }
        }
    }
}

impl From<GatewayError> for Error {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Aws(e) => Error::from(e),
            GatewayError::EmptyName => Error::InvalidRequest(err.to_string()),
            GatewayError::MissingUrl(_) => Error::Upstream(err.to_string()),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<RuntimeBuildError> for Error {
    fn from(err: RuntimeBuildError) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
