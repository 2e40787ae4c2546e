//! Command-line arguments.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use agenthub_core::HubConfig;

#[derive(Debug, Parser)]
#[command(name = "agenthub")]
#[command(about = "Chat relay and provisioning helpers for Bedrock AgentCore agents", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags that override the config file and environment.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Config file (default: ./agenthub.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// AWS region
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// AWS profile
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Path to .bedrock_agentcore.yaml
    #[arg(long, global = true)]
    pub agentcore_yaml: Option<PathBuf>,
}

impl GlobalArgs {
    pub fn apply(&self, config: &mut HubConfig) {
        if let Some(region) = &self.region {
            config.region = region.clone();
        }
        if let Some(profile) = &self.profile {
            config.profile = Some(profile.clone());
        }
        if let Some(path) = &self.agentcore_yaml {
            config.agentcore_yaml = path.clone();
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve {
        /// Listen address
        #[arg(long)]
        bind: Option<String>,

        /// Allow cross-origin browser requests
        #[arg(long)]
        cors: bool,
    },

    /// Send one message to an agent and stream the answer
    Chat {
        /// Agent id (default agent when omitted)
        #[arg(long)]
        agent: Option<String>,

        /// Continue an existing runtime session
        #[arg(long)]
        session: Option<String>,

        /// Actor id sent to the runtime
        #[arg(long)]
        actor: Option<String>,

        message: String,
    },

    /// Print the agents the hub knows about
    Agents,

    /// Fetch an access token for an agent and print it
    Token {
        #[arg(long)]
        agent: Option<String>,
    },

    /// Read or write SSM parameters
    #[command(subcommand)]
    Ssm(SsmCommand),

    /// Provision AgentCore gateways
    #[command(subcommand)]
    Gateway(GatewayCommand),
}

#[derive(Debug, Subcommand)]
pub enum SsmCommand {
    /// Print a parameter value
    Get { name: String },

    /// Create or overwrite a parameter
    Put {
        name: String,
        value: String,

        /// Store as SecureString
        #[arg(long)]
        secure: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum GatewayCommand {
    /// Create an MCP gateway, or reuse the one with the same name
    Create {
        #[arg(long)]
        name: String,

        /// IAM role the gateway assumes
        #[arg(long)]
        role_arn: String,

        /// OIDC discovery URL of the Cognito user pool
        #[arg(long)]
        discovery_url: String,

        /// Cognito app client allowed to call the gateway (repeatable)
        #[arg(long = "allowed-client", required = true)]
        allowed_clients: Vec<String>,

        /// Agent whose SSM prefix receives the gateway parameters
        #[arg(long)]
        agent: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },
}
