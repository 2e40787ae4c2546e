//! `agenthub` binary.

mod cli;

use std::io::Write;

use anyhow::{bail, Context, Result};
use clap::Parser;
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

use agenthub_core::aws::{AgentCoreControl, CreateGatewayRequest, ParameterStore};
use agenthub_core::hub::{connect_aws, parameter_store};
use agenthub_core::{ensure_gateway, AgentRegistry, Hub, HubConfig};
use agenthub_server::HubRouter;

use cli::{Cli, Command, GatewayCommand, SsmCommand};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = HubConfig::load(cli.global.config.as_deref())?;
    cli.global.apply(&mut config);

    match cli.command {
        Command::Serve { bind, cors } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            serve(config, cors).await
        }
        Command::Chat {
            agent,
            session,
            actor,
            message,
        } => chat(&config, agent.as_deref(), session, actor, &message).await,
        Command::Agents => {
            let hub = Hub::from_config(&config).await?;
            println!("{}", serde_json::to_string_pretty(&hub.info())?);
            Ok(())
        }
        Command::Token { agent } => token(&config, agent.as_deref()).await,
        Command::Ssm(command) => ssm(&config, command).await,
        Command::Gateway(command) => gateway(&config, command).await,
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn serve(config: HubConfig, cors: bool) -> Result<()> {
    let hub = Hub::from_config(&config).await?;

    let mut router = HubRouter::new(hub);
    if cors {
        router = router.with_cors();
    }
    let app = router.build()?;

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!(bind = %config.bind, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

async fn chat(
    config: &HubConfig,
    agent: Option<&str>,
    session: Option<String>,
    actor: Option<String>,
    message: &str,
) -> Result<()> {
    let hub = Hub::from_config(config).await?;
    let session = hub.open_session(agent, session, actor).await?;
    eprintln!("session: {}", session.context.session_id);

    let mut chunks = hub.chat_stream(&session, message).await?;
    let mut stdout = std::io::stdout();
    while let Some(chunk) = chunks.next().await {
        write!(stdout, "{}", chunk)?;
        stdout.flush()?;
    }
    writeln!(stdout)?;
    Ok(())
}

async fn token(config: &HubConfig, agent: Option<&str>) -> Result<()> {
    let hub = Hub::from_config(config).await?;
    let entry = hub.registry().resolve(agent)?;
    let token = hub
        .tokens()
        .fetch(&entry.id, &entry.ssm_prefix)
        .await
        .with_context(|| format!("failed to obtain a token for {}", entry.id))?;
    println!("{}", token);
    Ok(())
}

async fn ssm(config: &HubConfig, command: SsmCommand) -> Result<()> {
    let aws = connect_aws(config).await?;
    let store = parameter_store(config, &aws);

    match command {
        SsmCommand::Get { name } => {
            let value = store
                .get(&name)
                .await
                .with_context(|| format!("failed to read {}", name))?;
            println!("{}", value);
        }
        SsmCommand::Put {
            name,
            value,
            secure,
        } => {
            store
                .put(&name, &value, secure)
                .await
                .with_context(|| format!("failed to write {}", name))?;
            eprintln!("stored {}", name);
        }
    }
    Ok(())
}

async fn gateway(config: &HubConfig, command: GatewayCommand) -> Result<()> {
    match command {
        GatewayCommand::Create {
            name,
            role_arn,
            discovery_url,
            allowed_clients,
            agent,
            description,
        } => {
            let registry = AgentRegistry::from_config(config)?;
            let ssm_prefix = match registry.resolve(agent.as_deref()) {
                Ok(entry) => entry.ssm_prefix.clone(),
                Err(_) => match agent.as_deref().or(config.default_agent.as_deref()) {
                    Some(id) => config.ssm_prefix_for(id),
                    None => bail!("no agent given and no default agent configured"),
                },
            };

            let aws = connect_aws(config).await?;
            let store = parameter_store(config, &aws);
            let control = AgentCoreControl::new(aws);

            let request = CreateGatewayRequest {
                name,
                role_arn,
                discovery_url,
                allowed_clients,
                description,
            };
            let outcome = ensure_gateway(&control, store.as_ref(), &ssm_prefix, &request).await?;

            let verb = if outcome.created { "created" } else { "reused" };
            eprintln!("{} gateway {}", verb, outcome.gateway.name);
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "created": outcome.created,
                    "gateway_id": outcome.gateway.gateway_id,
                    "gateway_arn": outcome.gateway.gateway_arn,
                    "gateway_url": outcome.gateway.gateway_url,
                    "ssm_prefix": ssm_prefix,
                }))?
            );
            Ok(())
        }
    }
}
