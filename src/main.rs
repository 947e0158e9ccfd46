use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ghost_mcp_server::config::{AppConfig, CliConfig, EnvConfig, FileConfig, Transport};
use ghost_mcp_server::ghost::{CredentialManager, GhostClient};
use ghost_mcp_server::mcp::create_mcp_state;
use ghost_mcp_server::server::{
    run_server, run_stdio, RequestsLoggingLevel, ServerConfig,
};

#[derive(Parser, Debug)]
#[clap(version)]
struct CliArgs {
    /// Path to a TOML config file.
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Base URL of the Ghost instance, e.g. https://blog.example.com.
    #[clap(long)]
    pub ghost_url: Option<String>,

    /// Admin API key in id:secret form.
    #[clap(long)]
    pub admin_key: Option<String>,

    /// The address to bind the HTTP transport to.
    #[clap(long)]
    pub host: Option<String>,

    /// The port to listen on.
    #[clap(short, long)]
    pub port: Option<u16>,

    /// Transport to serve MCP over.
    #[clap(short, long)]
    pub transport: Option<Transport>,

    /// The level of logging to perform on each request.
    #[clap(long)]
    pub logging_level: Option<RequestsLoggingLevel>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            ghost_url: self.ghost_url.clone(),
            admin_key: self.admin_key.clone(),
            host: self.host.clone(),
            port: self.port,
            transport: self.transport,
            logging_level: self.logging_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), &EnvConfig::from_env(), file_config)?;

    info!("Connecting to Ghost at {}", config.ghost_url);
    let credentials = Arc::new(CredentialManager::new(config.admin_key.clone()));
    let ghost = Arc::new(GhostClient::new(config.ghost_url.clone(), credentials)?);

    let mcp_state = Arc::new(create_mcp_state(ghost, ghost_mcp_server::version()));

    match config.transport {
        Transport::Sse => {
            let server_config = ServerConfig {
                requests_logging_level: config.logging_level,
                host: config.host,
                port: config.port,
            };
            info!("Serving MCP over SSE at port {}!", server_config.port);
            run_server(server_config, mcp_state).await
        }
        Transport::Stdio => {
            info!("Serving MCP over stdio");
            run_stdio(mcp_state).await
        }
    }
}
