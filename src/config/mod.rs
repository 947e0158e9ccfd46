mod file_config;

pub use file_config::FileConfig;

use crate::ghost::AdminKey;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Context, Result};
use clap::ValueEnum;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8053;

/// Transport the MCP endpoint is served over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Transport {
    Sse,
    Stdio,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Sse => write!(f, "sse"),
            Transport::Stdio => write!(f, "stdio"),
        }
    }
}

/// CLI arguments that take part in config resolution.
/// This struct mirrors the CLI arguments so resolution can be tested
/// without going through clap.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub ghost_url: Option<String>,
    pub admin_key: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub transport: Option<Transport>,
    pub logging_level: Option<RequestsLoggingLevel>,
}

/// Environment variables that take part in config resolution.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub ghost_url: Option<String>,
    pub admin_key: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            ghost_url: std::env::var("GHOST_BASE_URL").ok(),
            admin_key: std::env::var("GHOST_ADMIN_API_KEY").ok(),
            host: std::env::var("HOST").ok(),
            port: std::env::var("PORT").ok(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub ghost_url: String,
    pub admin_key: AdminKey,
    pub host: String,
    pub port: u16,
    pub transport: Transport,
    pub logging_level: RequestsLoggingLevel,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments, environment variables and
    /// an optional TOML file config. CLI values win over environment values,
    /// which win over file values.
    pub fn resolve(
        cli: &CliConfig,
        env: &EnvConfig,
        file_config: Option<FileConfig>,
    ) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let ghost_url = cli
            .ghost_url
            .clone()
            .or_else(|| env.ghost_url.clone())
            .or(file.ghost_url)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Ghost base URL must be specified via --ghost-url, GHOST_BASE_URL or the config file"
                )
            })?;
        let ghost_url = ghost_url.trim_end_matches('/').to_owned();
        if !ghost_url.starts_with("http://") && !ghost_url.starts_with("https://") {
            bail!(
                "Ghost base URL must start with http:// or https://: {}",
                ghost_url
            );
        }

        let admin_key_raw = cli
            .admin_key
            .clone()
            .or_else(|| env.admin_key.clone())
            .or(file.admin_key)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Admin API key must be specified via --admin-key, GHOST_ADMIN_API_KEY or the config file"
                )
            })?;
        let admin_key = AdminKey::parse(&admin_key_raw)?;

        let host = cli
            .host
            .clone()
            .or_else(|| env.host.clone())
            .or(file.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_owned());

        let env_port = env
            .port
            .as_deref()
            .map(|raw| {
                raw.parse::<u16>()
                    .with_context(|| format!("Invalid PORT value: {}", raw))
            })
            .transpose()?;
        let port = cli.port.or(env_port).or(file.port).unwrap_or(DEFAULT_PORT);
        if port == 0 {
            bail!("Port must be nonzero");
        }

        let transport = cli
            .transport
            .or_else(|| file.transport.as_deref().and_then(parse_transport))
            .unwrap_or(Transport::Sse);

        let logging_level = cli
            .logging_level
            .clone()
            .or_else(|| file.logging_level.as_deref().and_then(parse_logging_level))
            .unwrap_or_default();

        Ok(Self {
            ghost_url,
            admin_key,
            host,
            port,
            transport,
            logging_level,
        })
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

fn parse_transport(s: &str) -> Option<Transport> {
    Transport::from_str(s, true).ok()
}
