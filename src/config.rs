use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

const DEFAULT_HTTP_BIND: &str = "127.0.0.1:4000";
const DEFAULT_BACKEND_BASE_URL: &str = "https://spreadsheets.google.com";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub http_bind_address: SocketAddr,
    pub backend_base_url: String,
    pub credentials_file: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub graceful_shutdown_timeout_secs: u64,
}

impl ServerConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            config,
            http_bind: cli_http_bind,
            backend_base_url: cli_backend_base_url,
            credentials_file: cli_credentials_file,
            request_timeout_secs: cli_request_timeout,
            shutdown_timeout_secs: cli_shutdown_timeout,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            http_bind: file_http_bind,
            backend_base_url: file_backend_base_url,
            credentials_file: file_credentials_file,
            request_timeout_secs: file_request_timeout,
            shutdown_timeout_secs: file_shutdown_timeout,
        } = file_config;

        let http_bind_address = cli_http_bind
            .or(file_http_bind)
            .or_else(bind_from_port_env)
            .unwrap_or_else(|| {
                DEFAULT_HTTP_BIND
                    .parse()
                    .expect("default bind address valid")
            });

        let backend_base_url = cli_backend_base_url
            .or(file_backend_base_url)
            .unwrap_or_else(|| DEFAULT_BACKEND_BASE_URL.to_string());

        let credentials_file = cli_credentials_file.or(file_credentials_file);

        let request_timeout_secs = cli_request_timeout
            .or(file_request_timeout)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
            .max(1);

        let graceful_shutdown_timeout_secs = cli_shutdown_timeout
            .or(file_shutdown_timeout)
            .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS);

        Ok(Self {
            http_bind_address,
            backend_base_url,
            credentials_file,
            request_timeout_secs,
            graceful_shutdown_timeout_secs,
        })
    }

    /// Fail-fast structural validation, run before the server starts.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.backend_base_url.starts_with("http://")
                || self.backend_base_url.starts_with("https://"),
            "backend base URL {:?} must be an http(s) URL",
            self.backend_base_url
        );
        if let Some(path) = self.credentials_file.as_ref() {
            anyhow::ensure!(
                path.exists(),
                "credentials file {:?} does not exist",
                path
            );
            anyhow::ensure!(path.is_file(), "credentials path {:?} is not a file", path);
        }
        Ok(())
    }
}

/// Heroku-style deployments hand the server a bare `PORT`.
fn bind_from_port_env() -> Option<SocketAddr> {
    let port: u16 = env::var("PORT").ok()?.parse().ok()?;
    Some(SocketAddr::from(([0, 0, 0, 0], port)))
}

#[derive(Parser, Debug, Default, Clone)]
#[command(name = "sheets-gateway", about = "Google Spreadsheets REST gateway", version)]
pub struct CliArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)",
        global = true
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "SHEETS_GATEWAY_HTTP_BIND",
        value_name = "ADDR",
        help = "HTTP bind address"
    )]
    pub http_bind: Option<SocketAddr>,

    #[arg(
        long,
        env = "SHEETS_GATEWAY_BACKEND_URL",
        value_name = "URL",
        help = "Base URL of the spreadsheet backend"
    )]
    pub backend_base_url: Option<String>,

    #[arg(
        long,
        env = "SHEETS_GATEWAY_CREDENTIALS",
        value_name = "FILE",
        help = "Path to the service-account credentials JSON"
    )]
    pub credentials_file: Option<PathBuf>,

    #[arg(
        long,
        env = "SHEETS_GATEWAY_REQUEST_TIMEOUT",
        value_name = "SECS",
        help = "Timeout for a single backend round trip"
    )]
    pub request_timeout_secs: Option<u64>,

    #[arg(
        long,
        env = "SHEETS_GATEWAY_SHUTDOWN_TIMEOUT",
        value_name = "SECS",
        help = "Grace period for in-flight requests on shutdown"
    )]
    pub shutdown_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    http_bind: Option<SocketAddr>,
    backend_base_url: Option<String>,
    credentials_file: Option<PathBuf>,
    request_timeout_secs: Option<u64>,
    shutdown_timeout_secs: Option<u64>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}
