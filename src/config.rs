use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Url;
use std::{env, str::FromStr, time::Duration};

pub const DEFAULT_UPSTREAM_URL: &str = "https://ocr.asprise.com/api/v1/receipt";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by the CORS layer. A single `*` entry allows any origin.
    pub allowed_origins: Vec<String>,
    pub relay: RelayConfig,
}

/// Immutable settings handed to the relay on every call.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub upstream_url: String,
    pub timeout: Duration,
    pub max_file_size: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            upstream_url: DEFAULT_UPSTREAM_URL.into(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Relay image uploads to an OCR service")]
pub struct Args {
    /// Host to bind to (overrides OCR_RELAY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides OCR_RELAY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// OCR endpoint uploads are forwarded to (overrides OCR_RELAY_UPSTREAM_URL)
    #[arg(long)]
    pub upstream_url: Option<String>,

    /// Upstream timeout in milliseconds (overrides OCR_RELAY_TIMEOUT_MS)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Maximum accepted upload size in bytes (overrides OCR_RELAY_MAX_FILE_SIZE)
    #[arg(long)]
    pub max_file_size: Option<usize>,

    /// Comma separated CORS origins (overrides OCR_RELAY_ALLOWED_ORIGINS)
    #[arg(long)]
    pub allowed_origins: Option<String>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();
        Self::resolve(args, |key| env::var(key).ok())
    }

    /// Merge CLI args over values looked up by `env`, falling back to defaults.
    pub fn resolve(args: Args, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = args
            .host
            .or_else(|| env("OCR_RELAY_HOST"))
            .unwrap_or_else(|| "0.0.0.0".into());
        let port = match args.port {
            Some(port) => port,
            None => parse_env(&env, "OCR_RELAY_PORT")?.unwrap_or(3000),
        };

        let upstream_url = args
            .upstream_url
            .or_else(|| env("OCR_RELAY_UPSTREAM_URL"))
            .unwrap_or_else(|| DEFAULT_UPSTREAM_URL.into());
        Url::parse(&upstream_url)
            .with_context(|| format!("parsing upstream URL `{}`", upstream_url))?;

        let timeout_ms = match args.timeout_ms {
            Some(ms) => ms,
            None => parse_env(&env, "OCR_RELAY_TIMEOUT_MS")?.unwrap_or(DEFAULT_TIMEOUT_MS),
        };
        let max_file_size = match args.max_file_size {
            Some(size) => size,
            None => parse_env(&env, "OCR_RELAY_MAX_FILE_SIZE")?.unwrap_or(DEFAULT_MAX_FILE_SIZE),
        };

        let origins = args
            .allowed_origins
            .or_else(|| env("OCR_RELAY_ALLOWED_ORIGINS"))
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.into());

        Ok(Self {
            host,
            port,
            allowed_origins: split_origins(&origins),
            relay: RelayConfig {
                upstream_url,
                timeout: Duration::from_millis(timeout_ms),
                max_file_size,
            },
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_env<T>(env: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env(key)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .with_context(|| format!("parsing {} value `{}`", key, value))
        })
        .transpose()
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
