use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: String,
    pub soap_url: String,
    pub minio_endpoint: String,
    pub minio_port: u16,
    pub minio_use_ssl: bool,
    pub minio_access_key: String,
    pub minio_secret_key: String,
    pub socket_host: String,
    pub socket_port: u16,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Multi-protocol demo gateway")]
pub struct Args {
    /// Host to bind to (overrides WEB_UI_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides WEB_UI_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory of static UI assets (overrides GATEWAY_STATIC_DIR)
    #[arg(long)]
    pub static_dir: Option<String>,

    /// Base URL of the SOAP todo service (overrides SOAP_URL)
    #[arg(long)]
    pub soap_url: Option<String>,

    /// Object store endpoint host (overrides MINIO_ENDPOINT)
    #[arg(long)]
    pub minio_endpoint: Option<String>,

    /// Object store port (overrides MINIO_PORT)
    #[arg(long)]
    pub minio_port: Option<u16>,

    /// Socket server host (overrides SOCKET_HOST)
    #[arg(long)]
    pub socket_host: Option<String>,

    /// Socket server port (overrides SOCKET_PORT)
    #[arg(long)]
    pub socket_port: Option<u16>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into an AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("WEB_UI_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = env_u16("WEB_UI_PORT", 3000)?;
        let env_static = env::var("GATEWAY_STATIC_DIR").unwrap_or_else(|_| "./public".into());
        let env_soap_url = assemble_soap_url(
            env::var("SOAP_URL").ok(),
            env::var("SOAP_HOST").ok(),
            env::var("SOAP_PORT").ok(),
        );
        let env_minio_endpoint = env::var("MINIO_ENDPOINT").unwrap_or_else(|_| "localhost".into());
        let env_minio_port = env_u16("MINIO_PORT", 9000)?;
        let minio_use_ssl = env::var("MINIO_USE_SSL").map(|v| v == "true").unwrap_or(false);
        let minio_access_key = env::var("MINIO_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".into());
        let minio_secret_key = env::var("MINIO_SECRET_KEY").unwrap_or_else(|_| "minioadmin".into());
        let env_socket_host = env::var("SOCKET_HOST").unwrap_or_else(|_| "localhost".into());
        let env_socket_port = env_u16("SOCKET_PORT", 8080)?;

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            static_dir: args.static_dir.unwrap_or(env_static),
            soap_url: args.soap_url.unwrap_or(env_soap_url),
            minio_endpoint: args.minio_endpoint.unwrap_or(env_minio_endpoint),
            minio_port: args.minio_port.unwrap_or(env_minio_port),
            minio_use_ssl,
            minio_access_key,
            minio_secret_key,
            socket_host: args.socket_host.unwrap_or(env_socket_host),
            socket_port: args.socket_port.unwrap_or(env_socket_port),
        };

        Ok(cfg)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// URL the object-store client should dial, honoring MINIO_USE_SSL.
    pub fn minio_endpoint_url(&self) -> String {
        let scheme = if self.minio_use_ssl { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.minio_endpoint, self.minio_port)
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.socket_host, self.socket_port)
    }
}

/// Read a port-like env var, falling back to `default` when unset.
fn env_u16(name: &str, default: u16) -> Result<u16> {
    match env::var(name) {
        Ok(value) => value
            .parse::<u16>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}

/// SOAP_URL wins when set; otherwise the URL is assembled from
/// SOAP_HOST/SOAP_PORT with the original deployment's defaults.
fn assemble_soap_url(url: Option<String>, host: Option<String>, port: Option<String>) -> String {
    match url {
        Some(url) => url,
        None => format!(
            "http://{}:{}",
            host.unwrap_or_else(|| "localhost".into()),
            port.unwrap_or_else(|| "8000".into())
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_soap_url_wins() {
        let url = assemble_soap_url(
            Some("http://todo:9999".into()),
            Some("ignored".into()),
            Some("1".into()),
        );
        assert_eq!(url, "http://todo:9999");
    }

    #[test]
    fn soap_url_assembled_from_parts() {
        let url = assemble_soap_url(None, Some("soap-api".into()), Some("8001".into()));
        assert_eq!(url, "http://soap-api:8001");
    }

    #[test]
    fn soap_url_defaults() {
        assert_eq!(assemble_soap_url(None, None, None), "http://localhost:8000");
    }
}
