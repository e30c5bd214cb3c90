/**
 * Server Configuration
 *
 * Configuration is loaded from an optional TOML file (path in
 * `COEDIT_CONFIG`) with environment variables taking precedence, and
 * sensible defaults for local development.
 *
 * # Error Handling
 *
 * Configuration errors are logged but do not prevent server startup; a
 * value that fails to parse falls back to its default.
 */
use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Load configuration: TOML file if `COEDIT_CONFIG` points at one,
    /// then `SERVER_HOST`/`SERVER_PORT` overrides, then defaults.
    pub fn load() -> Self {
        let mut config = match std::env::var("COEDIT_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path)).unwrap_or_else(|| {
                tracing::warn!(%path, "could not read config file, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        };

        if let Ok(host) = std::env::var("SERVER_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("SERVER_PORT") {
            match port.parse::<u16>() {
                Ok(port) => config.port = port,
                Err(_) => {
                    tracing::warn!(%port, "SERVER_PORT is not a port number, keeping {}", config.port);
                }
            }
        }

        config
    }

    /// Parse a TOML config file. Returns `None` when unreadable or
    /// malformed.
    pub fn from_file(path: &Path) -> Option<Self> {
        let raw = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&raw) {
            Ok(config) => Some(config),
            Err(err) => {
                tracing::warn!(%err, "malformed config file");
                None
            }
        }
    }

    /// The socket address to bind, falling back to all interfaces when
    /// the configured host does not parse.
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], self.port)))
    }
}
