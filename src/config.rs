//! Configuration management for the debugger
//!
//! Values come from the environment (optionally via a `.env` file) and can
//! be overridden per command with `--port`.

use std::env;

/// Port used when nothing else is configured
pub const DEFAULT_PORT: u16 = 5200;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub debugger: DebuggerConfig,
}

/// Where `serve` listens
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Where `mcp` sends its requests
#[derive(Debug, Clone)]
pub struct DebuggerConfig {
    pub server_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: DEFAULT_PORT,
            },
            debugger: DebuggerConfig {
                server_url: local_url(DEFAULT_PORT),
            },
        }
    }
}

impl Config {
    /// Load from `MCPDEBUGGER_HOST`, `MCPDEBUGGER_PORT` and `MCPDEBUGGER_URL`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("MCPDEBUGGER_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Config {
            server: ServerConfig {
                host: lookup("MCPDEBUGGER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
                port,
            },
            debugger: DebuggerConfig {
                server_url: lookup("MCPDEBUGGER_URL").unwrap_or_else(|| local_url(port)),
            },
        }
    }

    /// Apply a `--port` override to both the listener and the client URL
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.server.port = port;
            self.debugger.server_url = local_url(port);
        }
        self
    }
}

/// Base URL of a debug server on this machine
pub fn local_url(port: u16) -> String {
    format!("http://localhost:{}", port)
}
