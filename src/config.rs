//! Client configuration with defaults, builder and environment overrides.

use std::time::Duration;

pub const ENV_ADDR: &str = "REDCALL_ADDR";
pub const ENV_CONNECT_TIMEOUT_MS: &str = "REDCALL_CONNECT_TIMEOUT_MS";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address, `host:port`
    pub addr: String,

    /// How long `Connection::connect` waits for the TCP handshake
    pub connect_timeout: Duration,

    /// Disable Nagle's algorithm on the socket
    pub nodelay: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            nodelay: true,
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Defaults, overridden by `REDCALL_ADDR` and `REDCALL_CONNECT_TIMEOUT_MS`
    /// when set. Unparseable timeouts are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(addr) = lookup(ENV_ADDR) {
            config.addr = addr;
        }
        if let Some(raw) = lookup(ENV_CONNECT_TIMEOUT_MS) {
            match raw.parse::<u64>() {
                Ok(ms) => config.connect_timeout = Duration::from_millis(ms),
                Err(_) => tracing::warn!("ignoring invalid {}: {:?}", ENV_CONNECT_TIMEOUT_MS, raw),
            }
        }
        config
    }
}

#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn addr(mut self, addr: impl Into<String>) -> Self {
        self.config.addr = addr.into();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.config.nodelay = nodelay;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
