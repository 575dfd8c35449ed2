//! Server configuration

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::coordinator::DEFAULT_EVENT_CAPACITY;
use crate::error::{Error, Result};
use crate::sync::config::DEFAULT_EPSILON;

/// Default listening port
pub const DEFAULT_PORT: u16 = 13579;

/// Environment variable overriding the bind address
pub const ENV_ADDR: &str = "WATCH_PARTY_ADDR";
/// Environment variable naming the PEM certificate chain
pub const ENV_CERT: &str = "SSL_CERT";
/// Environment variable naming the PEM private key
pub const ENV_KEY: &str = "SSL_KEY";

/// Certificate and key for serving `wss://`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    /// PEM certificate chain
    pub cert: PathBuf,
    /// PEM private key
    pub key: PathBuf,
}

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// TLS material; plaintext when absent
    pub tls: Option<TlsPaths>,

    /// Tolerance for treating two positions as equal, in seconds
    pub epsilon: f64,

    /// Delay between `gtfo` and closing a kicked viewer
    pub kick_grace: Duration,

    /// How long open connections get to close after shutdown
    pub shutdown_grace: Duration,

    /// Capacity of the coordinator's event queue
    pub event_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            tls: None,
            epsilon: DEFAULT_EPSILON,
            kick_grace: Duration::from_millis(500),
            shutdown_grace: Duration::from_millis(500),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Build a config from `WATCH_PARTY_ADDR`, `SSL_CERT` and `SSL_KEY`
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup(ENV_ADDR).filter(|s| !s.is_empty()) {
            config.bind_addr = addr
                .parse()
                .map_err(|_| Error::Config(format!("{} is not a socket address: {}", ENV_ADDR, addr)))?;
        }

        let cert = lookup(ENV_CERT).filter(|s| !s.is_empty());
        let key = lookup(ENV_KEY).filter(|s| !s.is_empty());
        config.tls = match (cert, key) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(Error::Config(format!("{} is set but {} is not", ENV_CERT, ENV_KEY)))
            }
            (None, Some(_)) => {
                return Err(Error::Config(format!("{} is set but {} is not", ENV_KEY, ENV_CERT)))
            }
        };

        Ok(config)
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Serve TLS with the given certificate and key
    pub fn tls(mut self, cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        self.tls = Some(TlsPaths {
            cert: cert.into(),
            key: key.into(),
        });
        self
    }

    /// Set the position tolerance
    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon.abs();
        self
    }

    /// Set the kick grace period
    pub fn kick_grace(mut self, grace: Duration) -> Self {
        self.kick_grace = grace;
        self
    }

    /// Set the shutdown grace period
    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Set the event queue capacity (at least 1)
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// URL scheme clients should use
    pub fn scheme(&self) -> &'static str {
        if self.tls.is_some() {
            "wss"
        } else {
            "ws"
        }
    }
}
