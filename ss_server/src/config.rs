//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use system_sync::room::ManagerSettings;

/// Listen address used when neither `--bind` nor `SERVER_BIND` is given.
pub const DEFAULT_BIND: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000);

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP/WebSocket bind address
    pub bind: SocketAddr,
    /// Prometheus scrape listener, disabled when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Room defaults
    pub rooms: RoomDefaultsConfig,
    /// Per-connection limits
    pub connection: ConnectionConfig,
}

/// Settings handed to the room registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomDefaultsConfig {
    /// Base seed for per-room RNGs
    pub rng_seed: Option<u64>,
    /// Room actor inbox size
    pub inbox_capacity: usize,
}

/// Per-connection queue and flood limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Outbound queue size
    pub outbox_capacity: usize,
    /// Max client messages per second
    pub burst_limit: usize,
    /// Max client messages per minute
    pub sustained_limit: usize,
}

impl Default for RoomDefaultsConfig {
    fn default() -> Self {
        Self {
            rng_seed: None,
            inbox_capacity: 64,
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            outbox_capacity: 64,
            burst_limit: 10,
            sustained_limit: 120,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND,
            metrics_bind: None,
            rooms: RoomDefaultsConfig::default(),
            connection: ConnectionConfig::default(),
        }
    }
}

/// Values given on the command line, which win over the environment
#[derive(Debug, Clone, Copy, Default)]
pub struct CliOverrides {
    pub bind: Option<SocketAddr>,
    pub metrics_bind: Option<SocketAddr>,
    pub rng_seed: Option<u64>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a set variable cannot be parsed
    pub fn from_env(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bind = match overrides.bind {
            Some(bind) => bind,
            None => parse_env("SERVER_BIND")?.unwrap_or(defaults.bind),
        };
        let metrics_bind = match overrides.metrics_bind {
            Some(addr) => Some(addr),
            None => parse_env("METRICS_BIND")?,
        };
        let rng_seed = match overrides.rng_seed {
            Some(seed) => Some(seed),
            None => parse_env("RNG_SEED")?,
        };

        let rooms = RoomDefaultsConfig {
            rng_seed,
            inbox_capacity: parse_env_or("ROOM_INBOX_CAPACITY", defaults.rooms.inbox_capacity),
        };
        let connection = ConnectionConfig {
            outbox_capacity: parse_env_or(
                "CONNECTION_OUTBOX_CAPACITY",
                defaults.connection.outbox_capacity,
            ),
            burst_limit: parse_env_or("WS_BURST_LIMIT", defaults.connection.burst_limit),
            sustained_limit: parse_env_or("WS_SUSTAINED_LIMIT", defaults.connection.sustained_limit),
        };

        Ok(Self {
            bind,
            metrics_bind,
            rooms,
            connection,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rooms.inbox_capacity == 0 {
            return Err(ConfigError::Invalid {
                var: "ROOM_INBOX_CAPACITY".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.connection.outbox_capacity == 0 {
            return Err(ConfigError::Invalid {
                var: "CONNECTION_OUTBOX_CAPACITY".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.connection.burst_limit == 0 {
            return Err(ConfigError::Invalid {
                var: "WS_BURST_LIMIT".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.connection.sustained_limit < self.connection.burst_limit {
            return Err(ConfigError::Invalid {
                var: "WS_SUSTAINED_LIMIT".to_string(),
                reason: format!(
                    "Must be at least the burst limit ({})",
                    self.connection.burst_limit
                ),
            });
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server address ({})", self.bind),
            });
        }

        Ok(())
    }

    /// Settings for the room registry
    pub fn manager_settings(&self) -> ManagerSettings {
        ManagerSettings {
            base_seed: self.rooms.rng_seed,
            inbox_capacity: Some(self.rooms.inbox_capacity),
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parses an optional variable; set but unparsable is an error.
fn parse_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().map(Some).map_err(|e| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("{e}"),
        }),
        Err(_) => Ok(None),
    }
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
