//! Server configuration parsed from environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroUsize;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_EVENT_BUFFER: usize = 1024;
/// The channel allocates its full capacity up front.
pub const MAX_EVENT_BUFFER: usize = 1 << 20;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {var}: {value:?} ({reason})")]
    Invalid { var: &'static str, value: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    /// Maximum number of actions kept on the board. `None` keeps everything.
    pub history_limit: Option<NonZeroUsize>,
    /// Capacity of the board event channel. Subscribers further behind are resynced.
    pub event_buffer: usize,
    /// Directory with the browser client, served as the router fallback.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            history_limit: None,
            event_buffer: DEFAULT_EVENT_BUFFER,
            static_dir: None,
        }
    }
}

impl ServerConfig {
    /// Build typed server config from environment variables.
    ///
    /// Optional:
    /// - `BIND_ADDR`: default `0.0.0.0`
    /// - `PORT`: default 3000
    /// - `BOARD_HISTORY_LIMIT`: unset or `0` keeps the full history
    /// - `BOARD_EVENT_BUFFER`: default 1024, between 1 and `MAX_EVENT_BUFFER`
    /// - `STATIC_DIR`: no static files when absent
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a variable is set but does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a variable is set but does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bind_addr = parse_var(&lookup, "BIND_ADDR")?.unwrap_or(defaults.bind_addr);
        let port = parse_var(&lookup, "PORT")?.unwrap_or(defaults.port);
        let history_limit = parse_var::<usize>(&lookup, "BOARD_HISTORY_LIMIT")?.and_then(NonZeroUsize::new);
        let event_buffer = match parse_var::<usize>(&lookup, "BOARD_EVENT_BUFFER")? {
            Some(n) if !(1..=MAX_EVENT_BUFFER).contains(&n) => {
                return Err(ConfigError::Invalid {
                    var: "BOARD_EVENT_BUFFER",
                    value: n.to_string(),
                    reason: format!("must be between 1 and {MAX_EVENT_BUFFER}"),
                });
            }
            Some(n) => n,
            None => defaults.event_buffer,
        };
        let static_dir = lookup("STATIC_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self { bind_addr, port, history_limit, event_buffer, static_dir })
    }

    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

/// Parse `key` if set. Blank values count as unset.
fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(|e| ConfigError::Invalid { var: key, value: raw.clone(), reason: e.to_string() })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
