//! Client configuration
//!
//! Environment:
//! - `POKER_GATEWAY_URL`: websocket address of the gateway (default `ws://localhost:8000/ws`)
//! - `POKER_TOKEN`: access token, sent as the `token` query parameter (optional)
//! - `POKER_RECONNECT_DELAY_MS`: delay before reconnecting after an unclean close (default 2000)
//! - `POKER_RPC_TIMEOUT_MS`: give up on a request after this long (optional, default never)
//! - `POKER_GATEWAY_SERVICE`: `correlation_id` of outbound frames (default `gateway_service`)
//! - `POKER_STORAGE_DIR`: directory for locally remembered values (default `.poker`)
//! - `POKER_ID`: poker to open on start (optional)
//! - `POKER_PARTICIPANT_NAME`: name to join `POKER_ID` under when no participant is remembered (optional)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::protocol::GATEWAY_SERVICE;
use crate::transport::{TransportConfig, DEFAULT_RECONNECT_DELAY};

pub const DEFAULT_GATEWAY_URL: &str = "ws://localhost:8000/ws";
pub const DEFAULT_STORAGE_DIR: &str = ".poker";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything the client binary needs to connect
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub gateway_url: String,
    pub token: Option<String>,
    pub reconnect_delay: Duration,
    pub rpc_timeout: Option<Duration>,
    pub gateway_service: String,
    pub storage_dir: PathBuf,
    pub poker_id: Option<String>,
    pub participant_name: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            token: None,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            rpc_timeout: None,
            gateway_service: GATEWAY_SERVICE.to_string(),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            poker_id: None,
            participant_name: None,
        }
    }
}

impl ClientConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from any variable source. Unset and empty variables keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = var("POKER_GATEWAY_URL") {
            if !url.starts_with("ws://") && !url.starts_with("wss://") {
                return Err(ConfigError::Invalid {
                    name: "POKER_GATEWAY_URL",
                    value: url,
                    reason: "expected a ws:// or wss:// address".to_string(),
                });
            }
            config.gateway_url = url;
        }
        config.token = var("POKER_TOKEN");
        if let Some(raw) = var("POKER_RECONNECT_DELAY_MS") {
            config.reconnect_delay = parse_millis("POKER_RECONNECT_DELAY_MS", raw)?;
        }
        if let Some(raw) = var("POKER_RPC_TIMEOUT_MS") {
            config.rpc_timeout = Some(parse_millis("POKER_RPC_TIMEOUT_MS", raw)?);
        }
        if let Some(service) = var("POKER_GATEWAY_SERVICE") {
            config.gateway_service = service;
        }
        if let Some(dir) = var("POKER_STORAGE_DIR") {
            config.storage_dir = PathBuf::from(dir);
        }
        config.poker_id = var("POKER_ID");
        config.participant_name = var("POKER_PARTICIPANT_NAME");

        Ok(config)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Address to connect to, with the token appended as a query parameter
    pub fn connection_url(&self) -> String {
        let Some(token) = &self.token else {
            return self.gateway_url.clone();
        };
        let separator = if self.gateway_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}token={}",
            self.gateway_url,
            separator,
            urlencoding::encode(token)
        )
    }

    /// Transport settings derived from this configuration
    pub fn transport(&self) -> TransportConfig {
        let config = TransportConfig::default()
            .with_gateway_service(self.gateway_service.clone())
            .with_reconnect_delay(self.reconnect_delay);
        match self.rpc_timeout {
            Some(timeout) => config.with_rpc_timeout(timeout),
            None => config,
        }
    }
}

fn parse_millis(name: &'static str, raw: String) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(ms) => Ok(Duration::from_millis(ms)),
        Err(e) => Err(ConfigError::Invalid {
            name,
            value: raw,
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.reconnect_delay, Duration::from_millis(2000));
        assert!(config.rpc_timeout.is_none());
    }

    #[test]
    fn test_reads_every_variable() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("POKER_GATEWAY_URL", "wss://poker.example/ws"),
            ("POKER_TOKEN", "abc"),
            ("POKER_RECONNECT_DELAY_MS", "500"),
            ("POKER_RPC_TIMEOUT_MS", "10000"),
            ("POKER_GATEWAY_SERVICE", "edge"),
            ("POKER_STORAGE_DIR", "/tmp/poker"),
            ("POKER_ID", "p1"),
            ("POKER_PARTICIPANT_NAME", "Ana"),
        ]))
        .unwrap();

        assert_eq!(config.gateway_url, "wss://poker.example/ws");
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.reconnect_delay, Duration::from_millis(500));
        assert_eq!(config.rpc_timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.gateway_service, "edge");
        assert_eq!(config.storage_dir, PathBuf::from("/tmp/poker"));
        assert_eq!(config.poker_id.as_deref(), Some("p1"));
        assert_eq!(config.participant_name.as_deref(), Some("Ana"));

        let transport = config.transport();
        assert_eq!(transport.gateway_service, "edge");
        assert_eq!(transport.rpc_timeout, Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[("POKER_RPC_TIMEOUT_MS", "soon")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { name: "POKER_RPC_TIMEOUT_MS", .. }
        ));
    }

    #[test]
    fn test_non_websocket_url_is_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[("POKER_GATEWAY_URL", "http://x")])).unwrap_err();
        assert!(err.to_string().contains("POKER_GATEWAY_URL"));
    }

    #[test]
    fn test_connection_url_encodes_token() {
        let config = ClientConfig::default().with_token("a b&c");
        assert_eq!(config.connection_url(), "ws://localhost:8000/ws?token=a%20b%26c");

        let config = ClientConfig {
            gateway_url: "ws://host/ws?room=1".to_string(),
            ..ClientConfig::default()
        }
        .with_token("t");
        assert_eq!(config.connection_url(), "ws://host/ws?room=1&token=t");
    }

    #[test]
    fn test_connection_url_without_token() {
        assert_eq!(ClientConfig::default().connection_url(), DEFAULT_GATEWAY_URL);
    }
}
