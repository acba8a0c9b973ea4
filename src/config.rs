// MIT License - Copyright (c) 2026 Peter Wright
// Lares4 WebSocket client

use std::time::Duration;

use crate::constants::{WS_PATH, WS_SUBPROTOCOL};
use crate::error::{Lares4Error, Result};

/// Configuration for connecting to a Lares4 panel.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Panel host name or IP, optionally with `:port`
    pub host: String,
    /// Our sender identity; push updates are addressed to it
    pub sender: String,
    /// User PIN
    pub pin: String,
    /// WebSocket path (default: `/KseniaWsock`)
    pub path: String,
    /// WebSocket subprotocol (default: `KS_WSOCK`)
    pub subprotocol: String,
    /// Skip TLS certificate validation. Panels ship self-signed certificates,
    /// so this defaults to `true`.
    pub accept_invalid_certs: bool,
    /// Give up on the login reply after this long (default: wait forever)
    pub login_timeout: Option<Duration>,
    /// Give up on the bootstrap replies after this long (default: wait forever)
    pub bootstrap_timeout: Option<Duration>,
    /// Capacity of each change channel
    pub event_capacity: usize,
    /// Capacity of the outgoing frame queue
    pub outgoing_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.100".to_string(),
            sender: "lares4-ws".to_string(),
            pin: String::new(),
            path: WS_PATH.to_string(),
            subprotocol: WS_SUBPROTOCOL.to_string(),
            accept_invalid_certs: true,
            login_timeout: None,
            bootstrap_timeout: None,
            event_capacity: 256,
            outgoing_capacity: 64,
        }
    }
}

impl ClientConfig {
    /// Create a new config builder starting from defaults.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// `wss://` URL of the panel endpoint.
    pub fn url(&self) -> String {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };
        format!("wss://{}{}", self.host, path)
    }

    /// Reject configurations the panel could never accept.
    pub fn validate(&self) -> Result<()> {
        let invalid = |details: &str| {
            Err(Lares4Error::InvalidConfig {
                details: details.to_string(),
            })
        };
        if self.host.trim().is_empty() {
            return invalid("host is empty");
        }
        if self.sender.is_empty() {
            return invalid("sender is empty");
        }
        if self.pin.is_empty() {
            return invalid("pin is empty");
        }
        if self.event_capacity == 0 || self.outgoing_capacity == 0 {
            return invalid("channel capacities must be non-zero");
        }
        Ok(())
    }
}

/// Builder for ClientConfig.
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.config.sender = sender.into();
        self
    }

    pub fn pin(mut self, pin: impl Into<String>) -> Self {
        self.config.pin = pin.into();
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.config.path = path.into();
        self
    }

    pub fn subprotocol(mut self, subprotocol: impl Into<String>) -> Self {
        self.config.subprotocol = subprotocol.into();
        self
    }

    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.config.accept_invalid_certs = accept;
        self
    }

    pub fn login_timeout(mut self, timeout: Duration) -> Self {
        self.config.login_timeout = Some(timeout);
        self
    }

    pub fn bootstrap_timeout(mut self, timeout: Duration) -> Self {
        self.config.bootstrap_timeout = Some(timeout);
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    pub fn outgoing_capacity(mut self, capacity: usize) -> Self {
        self.config.outgoing_capacity = capacity;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::builder()
            .host("10.0.0.5")
            .sender("monitor")
            .pin("123456")
            .login_timeout(Duration::from_secs(5))
            .build();

        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.sender, "monitor");
        assert_eq!(config.pin, "123456");
        assert_eq!(config.login_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.bootstrap_timeout, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::builder().build();
        assert_eq!(config.path, "/KseniaWsock");
        assert_eq!(config.subprotocol, "KS_WSOCK");
        assert!(config.accept_invalid_certs);
        assert_eq!(config.event_capacity, 256);
    }

    #[test]
    fn test_url() {
        let config = ClientConfig::builder().host("panel.local:8443").build();
        assert_eq!(config.url(), "wss://panel.local:8443/KseniaWsock");

        let config = ClientConfig::builder().host("10.0.0.5").path("ws").build();
        assert_eq!(config.url(), "wss://10.0.0.5/ws");
    }

    #[test]
    fn test_validate() {
        let config = ClientConfig::builder().host("10.0.0.5").build();
        assert!(matches!(
            config.validate(),
            Err(Lares4Error::InvalidConfig { .. })
        ));

        let config = ClientConfig::builder()
            .host(" ")
            .pin("1")
            .build();
        assert!(config.validate().is_err());

        let config = ClientConfig::builder()
            .host("10.0.0.5")
            .pin("1")
            .event_capacity(0)
            .build();
        assert!(config.validate().is_err());
    }
}
