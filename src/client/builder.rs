use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use url::Url;

use super::{ClientState, ConnectionManager, MailboxClient, ReconnectContext};
use crate::infrastructure::Backoff;
use crate::messaging::EventBus;
use crate::socket::{SocketConnector, WebSocketConnector};
use crate::types::{
    Result, DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_BASE_DELAY,
    DEFAULT_RECONNECT_MAX_DELAY, DEFAULT_RECONNECT_MULTIPLIER, DEFAULT_REQUEST_TIMEOUT,
};

/// Client configuration.
#[derive(Debug, Clone)]
pub struct MailboxClientOptions {
    /// Timeout for each correlated subscribe/fetch request
    pub request_timeout: Duration,
    /// Timeout for connection establishment
    pub connect_timeout: Duration,
    /// Reconnect automatically after an abnormal closure
    pub auto_reconnect: bool,
    /// Replay active subscriptions after a successful reconnect
    pub auto_resubscribe: bool,
    pub reconnect_base_delay: Duration,
    pub reconnect_multiplier: f64,
    pub reconnect_max_delay: Duration,
    /// Reconnection attempt cap; 0 = unlimited
    pub max_reconnect_attempts: u32,
}

impl Default for MailboxClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT),
            auto_reconnect: true,
            auto_resubscribe: true,
            reconnect_base_delay: Duration::from_millis(DEFAULT_RECONNECT_BASE_DELAY),
            reconnect_multiplier: DEFAULT_RECONNECT_MULTIPLIER,
            reconnect_max_delay: Duration::from_millis(DEFAULT_RECONNECT_MAX_DELAY),
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
        }
    }
}

/// Builder for [`MailboxClient`]; validates the endpoint before `build()`.
pub struct MailboxClientBuilder {
    endpoint: String,
    options: MailboxClientOptions,
    connector: Option<Arc<dyn SocketConnector>>,
}

impl std::fmt::Debug for MailboxClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailboxClientBuilder")
            .field("endpoint", &self.endpoint)
            .field("options", &self.options)
            .field("connector", &self.connector.is_some())
            .finish()
    }
}

impl MailboxClientBuilder {
    pub fn new(endpoint: impl Into<String>, options: MailboxClientOptions) -> Result<Self> {
        let endpoint = endpoint.into();
        Url::parse(&endpoint)?;

        Ok(Self {
            endpoint,
            options,
            connector: None,
        })
    }

    /// Substitutes a custom transport (tests use an in-memory connector).
    pub fn connector(mut self, connector: Arc<dyn SocketConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn build(self) -> MailboxClient {
        let events = Arc::new(EventBus::new());
        let backoff = Backoff::new(
            self.options.reconnect_base_delay,
            self.options.reconnect_multiplier,
            self.options.reconnect_max_delay,
        );
        let reconnect = ReconnectContext::new(backoff, self.options.max_reconnect_attempts);

        MailboxClient {
            endpoint: self.endpoint,
            options: self.options,
            connector: self
                .connector
                .unwrap_or_else(|| Arc::new(WebSocketConnector)),
            connection: Arc::new(ConnectionManager::new(Arc::clone(&events))),
            events,
            state: Arc::new(RwLock::new(ClientState::new(reconnect))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MailboxError;

    #[test]
    fn test_rejects_malformed_endpoint() {
        let result = MailboxClientBuilder::new("not a url", MailboxClientOptions::default());
        assert!(matches!(result.unwrap_err(), MailboxError::UrlParse(_)));
    }

    #[test]
    fn test_default_options() {
        let options = MailboxClientOptions::default();
        assert!(options.auto_reconnect);
        assert!(options.auto_resubscribe);
        assert_eq!(options.max_reconnect_attempts, 0);
        assert_eq!(options.request_timeout, Duration::from_secs(10));
    }
}
