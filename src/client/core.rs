use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{
    ClientState, ConnectionManager, ConnectionState, Credentials, MailboxClientBuilder,
    MailboxClientOptions, SubscriptionState,
};
use crate::messaging::{codec, ClientEvent, EventBus, EventKind, ListenerId, MessageRouter, RouteOutcome};
use crate::socket::{SocketConnector, SocketEvent, SocketStream};
use crate::types::{close_codes, ClientMessage, MailboxError, Result};

/// Realtime client for the mailbox service.
///
/// `MailboxClient` owns the connection to the server, multiplexes channel
/// subscriptions and paginated fetches over it, correlates replies to their
/// requests, and reconnects with capped exponential backoff after abnormal
/// closures, replaying active subscriptions.
///
/// # Example
///
/// ```no_run
/// use mailbox_realtime_rs::{Credentials, MailboxClient, MailboxClientOptions};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = MailboxClient::new(
///     "wss://mail.example.com/realtime",
///     MailboxClientOptions::default(),
/// )?;
///
/// client.connect(Credentials::new("user-1", "token")).await?;
/// client.subscribe("mailboxes", json!({})).await?;
/// let page = client.fetch("messages", json!({"mailboxId": "inbox123"})).await?;
/// println!("{page}");
/// client.disconnect().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MailboxClient {
    pub(crate) endpoint: String,
    pub(crate) options: MailboxClientOptions,
    pub(crate) connector: Arc<dyn SocketConnector>,
    pub(crate) connection: Arc<ConnectionManager>,
    pub(crate) events: Arc<EventBus>,
    pub(crate) state: Arc<RwLock<ClientState>>,
}

impl MailboxClient {
    /// Creates a client without connecting; call
    /// [`connect()`](Self::connect) to establish the connection.
    ///
    /// # Errors
    ///
    /// Returns [`MailboxError::UrlParse`] if the endpoint URL is malformed.
    pub fn new(endpoint: impl Into<String>, options: MailboxClientOptions) -> Result<Self> {
        MailboxClientBuilder::new(endpoint, options).map(|builder| builder.build())
    }

    /// Establishes the connection and stores `credentials` for reconnection
    /// replay.
    ///
    /// A no-op when already connected; fails with
    /// [`MailboxError::AlreadyConnecting`] when a connect is in flight.
    /// Resolves once the transport is open: the reconnect attempt counter
    /// resets to zero and, when auto-resubscribe is enabled, previously
    /// active subscriptions are replayed. Rejects on transport error or
    /// establishment timeout, leaving the client disconnected.
    pub async fn connect(&self, credentials: Credentials) -> Result<()> {
        match self.connection.state().await {
            ConnectionState::Connected => return Ok(()),
            ConnectionState::Connecting => return Err(MailboxError::AlreadyConnecting),
            _ => {}
        }

        {
            let mut state = self.state.write().await;
            state.cancel_reconnect();
            state.credentials = Some(credentials);
        }

        self.connection.transition(ConnectionState::Connecting).await;
        tracing::info!("Connecting to {}", self.endpoint);

        let attempt = self.connector.connect(&self.endpoint);
        let opened = tokio::time::timeout(self.options.connect_timeout, attempt).await;
        let (sink, stream) = match opened {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => {
                tracing::error!("Connection failed: {}", e);
                self.connection
                    .transition(ConnectionState::Disconnected)
                    .await;
                return Err(e);
            }
            Err(_) => {
                tracing::error!("Connection attempt timed out");
                self.connection
                    .transition(ConnectionState::Disconnected)
                    .await;
                return Err(MailboxError::ConnectTimeout);
            }
        };

        self.connection.set_sink(sink).await;

        {
            let mut state = self.state.write().await;
            state.epoch += 1;
            state.reconnect.reset();

            let client = self.clone();
            let epoch = state.epoch;
            state
                .task_manager
                .spawn(async move { client.read_loop(stream, epoch).await });
        }

        self.connection.transition(ConnectionState::Connected).await;
        self.events.emit(&ClientEvent::Connected);
        tracing::info!("Connected to {}", self.endpoint);

        if self.options.auto_resubscribe {
            let snapshot = { self.state.read().await.subscriptions.snapshot() };
            if !snapshot.is_empty() {
                self.replay_subscriptions(snapshot).await;
            }
        }

        Ok(())
    }

    /// Gracefully disconnects; the client will not reconnect on its own.
    ///
    /// Cancels any scheduled reconnection, rejects every pending correlated
    /// request with a connection-closed error, and clears the stored
    /// credentials. Idempotent and terminal regardless of prior state.
    pub async fn disconnect(&self) -> Result<()> {
        if self.connection.state().await == ConnectionState::Disconnected {
            // a scheduled reconnect could still revive the connection later
            self.state.write().await.cancel_reconnect();
            return Ok(());
        }
        self.disconnect_with(close_codes::USER_DISCONNECT, "client disconnect")
            .await
    }

    pub(crate) async fn disconnect_with(&self, code: u16, reason: &str) -> Result<()> {
        tracing::info!("Disconnecting (code {}): {}", code, reason);

        {
            let mut state = self.state.write().await;
            state.cancel_reconnect();
        }

        self.connection
            .transition(ConnectionState::Disconnecting)
            .await;

        {
            let mut state = self.state.write().await;
            state.epoch += 1;
            state.task_manager.abort_all();
            state.pending.reject_all(|| MailboxError::ConnectionClosed);
            state.subscriptions.deactivate_all();
            state.credentials = None;
        }

        if let Err(e) = self.connection.close(code, reason).await {
            tracing::warn!("Transport close failed: {}", e);
        }

        self.connection
            .transition(ConnectionState::Disconnected)
            .await;
        self.events.emit(&ClientEvent::Disconnected {
            code,
            reason: reason.to_string(),
        });
        Ok(())
    }

    /// Subscribes to `channel` with channel-specific `params`.
    ///
    /// The wire request carries the stored credentials merged under the
    /// caller's params. Subscribing to an already-subscribed channel resends
    /// the request and refreshes the single registry entry. Resolves with
    /// the server's response payload.
    pub async fn subscribe(&self, channel: &str, params: Value) -> Result<Value> {
        let data = {
            let state = self.state.read().await;
            let credentials = state
                .credentials
                .as_ref()
                .ok_or(MailboxError::NotConnected)?;
            let mut merged = Map::new();
            merged.insert("userId".to_string(), credentials.user_id.clone().into());
            merged.insert("token".to_string(), credentials.access_token.clone().into());
            if let Value::Object(extra) = &params {
                merged.extend(extra.clone());
            }
            Value::Object(merged)
        };

        let response = self
            .send_and_wait(codec::subscribe(channel, data))
            .await?;

        {
            let mut state = self.state.write().await;
            state.subscriptions.upsert(channel, params);
        }
        tracing::info!("Subscribed to channel '{}'", channel);
        Ok(response)
    }

    /// Unsubscribes from `channel`.
    ///
    /// A silent no-op when the channel is not subscribed. Otherwise sends
    /// one best-effort unsubscribe frame (no reply is awaited; a send
    /// failure is only logged) and unconditionally removes the registry
    /// entry.
    pub async fn unsubscribe(&self, channel: &str) -> Result<()> {
        let subscribed = { self.state.read().await.subscriptions.contains(channel) };
        if !subscribed {
            return Ok(());
        }

        match codec::serialize(&codec::unsubscribe(channel, None)) {
            Ok(text) => {
                if let Err(e) = self.connection.send_text(text).await {
                    tracing::debug!("Unsubscribe send failed on '{}': {}", channel, e);
                }
            }
            Err(e) => tracing::warn!("Could not serialize unsubscribe for '{}': {}", channel, e),
        }

        self.state.write().await.subscriptions.remove(channel);
        tracing::info!("Unsubscribed from channel '{}'", channel);
        Ok(())
    }

    /// Issues a paginated fetch on `channel` and resolves with the server's
    /// response payload.
    pub async fn fetch(&self, channel: &str, params: Value) -> Result<Value> {
        self.send_and_wait(codec::fetch(channel, params)).await
    }

    /// Sends a correlated request and awaits its reply under the request
    /// timeout.
    async fn send_and_wait(&self, message: ClientMessage) -> Result<Value> {
        if !self.connection.is_connected().await {
            return Err(MailboxError::NotConnected);
        }

        let channel = message.channel.clone();
        let text = codec::serialize(&message)?;

        let (seq, reply) = {
            let mut state = self.state.write().await;
            state.pending.register(&channel)
        };

        if let Err(e) = self.connection.send_text(text).await {
            let mut state = self.state.write().await;
            state.pending.remove_if_seq(&channel, seq);
            return Err(e);
        }

        match tokio::time::timeout(self.options.request_timeout, reply).await {
            Ok(Ok(result)) => result,
            // sender dropped without a reply: the entry was torn down
            Ok(Err(_)) => Err(MailboxError::ConnectionClosed),
            Err(_) => {
                let mut state = self.state.write().await;
                state.pending.remove_if_seq(&channel, seq);
                tracing::warn!("Request on channel '{}' timed out", channel);
                Err(MailboxError::RequestTimeout(channel))
            }
        }
    }

    /// Consumes transport events for one connection session.
    async fn read_loop(self, mut stream: Box<dyn SocketStream>, epoch: u64) {
        let router = MessageRouter::new(Arc::clone(&self.state), Arc::clone(&self.events));
        tracing::debug!("Read task started (session {})", epoch);

        while let Some(event) = stream.next().await {
            match event {
                SocketEvent::Frame(frame) => match codec::parse(&frame) {
                    Ok(message) => {
                        if let RouteOutcome::Disconnected { code, reason } =
                            router.route(message).await
                        {
                            self.handle_closure(code, &reason, epoch).await;
                            return;
                        }
                    }
                    // malformed input degrades to an error event; the
                    // connection stays open
                    Err(e) => {
                        tracing::warn!("Dropping undecodable frame: {}", e);
                        self.events.emit(&ClientEvent::Error(Arc::new(e)));
                    }
                },
                SocketEvent::Closed(close) => {
                    self.handle_closure(close.code, &close.reason, epoch).await;
                    return;
                }
                SocketEvent::Error(e) => {
                    tracing::error!("Transport error: {}", e);
                    self.events
                        .emit(&ClientEvent::Error(Arc::new(MailboxError::Connection(
                            e.clone(),
                        ))));
                    self.handle_closure(close_codes::ABNORMAL, &e, epoch).await;
                    return;
                }
            }
        }

        self.handle_closure(close_codes::ABNORMAL, "connection lost", epoch)
            .await;
    }

    /// Unsolicited-closure path shared by transport closes, transport
    /// errors, and server disconnect notices.
    async fn handle_closure(&self, code: u16, reason: &str, epoch: u64) {
        {
            let state = self.state.read().await;
            if state.epoch != epoch {
                // a newer session owns the connection now
                return;
            }
        }
        match self.connection.state().await {
            ConnectionState::Disconnecting | ConnectionState::Disconnected => return,
            _ => {}
        }

        tracing::warn!("Connection closed (code {}): {}", code, reason);

        if let Err(e) = self.connection.close(code, reason).await {
            tracing::debug!("Transport close after closure failed: {}", e);
        }
        {
            let mut state = self.state.write().await;
            state.pending.reject_all(|| MailboxError::ConnectionClosed);
            state.subscriptions.deactivate_all();
        }
        self.events.emit(&ClientEvent::Disconnected {
            code,
            reason: reason.to_string(),
        });

        if close_codes::is_deliberate(code) || !self.options.auto_reconnect {
            self.connection
                .transition(ConnectionState::Disconnected)
                .await;
            return;
        }

        self.schedule_reconnect().await;
    }

    /// Schedules the next reconnection attempt, or forces the terminal
    /// disconnect once attempts are exhausted.
    ///
    /// Boxed because a failed attempt re-enters this path from its own
    /// spawned task.
    fn schedule_reconnect(&self) -> BoxFuture<'static, ()> {
        let this = self.clone();
        Box::pin(async move {
            let scheduled = {
                let mut state = this.state.write().await;
                if state.reconnect.exhausted() {
                    None
                } else {
                    let delay = state.reconnect.next_delay();
                    state.reconnect.attempt += 1;
                    Some((state.reconnect.attempt, delay))
                }
            };

            let Some((attempt, delay)) = scheduled else {
                tracing::error!("Reconnection attempts exhausted");
                let _ = this
                    .disconnect_with(
                        close_codes::MAX_RECONNECTS_EXCEEDED,
                        "max reconnect attempts exceeded",
                    )
                    .await;
                return;
            };

            this.connection
                .transition(ConnectionState::Reconnecting)
                .await;
            this.events
                .emit(&ClientEvent::Reconnecting { attempt, delay });
            tracing::info!("Reconnection attempt {} in {:?}", attempt, delay);

            let client = this.clone();
            let handle = tokio::spawn(async move {
                tokio::time::sleep(delay).await;

                // this attempt now owns the slot; connect() must find nothing
                // to cancel or it would abort the task running it
                {
                    client.state.write().await.reconnect_task = None;
                }
                if client.connection.state().await != ConnectionState::Reconnecting {
                    // disconnect() won the race
                    return;
                }

                let credentials = { client.state.read().await.credentials.clone() };
                let Some(credentials) = credentials else {
                    // disconnect() cleared them; nothing to retry with
                    return;
                };

                match client.connect(credentials).await {
                    Ok(()) => tracing::info!("Reconnected on attempt {}", attempt),
                    Err(e) => {
                        tracing::error!("Reconnection attempt {} failed: {}", attempt, e);
                        client.events.emit(&ClientEvent::Error(Arc::new(e)));
                        client.schedule_reconnect().await;
                    }
                }
            });

            this.state.write().await.reconnect_task = Some(handle);
        })
    }

    /// Sequential replay over a stable registry snapshot; one channel's
    /// failure does not abort the rest.
    async fn replay_subscriptions(&self, snapshot: Vec<SubscriptionState>) {
        tracing::info!("Replaying {} subscription(s)", snapshot.len());
        for entry in snapshot {
            if let Err(e) = self.subscribe(&entry.channel, entry.params).await {
                tracing::warn!("Failed to replay subscription '{}': {}", entry.channel, e);
            }
        }
    }

    /// Full teardown: disconnect, drop every listener, forget subscriptions.
    pub async fn cleanup(&self) {
        let _ = self.disconnect().await;
        self.events.remove_all(None);
        let mut state = self.state.write().await;
        state.subscriptions.clear();
    }

    /// Registers a listener and returns its id for [`off`](Self::off).
    pub fn on<F>(&self, kind: EventKind, callback: F) -> ListenerId
    where
        F: Fn(&ClientEvent) + Send + Sync + 'static,
    {
        self.events.on(kind, callback)
    }

    pub fn off(&self, kind: EventKind, id: ListenerId) {
        self.events.off(kind, id);
    }

    /// Clears one event kind's listeners, or all of them.
    pub fn remove_all_listeners(&self, kind: Option<EventKind>) {
        self.events.remove_all(kind);
    }

    pub async fn state(&self) -> ConnectionState {
        self.connection.state().await
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.is_connected().await
    }

    pub async fn reconnect_attempts(&self) -> u32 {
        self.state.read().await.reconnect.attempt
    }

    pub async fn active_subscriptions(&self) -> Vec<SubscriptionState> {
        self.state.read().await.subscriptions.snapshot()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
