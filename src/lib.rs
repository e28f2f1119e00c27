//! # Mailbox Realtime Rust
//!
//! Realtime client for the mailbox service WebSocket API: channel
//! subscriptions, paginated fetches, push updates, and transparent
//! reconnection with capped exponential backoff.
//!
//! ## Example
//!
//! ```no_run
//! use mailbox_realtime_rs::{Credentials, MailboxClient, MailboxClientOptions};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MailboxClient::new(
//!         "wss://mail.example.com/realtime",
//!         MailboxClientOptions::default(),
//!     )?;
//!
//!     client.connect(Credentials::new("user-1", "access-token")).await?;
//!     client.subscribe("mailboxes", json!({})).await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod infrastructure;
pub mod messaging;
pub mod socket;
pub mod types;

pub use client::{
    ConnectionState, Credentials, MailboxClient, MailboxClientBuilder, MailboxClientOptions,
    SubscriptionState,
};
pub use messaging::{ClientEvent, EventKind, ListenerId};
pub use socket::{SocketConnector, SocketEvent, SocketSink, SocketStream, WireFrame};
pub use types::{MailboxError, Result};
