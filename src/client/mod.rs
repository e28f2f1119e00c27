// Module declarations
mod builder;
mod connection;
mod core;
mod pending;
mod state;
mod subscriptions;

// Public API exports
pub use builder::{MailboxClientBuilder, MailboxClientOptions};
pub use connection::{ConnectionManager, ConnectionState};
pub use self::core::MailboxClient;
pub use pending::PendingRequests;
pub use state::{ClientState, Credentials, ReconnectContext};
pub use subscriptions::{SubscriptionRegistry, SubscriptionState};
