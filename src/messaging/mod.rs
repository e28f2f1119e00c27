// Messaging module - protocol codec, event dispatch and message routing
pub mod codec;
pub mod event;
pub mod router;

pub use event::{ClientEvent, EventBus, EventKind, ListenerId};
pub use router::{MessageRouter, RouteOutcome};
