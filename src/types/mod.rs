pub mod constants;
pub mod error;
pub mod message;

pub use constants::*;
pub use error::{MailboxError, Result};
pub use message::{ClientMessage, ClientMessageType, ServerMessage, ServerMessageType, ServerPayload};
