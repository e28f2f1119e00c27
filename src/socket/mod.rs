// Socket module - transport seam consumed by the client core
pub mod websocket;

use async_trait::async_trait;

use crate::types::Result;

pub use websocket::WebSocketConnector;

/// One discrete message unit as delivered by the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum WireFrame {
    Text(String),
    Binary(Vec<u8>),
    /// A representation the codec cannot decode (raw/continuation frames)
    Other(&'static str),
}

/// Closure details reported by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct CloseEvent {
    pub code: u16,
    pub reason: String,
}

/// Events surfaced by the inbound half of a socket.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    Frame(WireFrame),
    Closed(CloseEvent),
    Error(String),
}

/// Outbound half of an established socket.
#[async_trait]
pub trait SocketSink: Send {
    async fn send(&mut self, frame: WireFrame) -> Result<()>;
    async fn close(&mut self, code: u16, reason: &str) -> Result<()>;
}

/// Inbound half of an established socket.
#[async_trait]
pub trait SocketStream: Send {
    /// Next transport event; `None` once the socket is exhausted.
    async fn next(&mut self) -> Option<SocketEvent>;
}

/// Opens bidirectional message sockets. The client core consumes this seam;
/// the default implementation is [`WebSocketConnector`].
#[async_trait]
pub trait SocketConnector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<(Box<dyn SocketSink>, Box<dyn SocketStream>)>;
}
