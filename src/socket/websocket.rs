use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream, StreamExt};
use futures::SinkExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::{CloseEvent, SocketConnector, SocketEvent, SocketSink, SocketStream, WireFrame};
use crate::types::{close_codes, MailboxError, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Default transport: a tokio-tungstenite WebSocket connection.
pub struct WebSocketConnector;

#[async_trait]
impl SocketConnector for WebSocketConnector {
    async fn connect(&self, url: &str) -> Result<(Box<dyn SocketSink>, Box<dyn SocketStream>)> {
        tracing::debug!("Opening WebSocket connection to {}", url);
        let (ws_stream, _response) = tokio_tungstenite::connect_async(url).await?;
        let (write_half, read_half) = ws_stream.split();
        Ok((
            Box::new(WebSocketSink { inner: write_half }),
            Box::new(WebSocketReader { inner: read_half }),
        ))
    }
}

struct WebSocketSink {
    inner: SplitSink<WsStream, Message>,
}

#[async_trait]
impl SocketSink for WebSocketSink {
    async fn send(&mut self, frame: WireFrame) -> Result<()> {
        let message = match frame {
            WireFrame::Text(text) => Message::Text(text),
            WireFrame::Binary(bytes) => Message::Binary(bytes),
            WireFrame::Other(kind) => return Err(MailboxError::UnsupportedFrame(kind)),
        };
        self.inner.send(message).await?;
        Ok(())
    }

    async fn close(&mut self, code: u16, reason: &str) -> Result<()> {
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: reason.to_string().into(),
        };
        self.inner.send(Message::Close(Some(frame))).await?;
        Ok(())
    }
}

struct WebSocketReader {
    inner: SplitStream<WsStream>,
}

#[async_trait]
impl SocketStream for WebSocketReader {
    async fn next(&mut self) -> Option<SocketEvent> {
        loop {
            let message = match self.inner.next().await? {
                Ok(message) => message,
                Err(e) => return Some(SocketEvent::Error(e.to_string())),
            };

            match message {
                Message::Text(text) => {
                    return Some(SocketEvent::Frame(WireFrame::Text(text)));
                }
                Message::Binary(bytes) => {
                    return Some(SocketEvent::Frame(WireFrame::Binary(bytes)));
                }
                Message::Close(frame) => {
                    let (code, reason) = match frame {
                        Some(close_frame) => (
                            u16::from(close_frame.code),
                            close_frame.reason.to_string(),
                        ),
                        None => (close_codes::ABNORMAL, String::new()),
                    };
                    return Some(SocketEvent::Closed(CloseEvent { code, reason }));
                }
                // tungstenite answers pings itself on the next flush
                Message::Ping(data) => {
                    tracing::debug!("Received ping ({} bytes)", data.len());
                }
                Message::Pong(data) => {
                    tracing::debug!("Received pong ({} bytes)", data.len());
                }
                Message::Frame(_) => {
                    return Some(SocketEvent::Frame(WireFrame::Other("raw frame")));
                }
            }
        }
    }
}
