//! WebSocket transport on `tokio-tungstenite`.

use std::fmt;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::{Connector, Endpoint, FrameReader, FrameWriter, Security};
use crate::error::ChannelError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connector for real `ws://` and `wss://` endpoints.
///
/// Secure channels are available only when the crate is built with the
/// `tls` feature (on by default).
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl WsConnector {
    /// Creates a connector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Connector for WsConnector {
    type Reader = WsReader;
    type Writer = WsWriter;

    fn supports(&self, security: Security) -> bool {
        match security {
            Security::Plain => true,
            Security::Secure => cfg!(feature = "tls"),
        }
    }

    async fn connect(&self, endpoint: &Endpoint) -> Result<(WsWriter, WsReader), ChannelError> {
        let url = endpoint.url();
        if endpoint.security == Security::Secure {
            install_crypto_provider();
        }
        let (stream, response) = connect_async(url.as_str())
            .await
            .map_err(|e| ChannelError::Connect(format!("{url}: {e}")))?;
        tracing::debug!(%url, status = %response.status(), "websocket handshake complete");

        let (sink, stream) = stream.split();
        Ok((WsWriter { sink }, WsReader { stream }))
    }
}

/// Installs `ring` as the process-wide rustls provider unless one is set.
#[cfg(feature = "tls")]
fn install_crypto_provider() {
    if rustls::crypto::CryptoProvider::get_default().is_none() {
        // Losing the race to another installer is fine.
        let _ = rustls::crypto::ring::default_provider().install_default();
    }
}

#[cfg(not(feature = "tls"))]
const fn install_crypto_provider() {}

/// Receiving half of a WebSocket channel.
pub struct WsReader {
    stream: SplitStream<WsStream>,
}

impl fmt::Debug for WsReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsReader").finish_non_exhaustive()
    }
}

impl FrameReader for WsReader {
    async fn next_frame(&mut self) -> Option<Result<String, ChannelError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => {
                        tracing::warn!(len = bytes.len(), "dropping non-UTF-8 binary frame");
                    }
                },
                Ok(Message::Close(frame)) => {
                    tracing::debug!(?frame, "peer sent close frame");
                    return None;
                }
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Err(e) => return Some(Err(ChannelError::Transport(e.to_string()))),
            }
        }
    }
}

/// Sending half of a WebSocket channel.
pub struct WsWriter {
    sink: SplitSink<WsStream, Message>,
}

impl fmt::Debug for WsWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsWriter").finish_non_exhaustive()
    }
}

impl FrameWriter for WsWriter {
    async fn write_frame(&mut self, text: String) -> Result<(), ChannelError> {
        self.sink
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        self.sink
            .close()
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_always_supported() {
        assert!(WsConnector::new().supports(Security::Plain));
    }

    #[test]
    fn secure_support_follows_tls_feature() {
        assert_eq!(
            WsConnector::new().supports(Security::Secure),
            cfg!(feature = "tls")
        );
    }

    #[tokio::test]
    async fn connect_to_closed_port_fails() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await;
        let Ok(listener) = listener else {
            return;
        };
        let Ok(addr) = listener.local_addr() else {
            return;
        };
        drop(listener);

        let endpoint = Endpoint::new(addr.to_string(), "/moi-ws/", Security::Plain);
        let result = WsConnector::new().connect(&endpoint).await;
        assert!(matches!(result, Err(ChannelError::Connect(_))));
    }

    #[cfg(feature = "tls")]
    #[tokio::test]
    async fn failed_tls_handshake_is_a_connect_error() {
        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            return;
        };
        let Ok(addr) = listener.local_addr() else {
            return;
        };
        // Accept the TCP connection, then hang up mid-handshake.
        tokio::spawn(async move {
            if let Ok((socket, _)) = listener.accept().await {
                drop(socket);
            }
        });

        let endpoint = Endpoint::new(addr.to_string(), "/moi-ws/", Security::Secure);
        let result = WsConnector::new().connect(&endpoint).await;
        assert!(matches!(result, Err(ChannelError::Connect(_))));
        assert!(rustls::crypto::CryptoProvider::get_default().is_some());
    }
}
