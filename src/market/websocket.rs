use async_trait::async_trait;
use futures::{ SinkExt, StreamExt };
use tokio::net::TcpStream;
use tokio_tungstenite::{ connect_async, MaybeTlsStream, WebSocketStream };
use tracing::debug;
use tungstenite::{ Error as WsError, Message };
use url::Url;

use super::feed::{ FeedConnection, FeedConnector, FeedError };

/// Connects plain `ws://` and TLS `wss://` endpoints
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

#[async_trait]
impl FeedConnector for WsConnector {
    async fn connect(&self, url: &Url) -> Result<Box<dyn FeedConnection>, FeedError> {
        let (stream, response) = connect_async(url.as_str()).await.map_err(|e|
            FeedError::Connect(format!("{}: {}", url, e))
        )?;
        debug!(%url, status = %response.status(), "Websocket handshake complete");
        Ok(Box::new(WsConnection { stream }))
    }
}

pub struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

/// Transport-level failures reconnect; anything else means the feed itself is broken
fn classify(err: WsError) -> FeedError {
    match err {
        | WsError::ConnectionClosed
        | WsError::AlreadyClosed
        | WsError::Io(_)
        | WsError::Protocol(_) => FeedError::Disconnected(err.to_string()),
        other => FeedError::Decode(other.to_string()),
    }
}

#[async_trait]
impl FeedConnection for WsConnection {
    async fn next_text(&mut self) -> Result<String, FeedError> {
        loop {
            let message = match self.stream.next().await {
                Some(Ok(message)) => message,
                Some(Err(err)) => {
                    return Err(classify(err));
                }
                None => {
                    return Err(FeedError::Disconnected("end of stream".to_string()));
                }
            };

            match message {
                Message::Text(text) => {
                    return Ok(text.to_string());
                }
                Message::Binary(data) => {
                    return String::from_utf8(data.to_vec()).map_err(|e| FeedError::Decode(e.to_string()));
                }
                Message::Ping(payload) => {
                    // Respond to ping immediately
                    self.stream.send(Message::Pong(payload)).await.map_err(classify)?;
                }
                Message::Close(frame) => {
                    let reason = frame
                        .map(|f| format!("close frame {}: {}", f.code, f.reason))
                        .unwrap_or_else(|| "close frame".to_string());
                    return Err(FeedError::Disconnected(reason));
                }
                Message::Pong(_) | Message::Frame(_) => {}
            }
        }
    }

    async fn close(&mut self) {
        if let Err(err) = self.stream.close(None).await {
            debug!(error = %err, "Websocket close failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_reconnect_and_others_are_fatal() {
        assert!(matches!(classify(WsError::ConnectionClosed), FeedError::Disconnected(_)));
        assert!(
            matches!(
                classify(WsError::Io(std::io::Error::from(std::io::ErrorKind::ConnectionReset))),
                FeedError::Disconnected(_)
            )
        );
        assert!(
            matches!(
                classify(WsError::Capacity(tungstenite::error::CapacityError::MessageTooLong { size: 10, max_size: 1 })),
                FeedError::Decode(_)
            )
        );
    }
}
