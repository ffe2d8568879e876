//! Long-lived stream supervision.
//!
//! Each stream runs `Connecting -> Open -> (Connecting | Closed)`. Abnormal
//! closure goes back to `Connecting`; a decode failure or an exhausted retry
//! budget ends the task with an error; the shutdown signal ends it cleanly.
//! One stream failing never affects another.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{ debug, error, info, warn };
use url::Url;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FeedError {
    #[error("failed to connect: {0}")]
    Connect(String),

    /// Reset, EOF or close frame from the remote side
    #[error("connection closed abnormally: {0}")]
    Disconnected(String),

    #[error("malformed payload: {0}")]
    Decode(String),

    #[error("gave up after {attempts} connection attempts: {last}")] RetriesExhausted {
        attempts: u32,
        last: String,
    },
}

/// One open duplex connection
#[async_trait]
pub trait FeedConnection: Send {
    /// Next text payload. Keepalive pings are answered inside.
    async fn next_text(&mut self) -> Result<String, FeedError>;

    async fn close(&mut self);
}

#[async_trait]
pub trait FeedConnector: Send + Sync {
    async fn connect(&self, url: &Url) -> Result<Box<dyn FeedConnection>, FeedError>;
}

/// Consumer of decoded payloads. An error is fatal for the stream.
pub trait FeedHandler: Send {
    fn on_text(&mut self, text: &str) -> Result<(), FeedError>;
}

/// Fixed delay between attempts, capped per `Connecting` episode (0 = unlimited)
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl ReconnectPolicy {
    #[inline]
    fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts > 0 && attempts >= self.max_attempts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeedState {
    Connecting,
    Open,
}

/// Resolves once shutdown is signalled or the sender is gone
pub async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

pub struct FeedSupervisor<H: FeedHandler> {
    name: Arc<str>,
    url: Url,
    connector: Arc<dyn FeedConnector>,
    handler: H,
    policy: ReconnectPolicy,
    shutdown: watch::Receiver<bool>,
}

impl<H: FeedHandler> FeedSupervisor<H> {
    pub fn new(
        name: Arc<str>,
        url: Url,
        connector: Arc<dyn FeedConnector>,
        handler: H,
        policy: ReconnectPolicy,
        shutdown: watch::Receiver<bool>
    ) -> Self {
        Self { name, url, connector, handler, policy, shutdown }
    }

    /// Drive the stream until shutdown (Ok) or a fatal error
    pub async fn run(self) -> Result<(), FeedError> {
        let Self { name, url, connector, mut handler, policy, mut shutdown } = self;
        let mut attempts: u32 = 0;
        let mut state = FeedState::Connecting;

        loop {
            debug!(stream = %name, ?state, "Feed state");

            let connected =
                tokio::select! {
                biased;
                _ = wait_for_shutdown(&mut shutdown) => return Ok(()),
                result = connector.connect(&url) => result,
            };

            let mut connection = match connected {
                Ok(connection) => {
                    if attempts > 0 {
                        info!(stream = %name, attempts, "Reconnected");
                    } else {
                        info!(stream = %name, "Connected");
                    }
                    attempts = 0;
                    state = FeedState::Open;
                    connection
                }
                Err(err) => {
                    attempts += 1;
                    if policy.exhausted(attempts) {
                        error!(stream = %name, attempts, error = %err, "Giving up on stream");
                        return Err(FeedError::RetriesExhausted { attempts, last: err.to_string() });
                    }
                    warn!(stream = %name, attempts, error = %err, "Connection attempt failed, retrying");
                    tokio::select! {
                        biased;
                        _ = wait_for_shutdown(&mut shutdown) => return Ok(()),
                        _ = tokio::time::sleep(policy.delay) => {}
                    }
                    continue;
                }
            };

            debug!(stream = %name, ?state, "Feed state");

            loop {
                let frame =
                    tokio::select! {
                    biased;
                    _ = wait_for_shutdown(&mut shutdown) => {
                        connection.close().await;
                        info!(stream = %name, "Stream closed on shutdown");
                        return Ok(());
                    }
                    frame = connection.next_text() => frame,
                };

                match frame {
                    Ok(text) => {
                        if let Err(err) = handler.on_text(&text) {
                            error!(stream = %name, error = %err, "Stream handler failed");
                            connection.close().await;
                            return Err(err);
                        }
                    }
                    Err(FeedError::Disconnected(reason)) => {
                        warn!(stream = %name, %reason, "Connection lost, reconnecting");
                        state = FeedState::Connecting;
                        break;
                    }
                    Err(err) => {
                        error!(stream = %name, error = %err, "Fatal stream error");
                        connection.close().await;
                        return Err(err);
                    }
                }
            }

            // Bound the reconnect rate of a server that accepts and drops at once
            tokio::select! {
                biased;
                _ = wait_for_shutdown(&mut shutdown) => return Ok(()),
                _ = tokio::time::sleep(policy.delay) => {}
            }
        }
    }
}
