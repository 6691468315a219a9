//! Trade Update Stream Connection
//!
//! Maintains a single authenticated `trade_updates` connection and routes
//! each order event to the waiters subscribed to that order.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, Stream, StreamExt};
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;

use super::codec::{StreamMessage, TRADE_UPDATES_STREAM, auth_message, decode_message, listen_message};
use super::reconnect::ReconnectPolicy;
use super::router::OrderUpdateRouter;
use super::types::{StreamState, TradeStreamConfig, WebSocketError};
use crate::application::ports::{OrderUpdateStreamPort, OrderUpdateSubscription, StreamError};
use crate::domain::shared::OrderId;

/// Push source of order updates backed by the Alpaca trading stream.
///
/// The connection is opened on the first subscription and kept alive with
/// jittered reconnects until [`stop`](OrderUpdateStreamPort::stop) is called
/// or the shutdown token fires.
pub struct TradeUpdateStream {
    config: TradeStreamConfig,
    router: Arc<OrderUpdateRouter>,
    state: Arc<RwLock<StreamState>>,
    shutdown: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TradeUpdateStream {
    /// Create a stream; nothing connects until [`start`](Self::start) or the
    /// first subscription.
    #[must_use]
    pub fn new(config: TradeStreamConfig, shutdown: CancellationToken) -> Self {
        Self {
            config,
            router: OrderUpdateRouter::new(),
            state: Arc::new(RwLock::new(StreamState::Disconnected)),
            shutdown,
            task: Mutex::new(None),
        }
    }

    /// Spawn the connection task if it is not already running.
    pub fn start(&self) {
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|t| !t.is_finished()) || self.shutdown.is_cancelled() {
            return;
        }

        let config = self.config.clone();
        let router = Arc::clone(&self.router);
        let state = Arc::clone(&self.state);
        let shutdown = self.shutdown.clone();

        *task = Some(tokio::spawn(async move {
            run_stream(config, router, state, shutdown).await;
        }));
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> StreamState {
        *self.state.read()
    }

    /// Waiters currently registered.
    #[must_use]
    pub fn waiter_count(&self) -> usize {
        self.router.waiter_count()
    }
}

impl std::fmt::Debug for TradeUpdateStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradeUpdateStream")
            .field("url", &self.config.trade_updates_url())
            .field("state", &self.state())
            .field("waiters", &self.router.waiter_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl OrderUpdateStreamPort for TradeUpdateStream {
    async fn subscribe(
        &self,
        order_ids: &[OrderId],
    ) -> Result<OrderUpdateSubscription, StreamError> {
        if self.shutdown.is_cancelled() {
            return Err(StreamError::Stopped);
        }
        self.start();
        Ok(self.router.register(order_ids))
    }

    fn is_connected(&self) -> bool {
        self.state.read().is_live()
    }

    async fn stop(&self) {
        self.shutdown.cancel();
        self.router.clear();

        let handle = self.task.lock().take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            tracing::warn!(error = %e, "Trade update stream task ended abnormally");
        }
        *self.state.write() = StreamState::Stopped;
        tracing::info!("Trade update stream stopped");
    }
}

/// Connection loop with reconnection.
async fn run_stream(
    config: TradeStreamConfig,
    router: Arc<OrderUpdateRouter>,
    state: Arc<RwLock<StreamState>>,
    shutdown: CancellationToken,
) {
    let mut reconnect = ReconnectPolicy::from_config(&config);

    loop {
        if shutdown.is_cancelled() {
            break;
        }

        *state.write() = StreamState::Connecting;

        match connect_and_run(&config, &router, &state, &shutdown, &mut reconnect).await {
            Ok(()) => {
                tracing::info!("Trade update stream closed");
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Trade update stream error");
                *state.write() = StreamState::Disconnected;

                let Some(backoff) = reconnect.next_backoff() else {
                    tracing::error!(
                        attempts = reconnect.attempts(),
                        "Trade update stream reconnection attempts exhausted"
                    );
                    break;
                };
                crate::observability::record_stream_reconnect();
                tracing::info!(
                    backoff_ms = backoff.as_millis(),
                    attempt = reconnect.attempts(),
                    "Reconnecting trade update stream"
                );

                tokio::select! {
                    () = tokio::time::sleep(backoff) => {}
                    () = shutdown.cancelled() => break,
                }
            }
        }
    }

    let mut current = state.write();
    *current = if shutdown.is_cancelled() {
        StreamState::Stopped
    } else {
        StreamState::Disconnected
    };
}

async fn connect_and_run(
    config: &TradeStreamConfig,
    router: &OrderUpdateRouter,
    state: &RwLock<StreamState>,
    shutdown: &CancellationToken,
    reconnect: &mut ReconnectPolicy,
) -> Result<(), WebSocketError> {
    let url = config.trade_updates_url();
    tracing::info!(url, "Connecting to trade update stream");

    let (ws_stream, _) = connect_async(url)
        .await
        .map_err(|e| WebSocketError::ConnectionFailed {
            message: e.to_string(),
        })?;
    let (mut write, mut read) = ws_stream.split();

    *state.write() = StreamState::Authenticating;
    send_text(&mut write, auth_message(&config.api_key, &config.api_secret)).await?;
    match next_control(&mut read, config.handshake_timeout, "authentication").await? {
        StreamMessage::Authorization {
            authorized: true, ..
        } => {}
        StreamMessage::Authorization { status, .. } => {
            return Err(WebSocketError::AuthenticationFailed { message: status });
        }
        other => {
            return Err(WebSocketError::AuthenticationFailed {
                message: format!("unexpected reply: {other:?}"),
            });
        }
    }

    send_text(&mut write, listen_message()).await?;
    match next_control(&mut read, config.handshake_timeout, "listen").await? {
        StreamMessage::Listening { streams } if streams.iter().any(|s| s == TRADE_UPDATES_STREAM) => {}
        other => {
            return Err(WebSocketError::ListenFailed {
                message: format!("unexpected reply: {other:?}"),
            });
        }
    }

    *state.write() = StreamState::Listening;
    reconnect.reset();
    tracing::info!("Trade update stream listening");

    loop {
        tokio::select! {
            msg = read.next() => match msg {
                Some(Ok(message)) => route_message(router, message)?,
                Some(Err(e)) => {
                    return Err(WebSocketError::ConnectionClosed {
                        reason: e.to_string(),
                    });
                }
                None => {
                    return Err(WebSocketError::ConnectionClosed {
                        reason: "stream ended".to_string(),
                    });
                }
            },
            () = shutdown.cancelled() => {
                tracing::info!("Trade update stream shutdown requested");
                if let Err(e) = write.send(Message::Close(None)).await {
                    tracing::debug!(error = %e, "Close frame not sent");
                }
                return Ok(());
            }
        }
    }
}

/// Handle one frame from a listening connection.
///
/// Pings need no handling here: tungstenite queues the pong itself and
/// flushes it on the next read.
fn route_message(router: &OrderUpdateRouter, message: Message) -> Result<(), WebSocketError> {
    match message {
        Message::Text(text) => route_frame(router, text.as_str()),
        Message::Binary(data) => match std::str::from_utf8(&data) {
            Ok(text) => route_frame(router, text),
            Err(e) => tracing::debug!(error = %e, "Ignoring non-UTF-8 frame"),
        },
        Message::Close(_) => {
            return Err(WebSocketError::ConnectionClosed {
                reason: "close frame received".to_string(),
            });
        }
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
    }
    Ok(())
}

fn route_frame(router: &OrderUpdateRouter, text: &str) {
    match decode_message(text) {
        Ok(StreamMessage::TradeUpdate { event, update }) => {
            let delivered = router.dispatch(&update);
            tracing::debug!(
                order_id = %update.order_id,
                event = ?event,
                status = %update.status,
                delivered,
                "Trade update"
            );
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "Dropping undecodable trade stream frame"),
    }
}

async fn send_text<S>(write: &mut S, text: String) -> Result<(), WebSocketError>
where
    S: futures_util::Sink<Message, Error = tungstenite::Error> + Unpin,
{
    write
        .send(Message::Text(text.into()))
        .await
        .map_err(|e| WebSocketError::SendFailed {
            message: e.to_string(),
        })
}

/// Read frames until a control reply arrives, within `limit`.
async fn next_control<S>(
    read: &mut S,
    limit: Duration,
    operation: &str,
) -> Result<StreamMessage, WebSocketError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    timeout(limit, read_control(read, operation))
        .await
        .map_err(|_| WebSocketError::Timeout {
            operation: operation.to_string(),
        })?
}

async fn read_control<S>(read: &mut S, operation: &str) -> Result<StreamMessage, WebSocketError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        let frame = read
            .next()
            .await
            .ok_or_else(|| WebSocketError::ConnectionClosed {
                reason: format!("stream ended during {operation}"),
            })?
            .map_err(|e| WebSocketError::ConnectionFailed {
                message: e.to_string(),
            })?;

        let decoded = match &frame {
            Message::Text(text) => decode_message(text.as_str())?,
            Message::Binary(data) => {
                let text = std::str::from_utf8(data).map_err(|e| WebSocketError::ParseError {
                    message: e.to_string(),
                })?;
                decode_message(text)?
            }
            Message::Close(_) => {
                return Err(WebSocketError::ConnectionClosed {
                    reason: format!("closed during {operation}"),
                });
            }
            _ => continue,
        };

        if matches!(
            decoded,
            StreamMessage::Authorization { .. } | StreamMessage::Listening { .. }
        ) {
            return Ok(decoded);
        }
    }
}
