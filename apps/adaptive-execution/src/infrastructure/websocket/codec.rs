//! Trade Update Stream Message Codec
//!
//! The trading stream wraps every message as `{"stream": ..., "data": ...}`.
//! Control replies arrive on the `authorization` and `listening` streams;
//! order events arrive on `trade_updates`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use super::types::{TradeEvent, WebSocketError};
use crate::application::ports::OrderUpdate;
use crate::domain::order_execution::OrderStatus;
use crate::domain::shared::OrderId;
use crate::infrastructure::broker::alpaca::{parse_optional_decimal, parse_order_status};

/// Stream name carrying order events.
pub const TRADE_UPDATES_STREAM: &str = "trade_updates";

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamMessage {
    /// Reply to the auth request.
    Authorization {
        /// Whether the credentials were accepted.
        authorized: bool,
        /// Raw status text.
        status: String,
    },
    /// Reply to the listen request with the streams now active.
    Listening {
        /// Active stream names.
        streams: Vec<String>,
    },
    /// An order event.
    TradeUpdate {
        /// Event type.
        event: TradeEvent,
        /// Normalized update.
        update: OrderUpdate,
    },
    /// Anything else (other streams, unknown payloads).
    Ignored,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    stream: Option<String>,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct AuthorizationData {
    status: String,
}

#[derive(Debug, Deserialize)]
struct ListeningData {
    #[serde(default)]
    streams: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawTradeUpdate {
    event: String,
    timestamp: Option<String>,
    order: RawOrder,
}

#[derive(Debug, Deserialize)]
struct RawOrder {
    id: String,
    status: Option<String>,
    filled_qty: Option<String>,
    filled_avg_price: Option<String>,
    updated_at: Option<String>,
}

/// Auth request frame.
#[must_use]
pub fn auth_message(api_key: &str, api_secret: &str) -> String {
    serde_json::json!({
        "action": "auth",
        "key": api_key,
        "secret": api_secret,
    })
    .to_string()
}

/// Listen request frame subscribing to order events.
#[must_use]
pub fn listen_message() -> String {
    serde_json::json!({
        "action": "listen",
        "data": { "streams": [TRADE_UPDATES_STREAM] },
    })
    .to_string()
}

/// Decode a text (or UTF-8 binary) frame.
///
/// # Errors
///
/// Returns `ParseError` when the frame is not JSON or a known stream carries
/// a malformed payload.
pub fn decode_message(json: &str) -> Result<StreamMessage, WebSocketError> {
    let envelope: Envelope = serde_json::from_str(json).map_err(|e| WebSocketError::ParseError {
        message: format!("invalid stream message JSON: {e}"),
    })?;

    match envelope.stream.as_deref() {
        Some("authorization") => {
            let data: AuthorizationData = from_data(envelope.data, "authorization")?;
            Ok(StreamMessage::Authorization {
                authorized: data.status == "authorized",
                status: data.status,
            })
        }
        Some("listening") => {
            let data: ListeningData = from_data(envelope.data, "listening")?;
            Ok(StreamMessage::Listening {
                streams: data.streams,
            })
        }
        Some(TRADE_UPDATES_STREAM) => parse_trade_update(envelope.data),
        _ => Ok(StreamMessage::Ignored),
    }
}

fn from_data<T: serde::de::DeserializeOwned>(
    data: Value,
    stream: &str,
) -> Result<T, WebSocketError> {
    serde_json::from_value(data).map_err(|e| WebSocketError::ParseError {
        message: format!("invalid {stream} payload: {e}"),
    })
}

fn parse_trade_update(data: Value) -> Result<StreamMessage, WebSocketError> {
    let raw: RawTradeUpdate = from_data(data, TRADE_UPDATES_STREAM)?;
    let event = TradeEvent::from_alpaca_event(&raw.event);

    let status = raw
        .order
        .status
        .as_deref()
        .map_or_else(|| status_from_event(event), parse_order_status);

    let decimal = |field: &str, value: Option<&str>| {
        parse_optional_decimal(field, value).map_err(|e| WebSocketError::ParseError {
            message: e.to_string(),
        })
    };
    let filled_quantity = decimal("filled_qty", raw.order.filled_qty.as_deref())?.unwrap_or_default();
    let avg_fill_price = decimal("filled_avg_price", raw.order.filled_avg_price.as_deref())?
        .filter(|p| *p > Decimal::ZERO);

    let timestamp = raw
        .timestamp
        .as_deref()
        .or(raw.order.updated_at.as_deref())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map_or_else(Utc::now, |dt| dt.with_timezone(&Utc));

    Ok(StreamMessage::TradeUpdate {
        event,
        update: OrderUpdate {
            order_id: OrderId::new(raw.order.id),
            status,
            filled_quantity,
            avg_fill_price,
            timestamp,
        },
    })
}

const fn status_from_event(event: TradeEvent) -> OrderStatus {
    match event {
        TradeEvent::PartialFill => OrderStatus::PartiallyFilled,
        TradeEvent::Fill => OrderStatus::Filled,
        TradeEvent::Canceled | TradeEvent::Replaced => OrderStatus::Canceled,
        TradeEvent::Expired | TradeEvent::DoneForDay => OrderStatus::Expired,
        TradeEvent::Rejected => OrderStatus::Rejected,
        TradeEvent::PendingCancel => OrderStatus::PendingCancel,
        TradeEvent::PendingNew => OrderStatus::PendingNew,
        TradeEvent::Accepted | TradeEvent::New => OrderStatus::Accepted,
        TradeEvent::Other => OrderStatus::New,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn auth_and_listen_frames() {
        let auth: Value = serde_json::from_str(&auth_message("key", "secret")).unwrap();
        assert_eq!(auth["action"], "auth");
        assert_eq!(auth["key"], "key");
        assert_eq!(auth["secret"], "secret");

        let listen: Value = serde_json::from_str(&listen_message()).unwrap();
        assert_eq!(listen["action"], "listen");
        assert_eq!(listen["data"]["streams"][0], "trade_updates");
    }

    #[test]
    fn decodes_authorization_reply() {
        let msg = decode_message(
            r#"{"stream":"authorization","data":{"status":"authorized","action":"authenticate"}}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            StreamMessage::Authorization {
                authorized: true,
                status: "authorized".to_string()
            }
        );

        let denied = decode_message(
            r#"{"stream":"authorization","data":{"status":"unauthorized","action":"authenticate"}}"#,
        )
        .unwrap();
        assert!(matches!(
            denied,
            StreamMessage::Authorization {
                authorized: false,
                ..
            }
        ));
    }

    #[test]
    fn decodes_listening_reply() {
        let msg =
            decode_message(r#"{"stream":"listening","data":{"streams":["trade_updates"]}}"#).unwrap();
        assert_eq!(
            msg,
            StreamMessage::Listening {
                streams: vec!["trade_updates".to_string()]
            }
        );
    }

    #[test]
    fn decodes_fill() {
        let json = r#"{
            "stream": "trade_updates",
            "data": {
                "event": "fill",
                "timestamp": "2026-03-02T15:04:05.123Z",
                "price": "150.25",
                "qty": "10",
                "order": {
                    "id": "order-1",
                    "client_order_id": "c-1",
                    "symbol": "AAPL",
                    "status": "filled",
                    "filled_qty": "10",
                    "filled_avg_price": "150.25",
                    "updated_at": "2026-03-02T15:04:05Z"
                }
            }
        }"#;

        let StreamMessage::TradeUpdate { event, update } = decode_message(json).unwrap() else {
            panic!("expected trade update");
        };
        assert_eq!(event, TradeEvent::Fill);
        assert_eq!(update.order_id.as_str(), "order-1");
        assert_eq!(update.status, OrderStatus::Filled);
        assert_eq!(update.filled_quantity, dec!(10));
        assert_eq!(update.avg_fill_price, Some(dec!(150.25)));
    }

    #[test]
    fn status_falls_back_to_event() {
        let json = r#"{"stream":"trade_updates","data":{"event":"canceled","order":{"id":"o-2","filled_qty":"0"}}}"#;
        let StreamMessage::TradeUpdate { update, .. } = decode_message(json).unwrap() else {
            panic!("expected trade update");
        };
        assert_eq!(update.status, OrderStatus::Canceled);
        assert_eq!(update.filled_quantity, Decimal::ZERO);
        assert_eq!(update.avg_fill_price, None);
    }

    #[test]
    fn unknown_stream_is_ignored() {
        assert_eq!(
            decode_message(r#"{"stream":"account_updates","data":{}}"#).unwrap(),
            StreamMessage::Ignored
        );
    }

    #[test]
    fn malformed_json_is_error() {
        assert!(matches!(
            decode_message("not json"),
            Err(WebSocketError::ParseError { .. })
        ));
        assert!(decode_message(r#"{"stream":"trade_updates","data":{"event":"fill"}}"#).is_err());
    }
}
