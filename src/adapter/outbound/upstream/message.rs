//! Upstream wire messages.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{Candle, Timeframe};
use crate::port::outbound::upstream::UpstreamEvent;

const KNOWN_TYPES: &[&str] = &[
    "candles",
    "loop_reset",
    "paper_on",
    "paper_off",
    "startup",
    "shutdown",
];

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireMessage {
    Candles {
        timeframe: Timeframe,
        #[serde(alias = "boundary")]
        timestamp: i64,
        candles: Vec<Candle>,
    },
    LoopReset,
    PaperOn,
    PaperOff,
    Startup,
    Shutdown,
}

impl From<WireMessage> for UpstreamEvent {
    fn from(msg: WireMessage) -> Self {
        match msg {
            WireMessage::Candles {
                timeframe,
                timestamp,
                candles,
            } => Self::Candles {
                timeframe,
                boundary: timestamp,
                candles,
            },
            WireMessage::LoopReset => Self::LoopReset,
            WireMessage::PaperOn => Self::PaperOn,
            WireMessage::PaperOff => Self::PaperOff,
            WireMessage::Startup => Self::UpstreamStartup,
            WireMessage::Shutdown => Self::UpstreamShutdown,
        }
    }
}

/// Outcome of decoding one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Event(UpstreamEvent),
    /// Well-formed JSON whose `type` is not one we handle.
    Unknown(String),
    /// Not JSON, or a known type with unusable fields.
    Invalid(String),
}

/// Decode a single frame.
#[must_use]
pub fn decode(frame: &str) -> Decoded {
    let value: Value = match serde_json::from_str(frame) {
        Ok(value) => value,
        Err(e) => return Decoded::Invalid(format!("invalid JSON: {e}")),
    };

    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    if !KNOWN_TYPES.contains(&kind.as_str()) {
        return Decoded::Unknown(kind);
    }

    match serde_json::from_value::<WireMessage>(value) {
        Ok(msg) => Decoded::Event(msg.into()),
        Err(e) => Decoded::Invalid(format!("bad '{kind}' message: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_candles_with_either_boundary_key() {
        for key in ["timestamp", "boundary"] {
            let frame = format!(
                r#"{{"type":"candles","timeframe":"4h","{key}":14400000,
                    "candles":[{{"time":1,"open":1,"high":2,"low":0.5,"close":1.5}}]}}"#
            );
            match decode(&frame) {
                Decoded::Event(UpstreamEvent::Candles {
                    timeframe,
                    boundary,
                    candles,
                }) => {
                    assert_eq!(timeframe, Timeframe::H4);
                    assert_eq!(boundary, 14_400_000);
                    assert_eq!(candles.len(), 1);
                    assert_eq!(candles[0].volume, 0.0);
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn decodes_control_messages() {
        assert_eq!(
            decode(r#"{"type":"paper_on"}"#),
            Decoded::Event(UpstreamEvent::PaperOn)
        );
        assert_eq!(
            decode(r#"{"type":"loop_reset","extra":true}"#),
            Decoded::Event(UpstreamEvent::LoopReset)
        );
        assert_eq!(
            decode(r#"{"type":"shutdown"}"#),
            Decoded::Event(UpstreamEvent::UpstreamShutdown)
        );
    }

    #[test]
    fn unknown_type_is_reported_separately() {
        assert_eq!(
            decode(r#"{"type":"heartbeat"}"#),
            Decoded::Unknown("heartbeat".to_string())
        );
        assert_eq!(decode(r#"{"x":1}"#), Decoded::Unknown(String::new()));
    }

    #[test]
    fn garbage_and_bad_fields_are_invalid() {
        assert!(matches!(decode("{not json"), Decoded::Invalid(_)));
        assert!(matches!(
            decode(r#"{"type":"candles","timeframe":"2h","timestamp":1,"candles":[]}"#),
            Decoded::Invalid(_)
        ));
    }
}
