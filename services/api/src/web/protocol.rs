//! services/api/src/web/protocol.rs
//!
//! Defines the events streamed to the browser while a chat reply is generated.
//! Each event is one Server-Sent Event whose data is the JSON form of `StreamEvent`.

use axum::response::sse::Event;
use serde::Serialize;

/// Represents the structured messages the server streams to the client.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// The next piece of the model's reply, in arrival order.
    Chunk { text: String },

    /// The reply failed. The message is safe to show to the student.
    Error { message: String },

    /// The reply is complete and the conversation has been saved.
    Done,
}

impl StreamEvent {
    pub fn to_sse(&self) -> Event {
        let data = serde_json::to_string(self).unwrap_or_else(|_| "{\"type\":\"error\"}".to_string());
        Event::default().data(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let chunk = StreamEvent::Chunk {
            text: "Hi".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&chunk).unwrap(),
            r#"{"type":"chunk","text":"Hi"}"#
        );
        assert_eq!(
            serde_json::to_string(&StreamEvent::Done).unwrap(),
            r#"{"type":"done"}"#
        );
    }
}
