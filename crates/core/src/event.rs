//! Session event stream: ordered lifecycle notifications for an observer.
//!
//! Every turn emits a strictly ordered sequence of events (tool invocations,
//! partial output, the final answer) over a bounded per-session channel. The
//! observer may be a UI panel or a log sink; if it disconnects, events are
//! dropped and the turn still runs to completion. History and memory writes
//! are never conditioned on observer presence.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// Events emitted by the orchestration loop during a turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    /// The model is being invoked with the assembled context.
    Thinking { message: String },

    /// A tool call is about to execute.
    ToolCallStarted {
        id: String,
        name: String,
        arguments: serde_json::Value,
    },

    /// A tool call completed successfully.
    ToolCallFinished {
        id: String,
        name: String,
        output: String,
    },

    /// A tool call failed (unknown tool, invalid arguments, or execution
    /// error). The loop continues; the failure is fed back to the model.
    ToolCallFailed {
        id: String,
        name: String,
        error: String,
    },

    /// Partial assistant output.
    MessageDelta { content: String },

    /// The single terminal event of a successful turn.
    FinalAnswer { content: String },

    /// The turn aborted (model or store failure).
    Error { message: String },
}

impl TurnEvent {
    /// Wire name for this event kind.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Thinking { .. } => "thinking",
            Self::ToolCallStarted { .. } => "tool_call_started",
            Self::ToolCallFinished { .. } => "tool_call_finished",
            Self::ToolCallFailed { .. } => "tool_call_failed",
            Self::MessageDelta { .. } => "message_delta",
            Self::FinalAnswer { .. } => "final_answer",
            Self::Error { .. } => "error",
        }
    }
}

/// A turn event stamped with its per-session sequence number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequencedEvent {
    /// Strictly increasing per session. Consumed once; the core never
    /// replays.
    pub seq: u64,
    #[serde(flatten)]
    pub event: TurnEvent,
}

/// The emitting half of a session's event stream.
///
/// Bounded capacity: the core buffers only within the active turn. When the
/// observer has gone away (receiver dropped) or is not keeping up, events
/// are dropped rather than blocking the loop.
pub struct EventSink {
    sender: mpsc::Sender<SequencedEvent>,
    next_seq: AtomicU64,
}

impl EventSink {
    /// Create a sink and its observer end with the given buffer capacity.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<SequencedEvent>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (
            Self {
                sender,
                next_seq: AtomicU64::new(0),
            },
            receiver,
        )
    }

    /// Emit an event, assigning the next sequence number.
    pub fn emit(&self, event: TurnEvent) {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        // Observer gone or lagging: drop, never block the turn.
        let _ = self.sender.try_send(SequencedEvent { seq, event });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_carry_increasing_sequence_numbers() {
        let (sink, mut rx) = EventSink::channel(16);
        sink.emit(TurnEvent::Thinking {
            message: "assembling".into(),
        });
        sink.emit(TurnEvent::FinalAnswer {
            content: "done".into(),
        });

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.seq, 0);
        assert_eq!(second.seq, 1);
        assert_eq!(first.event.event_type(), "thinking");
        assert_eq!(second.event.event_type(), "final_answer");
    }

    #[test]
    fn emit_without_observer_does_not_panic() {
        let (sink, rx) = EventSink::channel(4);
        drop(rx);
        sink.emit(TurnEvent::Error {
            message: "nobody listening".into(),
        });
    }

    #[test]
    fn event_serialization_is_tagged() {
        let event = SequencedEvent {
            seq: 3,
            event: TurnEvent::ToolCallStarted {
                id: "call_1".into(),
                name: "search_general".into(),
                arguments: serde_json::json!({"query": "Lisbon"}),
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"tool_call_started""#));
        assert!(json.contains(r#""seq":3"#));
    }

    #[test]
    fn event_deserialization() {
        let json = r#"{"seq":0,"type":"message_delta","content":"hi"}"#;
        let event: SequencedEvent = serde_json::from_str(json).unwrap();
        match event.event {
            TurnEvent::MessageDelta { content } => assert_eq!(content, "hi"),
            _ => panic!("Wrong variant"),
        }
    }
}
