use axum::response::sse::Event;
use tokio_stream::{Stream, StreamExt};

use super::{BenchError, BenchEvent};

// ─── Framing ─────────────────────────────────────────────────────
// One message per event: `data: <json>\n\n`. The JSON is always compact, so
// it never spans more than one `data:` line.

impl BenchEvent {
    pub fn to_json(&self) -> Result<String, BenchError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Exact bytes of the event-stream message for this event.
    pub fn to_frame(&self) -> Result<String, BenchError> {
        Ok(format!("data: {}\n\n", self.to_json()?))
    }

    /// Same message as [`BenchEvent::to_frame`], as an axum SSE event.
    pub fn to_sse(&self) -> Result<Event, BenchError> {
        Ok(Event::default().data(self.to_json()?))
    }
}

/// Adapt a benchmark stream for `axum::response::Sse`.
///
/// An error item ends the response body; the client sees the stream close
/// without a `completed` message.
pub fn sse_events<S>(events: S) -> impl Stream<Item = Result<Event, BenchError>>
where
    S: Stream<Item = Result<BenchEvent, BenchError>>,
{
    events.map(|item| item.and_then(|event| event.to_sse()))
}
