use serde::Serialize;

/// Structured analytics events emitted across all Courier crates.
///
/// Fire-and-forget: events are serialized and logged through `tracing`,
/// where the embedder's collector picks them up.  Emission must never
/// affect delivery.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    SessionResolved {
        session_id: String,
        is_new: bool,
    },
    MessageSent {
        session_id: String,
        chars: usize,
        section: String,
    },
    TierAttempt {
        tier: String,
        attempt: u32,
    },
    TierFallback {
        from: String,
        to: String,
    },
    AnswerReceived {
        tier: String,
        chars: usize,
    },
    AssistantError {
        tier: String,
        detail: String,
    },
    DeliveryFailed {
        attempts: u32,
    },
    UploadCompleted {
        file_name: String,
        extracted_chars: usize,
    },
    UploadFailed {
        file_name: String,
        reason: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "courier_event");
    }
}
