//! Assistant protocol frames and the outbound message envelope.
//!
//! The frame vocabulary is shared across all three transport tiers: the
//! duplex channel and the push stream deliver frames one at a time, while
//! the request/response tier synthesizes a single terminal `answer` frame
//! from its complete reply body.

use serde::{Deserialize, Serialize};

use crate::page::PageContext;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Inbound frames
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A single typed frame from the assistant backend.
///
/// Zero or more `delta` frames may arrive before exactly one terminal
/// frame (`answer` or `error`) per message.  Frames after a terminal
/// frame are ignored by the assembler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProtocolFrame {
    /// The assistant has accepted the message and is composing.
    #[serde(rename = "ready")]
    Ready,

    /// Source citations backing the answer; replaces any previous set.
    #[serde(rename = "context")]
    Context { snippets: Vec<SourceSnippet> },

    /// A backend tool invocation has started.
    #[serde(rename = "tools.start")]
    ToolStart { tool: String, index: u32, total: u32 },

    /// A backend tool invocation has finished.
    #[serde(rename = "tools.done")]
    ToolDone { tool: String },

    /// An incremental fragment of the answer text.
    #[serde(rename = "delta")]
    Delta { text: String },

    /// Terminal: the complete answer, plus optional UI directives.
    #[serde(rename = "answer")]
    Answer {
        reply: String,
        #[serde(default)]
        cta_buttons: Vec<CtaButton>,
        #[serde(default)]
        intent: Option<String>,
    },

    /// Terminal: the backend failed while handling the message.
    #[serde(rename = "error")]
    Error { detail: String },
}

impl ProtocolFrame {
    /// Parse a raw wire payload.  Returns `None` for malformed input —
    /// malformed frames are dropped, they never fail a tier.
    pub fn parse(raw: &str) -> Option<Self> {
        match serde_json::from_str::<Self>(raw) {
            Ok(frame) => Some(frame),
            Err(e) => {
                tracing::debug!(error = %e, "dropping unparseable frame");
                None
            }
        }
    }

    /// Whether this frame ends processing for the current message.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Answer { .. } | Self::Error { .. })
    }
}

/// One source citation shown alongside the answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSnippet {
    pub source: String,
    pub snippet: String,
}

/// A call-to-action button surfaced next to the answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CtaButton {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Outbound envelope
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The outbound message envelope, sent on every tier.
///
/// Each tier adapts the shape to its own conventions (JSON text message
/// on the duplex channel, JSON POST body on the push and request tiers)
/// but the fields are identical everywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub text: String,
    pub session_id: String,
    pub language: String,
    pub page_context: PageContext,
}

impl Envelope {
    pub fn new(
        text: impl Into<String>,
        session_id: impl Into<String>,
        language: impl Into<String>,
        page_context: PageContext,
    ) -> Self {
        Self {
            text: text.into(),
            session_id: session_id.into(),
            language: language.into(),
            page_context,
        }
    }
}
