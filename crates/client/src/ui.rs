//! Ancillary UI state maintained alongside the conversation log.

use courier_domain::frame::{CtaButton, SourceSnippet};

use crate::directives::{DemoLaunch, PaymentDetails};

/// Transient widget state mutated by the assembler.
///
/// Everything here is presentation-adjacent: none of it belongs to the
/// conversation entries themselves.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// The assistant is composing an answer (typing indicator).
    pub composing: bool,

    /// Source citations for the current answer; replaced wholesale by
    /// each `context` frame.
    pub citations: Vec<SourceSnippet>,

    /// Call-to-action buttons from the last answer.
    pub cta_buttons: Vec<CtaButton>,

    /// Intent suggestion from the last answer.
    pub suggested_intent: Option<String>,

    /// Extracted payment panel, when the last answer carried one.
    pub payment: Option<PaymentDetails>,

    /// Extracted demo launch panel.
    pub demo: Option<DemoLaunch>,

    /// Dismissible delivery or assistant error for the last message.
    pub error: Option<String>,

    /// Distinct upload failure state; never routed through `error`.
    pub upload_error: Option<String>,
}

impl UiState {
    /// Reset the per-turn surfaces when a new message is sent.
    /// Citations persist until the next `context` frame replaces them.
    pub fn begin_turn(&mut self) {
        self.composing = false;
        self.cta_buttons.clear();
        self.suggested_intent = None;
        self.payment = None;
        self.demo = None;
        self.error = None;
        self.upload_error = None;
    }
}
