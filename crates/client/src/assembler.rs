//! The streaming assembler.
//!
//! Folds one message's protocol frames, in arrival order, into the
//! conversation log and the ancillary UI state.  Frames are handled one
//! at a time on the caller's cooperative queue; after the terminal
//! frame every further frame is a no-op, which guards against duplicate
//! delivery from a flaky transport.

use courier_domain::frame::ProtocolFrame;

use crate::conversation::ConversationStore;
use crate::directives;
use crate::ui::UiState;

/// Per-message frame folding state.
#[derive(Debug, Default)]
pub struct TurnAssembler {
    /// Concatenation of delta text seen this turn, used to suppress the
    /// portion of the final reply that already streamed in.
    streamed: String,
    terminal: bool,
}

impl TurnAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Apply one frame.
    pub fn apply(
        &mut self,
        frame: ProtocolFrame,
        conversation: &mut ConversationStore,
        ui: &mut UiState,
    ) {
        if self.terminal {
            return;
        }

        match frame {
            ProtocolFrame::Ready => {
                ui.composing = true;
            }

            ProtocolFrame::Context { snippets } => {
                ui.citations = snippets;
            }

            ProtocolFrame::ToolStart { tool, index, total } => {
                conversation.append_assistant(&format!("🔧 {tool} ({index}/{total})… "));
            }

            ProtocolFrame::ToolDone { .. } => {
                conversation.append_assistant("✓ ");
            }

            ProtocolFrame::Delta { text } => {
                self.streamed.push_str(&text);
                conversation.append_assistant(&text);
            }

            ProtocolFrame::Answer {
                reply,
                cta_buttons,
                intent,
            } => {
                let scan = directives::scan(&reply);

                let remainder = self.undelivered_remainder(&scan.display_text);
                if !remainder.is_empty() {
                    conversation.append_assistant(remainder);
                }

                ui.cta_buttons = cta_buttons;
                ui.suggested_intent = intent;
                if scan.payment.is_some() {
                    ui.payment = scan.payment;
                }
                if scan.demo.is_some() {
                    ui.demo = scan.demo;
                }
                ui.composing = false;
                self.terminal = true;
            }

            ProtocolFrame::Error { detail } => {
                ui.composing = false;
                ui.error = Some(detail);
                self.terminal = true;
            }
        }
    }

    /// Resolve total delivery failure for this turn.  Keeps the
    /// composing indicator from sticking when no terminal frame ever
    /// arrived.
    pub fn fail(&mut self, ui: &mut UiState, message: impl Into<String>) {
        ui.composing = false;
        ui.error = Some(message.into());
        self.terminal = true;
    }

    /// The part of the final reply not already delivered via deltas.
    /// When deltas and the reply diverge, the streamed text wins.
    fn undelivered_remainder<'a>(&self, reply: &'a str) -> &'a str {
        if self.streamed.is_empty() {
            return reply;
        }
        reply.strip_prefix(self.streamed.as_str()).unwrap_or("")
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
