//! `courier-client` — the conversational delivery client.
//!
//! Ties the pieces together: the sender appends the user entry, the
//! negotiator delivers the envelope over whichever tier is viable, and
//! the assembler folds the winning tier's frames into the conversation
//! and the ancillary UI state.  One message in flight at a time; the
//! busy flag is the only mutual exclusion.

pub mod assembler;
pub mod builder;
pub mod client;
pub mod conversation;
pub mod directives;
pub mod ui;

// ── Re-exports for ergonomic imports ─────────────────────────────────

pub use builder::ChatClientBuilder;
pub use client::{AttachmentSendOutcome, ChatClient, SendOutcome};
pub use conversation::{AttachmentRef, ConversationEntry, ConversationStore, Role};
pub use directives::{DemoLaunch, PaymentDetails};
pub use ui::UiState;
