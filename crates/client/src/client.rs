//! The chat client facade.
//!
//! Owns the conversation log, the UI state, the session store, and the
//! negotiator, and enforces the single-flight contract: one message may
//! be in flight at a time, guarded by the busy flag.  A send while busy
//! is rejected before it touches the conversation.
//!
//! Closing the widget does not cancel an in-flight negotiation — the
//! embedder simply stops rendering; a late answer still lands in the
//! log.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use courier_domain::config::ClientConfig;
use courier_domain::error::{Error, Result};
use courier_domain::frame::{Envelope, ProtocolFrame};
use courier_domain::page::PageSnapshot;
use courier_domain::trace::TraceEvent;
use courier_sessions::{extract_context, SessionStore};
use courier_transport::{AttachmentUploader, Delivery, Negotiator, Tier};

use crate::assembler::TurnAssembler;
use crate::builder::ChatClientBuilder;
use crate::conversation::{AttachmentRef, ConversationEntry, ConversationStore};
use crate::ui::UiState;

/// How one text message resolved.  Never an `Err`: delivery failures are
/// converted into UI state, not exceptions.
#[derive(Debug, Clone)]
pub enum SendOutcome {
    /// Some tier delivered a complete answer.
    Answered { tier: Tier },
    /// A tier connected but the assistant reported an application error.
    AssistantError { tier: Tier, detail: String },
    /// Every tier was exhausted.
    Failed { attempts: u32 },
}

/// How an attachment message resolved.
#[derive(Debug, Clone)]
pub enum AttachmentSendOutcome {
    Completed,
    Failed { reason: String },
}

pub struct ChatClient {
    pub(crate) config: ClientConfig,
    pub(crate) session: SessionStore,
    pub(crate) negotiator: Negotiator,
    pub(crate) uploader: AttachmentUploader,
    pub(crate) conversation: RwLock<ConversationStore>,
    pub(crate) ui: RwLock<UiState>,
    pub(crate) busy: AtomicBool,
}

impl ChatClient {
    /// Start a new builder.
    pub fn builder() -> ChatClientBuilder {
        ChatClientBuilder::new()
    }

    /// Deliver one text message and fold the answer into the
    /// conversation.  See [`send_with`](Self::send_with).
    pub async fn send(&self, text: &str, page: &PageSnapshot) -> Result<SendOutcome> {
        self.send_with(text, page, |_frame| {}).await
    }

    /// Deliver one text message, invoking `observer` after each frame is
    /// folded so an embedder can render incrementally.
    ///
    /// Returns [`Error::Busy`] — without touching the conversation —
    /// when a previous message is still unresolved.
    pub async fn send_with(
        &self,
        text: &str,
        page: &PageSnapshot,
        mut observer: impl FnMut(&ProtocolFrame),
    ) -> Result<SendOutcome> {
        let _turn = self.begin_turn()?;

        let context = extract_context(page);
        let session_id = self.session.get_or_create();
        let envelope = Envelope::new(
            text,
            session_id.clone(),
            self.config.language.clone(),
            context.clone(),
        );

        self.conversation.write().push_user(text, None);
        self.ui.write().begin_turn();

        TraceEvent::MessageSent {
            session_id,
            chars: text.chars().count(),
            section: context.section.to_string(),
        }
        .emit();

        let mut assembler = TurnAssembler::new();
        let delivery = self
            .negotiator
            .deliver(&envelope, |frame| {
                {
                    let mut conversation = self.conversation.write();
                    let mut ui = self.ui.write();
                    assembler.apply(frame.clone(), &mut conversation, &mut ui);
                }
                observer(&frame);
            })
            .await;

        let outcome = match delivery {
            Delivery::Delivered { tier, terminal } => match terminal {
                ProtocolFrame::Answer { reply, .. } => {
                    TraceEvent::AnswerReceived {
                        tier: tier.as_str().into(),
                        chars: reply.chars().count(),
                    }
                    .emit();
                    SendOutcome::Answered { tier }
                }
                ProtocolFrame::Error { detail } => {
                    TraceEvent::AssistantError {
                        tier: tier.as_str().into(),
                        detail: detail.clone(),
                    }
                    .emit();
                    SendOutcome::AssistantError { tier, detail }
                }
                other => {
                    tracing::debug!(frame = ?other, "negotiator resolved on a non-terminal frame");
                    SendOutcome::Answered { tier }
                }
            },
            Delivery::Exhausted { attempts } => {
                assembler.fail(
                    &mut self.ui.write(),
                    "The assistant could not be reached. Please try again.",
                );
                TraceEvent::DeliveryFailed { attempts }.emit();
                SendOutcome::Failed { attempts }
            }
        };

        Ok(outcome)
    }

    /// Deliver a message carrying a file.  Attachments bypass the tier
    /// chain: the file is uploaded and the extracted text becomes a
    /// single synthetic assistant entry.  Upload failure is surfaced as
    /// a distinct UI state and is never retried over the text path.
    pub async fn send_attachment(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        note: Option<&str>,
    ) -> Result<AttachmentSendOutcome> {
        let _turn = self.begin_turn()?;

        let session_id = self.session.get_or_create();
        let attachment = AttachmentRef {
            file_name: file_name.to_string(),
            size_bytes: bytes.len(),
        };

        let message_index = {
            let mut conversation = self.conversation.write();
            conversation.push_user(note.unwrap_or(file_name), Some(attachment))
        };
        self.ui.write().begin_turn();

        match self
            .uploader
            .upload(file_name, bytes, &session_id, message_index)
            .await
        {
            Ok(outcome) => {
                let extracted_chars = outcome
                    .content_text
                    .as_ref()
                    .map(|t| t.chars().count())
                    .unwrap_or(0);
                let reply = outcome
                    .content_text
                    .unwrap_or_else(|| format!("Attachment {file_name} received."));
                self.conversation.write().push_assistant(reply);

                TraceEvent::UploadCompleted {
                    file_name: file_name.to_string(),
                    extracted_chars,
                }
                .emit();
                Ok(AttachmentSendOutcome::Completed)
            }
            Err(e) => {
                let reason = e.to_string();
                self.ui.write().upload_error = Some(reason.clone());

                TraceEvent::UploadFailed {
                    file_name: file_name.to_string(),
                    reason: reason.clone(),
                }
                .emit();
                Ok(AttachmentSendOutcome::Failed { reason })
            }
        }
    }

    // ── State accessors for rendering ────────────────────────────────

    /// Snapshot of the conversation log.
    pub fn entries(&self) -> Vec<ConversationEntry> {
        self.conversation.read().entries().to_vec()
    }

    /// Snapshot of the ancillary UI state.
    pub fn ui_state(&self) -> UiState {
        self.ui.read().clone()
    }

    /// The durable session identifier for this profile.
    pub fn session_id(&self) -> String {
        self.session.get_or_create()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Claim the busy flag for one turn, or reject the send.
    fn begin_turn(&self) -> Result<TurnGuard<'_>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::Busy);
        }
        Ok(TurnGuard { busy: &self.busy })
    }
}

/// Clears the busy flag when the turn resolves, on every path.
struct TurnGuard<'a> {
    busy: &'a AtomicBool,
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}
