//! `courier-transport` — transport tiers and the delivery negotiator.
//!
//! One outbound message, three independently-failing ways to deliver it:
//!
//! 1. **Duplex** — a persistent WebSocket channel (retried with a short
//!    fixed pause).
//! 2. **Push** — a server-push event stream over HTTP, tried against a
//!    short list of candidate endpoints.
//! 3. **Request** — a single blocking request/response call with no
//!    streaming.
//!
//! The [`Negotiator`] walks the tiers in that strict order and resolves
//! exactly one outcome per message.  Attachments bypass the tiers
//! entirely via [`AttachmentUploader`].

pub mod duplex;
pub mod negotiator;
pub mod push;
pub mod request;
pub mod traits;
pub mod upload;

pub use duplex::DuplexTransport;
pub use negotiator::{Delivery, Negotiator};
pub use push::PushTransport;
pub use request::RequestTransport;
pub use traits::{Tier, Transport};
pub use upload::{AttachmentUploader, UploadOutcome};
