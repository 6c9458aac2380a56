//! `courier-sessions` — durable session identity and page context.
//!
//! The session store owns the one piece of persistent client state: an
//! opaque session identifier minted once per profile and reused across
//! restarts.  The context extractor derives a best-effort description of
//! the page the user is on; neither may ever block or fail a send.

pub mod context;
pub mod store;

pub use context::extract_context;
pub use store::SessionStore;
