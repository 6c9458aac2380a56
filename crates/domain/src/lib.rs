//! `courier-domain` — shared types for the Courier delivery client.
//!
//! Everything the other crates agree on lives here: the error taxonomy,
//! client configuration, the assistant protocol frames, the outbound
//! message envelope, page context, and structured trace events.

pub mod config;
pub mod error;
pub mod frame;
pub mod page;
pub mod stream;
pub mod trace;
