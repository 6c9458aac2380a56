//! The transport tier abstraction.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use courier_domain::error::Result;
use courier_domain::frame::Envelope;
use courier_domain::stream::FrameStream;

/// One transport strategy, attempted in fixed priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Duplex,
    ServerPush,
    RequestResponse,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Duplex => "duplex",
            Self::ServerPush => "server_push",
            Self::RequestResponse => "request_response",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single transport tier.
///
/// `open` performs one delivery attempt: it sends the envelope and
/// returns the inbound frame sequence.  The negotiator owns retry
/// ordering, terminal detection, and the per-tier timeout; a transport
/// only distinguishes "connected and streaming" from "could not
/// connect".
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    fn tier(&self) -> Tier;

    /// How many attempts this tier gets.  The duplex tier retries the
    /// same endpoint; the push tier uses the attempt index to walk its
    /// candidate endpoints.
    fn attempts(&self) -> u32 {
        1
    }

    /// Pause inserted between consecutive attempts on this tier.
    fn pause(&self) -> Duration {
        Duration::ZERO
    }

    /// Send the envelope and return the inbound frame stream.
    ///
    /// Dropping the returned stream tears the connection down.
    async fn open(&self, envelope: &Envelope, attempt: u32) -> Result<FrameStream>;
}
