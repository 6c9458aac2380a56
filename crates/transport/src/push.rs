//! Tier 2: server-push event stream.
//!
//! POSTs the envelope to one of a short list of candidate endpoints and
//! reads the response body as a server-sent event stream.  Each `data:`
//! payload is parsed as a protocol frame; malformed payloads are dropped
//! without failing the tier.  The attempt index selects the candidate
//! endpoint, so the negotiator's per-tier retry loop walks the list.

use courier_domain::error::{Error, Result};
use courier_domain::frame::{Envelope, ProtocolFrame};
use courier_domain::stream::FrameStream;

use crate::traits::{Tier, Transport};

pub struct PushTransport {
    urls: Vec<String>,
    client: reqwest::Client,
}

impl PushTransport {
    pub fn new(urls: Vec<String>, client: reqwest::Client) -> Self {
        Self { urls, client }
    }
}

#[async_trait::async_trait]
impl Transport for PushTransport {
    fn tier(&self) -> Tier {
        Tier::ServerPush
    }

    fn attempts(&self) -> u32 {
        self.urls.len() as u32
    }

    async fn open(&self, envelope: &Envelope, attempt: u32) -> Result<FrameStream> {
        let url = self
            .urls
            .get(attempt as usize)
            .ok_or_else(|| Error::Config("push endpoint index out of range".into()))?;

        tracing::debug!(url = %url, "opening push stream");

        let response = self
            .client
            .post(url)
            .json(envelope)
            .send()
            .await
            .map_err(|e| Error::Transport {
                tier: Tier::ServerPush.as_str().into(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transport {
                tier: Tier::ServerPush.as_str().into(),
                message: format!("endpoint {url} returned {status}"),
            });
        }

        Ok(event_stream(response))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SSE plumbing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Turn an event-stream response body into a frame stream.
///
/// Buffers chunks, splits on `\n\n`, parses each `data:` payload as a
/// frame.  The body closing without a terminal frame simply ends the
/// stream; deciding what that means is the negotiator's job.
fn event_stream(response: reqwest::Response) -> FrameStream {
    Box::pin(async_stream::stream! {
        let mut response = response;
        let mut buffer = String::new();

        loop {
            match response.chunk().await {
                Ok(Some(bytes)) => {
                    buffer.push_str(&String::from_utf8_lossy(&bytes));
                    for payload in drain_event_payloads(&mut buffer) {
                        if let Some(frame) = ProtocolFrame::parse(&payload) {
                            yield Ok(frame);
                        }
                    }
                }
                Ok(None) => {
                    // Body closed — flush any trailing partial event.
                    if !buffer.trim().is_empty() {
                        buffer.push_str("\n\n");
                        for payload in drain_event_payloads(&mut buffer) {
                            if let Some(frame) = ProtocolFrame::parse(&payload) {
                                yield Ok(frame);
                            }
                        }
                    }
                    break;
                }
                Err(e) => {
                    yield Err(Error::Transport {
                        tier: Tier::ServerPush.as_str().into(),
                        message: e.to_string(),
                    });
                    break;
                }
            }
        }
    })
}

/// Extract complete `data:` payloads from an SSE buffer.
///
/// Events are delimited by `\n\n`; `event:`, `id:`, and `retry:` lines
/// are skipped.  The buffer is drained in place, leaving any trailing
/// partial event for the next chunk.
fn drain_event_payloads(buffer: &mut String) -> Vec<String> {
    let mut payloads = Vec::new();

    while let Some(pos) = buffer.find("\n\n") {
        let block: String = buffer.drain(..pos).collect();
        buffer.drain(..2);

        for line in block.lines() {
            if let Some(data) = line.trim().strip_prefix("data:") {
                let data = data.trim();
                if !data.is_empty() {
                    payloads.push(data.to_string());
                }
            }
        }
    }

    payloads
}
