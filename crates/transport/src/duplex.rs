//! Tier 1: persistent duplex channel over WebSocket.
//!
//! Connects, sends the envelope as a single text message, then yields
//! inbound frames until a terminal frame or close.  After the terminal
//! frame the transport sends a close itself so no channel is left open.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use courier_domain::config::RetryPolicy;
use courier_domain::error::{Error, Result};
use courier_domain::frame::{Envelope, ProtocolFrame};
use courier_domain::stream::FrameStream;

use crate::traits::{Tier, Transport};

pub struct DuplexTransport {
    url: String,
    retry: RetryPolicy,
}

impl DuplexTransport {
    pub fn new(url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            url: url.into(),
            retry,
        }
    }
}

#[async_trait::async_trait]
impl Transport for DuplexTransport {
    fn tier(&self) -> Tier {
        Tier::Duplex
    }

    fn attempts(&self) -> u32 {
        self.retry.attempts.max(1)
    }

    fn pause(&self) -> Duration {
        self.retry.pause()
    }

    async fn open(&self, envelope: &Envelope, attempt: u32) -> Result<FrameStream> {
        tracing::debug!(url = %self.url, attempt, "opening duplex channel");

        let (ws, _response) = tokio_tungstenite::connect_async(&self.url)
            .await
            .map_err(|e| Error::Transport {
                tier: Tier::Duplex.as_str().into(),
                message: e.to_string(),
            })?;
        let (mut sink, mut stream) = ws.split();

        let json = serde_json::to_string(envelope)?;
        sink.send(Message::Text(json))
            .await
            .map_err(|e| Error::Transport {
                tier: Tier::Duplex.as_str().into(),
                message: e.to_string(),
            })?;

        Ok(Box::pin(async_stream::stream! {
            while let Some(msg) = stream.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        let Some(frame) = ProtocolFrame::parse(&text) else {
                            continue;
                        };
                        let terminal = frame.is_terminal();
                        yield Ok(frame);
                        if terminal {
                            // Resolved: close our side instead of waiting
                            // for the server.
                            let _ = sink.send(Message::Close(None)).await;
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        yield Err(Error::Transport {
                            tier: Tier::Duplex.as_str().into(),
                            message: e.to_string(),
                        });
                        break;
                    }
                }
            }
        }))
    }
}
