//! Tier 3: single-shot request/response.
//!
//! One blocking call, no streaming.  The complete reply body is folded
//! into a synthetic terminal `answer` frame so the assembler sees the
//! same vocabulary on every tier.

use serde::Deserialize;

use courier_domain::error::{Error, Result};
use courier_domain::frame::{CtaButton, Envelope, ProtocolFrame};
use courier_domain::stream::FrameStream;

use crate::traits::{Tier, Transport};

/// Complete-answer body returned by the request/response endpoint.
#[derive(Debug, Deserialize)]
struct AnswerBody {
    reply: String,
    #[serde(default)]
    cta_buttons: Vec<CtaButton>,
    #[serde(default)]
    intent: Option<String>,
}

pub struct RequestTransport {
    url: String,
    client: reqwest::Client,
}

impl RequestTransport {
    pub fn new(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }
}

#[async_trait::async_trait]
impl Transport for RequestTransport {
    fn tier(&self) -> Tier {
        Tier::RequestResponse
    }

    async fn open(&self, envelope: &Envelope, _attempt: u32) -> Result<FrameStream> {
        tracing::debug!(url = %self.url, "sending single-shot request");

        let response = self
            .client
            .post(&self.url)
            .json(envelope)
            .send()
            .await
            .map_err(|e| Error::Transport {
                tier: Tier::RequestResponse.as_str().into(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transport {
                tier: Tier::RequestResponse.as_str().into(),
                message: format!("endpoint returned {status}"),
            });
        }

        let body: AnswerBody = response.json().await.map_err(|e| Error::Transport {
            tier: Tier::RequestResponse.as_str().into(),
            message: format!("malformed answer body: {e}"),
        })?;

        let frame = ProtocolFrame::Answer {
            reply: body.reply,
            cta_buttons: body.cta_buttons,
            intent: body.intent,
        };

        Ok(Box::pin(futures_util::stream::iter(vec![Ok(frame)])))
    }
}
