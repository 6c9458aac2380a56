//! The delivery negotiator.
//!
//! Tries the configured tiers in strict priority order and resolves
//! exactly one outcome per message: delivered (some tier yielded a
//! terminal frame) or exhausted (every attempt on every tier failed).
//!
//! A tier succeeds the moment it yields a terminal frame — including a
//! well-formed `error` frame, which is a transport success even though
//! the application failed, and is never retried further down the chain.
//! A connection error, a close without a terminal frame, or the per-tier
//! timeout all count as tier failure and advance the negotiation.
//!
//! Single-flight: the caller guarantees one message at a time (the UI's
//! busy flag), so the negotiator is not reentrant.

use std::time::Duration;

use futures_util::StreamExt;

use courier_domain::config::ClientConfig;
use courier_domain::frame::{Envelope, ProtocolFrame};
use courier_domain::stream::FrameStream;
use courier_domain::trace::TraceEvent;

use crate::duplex::DuplexTransport;
use crate::push::PushTransport;
use crate::request::RequestTransport;
use crate::traits::{Tier, Transport};

/// The single resolved outcome of one message's negotiation.
#[derive(Debug, Clone)]
pub enum Delivery {
    /// Some tier yielded a terminal frame (already forwarded to the
    /// frame callback, echoed here for the caller's bookkeeping).
    Delivered {
        tier: Tier,
        terminal: ProtocolFrame,
    },
    /// Every tier was exhausted without a terminal frame.
    Exhausted { attempts: u32 },
}

pub struct Negotiator {
    tiers: Vec<Box<dyn Transport>>,
    tier_timeout: Duration,
}

impl Negotiator {
    /// Build a negotiator over an explicit tier list, highest priority
    /// first.  Tests inject fakes here.
    pub fn new(tiers: Vec<Box<dyn Transport>>, tier_timeout: Duration) -> Self {
        Self {
            tiers,
            tier_timeout,
        }
    }

    /// Build the production tier chain from configuration:
    /// duplex → server push → request/response.
    pub fn from_config(config: &ClientConfig, client: reqwest::Client) -> Self {
        let endpoints = &config.endpoints;
        let tiers: Vec<Box<dyn Transport>> = vec![
            Box::new(DuplexTransport::new(
                endpoints.duplex_url(),
                config.retry.clone(),
            )),
            Box::new(PushTransport::new(endpoints.push_urls(), client.clone())),
            Box::new(RequestTransport::new(endpoints.request_url(), client)),
        ];
        Self::new(tiers, config.tier_timeout())
    }

    /// Deliver one envelope.  Every inbound frame is handed to
    /// `on_frame` in arrival order; the return value tells the caller
    /// how the negotiation resolved.
    pub async fn deliver(
        &self,
        envelope: &Envelope,
        mut on_frame: impl FnMut(ProtocolFrame),
    ) -> Delivery {
        let mut attempts_total: u32 = 0;

        for (tier_index, transport) in self.tiers.iter().enumerate() {
            let tier = transport.tier();
            let attempts = transport.attempts().max(1);

            for attempt in 0..attempts {
                if attempt > 0 {
                    tokio::time::sleep(transport.pause()).await;
                }
                attempts_total += 1;

                TraceEvent::TierAttempt {
                    tier: tier.as_str().into(),
                    attempt: attempt + 1,
                }
                .emit();

                let stream = match transport.open(envelope, attempt).await {
                    Ok(stream) => stream,
                    Err(e) => {
                        tracing::debug!(tier = %tier, attempt, error = %e, "tier attempt failed to connect");
                        continue;
                    }
                };

                match tokio::time::timeout(self.tier_timeout, drain(stream, &mut on_frame)).await
                {
                    Ok(Some(terminal)) => {
                        tracing::debug!(tier = %tier, "terminal frame received");
                        return Delivery::Delivered { tier, terminal };
                    }
                    Ok(None) => {
                        tracing::debug!(tier = %tier, attempt, "stream ended without terminal frame");
                    }
                    Err(_) => {
                        tracing::warn!(
                            tier = %tier,
                            timeout_ms = self.tier_timeout.as_millis() as u64,
                            "tier timed out waiting for terminal frame"
                        );
                    }
                }
                // Dropping the stream tears the connection down.
            }

            if let Some(next) = self.tiers.get(tier_index + 1) {
                TraceEvent::TierFallback {
                    from: tier.as_str().into(),
                    to: next.tier().as_str().into(),
                }
                .emit();
            }
        }

        Delivery::Exhausted {
            attempts: attempts_total,
        }
    }
}

/// Forward frames until the stream ends, errors, or yields a terminal
/// frame.  Returns the terminal frame when one arrived.
async fn drain(
    mut stream: FrameStream,
    on_frame: &mut impl FnMut(ProtocolFrame),
) -> Option<ProtocolFrame> {
    while let Some(item) = stream.next().await {
        match item {
            Ok(frame) => {
                let terminal = frame.is_terminal().then(|| frame.clone());
                on_frame(frame);
                if terminal.is_some() {
                    return terminal;
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "connection failed mid-stream");
                return None;
            }
        }
    }
    None
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use parking_lot::Mutex;

    use courier_domain::error::{Error, Result};
    use courier_domain::page::PageContext;

    /// What one scripted attempt does.
    enum Script {
        /// `open` fails outright.
        ConnectFail,
        /// Yields these frames, then the stream ends.
        Frames(Vec<ProtocolFrame>),
        /// Connects, then never produces anything (forces the timeout).
        Hang,
    }

    struct FakeTransport {
        tier: Tier,
        scripts: Mutex<VecDeque<Script>>,
        declared_attempts: u32,
        opened: Arc<AtomicU32>,
    }

    impl FakeTransport {
        /// Returns the fake plus a counter of how often it was opened.
        fn new(tier: Tier, scripts: Vec<Script>) -> (Box<Self>, Arc<AtomicU32>) {
            let opened = Arc::new(AtomicU32::new(0));
            let fake = Box::new(Self {
                tier,
                declared_attempts: scripts.len() as u32,
                scripts: Mutex::new(scripts.into()),
                opened: opened.clone(),
            });
            (fake, opened)
        }
    }

    #[async_trait::async_trait]
    impl Transport for FakeTransport {
        fn tier(&self) -> Tier {
            self.tier
        }

        fn attempts(&self) -> u32 {
            self.declared_attempts
        }

        async fn open(&self, _envelope: &Envelope, _attempt: u32) -> Result<FrameStream> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            let script = self
                .scripts
                .lock()
                .pop_front()
                .unwrap_or(Script::ConnectFail);

            match script {
                Script::ConnectFail => Err(Error::Transport {
                    tier: self.tier.as_str().into(),
                    message: "connection refused".into(),
                }),
                Script::Frames(frames) => Ok(Box::pin(futures_util::stream::iter(
                    frames.into_iter().map(Ok),
                ))),
                Script::Hang => Ok(Box::pin(futures_util::stream::pending())),
            }
        }
    }

    fn envelope() -> Envelope {
        Envelope::new("hi", "session-1", "en", PageContext::general())
    }

    fn answer(reply: &str) -> ProtocolFrame {
        ProtocolFrame::Answer {
            reply: reply.into(),
            cta_buttons: vec![],
            intent: None,
        }
    }

    fn delta(text: &str) -> ProtocolFrame {
        ProtocolFrame::Delta { text: text.into() }
    }

    fn negotiator_over(tiers: Vec<Box<dyn Transport>>) -> Negotiator {
        Negotiator::new(tiers, Duration::from_millis(200))
    }

    #[tokio::test]
    async fn first_tier_success_stops_negotiation() {
        let (duplex, _) = FakeTransport::new(
            Tier::Duplex,
            vec![Script::Frames(vec![
                ProtocolFrame::Ready,
                delta("hello"),
                answer("hello"),
            ])],
        );
        let (push, push_opened) = FakeTransport::new(
            Tier::ServerPush,
            vec![Script::Frames(vec![answer("never")])],
        );

        let negotiator = negotiator_over(vec![duplex, push]);

        let mut seen = Vec::new();
        let delivery = negotiator
            .deliver(&envelope(), |frame| seen.push(frame))
            .await;

        match delivery {
            Delivery::Delivered { tier, .. } => assert_eq!(tier, Tier::Duplex),
            other => panic!("expected delivery, got: {other:?}"),
        }
        assert_eq!(seen.len(), 3);
        assert_eq!(push_opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn tiers_are_tried_in_strict_order() {
        let (duplex, duplex_opened) = FakeTransport::new(
            Tier::Duplex,
            vec![Script::ConnectFail, Script::ConnectFail],
        );
        let (push, push_opened) = FakeTransport::new(
            Tier::ServerPush,
            vec![Script::ConnectFail, Script::ConnectFail],
        );
        let (request, request_opened) = FakeTransport::new(
            Tier::RequestResponse,
            vec![Script::Frames(vec![answer("finally")])],
        );

        let negotiator = negotiator_over(vec![duplex, push, request]);
        let delivery = negotiator.deliver(&envelope(), |_| {}).await;

        match delivery {
            Delivery::Delivered { tier, terminal } => {
                assert_eq!(tier, Tier::RequestResponse);
                assert!(terminal.is_terminal());
            }
            other => panic!("expected delivery, got: {other:?}"),
        }
        assert_eq!(
            duplex_opened.load(Ordering::SeqCst),
            2,
            "duplex gets exactly its two tries"
        );
        assert_eq!(
            push_opened.load(Ordering::SeqCst),
            2,
            "push walks both candidate endpoints"
        );
        assert_eq!(
            request_opened.load(Ordering::SeqCst),
            1,
            "request/response is single-shot"
        );
    }

    #[tokio::test]
    async fn error_frame_is_terminal_and_never_retried_downchain() {
        let (duplex, _) = FakeTransport::new(
            Tier::Duplex,
            vec![Script::Frames(vec![ProtocolFrame::Error {
                detail: "intent handler crashed".into(),
            }])],
        );
        let (push, push_opened) = FakeTransport::new(
            Tier::ServerPush,
            vec![Script::Frames(vec![answer("should not run")])],
        );

        let negotiator = negotiator_over(vec![duplex, push]);
        let delivery = negotiator.deliver(&envelope(), |_| {}).await;

        match delivery {
            Delivery::Delivered { tier, terminal } => {
                assert_eq!(tier, Tier::Duplex);
                assert!(matches!(terminal, ProtocolFrame::Error { .. }));
            }
            other => panic!("expected delivery, got: {other:?}"),
        }
        assert_eq!(push_opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn silent_close_without_terminal_advances_tiers() {
        // Tier 1 connects and streams a delta but closes before any
        // terminal frame — that is tier failure, not an answer.
        let (duplex, _) = FakeTransport::new(
            Tier::Duplex,
            vec![
                Script::Frames(vec![ProtocolFrame::Ready, delta("par")]),
                Script::ConnectFail,
            ],
        );
        let (request, _) = FakeTransport::new(
            Tier::RequestResponse,
            vec![Script::Frames(vec![answer("complete")])],
        );

        let negotiator = negotiator_over(vec![duplex, request]);
        let mut seen = Vec::new();
        let delivery = negotiator
            .deliver(&envelope(), |frame| seen.push(frame))
            .await;

        match delivery {
            Delivery::Delivered { tier, .. } => assert_eq!(tier, Tier::RequestResponse),
            other => panic!("expected delivery, got: {other:?}"),
        }
        // Frames from the failed tier were still forwarded in order.
        assert!(matches!(seen[0], ProtocolFrame::Ready));
        assert!(matches!(seen[1], ProtocolFrame::Delta { .. }));
        assert!(matches!(seen[2], ProtocolFrame::Answer { .. }));
    }

    #[tokio::test]
    async fn hanging_tier_times_out_and_falls_through() {
        let (duplex, _) = FakeTransport::new(Tier::Duplex, vec![Script::Hang]);
        let (request, _) = FakeTransport::new(
            Tier::RequestResponse,
            vec![Script::Frames(vec![answer("rescued")])],
        );

        let negotiator = Negotiator::new(vec![duplex, request], Duration::from_millis(50));
        let delivery = negotiator.deliver(&envelope(), |_| {}).await;

        match delivery {
            Delivery::Delivered { tier, .. } => assert_eq!(tier, Tier::RequestResponse),
            other => panic!("expected delivery, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn all_tiers_exhausted_resolves_failure() {
        let (duplex, _) = FakeTransport::new(
            Tier::Duplex,
            vec![Script::ConnectFail, Script::ConnectFail],
        );
        let (push, _) = FakeTransport::new(Tier::ServerPush, vec![Script::ConnectFail]);
        let (request, _) = FakeTransport::new(Tier::RequestResponse, vec![Script::ConnectFail]);

        let negotiator = negotiator_over(vec![duplex, push, request]);
        let delivery = negotiator.deliver(&envelope(), |_| {}).await;

        match delivery {
            Delivery::Exhausted { attempts } => assert_eq!(attempts, 4),
            other => panic!("expected exhaustion, got: {other:?}"),
        }
    }
}
