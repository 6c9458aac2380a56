//! Directive markers embedded in answer text.
//!
//! The backend encodes structured UI directives as recognizable
//! substrings inside the reply: a payment reference (id marker, fenced
//! address block, bold amount, optional payment-page link) and demo
//! launch markers.  This parser extracts them and strips every matched
//! fragment from the text shown to the user.  It is deliberately
//! independent of the frame-folding assembler.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// A payment reference extracted from an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentDetails {
    pub payment_id: u64,
    pub amount: Option<f64>,
    /// Lowercased currency code (e.g. `"btc"`).
    pub currency: Option<String>,
    pub address: Option<String>,
    pub page_url: Option<String>,
}

/// A demo launch call-to-action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DemoLaunch {
    Sandbox,
    Live,
}

/// The result of scanning one reply.
#[derive(Debug, Clone)]
pub struct DirectiveScan {
    /// Reply text with every matched directive fragment removed.
    pub display_text: String,
    pub payment: Option<PaymentDetails>,
    pub demo: Option<DemoLaunch>,
}

const SANDBOX_MARKER: &str = "[SANDBOX_DEMO_START]";
const LIVE_MARKER: &str = "[LIVE_DEMO_START]";

struct Patterns {
    payment_id: Regex,
    amount: Regex,
    fenced_block: Regex,
    page_link: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        payment_id: Regex::new(r"\[PAYMENT_ID:(\d+)\]").expect("static pattern"),
        amount: Regex::new(r"\*\*\s*([0-9]+(?:\.[0-9]+)?)\s+([A-Za-z]{2,10})\s*\*\*")
            .expect("static pattern"),
        fenced_block: Regex::new(r"(?s)```[a-zA-Z0-9]*\s*(.*?)\s*```").expect("static pattern"),
        page_link: Regex::new(r"\[Payment-Page\]\(([^)]+)\)").expect("static pattern"),
    })
}

/// Extract zero or more known directives from a raw reply.
pub fn scan(reply: &str) -> DirectiveScan {
    let mut text = reply.to_string();
    let mut demo = None;

    if text.contains(SANDBOX_MARKER) {
        demo = Some(DemoLaunch::Sandbox);
        text = text.replace(SANDBOX_MARKER, "");
    }
    if text.contains(LIVE_MARKER) {
        demo.get_or_insert(DemoLaunch::Live);
        text = text.replace(LIVE_MARKER, "");
    }

    let payment = extract_payment(&mut text);

    DirectiveScan {
        display_text: tidy(&text),
        payment,
        demo,
    }
}

/// Parse and strip the payment directive, if present.
///
/// The id marker gates everything else: a fenced block or bold token in
/// an answer with no `[PAYMENT_ID:…]` is ordinary content and stays.
fn extract_payment(text: &mut String) -> Option<PaymentDetails> {
    let p = patterns();

    let id_match = p.payment_id.captures(text)?;
    let payment_id: u64 = id_match.get(1)?.as_str().parse().ok()?;
    let id_range = id_match.get(0)?.range();
    text.replace_range(id_range, "");

    let mut amount = None;
    let mut currency = None;
    if let Some(caps) = p.amount.captures(text) {
        amount = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok());
        currency = caps.get(2).map(|m| m.as_str().to_ascii_lowercase());
        if let Some(whole) = caps.get(0) {
            let range = whole.range();
            text.replace_range(range, "");
        }
    }

    let mut address = None;
    if let Some(caps) = p.fenced_block.captures(text) {
        address = caps.get(1).map(|m| m.as_str().trim().to_string());
        if let Some(whole) = caps.get(0) {
            let range = whole.range();
            text.replace_range(range, "");
        }
    }

    let mut page_url = None;
    if let Some(caps) = p.page_link.captures(text) {
        page_url = caps.get(1).map(|m| m.as_str().to_string());
        if let Some(whole) = caps.get(0) {
            let range = whole.range();
            text.replace_range(range, "");
        }
    }

    Some(PaymentDetails {
        payment_id,
        amount,
        currency,
        address,
        page_url,
    })
}

/// Collapse the whitespace holes left by stripped fragments.
fn tidy(text: &str) -> String {
    let collapsed = patterns_tidy().replace_all(text, "\n\n");
    collapsed.trim().to_string()
}

fn patterns_tidy() -> &'static Regex {
    static TIDY: OnceLock<Regex> = OnceLock::new();
    TIDY.get_or_init(|| Regex::new(r"\n{3,}").expect("static pattern"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_reply_passes_through() {
        let scan = scan("The audit covers chain-of-custody records.");
        assert_eq!(scan.display_text, "The audit covers chain-of-custody records.");
        assert!(scan.payment.is_none());
        assert!(scan.demo.is_none());
    }

    #[test]
    fn payment_directive_is_extracted_and_stripped() {
        let reply = "Please settle the invoice.\n\
                     [PAYMENT_ID:42]\n\
                     ```\nbc1q7zexamplepaymentaddress\n```\n\
                     **0.01 BTC**\n\
                     [Payment-Page](https://pay.example/42)\n\
                     Let me know once sent.";
        let scan = scan(reply);

        let payment = scan.payment.expect("payment extracted");
        assert_eq!(payment.payment_id, 42);
        assert_eq!(payment.amount, Some(0.01));
        assert_eq!(payment.currency.as_deref(), Some("btc"));
        assert_eq!(
            payment.address.as_deref(),
            Some("bc1q7zexamplepaymentaddress")
        );
        assert_eq!(payment.page_url.as_deref(), Some("https://pay.example/42"));

        assert!(!scan.display_text.contains("PAYMENT_ID"));
        assert!(!scan.display_text.contains("```"));
        assert!(!scan.display_text.contains("0.01"));
        assert!(!scan.display_text.contains("Payment-Page"));
        assert!(scan.display_text.starts_with("Please settle the invoice."));
        assert!(scan.display_text.ends_with("Let me know once sent."));
    }

    #[test]
    fn payment_without_optional_parts_still_parses() {
        let scan = scan("[PAYMENT_ID:7] pay soon");
        let payment = scan.payment.expect("payment extracted");
        assert_eq!(payment.payment_id, 7);
        assert!(payment.amount.is_none());
        assert!(payment.address.is_none());
        assert_eq!(scan.display_text, "pay soon");
    }

    #[test]
    fn fenced_block_without_payment_id_is_ordinary_content() {
        let reply = "Run this:\n```\ncourier --help\n```";
        let scan = scan(reply);
        assert!(scan.payment.is_none());
        assert!(scan.display_text.contains("courier --help"));
        assert!(scan.display_text.contains("```"));
    }

    #[test]
    fn demo_markers_are_recognized_and_stripped() {
        let scan_sandbox = scan("Try it yourself. [SANDBOX_DEMO_START]");
        assert_eq!(scan_sandbox.demo, Some(DemoLaunch::Sandbox));
        assert_eq!(scan_sandbox.display_text, "Try it yourself.");

        let scan_live = scan("[LIVE_DEMO_START] Start whenever ready.");
        assert_eq!(scan_live.demo, Some(DemoLaunch::Live));
        assert_eq!(scan_live.display_text, "Start whenever ready.");
    }

    #[test]
    fn stripping_does_not_leave_blank_line_runs() {
        let reply = "Before.\n\n[PAYMENT_ID:1]\n\n\nAfter.";
        let scan = scan(reply);
        assert!(!scan.display_text.contains("\n\n\n"));
        assert!(scan.display_text.starts_with("Before."));
        assert!(scan.display_text.ends_with("After."));
    }
}
