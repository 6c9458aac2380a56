//! Client configuration.
//!
//! All fields have serde defaults so an empty `{}` deserializes into a
//! working configuration pointed at a local backend.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClientConfig {
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    #[serde(default)]
    pub retry: RetryPolicy,

    /// Upper bound on how long any single tier may wait for a terminal
    /// frame before the negotiator advances to the next tier.
    #[serde(default = "d_tier_timeout_secs")]
    pub tier_timeout_secs: u64,

    /// Language code tagged onto every envelope (from the embedder's
    /// localization provider).
    #[serde(default = "d_language")]
    pub language: String,
}

impl ClientConfig {
    pub fn tier_timeout(&self) -> Duration {
        Duration::from_secs(self.tier_timeout_secs.max(1))
    }
}

fn d_tier_timeout_secs() -> u64 {
    90
}

fn d_language() -> String {
    "en".into()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Endpoints
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Where each transport tier connects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    /// HTTP(S) origin of the backend, no trailing slash.
    #[serde(default = "d_base_url")]
    pub base_url: String,

    /// Duplex channel path (tier 1).
    #[serde(default = "d_duplex_path")]
    pub duplex_path: String,

    /// Candidate push-stream paths (tier 2), tried in order.
    #[serde(default = "d_push_paths")]
    pub push_paths: Vec<String>,

    /// Single-shot request/response path (tier 3).
    #[serde(default = "d_request_path")]
    pub request_path: String,

    /// Attachment upload path.
    #[serde(default = "d_upload_path")]
    pub upload_path: String,
}

impl EndpointsConfig {
    /// The duplex URL, with the scheme rewritten for WebSocket.
    pub fn duplex_url(&self) -> String {
        let base = self
            .base_url
            .replacen("https://", "wss://", 1)
            .replacen("http://", "ws://", 1);
        format!("{}{}", base.trim_end_matches('/'), self.duplex_path)
    }

    pub fn push_urls(&self) -> Vec<String> {
        self.push_paths
            .iter()
            .map(|p| format!("{}{}", self.base_url.trim_end_matches('/'), p))
            .collect()
    }

    pub fn request_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.request_path)
    }

    pub fn upload_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.upload_path)
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            base_url: d_base_url(),
            duplex_path: d_duplex_path(),
            push_paths: d_push_paths(),
            request_path: d_request_path(),
            upload_path: d_upload_path(),
        }
    }
}

fn d_base_url() -> String {
    "http://localhost:8080".into()
}

fn d_duplex_path() -> String {
    "/ws/assistant".into()
}

fn d_push_paths() -> Vec<String> {
    vec!["/api/assistant/stream".into(), "/api/chat/stream".into()]
}

fn d_request_path() -> String {
    "/api/chat".into()
}

fn d_upload_path() -> String {
    "/api/chat/upload".into()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Retry policy
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// How the duplex tier retries before the negotiator falls through to
/// the push tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Connection attempts on the duplex tier.
    #[serde(default = "d_attempts")]
    pub attempts: u32,

    /// Fixed pause between duplex attempts, in milliseconds.
    #[serde(default = "d_pause_ms")]
    pub pause_ms: u64,
}

impl RetryPolicy {
    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: d_attempts(),
            pause_ms: d_pause_ms(),
        }
    }
}

fn d_attempts() -> u32 {
    2
}

fn d_pause_ms() -> u64 {
    250
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_working_defaults() {
        let cfg: ClientConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.retry.attempts, 2);
        assert_eq!(cfg.retry.pause_ms, 250);
        assert_eq!(cfg.tier_timeout_secs, 90);
        assert_eq!(cfg.language, "en");
        assert_eq!(cfg.endpoints.push_paths.len(), 2);
    }

    #[test]
    fn duplex_url_rewrites_scheme() {
        let cfg = EndpointsConfig {
            base_url: "https://app.example.com".into(),
            ..Default::default()
        };
        assert_eq!(cfg.duplex_url(), "wss://app.example.com/ws/assistant");

        let cfg = EndpointsConfig {
            base_url: "http://localhost:8080/".into(),
            ..Default::default()
        };
        assert_eq!(cfg.duplex_url(), "ws://localhost:8080/ws/assistant");
    }

    #[test]
    fn urls_join_without_double_slash() {
        let cfg = EndpointsConfig {
            base_url: "http://h:1/".into(),
            ..Default::default()
        };
        assert_eq!(cfg.request_url(), "http://h:1/api/chat");
        assert_eq!(cfg.upload_url(), "http://h:1/api/chat/upload");
        assert_eq!(
            cfg.push_urls(),
            vec![
                "http://h:1/api/assistant/stream".to_string(),
                "http://h:1/api/chat/stream".to_string(),
            ]
        );
    }
}
