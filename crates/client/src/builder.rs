//! Builder pattern for constructing a [`ChatClient`].

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use parking_lot::RwLock;

use courier_domain::config::{ClientConfig, RetryPolicy};
use courier_domain::error::{Error, Result};
use courier_sessions::SessionStore;
use courier_transport::{AttachmentUploader, Negotiator, Transport};

use crate::client::ChatClient;
use crate::conversation::ConversationStore;
use crate::ui::UiState;

/// Fluent builder for [`ChatClient`].
///
/// # Example
///
/// ```rust,no_run
/// # use courier_client::ChatClientBuilder;
/// let client = ChatClientBuilder::new()
///     .base_url("https://app.example.com")
///     .language("en")
///     .profile_dir("/tmp/courier-profile")
///     .build()
///     .unwrap();
/// ```
pub struct ChatClientBuilder {
    config: ClientConfig,
    profile_dir: Option<PathBuf>,
    transports: Option<Vec<Box<dyn Transport>>>,
}

impl ChatClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            profile_dir: None,
            transports: None,
        }
    }

    /// Replace the entire configuration at once.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the backend origin (e.g. `https://app.example.com`).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.endpoints.base_url = url.into();
        self
    }

    /// Language code tagged onto every envelope.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.config.language = language.into();
        self
    }

    /// Directory holding the durable session identifier.
    pub fn profile_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profile_dir = Some(dir.into());
        self
    }

    /// Override the duplex tier's retry policy.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Override the per-tier terminal-frame timeout.
    pub fn tier_timeout(mut self, timeout: Duration) -> Self {
        self.config.tier_timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Replace the production tier chain, highest priority first.
    /// Tests inject deterministic fakes here.
    pub fn transports(mut self, tiers: Vec<Box<dyn Transport>>) -> Self {
        self.transports = Some(tiers);
        self
    }

    /// Build the [`ChatClient`].
    pub fn build(self) -> Result<ChatClient> {
        let profile_dir = self
            .profile_dir
            .ok_or_else(|| Error::Config("profile_dir is required".into()))?;
        let session = SessionStore::open(&profile_dir)?;

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Config(format!("http client: {e}")))?;

        let negotiator = match self.transports {
            Some(tiers) => Negotiator::new(tiers, self.config.tier_timeout()),
            None => Negotiator::from_config(&self.config, http.clone()),
        };
        let uploader = AttachmentUploader::new(self.config.endpoints.upload_url(), http);

        Ok(ChatClient {
            config: self.config,
            session,
            negotiator,
            uploader,
            conversation: RwLock::new(ConversationStore::new()),
            ui: RwLock::new(UiState::default()),
            busy: AtomicBool::new(false),
        })
    }
}

impl Default for ChatClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
