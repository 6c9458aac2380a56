//! Page context — a lightweight description of the page the user is on,
//! attached to every outbound envelope so the assistant can tailor its
//! answer to what the user is currently looking at.

use serde::{Deserialize, Serialize};

/// A raw snapshot of the embedder's navigation state.
///
/// Fields are `Option` because every underlying read is best-effort: a
/// missing title or heading must never block a send.
#[derive(Debug, Clone, Default)]
pub struct PageSnapshot {
    pub path: Option<String>,
    pub title: Option<String>,
    pub heading: Option<String>,
    pub meta_description: Option<String>,
}

impl PageSnapshot {
    /// Convenience constructor for embedders that only track a path.
    pub fn at_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }
}

/// The derived page description sent with every envelope.
///
/// Recomputed fresh on every send; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContext {
    pub section: Section,
    pub path: String,
    pub title: String,
    pub heading: String,
    /// Kept for rendering/analytics, not part of the wire envelope.
    #[serde(skip)]
    pub meta_description: String,
}

impl PageContext {
    /// The fallback context used when nothing about the page is known.
    pub fn general() -> Self {
        Self {
            section: Section::General,
            path: "/".into(),
            title: String::new(),
            heading: String::new(),
            meta_description: String::new(),
        }
    }
}

/// Closed classification of the page the user is on, derived from the
/// path alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Hero,
    Pricing,
    Features,
    Demo,
    About,
    Contact,
    General,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::Pricing => "pricing",
            Self::Features => "features",
            Self::Demo => "demo",
            Self::About => "about",
            Self::Contact => "contact",
            Self::General => "general",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
