//! Page context extraction.
//!
//! Derives the [`PageContext`] attached to every envelope from a raw
//! [`PageSnapshot`].  Pure and infallible: any missing read degrades to
//! the general context, never to an error.

use courier_domain::page::{PageContext, PageSnapshot, Section};

/// Derive the envelope context from the embedder's navigation snapshot.
pub fn extract_context(snapshot: &PageSnapshot) -> PageContext {
    // A failed path read means we know nothing about the page; that is
    // the general context, not the landing page.
    let Some(path) = snapshot.path.clone() else {
        return PageContext {
            title: snapshot.title.clone().unwrap_or_default(),
            heading: snapshot.heading.clone().unwrap_or_default(),
            meta_description: snapshot.meta_description.clone().unwrap_or_default(),
            ..PageContext::general()
        };
    };

    PageContext {
        section: classify_section(&path),
        title: snapshot.title.clone().unwrap_or_default(),
        heading: snapshot.heading.clone().unwrap_or_default(),
        meta_description: snapshot.meta_description.clone().unwrap_or_default(),
        path,
    }
}

/// Classify the page section from the path alone.
///
/// The landing page is `hero`; anything unrecognized is `general`.
fn classify_section(path: &str) -> Section {
    let normalized = path.trim().trim_end_matches('/').to_ascii_lowercase();

    if normalized.is_empty() {
        return Section::Hero;
    }

    if contains_any(&normalized, &["pricing", "plans", "payment"]) {
        Section::Pricing
    } else if contains_any(&normalized, &["features", "capabilities", "product"]) {
        Section::Features
    } else if contains_any(&normalized, &["demo", "sandbox", "try"]) {
        Section::Demo
    } else if contains_any(&normalized, &["about", "team", "company"]) {
        Section::About
    } else if contains_any(&normalized, &["contact", "support", "help"]) {
        Section::Contact
    } else {
        Section::General
    }
}

fn contains_any(path: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| path.contains(n))
}
