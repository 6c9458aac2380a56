//! The conversation log.
//!
//! An append-only ordered list of entries.  User entries are immutable
//! once created; the trailing assistant entry grows in place while
//! frames stream in.  Entries are never removed.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Who authored an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// Preview reference to an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentRef {
    pub file_name: String,
    pub size_bytes: usize,
}

/// One rendered conversation entry.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationEntry {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub attachment: Option<AttachmentRef>,
}

/// Ordered, append-only conversation state.
#[derive(Debug, Default)]
pub struct ConversationStore {
    entries: Vec<ConversationEntry>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an immutable user entry.  Returns its index, which doubles
    /// as the message index sent with attachment uploads.
    pub fn push_user(&mut self, content: impl Into<String>, attachment: Option<AttachmentRef>) -> usize {
        self.entries.push(ConversationEntry {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            attachment,
        });
        self.entries.len() - 1
    }

    /// Append a complete assistant entry (upload results, synthetic
    /// answers).
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.entries.push(ConversationEntry {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            attachment: None,
        });
    }

    /// Extend the trailing assistant entry, creating one when the log is
    /// empty or ends with a user entry.
    pub fn append_assistant(&mut self, fragment: &str) {
        match self.entries.last_mut() {
            Some(entry) if entry.role == Role::Assistant => {
                entry.content.push_str(fragment);
            }
            _ => self.push_assistant(fragment),
        }
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&ConversationEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_extends_trailing_assistant_entry() {
        let mut store = ConversationStore::new();
        store.push_user("question", None);
        store.append_assistant("part one");
        store.append_assistant(", part two");

        assert_eq!(store.len(), 2);
        assert_eq!(store.last().unwrap().content, "part one, part two");
    }

    #[test]
    fn append_after_user_entry_creates_new_assistant_entry() {
        let mut store = ConversationStore::new();
        store.push_user("first", None);
        store.append_assistant("answer one");
        store.push_user("second", None);
        store.append_assistant("answer two");

        assert_eq!(store.len(), 4);
        assert_eq!(store.entries()[1].content, "answer one");
        assert_eq!(store.entries()[3].content, "answer two");
    }

    #[test]
    fn user_index_is_stable() {
        let mut store = ConversationStore::new();
        assert_eq!(store.push_user("a", None), 0);
        store.append_assistant("r");
        assert_eq!(
            store.push_user(
                "b",
                Some(AttachmentRef {
                    file_name: "doc.pdf".into(),
                    size_bytes: 10,
                })
            ),
            2
        );
    }
}
