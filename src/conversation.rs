//! Rolling conversation log exchanged with the model.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Role of a message in the chat-completion conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single role-tagged message, serialized as-is onto the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
}

impl ConversationMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Ordered log of messages exchanged with the model.
///
/// Optionally seeded with a few-shot priming script before any live turn.
/// The priming prefix is pinned: eviction under `live_window` only ever
/// removes the oldest live messages, and [`ConversationStore::drop_last`]
/// refuses to reach into the prefix.
#[derive(Debug)]
pub struct ConversationStore {
    messages: Vec<ConversationMessage>,
    primed_len: usize,
    live_window: Option<usize>,
}

impl ConversationStore {
    /// Create an empty store with the given live-suffix cap
    /// (`None` = unbounded, matching long-standing behavior).
    pub fn new(live_window: Option<usize>) -> Self {
        Self {
            messages: Vec::new(),
            primed_len: 0,
            live_window,
        }
    }

    /// Create a store seeded with a few-shot priming script.
    ///
    /// The script is a JSON array of `{role, content}` objects. A load
    /// failure is not fatal: the store starts empty and selection quality
    /// is expected to suffer, so the failure is surfaced as a warning.
    pub fn primed(path: &Path, live_window: Option<usize>) -> Self {
        let mut store = Self::new(live_window);
        match load_fewshot_script(path) {
            Ok(messages) => {
                debug!(
                    target: "conversation",
                    count = messages.len(),
                    path = %path.display(),
                    "loaded few-shot priming script"
                );
                store.primed_len = messages.len();
                store.messages = messages;
            }
            Err(cause) => {
                warn!(
                    target: "conversation",
                    path = %path.display(),
                    %cause,
                    "unable to load few-shot priming script; starting unprimed"
                );
            }
        }
        store
    }

    /// Append a message, evicting the oldest live messages when the live
    /// suffix exceeds its cap. The priming prefix is never evicted.
    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(ConversationMessage::new(role, content));
        if let Some(cap) = self.live_window {
            while self.messages.len() - self.primed_len > cap {
                self.messages.remove(self.primed_len);
            }
        }
    }

    /// Remove and return the most recently appended live message.
    ///
    /// Returns `None` when only the priming prefix remains.
    pub fn drop_last(&mut self) -> Option<ConversationMessage> {
        if self.messages.len() > self.primed_len {
            self.messages.pop()
        } else {
            None
        }
    }

    /// Ordered view of the full conversation for transport serialization.
    pub fn snapshot(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Length of the pinned priming prefix.
    pub fn primed_len(&self) -> usize {
        self.primed_len
    }
}

fn load_fewshot_script(path: &Path) -> Result<Vec<ConversationMessage>, String> {
    let raw = fs::read_to_string(path).map_err(|err| err.to_string())?;
    serde_json::from_str(&raw).map_err(|err| err.to_string())
}
