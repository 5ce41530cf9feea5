//! Append-only conversation timeline.
//!
//! The timeline is shared by every in-flight submission. Each append is a
//! single critical section, so entries from concurrent submissions may
//! interleave but never tear.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

use crate::render::RenderableContent;

/// Position-derived message identifier, increasing with insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(u64);

impl MessageId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// A timeline entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    id: MessageId,
    role: Role,
    content: RenderableContent,
    created_at: DateTime<Utc>,
}

impl Message {
    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &RenderableContent {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Default)]
struct State {
    entries: Vec<Message>,
    /// Entries scrolled back from the latest; 0 follows the latest entry.
    scroll_offset: usize,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<State>,
    appended: watch::Sender<usize>,
}

/// Cloneable handle to a shared timeline.
#[derive(Debug, Clone)]
pub struct Timeline {
    shared: Arc<Shared>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    /// Creates an empty timeline.
    pub fn new() -> Self {
        let (appended, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::default()),
                appended,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Appends a message and scrolls to it.
    ///
    /// The new length is published while the entry lock is held, so
    /// subscribers observe lengths in append order.
    pub fn append(&self, role: Role, content: RenderableContent) -> MessageId {
        let mut state = self.state();
        let id = MessageId(state.entries.len() as u64 + 1);
        state.entries.push(Message {
            id,
            role,
            content,
            created_at: Utc::now(),
        });
        state.scroll_offset = 0;
        self.shared.appended.send_replace(state.entries.len());
        id
    }

    /// Snapshot of every message in insertion order.
    pub fn all(&self) -> Vec<Message> {
        self.state().entries.clone()
    }

    /// Messages appended at or after position `start`.
    pub fn since(&self, start: usize) -> Vec<Message> {
        self.state()
            .entries
            .get(start..)
            .map(<[Message]>::to_vec)
            .unwrap_or_default()
    }

    /// The most recently appended message.
    pub fn latest(&self) -> Option<Message> {
        self.state().entries.last().cloned()
    }

    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().entries.is_empty()
    }

    /// Receiver notified with the new length after every append.
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.shared.appended.subscribe()
    }

    /// Entries currently scrolled back from the latest.
    pub fn scroll_offset(&self) -> usize {
        self.state().scroll_offset
    }

    /// Scrolls back towards older entries.
    pub fn scroll_up(&self, by: usize) {
        let mut state = self.state();
        let max = state.entries.len().saturating_sub(1);
        state.scroll_offset = state.scroll_offset.saturating_add(by).min(max);
    }

    /// Scrolls forward towards the latest entry.
    pub fn scroll_down(&self, by: usize) {
        let mut state = self.state();
        state.scroll_offset = state.scroll_offset.saturating_sub(by);
    }
}
