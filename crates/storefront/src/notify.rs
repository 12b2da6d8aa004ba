//! User-visible notifications (toasts).
//!
//! Every flow reports its outcome here instead of failing loudly. The front
//! end drains the queue and shows each notice once.

use std::sync::{Arc, Mutex};

/// Severity of a notice, which decides how the front end styles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A single toast message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Shared queue of pending notices.
///
/// Cheap to clone; clones push into the same queue. The queue is unbounded
/// and only [`Notifications::drain`] empties it, so whoever owns the front end
/// must drain it after each action (the CLI does so once per command).
#[derive(Debug, Clone, Default)]
pub struct Notifications {
    queue: Arc<Mutex<Vec<Notice>>>,
}

impl Notifications {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Error, message.into());
    }

    /// Take every pending notice, oldest first.
    #[must_use]
    pub fn drain(&self) -> Vec<Notice> {
        self.queue
            .lock()
            .map(|mut queue| std::mem::take(&mut *queue))
            .unwrap_or_default()
    }

    /// Copy of the pending notices without consuming them.
    #[must_use]
    pub fn pending(&self) -> Vec<Notice> {
        self.queue
            .lock()
            .map(|queue| queue.clone())
            .unwrap_or_default()
    }

    fn push(&self, level: NoticeLevel, message: String) {
        match level {
            NoticeLevel::Error => tracing::warn!(%message, "notice"),
            NoticeLevel::Success => tracing::debug!(%message, "notice"),
        }

        if let Ok(mut queue) = self.queue.lock() {
            queue.push(Notice { level, message });
        }
    }
}
