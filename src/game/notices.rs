//! User-visible notices, queued for the client to drain.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::domain::TimeMs;
use crate::schedule::lock;

/// Oldest notices are dropped past this many undrained entries.
pub const MAX_QUEUED_NOTICES: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    ItemUsed,
    ItemUnavailable,
    SearchBlocked,
    SearchCanceled,
    MatchFound,
    DuelResult,
    LocationError,
    MissionCompleted,
    ProfileSaved,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub at_ms: TimeMs,
}

#[derive(Debug, Clone, Default)]
pub struct NoticeBoard {
    queue: Arc<Mutex<VecDeque<Notice>>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, kind: NoticeKind, message: impl Into<String>, at_ms: TimeMs) {
        let mut queue = lock(&self.queue);
        if queue.len() >= MAX_QUEUED_NOTICES {
            queue.pop_front();
        }
        queue.push_back(Notice {
            kind,
            message: message.into(),
            at_ms,
        });
    }

    /// Take every queued notice, oldest first.
    pub fn drain(&self) -> Vec<Notice> {
        lock(&self.queue).drain(..).collect()
    }

    /// Copy of the queue without consuming it.
    pub fn peek(&self) -> Vec<Notice> {
        lock(&self.queue).iter().cloned().collect()
    }

    pub fn count(&self, kind: NoticeKind) -> usize {
        lock(&self.queue).iter().filter(|n| n.kind == kind).count()
    }
}
