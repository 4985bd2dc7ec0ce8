// src/engine/defer.rs
//
// Cancellable deferred work for the single cooperative thread: debounced
// voice commits, animation sweeps, preview resumes, snapshot saves.
// Scheduling a key always cancels the pending task with the same key
// first; that discipline is what prevents duplicate triggers.

use crate::core::coord::SelectionKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKey {
    /// Debounced audition commit for one node.
    VoiceCommit(SelectionKey),
    /// Resume a sustain paused for an info preview.
    PreviewResume(SelectionKey),
    /// Delete expired animation entries.
    AnimSweep,
    /// Debounced persistence save.
    SnapshotSave,
}

#[derive(Debug, Clone, Copy)]
struct Deferred {
    key: TaskKey,
    due: f64,
}

#[derive(Debug, Default)]
pub struct DeferredQueue {
    tasks: Vec<Deferred>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `key` to fire at `due`, replacing any pending task with
    /// the same key.
    pub fn schedule(&mut self, key: TaskKey, due: f64) {
        self.cancel(key);
        self.tasks.push(Deferred { key, due });
    }

    /// Cancel the pending task for `key`, if any. Returns whether one
    /// was pending.
    pub fn cancel(&mut self, key: TaskKey) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.key != key);
        self.tasks.len() != before
    }

    /// Remove and return every task due at or before `now`, in due order.
    pub fn take_due(&mut self, now: f64) -> Vec<TaskKey> {
        let mut due: Vec<Deferred> = Vec::new();
        self.tasks.retain(|t| {
            if t.due <= now {
                due.push(*t);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.due.partial_cmp(&b.due).unwrap_or(std::cmp::Ordering::Equal));
        due.into_iter().map(|t| t.key).collect()
    }

    pub fn is_pending(&self, key: TaskKey) -> bool {
        self.tasks.iter().any(|t| t.key == key)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
