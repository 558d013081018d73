use std::time::{Duration, Instant};

use super::scheduler::TaskId;

/// Continuous-typing sub-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingState {
    Idle,
    Armed,
}

/// Everything the classifier remembers between notifications.
#[derive(Debug, Clone, Default)]
pub struct ClassifierState {
    pub last_error_at: Option<Instant>,
    pub consecutive_errors: u32,
    pub last_focus_gain_at: Option<Instant>,
    pub has_focus: bool,
    pub last_keystroke_at: Option<Instant>,
    /// Outstanding typing deadline; at most one at a time.
    pub pending_typing: Option<TaskId>,
}

impl ClassifierState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn typing(&self) -> TypingState {
        if self.pending_typing.is_some() {
            TypingState::Armed
        } else {
            TypingState::Idle
        }
    }

    pub fn since_last_error(&self, now: Instant) -> Option<Duration> {
        self.last_error_at
            .map(|at| now.saturating_duration_since(at))
    }

    pub fn since_focus_gain(&self, now: Instant) -> Option<Duration> {
        self.last_focus_gain_at
            .map(|at| now.saturating_duration_since(at))
    }

    /// Gap since the previous keystroke; `None` before the first one.
    pub fn keystroke_gap(&self, now: Instant) -> Option<Duration> {
        self.last_keystroke_at
            .map(|at| now.saturating_duration_since(at))
    }

    /// Advances a timestamp without ever moving it backwards.
    pub(crate) fn bump(slot: &mut Option<Instant>, now: Instant) {
        *slot = Some(match *slot {
            Some(prev) if prev > now => prev,
            _ => now,
        });
    }
}
