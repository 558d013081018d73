use crate::notification::{Diagnostic, TextChange};

use super::{
    clock::Clock,
    config::ClassifierConfig,
    intent::SoundCategory,
    scheduler::{Deadline, DeferredTask, Scheduler},
    state::{ClassifierState, TypingState},
};

// Set to true to log every state transition at debug level
const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// Turns editor notifications into sound-category intents.
///
/// One instance lives for one editor session. Handlers are called one at a
/// time by the dispatch loop and never block; the only deferred work is the
/// continuous-typing deadline, which goes through the [`Scheduler`].
pub struct Classifier<C: Clock, S: Scheduler> {
    config: ClassifierConfig,
    clock: C,
    scheduler: S,
    state: ClassifierState,
    active: bool,
}

impl<C: Clock, S: Scheduler> Classifier<C, S> {
    pub fn new(clock: C, scheduler: S) -> Self {
        Self::with_config(ClassifierConfig::default(), clock, scheduler)
    }

    pub fn with_config(config: ClassifierConfig, clock: C, scheduler: S) -> Self {
        Self {
            config,
            clock,
            scheduler,
            state: ClassifierState::new(),
            active: true,
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn state(&self) -> &ClassifierState {
        &self.state
    }

    pub fn typing_state(&self) -> TypingState {
        self.state.typing()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn on_diagnostics_changed(
        &mut self,
        document: &str,
        diagnostics: &[Diagnostic],
    ) -> Vec<SoundCategory> {
        let mut intents = Vec::new();
        if !self.active {
            return intents;
        }

        let errors: Vec<&Diagnostic> = diagnostics.iter().filter(|d| d.is_error()).collect();
        if errors.is_empty() {
            return intents;
        }

        let now = self.clock.now();
        intents.push(SoundCategory::Error);
        ClassifierState::bump(&mut self.state.last_error_at, now);
        self.state.consecutive_errors = self.state.consecutive_errors.saturating_add(1);

        if errors
            .iter()
            .any(|e| e.message.chars().count() > self.config.long_error_chars)
        {
            intents.push(SoundCategory::LongError);
        }

        log_debug!(
            "{} error(s) in {document}; consecutive error bursts: {}",
            errors.len(),
            self.state.consecutive_errors
        );

        intents
    }

    pub fn on_debug_session_started(&mut self) -> Vec<SoundCategory> {
        if !self.active {
            return Vec::new();
        }

        let now = self.clock.now();
        let recent = self
            .state
            .since_last_error(now)
            .is_some_and(|elapsed| elapsed < self.config.success_window);

        if self.state.consecutive_errors >= self.config.success_min_errors && recent {
            log_debug!(
                "debug session after {} error bursts; celebrating",
                self.state.consecutive_errors
            );
            self.state.consecutive_errors = 0;
            vec![SoundCategory::Success]
        } else {
            Vec::new()
        }
    }

    pub fn on_window_focus_changed(&mut self, focused: bool) {
        if !self.active {
            return;
        }

        self.state.has_focus = focused;
        if focused {
            let now = self.clock.now();
            ClassifierState::bump(&mut self.state.last_focus_gain_at, now);
        }
    }

    pub fn on_text_changed(&mut self, changes: &[TextChange]) -> Vec<SoundCategory> {
        let mut intents = Vec::new();
        if !self.active {
            return intents;
        }

        // Multi-cursor and batched edits are ignored entirely.
        let [change] = changes else {
            return intents;
        };

        let now = self.clock.now();
        let inserted = change.inserted_chars();

        let focus_recent = self.state.has_focus
            && self
                .state
                .since_focus_gain(now)
                .is_some_and(|elapsed| elapsed < self.config.focus_recency);

        if inserted > self.config.paste_chars && focus_recent {
            intents.push(SoundCategory::Paste);
        }
        if inserted > self.config.huge_paste_chars && focus_recent {
            intents.push(SoundCategory::HugePaste);
        }

        if change.is_pure_deletion() && change.range_length > self.config.delete_chars {
            intents.push(SoundCategory::Delete);
        }

        if inserted == 1 {
            self.on_keystroke();
        }

        intents
    }

    fn on_keystroke(&mut self) {
        let now = self.clock.now();
        let fast = self
            .state
            .keystroke_gap(now)
            .is_some_and(|gap| gap < self.config.typing_gap);

        if fast {
            if self.state.pending_typing.is_none() {
                let id = self
                    .scheduler
                    .schedule(self.config.typing_window, DeferredTask::TypingDeadline);
                self.state.pending_typing = Some(id);
                log_debug!("typing rhythm detected; deadline {id:?} armed");
            }
        } else {
            self.cancel_typing();
        }

        ClassifierState::bump(&mut self.state.last_keystroke_at, now);
    }

    /// Handles a deadline delivered by the scheduler. Deadlines that were
    /// cancelled or replaced in the meantime are ignored.
    pub fn on_deadline(&mut self, deadline: Deadline) -> Vec<SoundCategory> {
        if !self.active {
            return Vec::new();
        }

        match deadline.task {
            DeferredTask::TypingDeadline => {
                if self.state.pending_typing != Some(deadline.id) {
                    log_debug!("ignoring stale typing deadline {:?}", deadline.id);
                    return Vec::new();
                }
                self.state.pending_typing = None;
                vec![SoundCategory::Typing]
            }
        }
    }

    fn cancel_typing(&mut self) {
        if let Some(id) = self.state.pending_typing.take() {
            self.scheduler.cancel(id);
            log_debug!("typing rhythm broken; deadline {id:?} cancelled");
        }
    }

    /// Cancels outstanding deferred work. Later notifications are ignored.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.cancel_typing();
        self.active = false;
    }
}

impl<C: Clock, S: Scheduler> Drop for Classifier<C, S> {
    fn drop(&mut self) {
        self.deactivate();
    }
}
