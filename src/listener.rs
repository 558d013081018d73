//! Dispatch loop between the host editor and the classifier.
//!
//! Notifications arrive one JSON object per line. Each is handled to
//! completion before the next one is read, and fired deadlines are fed back
//! in the same loop, so the classifier never sees concurrent calls.
//!
//! Lines are read on a dedicated thread and handed over through a channel.
//! A blocking read that never returns then cannot hold up shutdown.

use anyhow::{Context, Result};
use std::io::{self, BufRead};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::thread;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    audio::SoundPlayer,
    classifier::{
        Classifier, ClassifierConfig, Deadline, SoundCategory, SystemClock, TokioScheduler,
    },
    diagnostics::{DiagnosticsCache, DiagnosticsSource},
    notification::Notification,
    settings::SettingsStore,
};

// Set to true to log each notification as it is handled
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

#[derive(Debug, Clone, Default)]
pub struct ListenerOptions {
    pub classifier: ClassifierConfig,
    /// Re-run the error check against cached diagnostics on every edit
    pub recheck_on_edit: bool,
}

/// Lines read from the host, in arrival order. The channel closes at EOF.
pub type InputLines = mpsc::UnboundedReceiver<io::Result<String>>;

/// Reads `input` line by line on a `notification-reader` thread.
///
/// The thread is detached: if it is stuck in a read when the listener stops,
/// it simply goes away with the process.
pub fn spawn_line_reader<R>(input: R) -> Result<InputLines>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    thread::Builder::new()
        .name("notification-reader".to_string())
        .spawn(move || {
            for line in input.lines() {
                let failed = line.is_err();
                if tx.send(line).is_err() || failed {
                    break;
                }
            }
        })
        .context("failed to spawn notification reader thread")?;
    Ok(rx)
}

pub struct Listener<P: SoundPlayer> {
    classifier: Classifier<SystemClock, TokioScheduler>,
    deadlines: mpsc::UnboundedReceiver<Deadline>,
    diagnostics: DiagnosticsCache,
    settings: Arc<SettingsStore>,
    player: P,
    recheck_on_edit: bool,
}

impl<P: SoundPlayer> Listener<P> {
    pub fn new(options: ListenerOptions, settings: Arc<SettingsStore>, player: P) -> Self {
        let (scheduler, deadlines) = TokioScheduler::new();
        Self {
            classifier: Classifier::with_config(options.classifier, SystemClock, scheduler),
            deadlines,
            diagnostics: DiagnosticsCache::new(),
            settings,
            player,
            recheck_on_edit: options.recheck_on_edit,
        }
    }

    pub fn classifier(&self) -> &Classifier<SystemClock, TokioScheduler> {
        &self.classifier
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    /// Reads notifications until the input ends, a `shutdown` notification
    /// arrives, or `shutdown` is cancelled. The classifier is deactivated on
    /// the way out.
    pub async fn run(
        &mut self,
        mut lines: InputLines,
        shutdown: CancellationToken,
    ) -> Result<()> {
        log::info!("RubberDuck++ is here to cheer you on!");

        let result = loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    log_info!("shutdown requested");
                    break Ok(());
                }
                Some(deadline) = self.deadlines.recv() => {
                    let intents = self.classifier.on_deadline(deadline);
                    self.emit(intents);
                }
                line = lines.recv() => {
                    match line {
                        Some(Ok(line)) => {
                            if self.handle_line(&line).is_break() {
                                break Ok(());
                            }
                        }
                        None => {
                            log_info!("notification stream closed");
                            break Ok(());
                        }
                        Some(Err(err)) => {
                            break Err(err).context("failed to read notifications");
                        }
                    }
                }
            }
        };

        self.deactivate();
        result
    }

    fn handle_line(&mut self, line: &str) -> ControlFlow<()> {
        match Notification::parse_line(line) {
            Ok(Some(notification)) => self.handle(notification),
            Ok(None) => ControlFlow::Continue(()),
            Err(err) => {
                log::warn!("Skipping malformed notification ({err}): {line}");
                ControlFlow::Continue(())
            }
        }
    }

    /// Handles one notification and plays whatever it triggers.
    pub fn handle(&mut self, notification: Notification) -> ControlFlow<()> {
        match notification {
            Notification::DiagnosticsChanged {
                document,
                diagnostics,
            } => {
                self.diagnostics.publish(&document, &diagnostics);
                let intents = self
                    .classifier
                    .on_diagnostics_changed(&document, &diagnostics);
                self.emit(intents);
            }
            Notification::TextChanged { document, changes } => {
                let mut intents = self.classifier.on_text_changed(&changes);
                if self.recheck_on_edit && !document.is_empty() {
                    let current = self.diagnostics.diagnostics(&document);
                    intents.extend(self.classifier.on_diagnostics_changed(&document, &current));
                }
                self.emit(intents);
            }
            Notification::DebugSessionStarted => {
                let intents = self.classifier.on_debug_session_started();
                self.emit(intents);
            }
            Notification::WindowStateChanged { focused } => {
                log_debug!("window focus: {focused}");
                self.classifier.on_window_focus_changed(focused);
            }
            Notification::SetEnabled { enabled } => match self.settings.set_enabled(enabled) {
                Ok(_) if enabled => log::info!("RubberDuck++ is ready to cheer you on!"),
                Ok(_) => log::info!("RubberDuck++ is taking a break!"),
                Err(err) => log::warn!("Could not update settings: {err:#}"),
            },
            Notification::SetVolume { volume } => match self.settings.set_volume(volume) {
                Ok(_) => log::info!("Volume set to {volume}"),
                Err(err) => log::warn!("Could not set volume: {err:#}"),
            },
            Notification::Shutdown => {
                log_info!("host asked us to shut down");
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn emit(&self, intents: Vec<SoundCategory>) {
        for category in intents {
            log_debug!("intent: {category}");
            self.player.play(category);
        }
    }

    /// Cancels the pending typing deadline and stops reacting to input.
    pub fn deactivate(&mut self) {
        self.classifier.deactivate();
        self.deadlines.close();
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod listener_tests;
