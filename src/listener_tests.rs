//! End-to-end tests for the dispatch loop, fed through the input channel on
//! a paused tokio clock.

use std::io::{self, BufReader, Cursor, Read};
use std::sync::{mpsc as std_mpsc, Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{spawn_line_reader, InputLines, Listener, ListenerOptions};
use crate::audio::SoundPlayer;
use crate::classifier::{SoundCategory, TypingState};
use crate::settings::SettingsStore;

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<SoundCategory>>>);

impl Recorder {
    fn played(&self) -> Vec<SoundCategory> {
        self.0.lock().unwrap().clone()
    }

    fn count(&self, category: SoundCategory) -> usize {
        self.played().iter().filter(|c| **c == category).count()
    }
}

impl SoundPlayer for Recorder {
    fn play(&self, category: SoundCategory) {
        self.0.lock().unwrap().push(category);
    }
}

struct Session {
    _dir: tempfile::TempDir,
    settings: Arc<SettingsStore>,
    recorder: Recorder,
    input: mpsc::UnboundedSender<io::Result<String>>,
    shutdown: CancellationToken,
    task: JoinHandle<anyhow::Result<Listener<Recorder>>>,
}

impl Session {
    fn start(options: ListenerOptions) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let settings = Arc::new(SettingsStore::new(dir.path().join("settings.json")).unwrap());
        let recorder = Recorder::default();
        let (input, lines) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let task = spawn_listener(options, settings.clone(), recorder.clone(), lines, &shutdown);

        Self {
            _dir: dir,
            settings,
            recorder,
            input,
            shutdown,
            task,
        }
    }

    async fn send(&mut self, line: &str) {
        self.input.send(Ok(line.to_string())).unwrap();
        // Let the listener drain the channel before time moves on.
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
    }

    async fn key(&mut self) {
        self.send(r#"{"event":"textChanged","document":"file:///main.rs","changes":[{"text":"k","rangeLength":0}]}"#)
            .await;
    }

    async fn finish(self) -> Listener<Recorder> {
        drop(self.input);
        self.task.await.unwrap().unwrap()
    }
}

fn spawn_listener(
    options: ListenerOptions,
    settings: Arc<SettingsStore>,
    recorder: Recorder,
    lines: InputLines,
    shutdown: &CancellationToken,
) -> JoinHandle<anyhow::Result<Listener<Recorder>>> {
    let mut listener = Listener::new(options, settings, recorder);
    let token = shutdown.clone();
    tokio::spawn(async move {
        listener.run(lines, token).await?;
        Ok(listener)
    })
}

/// Input whose reads block until the test lets go of the sender.
struct StuckInput(std_mpsc::Receiver<()>);

impl Read for StuckInput {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        let _ = self.0.recv();
        Ok(0)
    }
}

async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn test_struggle_then_success() {
    let mut session = Session::start(ListenerOptions::default());

    for _ in 0..3 {
        session
            .send(r#"{"event":"diagnosticsChanged","document":"file:///main.rs","diagnostics":[{"severity":"error","message":"cannot find value `x`"}]}"#)
            .await;
        sleep_ms(1_000).await;
    }
    session.send(r#"{"event":"debugSessionStarted"}"#).await;

    let listener = session.finish().await;
    assert_eq!(
        listener.player().played(),
        vec![
            SoundCategory::Error,
            SoundCategory::Error,
            SoundCategory::Error,
            SoundCategory::Success
        ]
    );
    assert_eq!(listener.classifier().state().consecutive_errors, 0);
}

#[tokio::test(start_paused = true)]
async fn test_paste_after_focus_and_large_delete() {
    let mut session = Session::start(ListenerOptions::default());

    session
        .send(r#"{"event":"windowStateChanged","focused":true}"#)
        .await;
    sleep_ms(300).await;
    let paste = format!(
        r#"{{"event":"textChanged","document":"a","changes":[{{"text":"{}","rangeLength":0}}]}}"#,
        "z".repeat(1_200)
    );
    session.send(&paste).await;
    session
        .send(r#"{"event":"textChanged","document":"a","changes":[{"text":"","rangeLength":501}]}"#)
        .await;

    let recorder = session.recorder.clone();
    session.finish().await;
    assert_eq!(
        recorder.played(),
        vec![
            SoundCategory::Paste,
            SoundCategory::HugePaste,
            SoundCategory::Delete
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_sustained_typing_plays_once() {
    let mut session = Session::start(ListenerOptions::default());

    session.key().await;
    for _ in 0..610 {
        sleep_ms(100).await;
        session.key().await;
    }

    let recorder = session.recorder.clone();
    let listener = session.finish().await;
    assert_eq!(recorder.count(SoundCategory::Typing), 1);
    assert!(!listener.classifier().is_active());
}

#[tokio::test(start_paused = true)]
async fn test_pause_breaks_typing_rhythm() {
    let mut session = Session::start(ListenerOptions::default());

    session.key().await;
    for _ in 0..500 {
        sleep_ms(100).await;
        session.key().await;
    }
    sleep_ms(600).await;
    session.key().await;

    sleep_ms(120_000).await;
    let recorder = session.recorder.clone();
    let listener = session.finish().await;
    assert_eq!(recorder.count(SoundCategory::Typing), 0);
    assert_eq!(listener.classifier().typing_state(), TypingState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_pending_typing() {
    let mut session = Session::start(ListenerOptions::default());

    session.key().await;
    sleep_ms(100).await;
    session.key().await;

    session.shutdown.cancel();
    let recorder = session.recorder.clone();
    let listener = session.task.await.unwrap().unwrap();
    assert!(!listener.classifier().is_active());
    assert_eq!(listener.classifier().typing_state(), TypingState::Idle);

    sleep_ms(120_000).await;
    assert!(recorder.played().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_notification_stops_loop() {
    let mut session = Session::start(ListenerOptions::default());
    session.send(r#"{"event":"shutdown"}"#).await;

    let listener = session.task.await.unwrap().unwrap();
    assert!(!listener.classifier().is_active());
}

#[tokio::test(start_paused = true)]
async fn test_malformed_lines_are_skipped() {
    let mut session = Session::start(ListenerOptions::default());

    session.send("").await;
    session.send("definitely not json").await;
    session.send(r#"{"event":"mystery"}"#).await;
    session
        .send(r#"{"event":"diagnosticsChanged","document":"a","diagnostics":[{"severity":0,"message":"boom"}]}"#)
        .await;

    let recorder = session.recorder.clone();
    session.finish().await;
    assert_eq!(recorder.played(), vec![SoundCategory::Error]);
}

#[tokio::test(start_paused = true)]
async fn test_settings_commands() {
    let mut session = Session::start(ListenerOptions::default());

    session.send(r#"{"event":"setEnabled","enabled":false}"#).await;
    session.send(r#"{"event":"setVolume","volume":0.4}"#).await;
    session.send(r#"{"event":"setVolume","volume":7.5}"#).await;

    let settings = session.settings.clone();
    session.finish().await;
    let current = settings.get();
    assert!(!current.enabled);
    assert_eq!(current.volume, 0.4);
}

#[tokio::test(start_paused = true)]
async fn test_recheck_on_edit_uses_cached_diagnostics() {
    let options = ListenerOptions {
        recheck_on_edit: true,
        ..ListenerOptions::default()
    };
    let mut session = Session::start(options);

    session
        .send(r#"{"event":"diagnosticsChanged","document":"a","diagnostics":[{"severity":"error","message":"boom"}]}"#)
        .await;
    sleep_ms(1_000).await;
    session
        .send(r#"{"event":"textChanged","document":"a","changes":[{"text":"abc","rangeLength":0}]}"#)
        .await;
    session
        .send(r#"{"event":"textChanged","document":"b","changes":[{"text":"abc","rangeLength":0}]}"#)
        .await;

    let listener = session.finish().await;
    assert_eq!(
        listener.player().played(),
        vec![SoundCategory::Error, SoundCategory::Error]
    );
    assert_eq!(listener.classifier().state().consecutive_errors, 2);
}

#[tokio::test(start_paused = true)]
async fn test_edits_do_not_recheck_by_default() {
    let mut session = Session::start(ListenerOptions::default());

    session
        .send(r#"{"event":"diagnosticsChanged","document":"a","diagnostics":[{"severity":"error","message":"boom"}]}"#)
        .await;
    session
        .send(r#"{"event":"textChanged","document":"a","changes":[{"text":"abc","rangeLength":0}]}"#)
        .await;

    let recorder = session.recorder.clone();
    session.finish().await;
    assert_eq!(recorder.played(), vec![SoundCategory::Error]);
}

#[tokio::test]
async fn test_line_reader_forwards_lines_then_closes() {
    let input = Cursor::new("{\"event\":\"debugSessionStarted\"}\n\nsecond\n");
    let mut lines = spawn_line_reader(input).unwrap();

    assert_eq!(
        lines.recv().await.unwrap().unwrap(),
        r#"{"event":"debugSessionStarted"}"#
    );
    assert_eq!(lines.recv().await.unwrap().unwrap(), "");
    assert_eq!(lines.recv().await.unwrap().unwrap(), "second");
    assert!(lines.recv().await.is_none());
}

#[tokio::test]
async fn test_cancel_returns_while_input_read_is_blocked() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Arc::new(SettingsStore::new(dir.path().join("settings.json")).unwrap());
    let (hold, stuck) = std_mpsc::channel::<()>();
    let lines = spawn_line_reader(BufReader::new(StuckInput(stuck))).unwrap();

    let shutdown = CancellationToken::new();
    let task = spawn_listener(
        ListenerOptions::default(),
        settings,
        Recorder::default(),
        lines,
        &shutdown,
    );

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!task.is_finished());

    shutdown.cancel();
    let listener = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("listener kept waiting on its input after cancel")
        .unwrap()
        .unwrap();
    assert!(!listener.classifier().is_active());

    // The reader thread is still parked in its read at this point.
    drop(hold);
}
