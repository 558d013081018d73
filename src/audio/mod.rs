pub mod board;
pub mod library;

pub use board::{SoundBoard, SoundPlayer};
pub use library::SoundLibrary;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{
    mpsc::{self, Sender},
    Arc, Mutex,
};
use std::thread;

/// Something that can play a sound file at a given volume.
pub trait AudioOutput {
    /// Starts playing without waiting; failures are only logged.
    fn play_file(&self, path: &Path, volume: f32) -> Result<(), String>;

    /// Plays to the end and reports whether playback actually happened.
    fn play_file_to_end(&self, path: &Path, volume: f32) -> Result<(), String>;
}

enum AudioCommand {
    Play {
        path: PathBuf,
        volume: f32,
    },
    PlayToEnd {
        path: PathBuf,
        volume: f32,
        done: Sender<Result<(), String>>,
    },
    StopAll,
}

/// Handle to the audio thread. Clones share the same thread.
#[derive(Clone)]
pub struct AudioEngineHandle {
    tx: Arc<Mutex<Option<Sender<AudioCommand>>>>,
}

impl AudioEngineHandle {
    pub fn new() -> Self {
        Self {
            tx: Arc::new(Mutex::new(None)),
        }
    }

    fn ensure_thread(&self) -> Result<Sender<AudioCommand>, String> {
        let mut guard = self.tx.lock().map_err(|e| e.to_string())?;
        if let Some(tx) = guard.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<AudioCommand>();

        // Dedicated thread owns the non-Send output stream
        thread::Builder::new()
            .name("audio-engine".to_string())
            .spawn(move || {
                let mut output: Option<(OutputStream, OutputStreamHandle)> = None;
                let mut sinks: Vec<Sink> = Vec::new();

                fn ensure_output(
                    output: &mut Option<(OutputStream, OutputStreamHandle)>,
                ) -> Result<&OutputStreamHandle, String> {
                    if output.is_none() {
                        let pair = OutputStream::try_default()
                            .map_err(|e| format!("Failed to create audio output stream: {}", e))?;
                        *output = Some(pair);
                    }
                    output
                        .as_ref()
                        .map(|(_, handle)| handle)
                        .ok_or_else(|| "audio output unavailable".to_string())
                }

                fn start(
                    output: &mut Option<(OutputStream, OutputStreamHandle)>,
                    path: &Path,
                    volume: f32,
                ) -> Result<Sink, String> {
                    let file = File::open(path)
                        .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;
                    let source = Decoder::new(BufReader::new(file))
                        .map_err(|e| format!("Failed to decode {}: {}", path.display(), e))?;
                    let handle = ensure_output(output)?;
                    let sink = Sink::try_new(handle)
                        .map_err(|e| format!("Failed to create audio sink: {}", e))?;
                    sink.set_volume(volume.clamp(0.0, 1.0));
                    sink.append(source);
                    Ok(sink)
                }

                while let Ok(cmd) = rx.recv() {
                    sinks.retain(|sink| !sink.empty());
                    match cmd {
                        AudioCommand::Play { path, volume } => {
                            match start(&mut output, &path, volume) {
                                Ok(sink) => sinks.push(sink),
                                Err(err) => log::error!("Error playing sound: {}", err),
                            }
                        }
                        AudioCommand::PlayToEnd { path, volume, done } => {
                            let result = start(&mut output, &path, volume).map(|sink| {
                                sink.sleep_until_end();
                            });
                            let _ = done.send(result);
                        }
                        AudioCommand::StopAll => {
                            for sink in sinks.drain(..) {
                                sink.stop();
                            }
                        }
                    }
                }
                log::debug!("audio engine thread exiting");
            })
            .map_err(|e| e.to_string())?;

        *guard = Some(tx.clone());
        Ok(tx)
    }

    /// Queues `path` for playback. Overlapping sounds play side by side.
    pub fn play(&self, path: &Path, volume: f32) -> Result<(), String> {
        let tx = self.ensure_thread()?;
        tx.send(AudioCommand::Play {
            path: path.to_path_buf(),
            volume,
        })
        .map_err(|e| e.to_string())
    }

    /// Plays `path` and blocks until it finishes, returning any open,
    /// decode or output error.
    pub fn play_to_end(&self, path: &Path, volume: f32) -> Result<(), String> {
        let tx = self.ensure_thread()?;
        let (done_tx, done_rx) = mpsc::channel();
        tx.send(AudioCommand::PlayToEnd {
            path: path.to_path_buf(),
            volume,
            done: done_tx,
        })
        .map_err(|e| e.to_string())?;
        done_rx.recv().map_err(|e| e.to_string())?
    }

    /// Stops playback and lets the audio thread exit.
    pub fn shutdown(&self) {
        if let Ok(mut guard) = self.tx.lock() {
            if let Some(tx) = guard.take() {
                let _ = tx.send(AudioCommand::StopAll);
            }
        }
    }
}

impl Default for AudioEngineHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioOutput for AudioEngineHandle {
    fn play_file(&self, path: &Path, volume: f32) -> Result<(), String> {
        self.play(path, volume)
    }

    fn play_file_to_end(&self, path: &Path, volume: f32) -> Result<(), String> {
        self.play_to_end(path, volume)
    }
}
