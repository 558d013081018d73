//! What each CLI subcommand does.

use anyhow::{anyhow, Context, Result};
use std::fmt::Write as _;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::{
    audio::{AudioEngineHandle, SoundBoard, SoundLibrary},
    classifier::SoundCategory,
    listener::{spawn_line_reader, InputLines, Listener, ListenerOptions},
    settings::{SettingsStore, SoundSettings},
};

const APP_DIR: &str = "rubberduck";

/// Where settings and sounds live.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub settings: PathBuf,
    pub sounds: PathBuf,
}

impl AppPaths {
    /// Fills in platform defaults for anything not given explicitly.
    pub fn resolve(settings: Option<PathBuf>, sounds: Option<PathBuf>) -> Result<Self> {
        let settings = match settings {
            Some(path) => path,
            None => dirs::config_dir()
                .ok_or_else(|| anyhow!("no config directory on this platform; pass --settings"))?
                .join(APP_DIR)
                .join("settings.json"),
        };
        let sounds = match sounds {
            Some(path) => path,
            None => dirs::data_dir()
                .ok_or_else(|| anyhow!("no data directory on this platform; pass --sounds"))?
                .join(APP_DIR)
                .join("sounds"),
        };
        Ok(Self { settings, sounds })
    }

    fn open_settings(&self) -> Result<SettingsStore> {
        SettingsStore::new(self.settings.clone())
            .with_context(|| format!("opening settings at {}", self.settings.display()))
    }
}

/// Listens on stdin until EOF or Ctrl-C.
pub async fn listen(paths: &AppPaths, options: ListenerOptions) -> Result<()> {
    let lines = spawn_line_reader(BufReader::new(io::stdin()))?;

    let shutdown = CancellationToken::new();
    let ctrl_c = {
        let token = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        })
    };

    let result = listen_with(paths, options, lines, shutdown).await;
    ctrl_c.abort();
    result
}

/// Runs the listener over `lines` with real audio output until the input
/// closes or `shutdown` is cancelled.
pub async fn listen_with(
    paths: &AppPaths,
    options: ListenerOptions,
    lines: InputLines,
    shutdown: CancellationToken,
) -> Result<()> {
    let settings = Arc::new(paths.open_settings()?);
    let audio = AudioEngineHandle::new();
    let board = SoundBoard::new(
        SoundLibrary::new(paths.sounds.clone()),
        settings.clone(),
        audio.clone(),
    );

    log::info!(
        "Listening for editor events (sounds: {}, settings: {})",
        paths.sounds.display(),
        paths.settings.display()
    );

    let mut listener = Listener::new(options, settings, board);
    let result = listener.run(lines, shutdown).await;

    audio.shutdown();
    result
}

pub fn set_enabled(paths: &AppPaths, enabled: bool) -> Result<SoundSettings> {
    let settings = paths.open_settings()?.set_enabled(enabled)?;
    if enabled {
        log::info!("RubberDuck++ is ready to cheer you on!");
    } else {
        log::info!("RubberDuck++ is taking a break!");
    }
    Ok(settings)
}

pub fn set_volume(paths: &AppPaths, volume: f32) -> Result<SoundSettings> {
    let settings = paths.open_settings()?.set_volume(volume)?;
    log::info!("Volume set to {}", settings.volume);
    Ok(settings)
}

/// Plays one sound from `category` and waits for it to finish. Fails if the
/// file could not be opened, decoded or sent to an output device.
pub fn play(paths: &AppPaths, category: SoundCategory) -> Result<PathBuf> {
    let settings = Arc::new(paths.open_settings()?);
    let audio = AudioEngineHandle::new();
    let board = SoundBoard::new(
        SoundLibrary::new(paths.sounds.clone()),
        settings,
        audio.clone(),
    );

    let result = board.preview(category);
    audio.shutdown();
    result
}

pub fn status(paths: &AppPaths) -> Result<String> {
    let settings = paths.open_settings()?.get();
    let library = SoundLibrary::new(paths.sounds.clone());

    let mut out = String::new();
    writeln!(out, "settings: {}", paths.settings.display())?;
    writeln!(out, "enabled:  {}", settings.enabled)?;
    writeln!(out, "volume:   {}", settings.volume)?;
    writeln!(out, "sounds:   {}", library.root().display())?;
    for category in SoundCategory::ALL {
        let count = library.candidates(category).len();
        writeln!(out, "  {:<10} {count} file(s)", category.dir_name())?;
    }
    Ok(out)
}
