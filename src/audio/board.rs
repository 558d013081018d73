use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::classifier::SoundCategory;
use crate::settings::SettingsStore;

use super::{AudioOutput, SoundLibrary};

/// Receives the classifier's intents.
pub trait SoundPlayer {
    fn play(&self, category: SoundCategory);
}

/// Plays a random sound from a category's directory, honouring the user's
/// enabled flag and volume.
pub struct SoundBoard<O: AudioOutput> {
    library: SoundLibrary,
    settings: Arc<SettingsStore>,
    output: O,
}

impl<O: AudioOutput> SoundBoard<O> {
    pub fn new(library: SoundLibrary, settings: Arc<SettingsStore>, output: O) -> Self {
        Self {
            library,
            settings,
            output,
        }
    }

    pub fn library(&self) -> &SoundLibrary {
        &self.library
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    /// Plays one sound for `category` to the end, even when sounds are
    /// disabled. Open, decode and output failures are returned.
    pub fn preview(&self, category: SoundCategory) -> Result<PathBuf> {
        let volume = self.settings.get().volume;
        let path = self
            .library
            .pick(category, &mut rand::thread_rng())
            .ok_or_else(|| {
                anyhow!(
                    "no sound files for {category} in {}",
                    self.library.category_dir(category).display()
                )
            })?;
        self.output
            .play_file_to_end(&path, volume)
            .map_err(|err| anyhow!(err))?;
        Ok(path)
    }
}

impl<O: AudioOutput> SoundPlayer for SoundBoard<O> {
    fn play(&self, category: SoundCategory) {
        if let Err(err) = self.settings.refresh() {
            log::warn!("Could not refresh settings: {err:#}");
        }

        let settings = self.settings.get();
        if !settings.enabled {
            log::debug!("Sounds disabled; skipping {category}");
            return;
        }

        let Some(path) = self.library.pick(category, &mut rand::thread_rng()) else {
            log::debug!("No sound files for {category}; skipping");
            return;
        };

        log::info!("Playing {category}: {}", path.display());
        if let Err(err) = self.output.play_file(&path, settings.volume) {
            log::error!("Error playing sound: {err}");
        }
    }
}
