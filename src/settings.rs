use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
    time::SystemTime,
};

pub const DEFAULT_VOLUME: f32 = 0.7;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SoundSettings {
    pub enabled: bool,
    pub volume: f32,
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: DEFAULT_VOLUME,
        }
    }
}

/// Checks a volume entered by the user.
pub fn validate_volume(volume: f32) -> Result<f32> {
    if !(0.0..=1.0).contains(&volume) {
        bail!("volume must be a number between 0.0 and 1.0");
    }
    Ok(volume)
}

struct Loaded {
    settings: SoundSettings,
    modified: Option<SystemTime>,
}

/// Sound settings persisted as JSON. Other processes may rewrite the file;
/// [`SettingsStore::refresh`] picks their changes up.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<Loaded>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let loaded = read_from(&path)?;
        Ok(Self {
            path,
            data: RwLock::new(loaded),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> SoundSettings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .settings
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<SoundSettings> {
        self.update(|settings| settings.enabled = enabled)
    }

    pub fn set_volume(&self, volume: f32) -> Result<SoundSettings> {
        let volume = validate_volume(volume)?;
        self.update(|settings| settings.volume = volume)
    }

    fn update(&self, apply: impl FnOnce(&mut SoundSettings)) -> Result<SoundSettings> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = guard.settings;
        apply(&mut next);
        self.persist(&next)?;
        guard.settings = next;
        guard.modified = modified_at(&self.path);
        Ok(next)
    }

    /// Re-reads the file if it changed on disk since we last saw it.
    pub fn refresh(&self) -> Result<bool> {
        let on_disk = modified_at(&self.path);
        {
            let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
            if on_disk == guard.modified {
                return Ok(false);
            }
        }
        self.reload()?;
        Ok(true)
    }

    pub fn reload(&self) -> Result<()> {
        let loaded = read_from(&self.path)?;
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = loaded;
        Ok(())
    }

    fn persist(&self, settings: &SoundSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create settings directory {}", parent.display())
                })?;
            }
        }
        let serialized = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn read_from(path: &Path) -> Result<Loaded> {
    let settings = if path.exists() {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        match serde_json::from_str::<SoundSettings>(&contents) {
            Ok(settings) if validate_volume(settings.volume).is_ok() => settings,
            Ok(settings) => {
                log::warn!(
                    "Ignoring out-of-range volume {} in {}",
                    settings.volume,
                    path.display()
                );
                SoundSettings {
                    volume: DEFAULT_VOLUME,
                    ..settings
                }
            }
            Err(err) => {
                log::warn!(
                    "Settings file {} is unreadable ({err}); using defaults",
                    path.display()
                );
                SoundSettings::default()
            }
        }
    } else {
        SoundSettings::default()
    };

    Ok(Loaded {
        settings,
        modified: modified_at(path),
    })
}
