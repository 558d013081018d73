use rand::seq::SliceRandom;
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};

use crate::classifier::SoundCategory;

const AUDIO_EXTENSIONS: [&str; 4] = ["wav", "mp3", "ogg", "flac"];

/// Sound files on disk, laid out as `<root>/<category-dir>/<file>`.
///
/// Directories are scanned on every lookup so files dropped in while the
/// listener runs are picked up.
#[derive(Debug, Clone)]
pub struct SoundLibrary {
    root: PathBuf,
}

impl SoundLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn category_dir(&self, category: SoundCategory) -> PathBuf {
        self.root.join(category.dir_name())
    }

    /// Playable files for `category`, sorted by name. A missing directory
    /// yields an empty list.
    pub fn candidates(&self, category: SoundCategory) -> Vec<PathBuf> {
        let dir = self.category_dir(category);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                log::debug!("No sounds for {category} at {}: {err}", dir.display());
                return Vec::new();
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_audio_file(path))
            .collect();
        files.sort();
        files
    }

    /// Uniformly random candidate for `category`, if there is any.
    pub fn pick<R: Rng + ?Sized>(&self, category: SoundCategory, rng: &mut R) -> Option<PathBuf> {
        self.candidates(category).choose(rng).cloned()
    }
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            AUDIO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}
