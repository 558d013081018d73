use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sound category the classifier asks to be played.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SoundCategory {
    Error,
    Success,
    Paste,
    #[serde(rename = "hugepaste")]
    HugePaste,
    Delete,
    Typing,
    LongError,
}

impl SoundCategory {
    pub const ALL: [SoundCategory; 7] = [
        SoundCategory::Error,
        SoundCategory::Success,
        SoundCategory::Paste,
        SoundCategory::HugePaste,
        SoundCategory::Delete,
        SoundCategory::Typing,
        SoundCategory::LongError,
    ];

    /// Name of the directory holding this category's sound files.
    pub fn dir_name(self) -> &'static str {
        match self {
            SoundCategory::Error => "error",
            SoundCategory::Success => "success",
            SoundCategory::Paste => "paste",
            SoundCategory::HugePaste => "hugepaste",
            SoundCategory::Delete => "delete",
            SoundCategory::Typing => "typing",
            SoundCategory::LongError => "longError",
        }
    }
}

impl fmt::Display for SoundCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for SoundCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SoundCategory::ALL
            .into_iter()
            .find(|category| category.dir_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown sound category: {s}"))
    }
}
