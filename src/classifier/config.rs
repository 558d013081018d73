use std::time::Duration;

/// Thresholds used by the event classifier.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Error messages longer than this (in characters) also trigger `longError`
    pub long_error_chars: usize,

    /// Error bursts needed before a debug session counts as a recovery
    pub success_min_errors: u32,
    /// The last error must be more recent than this for `success`
    pub success_window: Duration,

    /// Inserts longer than this count as a paste
    pub paste_chars: usize,
    /// Inserts longer than this additionally count as a huge paste
    pub huge_paste_chars: usize,
    /// Pastes only count this soon after the window gained focus
    pub focus_recency: Duration,

    /// Pure deletions removing more than this many characters
    pub delete_chars: usize,

    /// Keystrokes closer together than this keep the typing rhythm alive
    pub typing_gap: Duration,
    /// How long the rhythm must hold before `typing` fires
    pub typing_window: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            long_error_chars: 200,
            success_min_errors: 3,
            success_window: Duration::from_millis(300_000),
            paste_chars: 500,
            huge_paste_chars: 1000,
            focus_recency: Duration::from_millis(2_000),
            delete_chars: 500,
            typing_gap: Duration::from_millis(500),
            typing_window: Duration::from_millis(60_000),
        }
    }
}
