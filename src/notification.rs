//! Notifications forwarded by the host editor, one JSON object per line.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
    Other,
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Hosts send either the name or VS Code's numeric DiagnosticSeverity.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Code(i64),
            Name(String),
        }

        let severity = match Raw::deserialize(deserializer)? {
            Raw::Code(0) => Severity::Error,
            Raw::Code(1) => Severity::Warning,
            Raw::Code(2) => Severity::Information,
            Raw::Code(3) => Severity::Hint,
            Raw::Code(_) => Severity::Other,
            Raw::Name(name) => match name.to_ascii_lowercase().as_str() {
                "error" => Severity::Error,
                "warning" => Severity::Warning,
                "information" | "info" => Severity::Information,
                "hint" => Severity::Hint,
                _ => Severity::Other,
            },
        };
        Ok(severity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    #[serde(default)]
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// One content change inside a text-document edit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TextChange {
    /// Inserted text; empty for a pure deletion
    #[serde(default)]
    pub text: String,
    /// Length of the replaced range, as reported by the host
    #[serde(default)]
    pub range_length: usize,
}

impl TextChange {
    pub fn insert(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            range_length: 0,
        }
    }

    pub fn delete(range_length: usize) -> Self {
        Self {
            text: String::new(),
            range_length,
        }
    }

    pub fn inserted_chars(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_pure_deletion(&self) -> bool {
        self.text.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum Notification {
    #[serde(rename_all = "camelCase")]
    DiagnosticsChanged {
        #[serde(default)]
        document: String,
        #[serde(default)]
        diagnostics: Vec<Diagnostic>,
    },
    #[serde(rename_all = "camelCase")]
    TextChanged {
        #[serde(default)]
        document: String,
        #[serde(default)]
        changes: Vec<TextChange>,
    },
    DebugSessionStarted,
    WindowStateChanged {
        focused: bool,
    },
    SetEnabled {
        enabled: bool,
    },
    SetVolume {
        volume: f32,
    },
    Shutdown,
}

impl Notification {
    /// Parses one input line. Blank lines yield `None`.
    pub fn parse_line(line: &str) -> serde_json::Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(line).map(Some)
    }
}
