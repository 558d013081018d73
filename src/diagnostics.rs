use std::collections::HashMap;

use crate::notification::Diagnostic;

/// Looks up the current diagnostics for a document.
pub trait DiagnosticsSource {
    fn diagnostics(&self, document: &str) -> Vec<Diagnostic>;
}

/// Latest diagnostics published for each document.
#[derive(Debug, Default)]
pub struct DiagnosticsCache {
    by_document: HashMap<String, Vec<Diagnostic>>,
}

impl DiagnosticsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces what is stored for `document`. An empty list forgets it.
    pub fn publish(&mut self, document: &str, diagnostics: &[Diagnostic]) {
        if diagnostics.is_empty() {
            self.by_document.remove(document);
        } else {
            self.by_document
                .insert(document.to_string(), diagnostics.to_vec());
        }
    }

    pub fn len(&self) -> usize {
        self.by_document.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_document.is_empty()
    }
}

impl DiagnosticsSource for DiagnosticsCache {
    fn diagnostics(&self, document: &str) -> Vec<Diagnostic> {
        self.by_document.get(document).cloned().unwrap_or_default()
    }
}
