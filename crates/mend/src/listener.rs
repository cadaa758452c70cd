//! Listener surface receiving syntax diagnostics.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use codespan_reporting::files::SimpleFiles;
use parking_lot::Mutex;
use termcolor::{ColorChoice, StandardStream};
use tracing::debug;

use crate::diagnostic::{create_files, SyntaxDiagnostic};

/// Receives every diagnostic that survives recovery-mode suppression.
pub trait ErrorListener {
    fn syntax_error(&mut self, diagnostic: &SyntaxDiagnostic);
}

/// Listener that stores diagnostics behind a shared handle.
///
/// Clone it before registering; the clone kept by the caller sees
/// everything the registered one receives.
#[derive(Debug, Clone, Default)]
pub struct CollectingListener {
    diagnostics: Arc<Mutex<Vec<SyntaxDiagnostic>>>,
}

impl CollectingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> Vec<SyntaxDiagnostic> {
        self.diagnostics.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.diagnostics
            .lock()
            .iter()
            .map(|d| d.message.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.diagnostics.lock().clear();
    }
}

impl ErrorListener for CollectingListener {
    fn syntax_error(&mut self, diagnostic: &SyntaxDiagnostic) {
        self.diagnostics.lock().push(diagnostic.clone());
    }
}

/// Listener that renders diagnostics to stderr with source context.
pub struct ConsoleListener {
    files: SimpleFiles<String, String>,
    file_id: usize,
    writer: StandardStream,
}

impl ConsoleListener {
    /// Create a listener for one source file.
    pub fn new(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self::with_color(path, source, ColorChoice::Auto)
    }

    pub fn with_color(path: impl Into<PathBuf>, source: impl Into<String>, color: ColorChoice) -> Self {
        Self {
            files: create_files(path, source),
            file_id: 0,
            writer: StandardStream::stderr(color),
        }
    }
}

impl ErrorListener for ConsoleListener {
    fn syntax_error(&mut self, diagnostic: &SyntaxDiagnostic) {
        if let Err(e) = diagnostic.emit(&mut self.writer, &self.files, self.file_id) {
            // Span outside the registered source; fall back to the bare message
            debug!(error = %e, "rendering diagnostic failed; writing plain line");
            if let Err(e) = write_plain(&mut self.writer, diagnostic) {
                debug!(error = %e, "dropped diagnostic: stderr not writable");
            }
        }
    }
}

/// `line L:C message`, without source context.
fn write_plain(writer: &mut dyn Write, diagnostic: &SyntaxDiagnostic) -> std::io::Result<()> {
    writeln!(
        writer,
        "line {}:{} {}",
        diagnostic.line, diagnostic.column, diagnostic.message
    )
}
