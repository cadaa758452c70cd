//! Diagnostic records produced by the error reporter.
//!
//! A [`SyntaxDiagnostic`] carries the formatted message together with the
//! immutable [`ErrorRecord`] it was built from. Rendering is left to
//! listeners: this module provides conversion to codespan-reporting for
//! terminal output and a JSON form for editor integration.

use codespan_reporting::diagnostic::{Diagnostic as CsDiagnostic, Label, LabelStyle};
use codespan_reporting::files::{Files, SimpleFiles};
use codespan_reporting::term;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use termcolor::WriteColor;

use crate::error::{ErrorKind, ErrorRecord};
use crate::token::Span;

/// Error code for a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode(pub &'static str);

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        self.0
    }
}

/// Get the error code for an error kind
pub fn error_code(kind: &ErrorKind) -> ErrorCode {
    match kind {
        ErrorKind::InputMismatch => ErrorCode("E0001"),
        ErrorKind::NoViableAlternative { .. } => ErrorCode("E0002"),
        ErrorKind::FailedPredicate { .. } => ErrorCode("E0003"),
    }
}

/// A syntax error ready to be handed to listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxDiagnostic {
    /// Error code (e.g. "E0001")
    pub code: ErrorCode,

    /// Human-readable message
    pub message: String,

    /// Location of the offending token
    pub span: Span,

    pub line: u32,

    pub column: u32,

    /// Expected set rendered with the recognizer's vocabulary
    pub expected: String,

    /// The record this diagnostic was built from
    pub record: ErrorRecord,
}

impl SyntaxDiagnostic {
    pub fn new(record: ErrorRecord, message: impl Into<String>, expected: impl Into<String>) -> Self {
        let span = record.offending.span;
        Self {
            code: error_code(&record.kind),
            message: message.into(),
            span,
            line: span.line,
            column: span.column,
            expected: expected.into(),
            record,
        }
    }

    /// Build the codespan diagnostic for the file registered as `file_id`.
    pub fn to_codespan(&self, file_id: usize) -> CsDiagnostic<usize> {
        let label_message = if self.record.offending.is_eof() {
            "unexpected end of input".to_string()
        } else {
            format!("unexpected '{}'", self.record.offending.error_display())
        };

        let mut notes = Vec::new();
        if !self.record.expected.is_empty() {
            notes.push(format!("expected: {}", self.expected));
        }
        if !self.record.rule_stack.is_empty() {
            notes.push(format!("while parsing: {}", self.record.rule_stack.join(" > ")));
        }

        CsDiagnostic::error()
            .with_message(&self.message)
            .with_code(self.code.0)
            .with_labels(vec![Label::primary(file_id, self.span.start..self.span.end)
                .with_message(label_message)])
            .with_notes(notes)
    }

    /// Render to a terminal writer.
    pub fn emit(
        &self,
        writer: &mut dyn WriteColor,
        files: &SimpleFiles<String, String>,
        file_id: usize,
    ) -> Result<(), codespan_reporting::files::Error> {
        let config = term::Config::default();
        term::emit(writer, &config, files, &self.to_codespan(file_id))
    }

    /// Convert to JSON representation for IDE integration
    pub fn to_json(
        &self,
        files: &SimpleFiles<String, String>,
        file_id: usize,
    ) -> Result<String, serde_json::Error> {
        let json_diag = JsonDiagnostic::from_diagnostic(self, files, file_id);
        serde_json::to_string_pretty(&json_diag)
    }
}

/// JSON representation of a diagnostic for IDE integration
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonDiagnostic {
    /// Error code (e.g., "E0001")
    pub code: String,
    /// Error kind
    pub kind: String,
    /// Main error message
    pub message: String,
    /// Source locations with labels
    pub labels: Vec<JsonLabel>,
    /// Additional notes
    pub notes: Vec<String>,
    /// Rules being parsed, outermost first
    pub rule_stack: Vec<String>,
}

/// JSON representation of a diagnostic label
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonLabel {
    /// File path
    pub file: String,
    /// Start line (1-indexed)
    pub start_line: usize,
    /// Start column (1-indexed)
    pub start_column: usize,
    /// End line (1-indexed)
    pub end_line: usize,
    /// End column (1-indexed)
    pub end_column: usize,
    /// Label message
    pub message: Option<String>,
    /// Label style (primary or secondary)
    pub style: String,
}

impl JsonDiagnostic {
    /// Convert a diagnostic to JSON representation
    pub fn from_diagnostic(
        diag: &SyntaxDiagnostic,
        files: &SimpleFiles<String, String>,
        file_id: usize,
    ) -> Self {
        let inner = diag.to_codespan(file_id);

        let labels = inner
            .labels
            .iter()
            .filter_map(|label| {
                let file = files.get(label.file_id).ok()?;
                let start = file.location((), label.range.start).ok()?;
                let end = file.location((), label.range.end).ok()?;

                Some(JsonLabel {
                    file: file.name().to_string(),
                    start_line: start.line_number,
                    start_column: start.column_number,
                    end_line: end.line_number,
                    end_column: end.column_number,
                    message: Some(label.message.clone()),
                    style: match label.style {
                        LabelStyle::Primary => "primary",
                        LabelStyle::Secondary => "secondary",
                    }
                    .to_string(),
                })
            })
            .collect();

        JsonDiagnostic {
            code: diag.code.0.to_string(),
            kind: diag.record.kind.name().to_string(),
            message: diag.message.clone(),
            labels,
            notes: inner.notes,
            rule_stack: diag.record.rule_stack.clone(),
        }
    }
}

/// Helper to create a SimpleFiles instance from source code
pub fn create_files(path: impl Into<PathBuf>, source: impl Into<String>) -> SimpleFiles<String, String> {
    let mut files = SimpleFiles::new();
    files.add(path.into().display().to_string(), source.into());
    files
}
