//! Recognition error types.
//!
//! An [`ErrorRecord`] is a snapshot taken at the moment the automaton (or
//! the inline recovery engine) detects a problem. It is never modified
//! afterwards; the reporter reads it exactly once to build a diagnostic.

use std::fmt;

use thiserror::Error;

use crate::atn::StateId;
use crate::recognizer::Recognizer;
use crate::token::Token;
use crate::token_set::TokenSet;

/// The three ways recognition can fail.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    /// No alternative of a decision is viable for the lookahead
    NoViableAlternative {
        /// First token of the input the decision looked at
        start: Token,
    },

    /// The lookahead does not match the single token a linear match wants
    InputMismatch,

    /// A semantic predicate eliminated an otherwise viable path
    FailedPredicate {
        /// Rule containing the predicate
        rule: String,
        /// Predicate source text
        predicate: String,
        /// Custom message supplied by the grammar, if any
        message: Option<String>,
    },
}

impl ErrorKind {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::NoViableAlternative { .. } => "no viable alternative",
            ErrorKind::InputMismatch => "input mismatch",
            ErrorKind::FailedPredicate { .. } => "failed predicate",
        }
    }

    /// Predicate failures cannot be repaired locally.
    pub fn is_locally_repairable(&self) -> bool {
        !matches!(self, ErrorKind::FailedPredicate { .. })
    }
}

/// Everything known about an error at detection time.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRecord {
    pub kind: ErrorKind,

    /// Token at which the error was detected
    pub offending: Token,

    /// Kinds that would have been accepted
    pub expected: TokenSet,

    /// Rule names on the invocation stack, outermost first
    pub rule_stack: Vec<String>,

    /// Automaton state at detection
    pub state: StateId,
}

impl ErrorRecord {
    /// Snapshot the recognizer for an error of `kind` at `offending`.
    pub fn capture(recognizer: &dyn Recognizer, kind: ErrorKind, offending: Token) -> Self {
        Self {
            kind,
            offending,
            expected: recognizer.expected_tokens(),
            rule_stack: recognizer.rule_invocation_stack(),
            state: recognizer.state(),
        }
    }

    /// The lookahead does not match what the current state expects.
    pub fn input_mismatch(recognizer: &dyn Recognizer) -> Self {
        Self::capture(recognizer, ErrorKind::InputMismatch, recognizer.current_token())
    }

    /// No alternative is viable; `start` is where the decision began.
    pub fn no_viable_alternative(recognizer: &dyn Recognizer, start: Token) -> Self {
        Self::capture(
            recognizer,
            ErrorKind::NoViableAlternative { start },
            recognizer.current_token(),
        )
    }

    /// A predicate in the current rule evaluated false.
    pub fn failed_predicate(
        recognizer: &dyn Recognizer,
        predicate: impl Into<String>,
        message: Option<String>,
    ) -> Self {
        let rule = recognizer
            .rule_stack()
            .last()
            .map(|f| recognizer.atn().rule_name(f.rule).to_string())
            .unwrap_or_default();
        Self::capture(
            recognizer,
            ErrorKind::FailedPredicate {
                rule,
                predicate: predicate.into(),
                message,
            },
            recognizer.current_token(),
        )
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}:{} near '{}'",
            self.kind.name(),
            self.offending.span.line,
            self.offending.span.column,
            self.offending.error_display()
        )
    }
}

/// Failure raised out of the error strategy or the automaton.
///
/// Variants distinguish errors that still need reporting from those that
/// already reached the listeners, so a rule's catch block never reports
/// the same root cause twice.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecognitionError {
    /// Detected by the automaton, not yet reported (no viable alternative)
    #[error("{0}")]
    Detected(ErrorRecord),

    /// Neither single-token deletion nor insertion could repair the match
    #[error("unrecoverable mismatch: {0}")]
    Unrecoverable(ErrorRecord),

    /// Re-raised after reporting (halt policy or failed predicate)
    #[error("syntax error: {0}")]
    Reported(ErrorRecord),

    /// Parse abandoned by a bail-out strategy
    #[error("parse cancelled: {0}")]
    Cancelled(ErrorRecord),
}

impl RecognitionError {
    pub fn record(&self) -> &ErrorRecord {
        match self {
            RecognitionError::Detected(r)
            | RecognitionError::Unrecoverable(r)
            | RecognitionError::Reported(r)
            | RecognitionError::Cancelled(r) => r,
        }
    }

    pub fn into_record(self) -> ErrorRecord {
        match self {
            RecognitionError::Detected(r)
            | RecognitionError::Unrecoverable(r)
            | RecognitionError::Reported(r)
            | RecognitionError::Cancelled(r) => r,
        }
    }

    /// Returns true if listeners have already seen this error.
    pub fn is_reported(&self) -> bool {
        matches!(self, RecognitionError::Reported(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Span, TokenKind};

    fn record(kind: ErrorKind) -> ErrorRecord {
        ErrorRecord {
            kind,
            offending: Token::new(TokenKind(4), "x", Span::new(3, 4, 2, 7)),
            expected: TokenSet::of([TokenKind(1)]),
            rule_stack: vec!["file".to_string()],
            state: StateId(5),
        }
    }

    #[test]
    fn test_record_display() {
        let r = record(ErrorKind::InputMismatch);
        assert_eq!(r.to_string(), "input mismatch at 2:7 near 'x'");
    }

    #[test]
    fn test_predicate_not_locally_repairable() {
        let pred = ErrorKind::FailedPredicate {
            rule: "r".into(),
            predicate: "p".into(),
            message: None,
        };
        assert!(!pred.is_locally_repairable());
        assert!(ErrorKind::InputMismatch.is_locally_repairable());
    }

    #[test]
    fn test_recognition_error_record_access() {
        let err = RecognitionError::Unrecoverable(record(ErrorKind::InputMismatch));
        assert_eq!(err.record().state, StateId(5));
        assert!(err.to_string().starts_with("unrecoverable mismatch"));
        assert!(!err.is_reported());
        assert_eq!(err.into_record().offending.text, "x");
    }
}
