//! The default recovery policy.
//!
//! - Inside an alternative, a failed match is repaired by dropping one
//!   extraneous token or conjuring one missing token.
//! - Before loop and optional-subrule decisions, `sync` silently discards
//!   input until something the decision can handle appears.
//! - When a whole rule fails, `recover` discards input until a token that
//!   can follow one of the active rules appears.
//! - Only the first error of a recovery window reaches the listeners.

use tracing::debug;

use super::{ErrorStrategy, RepairedSymbol};
use crate::diagnostic::SyntaxDiagnostic;
use crate::error::{ErrorKind, ErrorRecord, RecognitionError};
use crate::ll1;
use crate::recognizer::Recognizer;
use crate::token::{escape_ws, Span, Token, TokenKind};
use crate::token_set::TokenSet;

/// Single-token repair plus follow-set resynchronization.
///
/// Holds no state; share one value across any number of parses.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorStrategy;

impl DefaultErrorStrategy {
    pub fn new() -> Self {
        Self
    }

    /// Drop the current token when the token after it is expected.
    ///
    /// On success the extraneous token has been reported and consumed and
    /// the recovery window is closed; the returned token is the (still
    /// unconsumed) token that now matches.
    fn single_token_deletion(
        &self,
        recognizer: &mut dyn Recognizer,
        expected: &TokenSet,
    ) -> Option<Token> {
        let current = recognizer.input().la(1);
        if current.is_eof() || expected.contains(current) {
            return None;
        }
        if !expected.contains(recognizer.input().la(2)) {
            return None;
        }

        self.report_unwanted_token(recognizer, expected);
        debug!(state = %recognizer.state(), index = recognizer.input().index(), "single-token deletion");
        recognizer.consume();

        let matched = recognizer.current_token();
        self.report_match(recognizer);
        Some(matched)
    }

    /// Conjure the lowest-numbered expected kind without consuming input.
    ///
    /// EOF is never conjured. The recovery window stays open until a real
    /// token matches.
    fn single_token_insertion(
        &self,
        recognizer: &mut dyn Recognizer,
        expected: &TokenSet,
    ) -> Option<Token> {
        let at_eof = recognizer.input().la(1).is_eof();
        if at_eof && !recognizer.config().report_missing_at_eof {
            return None;
        }
        let kind = expected.min_user_kind()?;

        self.report_missing_token(recognizer, expected);
        debug!(state = %recognizer.state(), %kind, "single-token insertion");
        Some(self.conjure(recognizer, kind))
    }

    fn conjure(&self, recognizer: &dyn Recognizer, kind: TokenKind) -> Token {
        let name = recognizer.vocabulary().display_name(kind);
        let current = recognizer.current_token();

        // At EOF, place the placeholder right after the last real token
        let at = match recognizer.input().lt(-1) {
            Some(prev) if current.is_eof() => Span::new(
                prev.span.end,
                prev.span.end,
                prev.span.line,
                prev.span.column + prev.span.len() as u32,
            ),
            _ => current.span,
        };
        Token::missing(kind, &name, at)
    }

    fn report_unwanted_token(&self, recognizer: &mut dyn Recognizer, expected: &TokenSet) {
        if self.in_error_recovery_mode(recognizer) {
            return;
        }
        self.begin_error_condition(recognizer);

        let token = recognizer.current_token();
        let expected_display = expected.to_display(recognizer.vocabulary());
        let message = format!(
            "extraneous input '{}' expecting {}",
            token.error_display(),
            expected_display
        );
        let record = snapshot(recognizer, ErrorKind::InputMismatch, token, expected);
        recognizer.notify_error_listeners(SyntaxDiagnostic::new(record, message, expected_display));
    }

    fn report_missing_token(&self, recognizer: &mut dyn Recognizer, expected: &TokenSet) {
        if self.in_error_recovery_mode(recognizer) {
            return;
        }
        self.begin_error_condition(recognizer);

        let token = recognizer.current_token();
        let expected_display = expected.to_display(recognizer.vocabulary());
        let message = format!("missing {} at '{}'", expected_display, token.error_display());
        let record = snapshot(recognizer, ErrorKind::InputMismatch, token, expected);
        recognizer.notify_error_listeners(SyntaxDiagnostic::new(record, message, expected_display));
    }

    fn message_for(&self, recognizer: &dyn Recognizer, record: &ErrorRecord) -> String {
        match &record.kind {
            ErrorKind::InputMismatch => format!(
                "mismatched input '{}' expecting {}",
                record.offending.error_display(),
                record.expected.to_display(recognizer.vocabulary())
            ),
            ErrorKind::NoViableAlternative { start } => format!(
                "no viable alternative at input '{}'",
                input_text(recognizer, start, &record.offending)
            ),
            ErrorKind::FailedPredicate {
                rule,
                predicate,
                message,
            } => message
                .clone()
                .unwrap_or_else(|| format!("rule {} failed predicate: {{{}}}?", rule, predicate)),
        }
    }

    fn consume_until(&self, recognizer: &mut dyn Recognizer, set: &TokenSet) -> usize {
        let mut skipped = 0;
        loop {
            let la = recognizer.input().la(1);
            if la.is_eof() || set.contains(la) {
                return skipped;
            }
            recognizer.consume();
            skipped += 1;
        }
    }
}

impl ErrorStrategy for DefaultErrorStrategy {
    fn report_error(
        &self,
        recognizer: &mut dyn Recognizer,
        error: ErrorRecord,
    ) -> Result<(), RecognitionError> {
        let propagate = recognizer.config().halt_on_error || !error.kind.is_locally_repairable();

        if self.in_error_recovery_mode(recognizer) {
            debug!(kind = error.kind.name(), "suppressed error inside recovery window");
            self.begin_error_condition(recognizer);
        } else {
            self.begin_error_condition(recognizer);
            let message = self.message_for(recognizer, &error);
            let expected = error.expected.to_display(recognizer.vocabulary());
            recognizer.notify_error_listeners(SyntaxDiagnostic::new(error.clone(), message, expected));
        }

        if propagate {
            return Err(RecognitionError::Reported(error));
        }
        Ok(())
    }

    fn recover_inline(
        &self,
        recognizer: &mut dyn Recognizer,
    ) -> Result<RepairedSymbol, RecognitionError> {
        let expected = recognizer.expected_tokens();
        let config = recognizer.config().clone();

        if !config.halt_on_error {
            if config.single_token_deletion {
                if let Some(matched) = self.single_token_deletion(recognizer, &expected) {
                    recognizer.consume();
                    return Ok(RepairedSymbol::Matched(matched));
                }
            }
            if config.single_token_insertion {
                if let Some(conjured) = self.single_token_insertion(recognizer, &expected) {
                    return Ok(RepairedSymbol::Conjured(conjured));
                }
            }
        }

        let offending = recognizer.current_token();
        debug!(state = %recognizer.state(), expected = %expected, "no inline repair possible");
        Err(RecognitionError::Unrecoverable(snapshot(
            recognizer,
            ErrorKind::InputMismatch,
            offending,
            &expected,
        )))
    }

    fn recover(
        &self,
        recognizer: &mut dyn Recognizer,
        error: &ErrorRecord,
    ) -> Result<(), RecognitionError> {
        let state = recognizer.state();
        let stalled = {
            let rs = recognizer.recovery();
            rs.last_error_index == Some(recognizer.input().index())
                && rs.last_error_states.contains(&state)
        };
        if stalled {
            // Same position, same state: guarantee progress
            debug!(%state, "recover re-entered without progress; dropping one token");
            recognizer.consume();
        }

        let index = recognizer.input().index();
        let rs = recognizer.recovery_mut();
        rs.last_error_index = Some(index);
        rs.last_error_states.insert(state);

        let follow = ll1::error_recovery_set(recognizer.atn(), recognizer.rule_stack());
        let skipped = self.consume_until(recognizer, &follow);
        debug!(kind = error.kind.name(), skipped, follow = %follow, "resynchronized at rule exit");
        Ok(())
    }

    fn sync(&self, recognizer: &mut dyn Recognizer) {
        let la = recognizer.input().la(1);

        if ll1::next_tokens(recognizer.atn(), recognizer.state()).contains(la) {
            return;
        }
        let expected = recognizer.expected_tokens();
        if expected.contains(la) {
            return;
        }

        let skipped = self.consume_until(recognizer, &expected);
        if skipped > 0 {
            debug!(state = %recognizer.state(), skipped, expected = %expected, "resynchronized before decision");
        }
    }
}

fn snapshot(
    recognizer: &dyn Recognizer,
    kind: ErrorKind,
    offending: Token,
    expected: &TokenSet,
) -> ErrorRecord {
    ErrorRecord {
        kind,
        offending,
        expected: expected.clone(),
        rule_stack: recognizer.rule_invocation_stack(),
        state: recognizer.state(),
    }
}

/// Text of the input from `start` through `stop`, for no-viable-alternative messages.
fn input_text(recognizer: &dyn Recognizer, start: &Token, stop: &Token) -> String {
    if start.is_eof() {
        return "<EOF>".to_string();
    }
    let text = match (start.index, stop.index) {
        (Some(a), Some(b)) if a <= b => (a..=b)
            .filter_map(|i| recognizer.input().get(i))
            .filter(|t| !t.is_eof())
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" "),
        _ => stop.text.clone(),
    };
    if text.is_empty() {
        return "<EOF>".to_string();
    }
    escape_ws(&text)
}
