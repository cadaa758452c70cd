//! Pluggable error strategies.
//!
//! The automaton calls into an [`ErrorStrategy`] whenever it detects a
//! mismatch or a predicate failure, and before loop and optional-subrule
//! decisions. Strategies are stateless: every call receives the
//! [`Recognizer`] it acts on, and all per-parse bookkeeping lives in that
//! recognizer's [`RecoveryState`](crate::recognizer::RecoveryState). One
//! strategy value can therefore serve parses running on many threads.

pub mod bail;
pub mod default;

use tracing::debug;

use crate::error::{ErrorRecord, RecognitionError};
use crate::recognizer::Recognizer;
use crate::token::Token;

pub use bail::BailErrorStrategy;
pub use default::DefaultErrorStrategy;

/// Result of a successful inline repair.
///
/// The caller decides how a conjured symbol is represented (for example
/// as an error node in a tree); the strategy only says which case applies.
#[derive(Debug, Clone, PartialEq)]
pub enum RepairedSymbol {
    /// A real token, matched after an extraneous token was dropped
    Matched(Token),

    /// A placeholder for a token missing from the input
    Conjured(Token),
}

impl RepairedSymbol {
    pub fn token(&self) -> &Token {
        match self {
            RepairedSymbol::Matched(t) | RepairedSymbol::Conjured(t) => t,
        }
    }

    pub fn into_token(self) -> Token {
        match self {
            RepairedSymbol::Matched(t) | RepairedSymbol::Conjured(t) => t,
        }
    }

    pub fn is_conjured(&self) -> bool {
        matches!(self, RepairedSymbol::Conjured(_))
    }
}

/// Recovery policy consumed by the parsing automaton.
///
/// The recovery-mode tracker (`begin_error_condition`,
/// `in_error_recovery_mode`, `end_error_condition`) is provided here so
/// every strategy shares the same window semantics.
pub trait ErrorStrategy: Send + Sync {
    /// Report a detected error.
    ///
    /// Suppressed while already in recovery mode. Returns
    /// [`RecognitionError::Reported`] when the error must propagate (halt
    /// policy, failed predicates); otherwise the parse may continue.
    fn report_error(
        &self,
        recognizer: &mut dyn Recognizer,
        error: ErrorRecord,
    ) -> Result<(), RecognitionError>;

    /// Repair a failed token match in place.
    fn recover_inline(
        &self,
        recognizer: &mut dyn Recognizer,
    ) -> Result<RepairedSymbol, RecognitionError>;

    /// Resynchronize at rule granularity after `error` aborted a rule.
    fn recover(
        &self,
        recognizer: &mut dyn Recognizer,
        error: &ErrorRecord,
    ) -> Result<(), RecognitionError>;

    /// Realign the input before a loop iteration or optional subrule.
    fn sync(&self, recognizer: &mut dyn Recognizer);

    /// Called at the start of a parse.
    fn reset(&self, recognizer: &mut dyn Recognizer) {
        recognizer.recovery_mut().reset();
    }

    /// Enter recovery mode. Idempotent.
    fn begin_error_condition(&self, recognizer: &mut dyn Recognizer) {
        let state = recognizer.recovery_mut();
        if !state.error_recovery_mode {
            debug!("entering error recovery mode");
            state.error_recovery_mode = true;
        }
    }

    fn in_error_recovery_mode(&self, recognizer: &dyn Recognizer) -> bool {
        recognizer.recovery().error_recovery_mode
    }

    /// Leave recovery mode and forget where `recover` last ran.
    fn end_error_condition(&self, recognizer: &mut dyn Recognizer) {
        let state = recognizer.recovery_mut();
        if state.error_recovery_mode {
            debug!("leaving error recovery mode");
        }
        state.error_recovery_mode = false;
        state.last_error_index = None;
        state.last_error_states.clear();
    }

    /// Called by the automaton after a token matched without error.
    fn report_match(&self, recognizer: &mut dyn Recognizer) {
        self.end_error_condition(recognizer);
    }
}
