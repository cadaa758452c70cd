//! Bail-out policy: report the first error, then abandon the parse.
//!
//! Useful for two-stage parsing where a fast pass without recovery is
//! tried first and only failing inputs are re-parsed with the default
//! strategy.

use super::{DefaultErrorStrategy, ErrorStrategy, RepairedSymbol};
use crate::error::{ErrorRecord, RecognitionError};
use crate::recognizer::Recognizer;

/// Strategy that never repairs or resynchronizes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BailErrorStrategy {
    reporter: DefaultErrorStrategy,
}

impl BailErrorStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ErrorStrategy for BailErrorStrategy {
    fn report_error(
        &self,
        recognizer: &mut dyn Recognizer,
        error: ErrorRecord,
    ) -> Result<(), RecognitionError> {
        self.reporter.report_error(recognizer, error)
    }

    fn recover_inline(
        &self,
        recognizer: &mut dyn Recognizer,
    ) -> Result<RepairedSymbol, RecognitionError> {
        let record = ErrorRecord::input_mismatch(recognizer);
        self.reporter.report_error(recognizer, record.clone())?;
        Err(RecognitionError::Cancelled(record))
    }

    fn recover(
        &self,
        _recognizer: &mut dyn Recognizer,
        error: &ErrorRecord,
    ) -> Result<(), RecognitionError> {
        Err(RecognitionError::Cancelled(error.clone()))
    }

    /// Never skips input.
    fn sync(&self, _recognizer: &mut dyn Recognizer) {}
}
