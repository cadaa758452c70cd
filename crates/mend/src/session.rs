//! A concrete recognizer for hand-written and generated parsers.
//!
//! [`ParseSession`] holds everything that changes during one parse: the
//! input cursor, the rule-invocation stack, the automaton state and the
//! recovery-mode bookkeeping. Parser code drives it in the usual
//! generated-parser shape:
//!
//! ```ignore
//! fn list(&mut self) -> Result<(), RecognitionError> {
//!     self.session.enter_rule(LIST);
//!     let result = self.list_body();
//!     let result = match result {
//!         Err(e) => self.session.handle_rule_error(&self.strategy, e),
//!         ok => ok,
//!     };
//!     self.session.exit_rule();
//!     result
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::atn::{Atn, RuleIndex, StateId, Transition};
use crate::config::RecoveryConfig;
use crate::diagnostic::SyntaxDiagnostic;
use crate::error::{ErrorRecord, RecognitionError};
use crate::listener::ErrorListener;
use crate::recognizer::{Recognizer, RecoveryState, RuleFrame};
use crate::strategy::{ErrorStrategy, RepairedSymbol};
use crate::stream::{BufferedTokenStream, TokenStream};
use crate::token::{Token, TokenKind, Vocabulary};
use crate::token_set::TokenSet;

/// Per-parse recognizer state.
pub struct ParseSession {
    atn: Arc<Atn>,
    vocabulary: Arc<Vocabulary>,

    /// Token input, always terminated by EOF
    input: BufferedTokenStream,

    /// Active rule invocations, outermost first
    stack: Vec<RuleFrame>,

    /// Current automaton state
    state: StateId,

    recovery: RecoveryState,
    config: RecoveryConfig,

    /// Every diagnostic delivered to listeners, in order
    diagnostics: Vec<SyntaxDiagnostic>,
    listeners: Vec<Box<dyn ErrorListener>>,

    syntax_errors: usize,
}

impl ParseSession {
    pub fn new(atn: Arc<Atn>, vocabulary: Arc<Vocabulary>, input: BufferedTokenStream) -> Self {
        Self::with_config(atn, vocabulary, input, RecoveryConfig::default())
    }

    pub fn with_config(
        atn: Arc<Atn>,
        vocabulary: Arc<Vocabulary>,
        input: BufferedTokenStream,
        config: RecoveryConfig,
    ) -> Self {
        Self {
            atn,
            vocabulary,
            input,
            stack: Vec::new(),
            state: StateId(0),
            recovery: RecoveryState::new(),
            config,
            diagnostics: Vec::new(),
            listeners: Vec::new(),
            syntax_errors: 0,
        }
    }

    /// Register a listener. Listeners are notified in registration order.
    pub fn add_listener(&mut self, listener: impl ErrorListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Move the automaton to `state`.
    pub fn set_state(&mut self, state: StateId) {
        self.state = state;
    }

    /// Kind of the token at lookahead `offset` (1 is the current token).
    pub fn la(&self, offset: isize) -> TokenKind {
        self.input.la(offset)
    }

    pub fn stream(&self) -> &BufferedTokenStream {
        &self.input
    }

    /// Push a frame for `rule` and move to its start state.
    ///
    /// The current state is taken as the invoking state; the follow state is
    /// read from its rule edge for `rule`. The first rule entered becomes
    /// the root of the stack.
    pub fn enter_rule(&mut self, rule: RuleIndex) {
        let frame = if self.stack.is_empty() {
            RuleFrame::root(rule)
        } else {
            let invoking = self.state;
            match self.follow_state_for(invoking, rule) {
                Some(follow) => RuleFrame::invoked(rule, invoking, follow),
                None => {
                    warn!(%invoking, %rule, "no rule edge from invoking state; follow set unavailable");
                    RuleFrame {
                        rule,
                        invoking_state: Some(invoking),
                        follow_state: None,
                    }
                }
            }
        };

        self.stack.push(frame);
        self.state = self.atn.rule_start(rule);
    }

    /// Pop the current rule and continue at its follow state.
    pub fn exit_rule(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        self.state = frame
            .follow_state
            .unwrap_or_else(|| self.atn.rule_stop(frame.rule));
    }

    /// Match the current token against `kind`.
    ///
    /// On success the token is consumed and any recovery window ends. On
    /// mismatch the strategy's inline repair decides the outcome.
    pub fn match_token(
        &mut self,
        kind: TokenKind,
        strategy: &dyn ErrorStrategy,
    ) -> Result<RepairedSymbol, RecognitionError> {
        let current = self.current_token();
        if current.kind == kind {
            strategy.report_match(self);
            self.input.consume();
            return Ok(RepairedSymbol::Matched(current));
        }
        strategy.recover_inline(self)
    }

    /// Match the current token against any kind in `set`.
    pub fn match_set(
        &mut self,
        set: &TokenSet,
        strategy: &dyn ErrorStrategy,
    ) -> Result<RepairedSymbol, RecognitionError> {
        let current = self.current_token();
        if set.contains(current.kind) {
            strategy.report_match(self);
            self.input.consume();
            return Ok(RepairedSymbol::Matched(current));
        }
        strategy.recover_inline(self)
    }

    /// Evaluate a semantic predicate result.
    ///
    /// A false predicate is reported and always propagates; the caller
    /// must abandon the current alternative.
    pub fn check_predicate(
        &mut self,
        strategy: &dyn ErrorStrategy,
        holds: bool,
        predicate: &str,
        message: Option<String>,
    ) -> Result<(), RecognitionError> {
        if holds {
            return Ok(());
        }
        let record = ErrorRecord::failed_predicate(self, predicate, message);
        strategy.report_error(self, record.clone())?;
        Err(RecognitionError::Reported(record))
    }

    /// Build the error for a decision with no viable alternative.
    ///
    /// `start` is the token at which the decision began looking ahead.
    pub fn no_viable_alternative(&self, start: Token) -> RecognitionError {
        RecognitionError::Detected(ErrorRecord::no_viable_alternative(self, start))
    }

    /// The catch block of a rule: report what is still unreported, then
    /// resynchronize at rule granularity.
    ///
    /// Returns `Err` only when the parse must stop: halt policy, or a
    /// strategy that cancels.
    pub fn handle_rule_error(
        &mut self,
        strategy: &dyn ErrorStrategy,
        error: RecognitionError,
    ) -> Result<(), RecognitionError> {
        match error {
            RecognitionError::Detected(record) | RecognitionError::Unrecoverable(record) => {
                strategy.report_error(self, record.clone())?;
                strategy.recover(self, &record)
            }
            RecognitionError::Reported(record) => {
                if self.config.halt_on_error {
                    return Err(RecognitionError::Reported(record));
                }
                strategy.recover(self, &record)
            }
            cancelled @ RecognitionError::Cancelled(_) => Err(cancelled),
        }
    }

    /// Rewind to the first token and start a fresh parse.
    pub fn reset(&mut self) {
        self.input.seek(0);
        self.stack.clear();
        self.state = StateId(0);
        self.recovery.reset();
        self.diagnostics.clear();
        self.syntax_errors = 0;
    }

    /// Returns true once the current token is EOF.
    pub fn at_eof(&self) -> bool {
        self.input.la(1).is_eof()
    }

    pub fn diagnostics(&self) -> &[SyntaxDiagnostic] {
        &self.diagnostics
    }

    /// Drain the accumulated diagnostics. The error count is unaffected.
    pub fn take_diagnostics(&mut self) -> Vec<SyntaxDiagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Number of diagnostics delivered since the last reset.
    pub fn syntax_error_count(&self) -> usize {
        self.syntax_errors
    }

    fn follow_state_for(&self, invoking: StateId, rule: RuleIndex) -> Option<StateId> {
        self.atn
            .get_state(invoking)?
            .transitions
            .iter()
            .find_map(|t| match t {
                Transition::Rule {
                    rule: r, follow, ..
                } if *r == rule => Some(*follow),
                _ => None,
            })
    }
}

impl Recognizer for ParseSession {
    fn atn(&self) -> &Atn {
        &self.atn
    }

    fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    fn state(&self) -> StateId {
        self.state
    }

    fn rule_stack(&self) -> &[RuleFrame] {
        &self.stack
    }

    fn input(&self) -> &dyn TokenStream {
        &self.input
    }

    fn input_mut(&mut self) -> &mut dyn TokenStream {
        &mut self.input
    }

    fn recovery(&self) -> &RecoveryState {
        &self.recovery
    }

    fn recovery_mut(&mut self) -> &mut RecoveryState {
        &mut self.recovery
    }

    fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    fn notify_error_listeners(&mut self, diagnostic: SyntaxDiagnostic) {
        self.syntax_errors += 1;
        debug!(
            code = diagnostic.code.as_str(),
            line = diagnostic.line,
            column = diagnostic.column,
            "{}",
            diagnostic.message
        );
        for listener in &mut self.listeners {
            listener.syntax_error(&diagnostic);
        }
        self.diagnostics.push(diagnostic);
    }
}

impl fmt::Debug for ParseSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseSession")
            .field("state", &self.state)
            .field("index", &self.input.index())
            .field("stack", &self.stack)
            .field("recovery", &self.recovery)
            .field("syntax_errors", &self.syntax_errors)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
