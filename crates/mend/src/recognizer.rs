//! The capability an error strategy needs from the parser it serves.
//!
//! A strategy never owns parse state. Everything that changes during a
//! parse (input cursor, invocation stack, the recovery-mode flag) lives
//! behind the [`Recognizer`] handle that is passed into every call, so one
//! strategy value can serve any number of parses at once.

use std::collections::BTreeSet;

use crate::atn::{Atn, RuleIndex, StateId};
use crate::config::RecoveryConfig;
use crate::diagnostic::SyntaxDiagnostic;
use crate::ll1;
use crate::stream::TokenStream;
use crate::token::{Token, Vocabulary};
use crate::token_set::TokenSet;

/// One entry of the rule-invocation stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleFrame {
    /// Rule being executed
    pub rule: RuleIndex,

    /// State in the caller holding the rule edge; `None` for the start rule
    pub invoking_state: Option<StateId>,

    /// State in the caller to continue in once this rule returns
    pub follow_state: Option<StateId>,
}

impl RuleFrame {
    /// Frame for the rule a parse starts in.
    pub fn root(rule: RuleIndex) -> Self {
        Self {
            rule,
            invoking_state: None,
            follow_state: None,
        }
    }

    /// Frame for a rule invoked from `invoking_state`, resuming at `follow_state`.
    pub fn invoked(rule: RuleIndex, invoking_state: StateId, follow_state: StateId) -> Self {
        Self {
            rule,
            invoking_state: Some(invoking_state),
            follow_state: Some(follow_state),
        }
    }
}

/// Per-parse error-recovery bookkeeping.
///
/// `error_recovery_mode` is true exactly while the parser is inside a
/// window that began at a reported error and has not yet matched a token
/// without a new error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryState {
    /// Inside an error window; further diagnostics are suppressed
    pub error_recovery_mode: bool,

    /// Input index at which `recover` last ran
    pub last_error_index: Option<usize>,

    /// States from which `recover` ran at `last_error_index`
    pub last_error_states: BTreeSet<StateId>,
}

impl RecoveryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything; called at the start of a new parse.
    pub fn reset(&mut self) {
        self.error_recovery_mode = false;
        self.last_error_index = None;
        self.last_error_states.clear();
    }
}

/// Parse-session handle consumed by error strategies.
///
/// The parsing automaton implements this; the strategy only queries the
/// automaton position, moves the input cursor forward and hands finished
/// diagnostics to the listener surface.
pub trait Recognizer {
    /// Transition network the parser runs on.
    fn atn(&self) -> &Atn;

    /// Token names for diagnostics.
    fn vocabulary(&self) -> &Vocabulary;

    /// Current automaton state.
    fn state(&self) -> StateId;

    /// Invocation stack, outermost rule first.
    fn rule_stack(&self) -> &[RuleFrame];

    fn input(&self) -> &dyn TokenStream;

    fn input_mut(&mut self) -> &mut dyn TokenStream;

    fn recovery(&self) -> &RecoveryState;

    fn recovery_mut(&mut self) -> &mut RecoveryState;

    fn config(&self) -> &RecoveryConfig;

    /// Forward a diagnostic to every registered listener.
    fn notify_error_listeners(&mut self, diagnostic: SyntaxDiagnostic);

    /// The current lookahead token (EOF once input is exhausted).
    fn current_token(&self) -> Token {
        self.input()
            .lt(1)
            .cloned()
            .unwrap_or_else(|| Token::eof(Default::default()))
    }

    /// Discard the current token without matching it.
    fn consume(&mut self) {
        self.input_mut().consume();
    }

    /// Names of the rules on the invocation stack, outermost first.
    fn rule_invocation_stack(&self) -> Vec<String> {
        self.rule_stack()
            .iter()
            .map(|f| self.atn().rule_name(f.rule).to_string())
            .collect()
    }

    /// Kinds acceptable at the current state given the invocation stack.
    fn expected_tokens(&self) -> TokenSet {
        ll1::expected_tokens(self.atn(), self.state(), self.rule_stack())
    }
}
