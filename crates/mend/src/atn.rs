//! Augmented transition network: the parser's state/transition tables as
//! seen by the error strategy.
//!
//! Each grammar rule is a small sub-network with a start and a stop
//! state. Token-labelled edges consume input, rule edges invoke another
//! rule and name the state to continue in once it returns, and
//! epsilon-like edges (plain, predicate, action) move without consuming.
//!
//! The network is immutable after [`AtnBuilder::build`] and is shared
//! between parse sessions through an `Arc`.

use std::fmt;

use thiserror::Error;

use crate::token::TokenKind;
use crate::token_set::TokenSet;

/// Index of a state in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(pub u32);

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Index of a grammar rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleIndex(pub u32);

impl fmt::Display for RuleIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Structural role of a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Basic,
    RuleStart,
    RuleStop,
    /// Start of an alternative block (a decision point)
    BlockStart,
    BlockEnd,
    /// Decision between entering a `(...)*` loop and skipping it
    StarLoopEntry,
    /// Decision between another iteration and leaving a loop
    LoopBack,
    LoopEnd,
}

impl StateKind {
    /// Returns true for states where the parser picks among alternatives.
    pub fn is_decision(self) -> bool {
        matches!(
            self,
            StateKind::BlockStart | StateKind::StarLoopEntry | StateKind::LoopBack
        )
    }
}

/// An outgoing edge.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Match exactly one token kind
    Atom { kind: TokenKind, target: StateId },

    /// Match any kind in `lo..=hi`
    Range {
        lo: TokenKind,
        hi: TokenKind,
        target: StateId,
    },

    /// Match any kind in the set
    Set { set: TokenSet, target: StateId },

    /// Match any user kind not in the set
    NotSet { set: TokenSet, target: StateId },

    /// Match any user kind
    Wildcard { target: StateId },

    Epsilon { target: StateId },

    /// Invoke `rule` (whose start state is `target`) and continue at `follow`
    Rule {
        rule: RuleIndex,
        target: StateId,
        follow: StateId,
    },

    /// Semantic predicate guarding the rest of an alternative
    Predicate {
        rule: RuleIndex,
        index: u32,
        target: StateId,
    },

    /// Embedded action; never affects lookahead
    Action { target: StateId },
}

impl Transition {
    pub fn target(&self) -> StateId {
        match self {
            Transition::Atom { target, .. }
            | Transition::Range { target, .. }
            | Transition::Set { target, .. }
            | Transition::NotSet { target, .. }
            | Transition::Wildcard { target }
            | Transition::Epsilon { target }
            | Transition::Rule { target, .. }
            | Transition::Predicate { target, .. }
            | Transition::Action { target } => *target,
        }
    }

    /// Returns true if following this edge consumes no input.
    pub fn is_epsilon(&self) -> bool {
        matches!(
            self,
            Transition::Epsilon { .. }
                | Transition::Rule { .. }
                | Transition::Predicate { .. }
                | Transition::Action { .. }
        )
    }

    /// Kinds this edge can consume, for edges with a finite label.
    ///
    /// `max_kind` bounds the complement of negated sets and wildcards.
    pub fn label(&self, max_kind: TokenKind) -> Option<TokenSet> {
        match self {
            Transition::Atom { kind, .. } => Some(TokenSet::of([*kind])),
            Transition::Range { lo, hi, .. } => Some(TokenSet::range(*lo, *hi)),
            Transition::Set { set, .. } => Some(set.clone()),
            Transition::NotSet { set, .. } => Some(set.complement(max_kind)),
            Transition::Wildcard { .. } => {
                Some(TokenSet::range(TokenKind::MIN_USER, max_kind))
            }
            _ => None,
        }
    }

    /// Returns true if this edge consumes a token of `kind`.
    pub fn matches(&self, kind: TokenKind, max_kind: TokenKind) -> bool {
        let in_vocab = kind.is_user() && kind <= max_kind;
        match self {
            Transition::Atom { kind: k, .. } => *k == kind,
            Transition::Range { lo, hi, .. } => *lo <= kind && kind <= *hi,
            Transition::Set { set, .. } => set.contains(kind),
            Transition::NotSet { set, .. } => in_vocab && !set.contains(kind),
            Transition::Wildcard { .. } => in_vocab,
            _ => false,
        }
    }
}

/// A state with its outgoing edges.
#[derive(Debug, Clone)]
pub struct AtnState {
    pub id: StateId,
    pub kind: StateKind,
    pub rule: RuleIndex,
    pub transitions: Vec<Transition>,
}

impl AtnState {
    /// Returns true if the parser chooses among several edges here.
    pub fn is_decision(&self) -> bool {
        self.kind.is_decision() || self.transitions.len() > 1
    }
}

#[derive(Debug, Clone)]
struct RuleInfo {
    name: String,
    start: StateId,
    stop: StateId,
}

/// Errors detected while building a network.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AtnError {
    /// An edge points at a state that was never created
    #[error("state {from} has an edge to unknown state {target}")]
    UnknownState { from: StateId, target: StateId },

    /// A rule edge or state references a rule that was never declared
    #[error("reference to undeclared rule {rule}")]
    UnknownRule { rule: RuleIndex },

    /// A rule edge's target is not the invoked rule's start state
    #[error("rule edge in {from} targets {target}, which is not the start of rule '{rule}'")]
    RuleTargetMismatch {
        from: StateId,
        target: StateId,
        rule: String,
    },

    /// Rule stop states return through the invocation stack, never through edges
    #[error("stop state of rule '{rule}' has outgoing edges")]
    RuleStopHasTransitions { rule: String },

    /// A token label exceeds the declared vocabulary
    #[error("token kind {kind} on edge from {from} exceeds max kind {max}")]
    TokenKindOutOfRange {
        from: StateId,
        kind: TokenKind,
        max: TokenKind,
    },
}

/// Immutable transition network.
#[derive(Debug, Clone)]
pub struct Atn {
    states: Vec<AtnState>,
    rules: Vec<RuleInfo>,
    max_token_kind: TokenKind,
}

impl Atn {
    /// Look up a state. Panics on ids not produced by this network's builder.
    #[inline]
    pub fn state(&self, id: StateId) -> &AtnState {
        &self.states[id.0 as usize]
    }

    pub fn get_state(&self, id: StateId) -> Option<&AtnState> {
        self.states.get(id.0 as usize)
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn rule_start(&self, rule: RuleIndex) -> StateId {
        self.rules[rule.0 as usize].start
    }

    pub fn rule_stop(&self, rule: RuleIndex) -> StateId {
        self.rules[rule.0 as usize].stop
    }

    pub fn rule_name(&self, rule: RuleIndex) -> &str {
        self.rules
            .get(rule.0 as usize)
            .map_or("<unknown>", |r| r.name.as_str())
    }

    pub fn rule_by_name(&self, name: &str) -> Option<RuleIndex> {
        self.rules
            .iter()
            .position(|r| r.name == name)
            .map(|i| RuleIndex(i as u32))
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.name.as_str())
    }

    pub fn max_token_kind(&self) -> TokenKind {
        self.max_token_kind
    }
}

/// Incremental constructor for [`Atn`].
///
/// ```ignore
/// let mut b = AtnBuilder::new(TokenKind(3));
/// let (r, start, stop) = b.add_rule("pair");
/// let mid = b.add_state(r, StateKind::Basic);
/// b.atom(start, A, mid);
/// b.atom(mid, B, stop);
/// let atn = b.build()?;
/// ```
#[derive(Debug, Clone)]
pub struct AtnBuilder {
    states: Vec<AtnState>,
    rules: Vec<RuleInfo>,
    max_token_kind: TokenKind,
}

impl AtnBuilder {
    pub fn new(max_token_kind: TokenKind) -> Self {
        Self {
            states: Vec::new(),
            rules: Vec::new(),
            max_token_kind,
        }
    }

    /// Declare a rule, creating its start and stop states.
    pub fn add_rule(&mut self, name: impl Into<String>) -> (RuleIndex, StateId, StateId) {
        let rule = RuleIndex(self.rules.len() as u32);
        let start = self.push_state(rule, StateKind::RuleStart);
        let stop = self.push_state(rule, StateKind::RuleStop);
        self.rules.push(RuleInfo {
            name: name.into(),
            start,
            stop,
        });
        (rule, start, stop)
    }

    pub fn add_state(&mut self, rule: RuleIndex, kind: StateKind) -> StateId {
        self.push_state(rule, kind)
    }

    pub fn add_transition(&mut self, from: StateId, transition: Transition) {
        if let Some(state) = self.states.get_mut(from.0 as usize) {
            state.transitions.push(transition);
        }
    }

    pub fn atom(&mut self, from: StateId, kind: TokenKind, to: StateId) {
        self.add_transition(from, Transition::Atom { kind, target: to });
    }

    pub fn set(&mut self, from: StateId, set: TokenSet, to: StateId) {
        self.add_transition(from, Transition::Set { set, target: to });
    }

    pub fn epsilon(&mut self, from: StateId, to: StateId) {
        self.add_transition(from, Transition::Epsilon { target: to });
    }

    /// Add an edge from `from` invoking `rule`, resuming at `follow`.
    pub fn call(&mut self, from: StateId, rule: RuleIndex, follow: StateId) {
        let target = self
            .rules
            .get(rule.0 as usize)
            .map_or(StateId(u32::MAX), |r| r.start);
        self.add_transition(
            from,
            Transition::Rule {
                rule,
                target,
                follow,
            },
        );
    }

    pub fn predicate(&mut self, from: StateId, rule: RuleIndex, index: u32, to: StateId) {
        self.add_transition(
            from,
            Transition::Predicate {
                rule,
                index,
                target: to,
            },
        );
    }

    pub fn rule_start(&self, rule: RuleIndex) -> Option<StateId> {
        self.rules.get(rule.0 as usize).map(|r| r.start)
    }

    pub fn rule_stop(&self, rule: RuleIndex) -> Option<StateId> {
        self.rules.get(rule.0 as usize).map(|r| r.stop)
    }

    /// Validate and freeze the network.
    pub fn build(self) -> Result<Atn, AtnError> {
        let state_count = self.states.len() as u32;
        let known = |id: StateId| id.0 < state_count;

        for state in &self.states {
            if state.rule.0 as usize >= self.rules.len() {
                return Err(AtnError::UnknownRule { rule: state.rule });
            }
            if state.kind == StateKind::RuleStop && !state.transitions.is_empty() {
                return Err(AtnError::RuleStopHasTransitions {
                    rule: self.rules[state.rule.0 as usize].name.clone(),
                });
            }

            for t in &state.transitions {
                if !known(t.target()) {
                    return Err(AtnError::UnknownState {
                        from: state.id,
                        target: t.target(),
                    });
                }
                match t {
                    Transition::Rule {
                        rule,
                        target,
                        follow,
                    } => {
                        let info = self
                            .rules
                            .get(rule.0 as usize)
                            .ok_or(AtnError::UnknownRule { rule: *rule })?;
                        if info.start != *target {
                            return Err(AtnError::RuleTargetMismatch {
                                from: state.id,
                                target: *target,
                                rule: info.name.clone(),
                            });
                        }
                        if !known(*follow) {
                            return Err(AtnError::UnknownState {
                                from: state.id,
                                target: *follow,
                            });
                        }
                    }
                    Transition::Atom { kind, .. } => self.check_kind(state.id, *kind)?,
                    Transition::Range { lo, hi, .. } => {
                        self.check_kind(state.id, *lo)?;
                        self.check_kind(state.id, *hi)?;
                    }
                    Transition::Set { set, .. } | Transition::NotSet { set, .. } => {
                        for kind in set.iter() {
                            self.check_kind(state.id, kind)?;
                        }
                    }
                    _ => {}
                }
            }
        }

        Ok(Atn {
            states: self.states,
            rules: self.rules,
            max_token_kind: self.max_token_kind,
        })
    }

    fn check_kind(&self, from: StateId, kind: TokenKind) -> Result<(), AtnError> {
        if kind.is_user() && kind > self.max_token_kind {
            return Err(AtnError::TokenKindOutOfRange {
                from,
                kind,
                max: self.max_token_kind,
            });
        }
        Ok(())
    }

    fn push_state(&mut self, rule: RuleIndex, kind: StateKind) -> StateId {
        let id = StateId(self.states.len() as u32);
        self.states.push(AtnState {
            id,
            kind,
            rule,
            transitions: Vec::new(),
        });
        id
    }
}
