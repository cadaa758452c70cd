//! Single-token lookahead analysis over the transition network.
//!
//! This is where the error strategy learns what the parser would have
//! accepted. Everything here is a pure query: nothing is cached between
//! calls because the answer depends on the dynamic invocation stack.

use rustc_hash::FxHashSet;
use tracing::trace;

use crate::atn::{Atn, RuleIndex, StateId, StateKind, Transition};
use crate::recognizer::RuleFrame;
use crate::token::TokenKind;
use crate::token_set::TokenSet;

/// Kinds that can be consumed next from `state`, without context.
///
/// If the end of the state's rule is reachable without consuming input the
/// result contains [`TokenKind::EPSILON`]. Invocations of other rules are
/// followed through to their follow states; a rule that is already being
/// analyzed further up is not re-entered, which cuts left recursion.
pub fn next_tokens(atn: &Atn, state: StateId) -> TokenSet {
    let mut analyzer = Ll1Analyzer::new(atn);
    let mut out = TokenSet::new();
    analyzer.walk(state, &mut Vec::new(), &mut out);
    out
}

/// Kinds the parser would accept at `state` given the invocation stack.
///
/// Starts from [`next_tokens`]. While the current rule can end without
/// consuming input, the follow set of the invoking rule is merged in,
/// walking outwards through `frames` until a state with a real transition
/// is found. If the bottom of the stack is reached with the end still
/// reachable, EOF is expected.
pub fn expected_tokens(atn: &Atn, state: StateId, frames: &[RuleFrame]) -> TokenSet {
    let mut following = next_tokens(atn, state);
    if !following.contains(TokenKind::EPSILON) {
        trace!(%state, expected = %following, "expected tokens");
        return following;
    }

    let mut expected = following.clone();
    expected.remove(TokenKind::EPSILON);

    for frame in frames.iter().rev() {
        if !following.contains(TokenKind::EPSILON) {
            break;
        }
        let Some(follow) = frame.follow_state else {
            break;
        };
        following = next_tokens(atn, follow);
        expected.union_with(&following);
        expected.remove(TokenKind::EPSILON);
    }

    if following.contains(TokenKind::EPSILON) {
        expected.insert(TokenKind::EOF);
    }

    trace!(%state, depth = frames.len(), expected = %expected, "expected tokens");
    expected
}

/// Union of the follow sets of every active invocation.
///
/// Used to resynchronize at rule granularity: any token that can follow
/// one of the rules on the stack is a safe place to resume.
pub fn error_recovery_set(atn: &Atn, frames: &[RuleFrame]) -> TokenSet {
    let mut recover_set = TokenSet::new();
    for follow in frames.iter().rev().filter_map(|f| f.follow_state) {
        recover_set.union_with(&next_tokens(atn, follow));
    }
    recover_set.remove(TokenKind::EPSILON);
    recover_set
}

/// Returns true if `kind` can be consumed by one of `state`'s edges
/// (epsilon closure included, no context).
pub fn accepts(atn: &Atn, state: StateId, kind: TokenKind) -> bool {
    next_tokens(atn, state).contains(kind)
}

struct Ll1Analyzer<'a> {
    atn: &'a Atn,
    /// (state, local return stack) pairs already visited
    busy: FxHashSet<(StateId, Vec<StateId>)>,
    /// Rules entered during this walk
    called: FxHashSet<RuleIndex>,
}

impl<'a> Ll1Analyzer<'a> {
    fn new(atn: &'a Atn) -> Self {
        Self {
            atn,
            busy: FxHashSet::default(),
            called: FxHashSet::default(),
        }
    }

    fn walk(&mut self, s: StateId, returns: &mut Vec<StateId>, out: &mut TokenSet) {
        if !self.busy.insert((s, returns.clone())) {
            return;
        }

        let state = self.atn.state(s);
        if state.kind == StateKind::RuleStop {
            match returns.pop() {
                None => {
                    out.insert(TokenKind::EPSILON);
                }
                Some(follow) => {
                    let was_called = self.called.remove(&state.rule);
                    self.walk(follow, returns, out);
                    if was_called {
                        self.called.insert(state.rule);
                    }
                    returns.push(follow);
                }
            }
            return;
        }

        let max = self.atn.max_token_kind();
        for t in &state.transitions {
            match t {
                Transition::Rule {
                    rule,
                    target,
                    follow,
                } => {
                    if !self.called.insert(*rule) {
                        continue;
                    }
                    returns.push(*follow);
                    self.walk(*target, returns, out);
                    returns.pop();
                    self.called.remove(rule);
                }
                t if t.is_epsilon() => self.walk(t.target(), returns, out),
                t => {
                    if let Some(label) = t.label(max) {
                        out.union_with(&label);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atn::AtnBuilder;

    const A: TokenKind = TokenKind(1);
    const B: TokenKind = TokenKind(2);
    const C: TokenKind = TokenKind(3);

    /// outer : inner C ;
    /// inner : A? ;
    fn nullable_call() -> (Atn, StateId, StateId, StateId) {
        let mut b = AtnBuilder::new(TokenKind(3));
        let (outer, o_start, o_stop) = b.add_rule("outer");
        let (inner, i_start, i_stop) = b.add_rule("inner");
        let o_mid = b.add_state(outer, StateKind::Basic);
        b.call(o_start, inner, o_mid);
        b.atom(o_mid, C, o_stop);

        let i_block = b.add_state(inner, StateKind::BlockStart);
        b.epsilon(i_start, i_block);
        b.atom(i_block, A, i_stop);
        b.epsilon(i_block, i_stop);

        (b.build().unwrap(), o_start, i_block, o_mid)
    }

    #[test]
    fn test_next_tokens_follows_calls() {
        let (atn, o_start, i_block, _) = nullable_call();

        // inner is nullable, so its follow (C) is visible from outer's start
        assert_eq!(next_tokens(&atn, o_start), TokenSet::of([A, C]));
        // without context the end of inner is reachable
        assert_eq!(
            next_tokens(&atn, i_block),
            TokenSet::of([TokenKind::EPSILON, A])
        );
    }

    #[test]
    fn test_expected_tokens_merges_invoking_follow() {
        let (atn, o_start, i_block, o_mid) = nullable_call();
        let frames = [
            RuleFrame::root(atn.rule_by_name("outer").unwrap()),
            RuleFrame::invoked(atn.rule_by_name("inner").unwrap(), o_start, o_mid),
        ];

        assert_eq!(expected_tokens(&atn, i_block, &frames), TokenSet::of([A, C]));
    }

    #[test]
    fn test_expected_tokens_eof_at_bottom() {
        let (atn, _, i_block, _) = nullable_call();
        let frames = [RuleFrame::root(atn.rule_by_name("inner").unwrap())];

        assert_eq!(
            expected_tokens(&atn, i_block, &frames),
            TokenSet::of([TokenKind::EOF, A])
        );
    }

    #[test]
    fn test_left_recursion_terminates() {
        // e : e B | A ;
        let mut b = AtnBuilder::new(TokenKind(2));
        let (e, start, stop) = b.add_rule("e");
        let block = b.add_state(e, StateKind::BlockStart);
        let after = b.add_state(e, StateKind::Basic);
        b.epsilon(start, block);
        b.call(block, e, after);
        b.atom(after, B, stop);
        b.atom(block, A, stop);
        let atn = b.build().unwrap();

        assert_eq!(next_tokens(&atn, start), TokenSet::of([A]));
    }

    #[test]
    fn test_error_recovery_set_unions_all_frames() {
        let (atn, o_start, _, o_mid) = nullable_call();
        let frames = [
            RuleFrame::root(atn.rule_by_name("outer").unwrap()),
            RuleFrame::invoked(atn.rule_by_name("inner").unwrap(), o_start, o_mid),
        ];

        assert_eq!(error_recovery_set(&atn, &frames), TokenSet::of([C]));
        assert!(error_recovery_set(&atn, &frames[..1]).is_empty());
    }

    #[test]
    fn test_predicates_are_transparent() {
        let mut b = AtnBuilder::new(TokenKind(2));
        let (r, start, stop) = b.add_rule("r");
        let mid = b.add_state(r, StateKind::Basic);
        b.predicate(start, r, 0, mid);
        b.atom(mid, B, stop);
        let atn = b.build().unwrap();

        assert!(accepts(&atn, start, B));
        assert!(!accepts(&atn, start, A));
    }
}
