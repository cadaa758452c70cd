//! Ordered sets of token kinds.
//!
//! Expected sets and resynchronization sets are small and are rebuilt on
//! every call, so a sorted set is used: iteration order is deterministic
//! and the lowest kind is always the first element, which is what the
//! insertion heuristic relies on.

use std::collections::BTreeSet;
use std::fmt;

use crate::token::{TokenKind, Vocabulary};

/// A set of token kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSet {
    kinds: BTreeSet<TokenKind>,
}

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from a list of kinds.
    pub fn of(kinds: impl IntoIterator<Item = TokenKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
        }
    }

    /// Build a set covering `lo..=hi`.
    pub fn range(lo: TokenKind, hi: TokenKind) -> Self {
        Self {
            kinds: (lo.0..=hi.0).map(TokenKind).collect(),
        }
    }

    pub fn insert(&mut self, kind: TokenKind) -> bool {
        self.kinds.insert(kind)
    }

    pub fn remove(&mut self, kind: TokenKind) -> bool {
        self.kinds.remove(&kind)
    }

    #[inline]
    pub fn contains(&self, kind: TokenKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Add every kind of `other` to this set.
    pub fn union_with(&mut self, other: &TokenSet) {
        self.kinds.extend(other.kinds.iter().copied());
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Lowest kind in the set, reserved kinds included.
    pub fn min_kind(&self) -> Option<TokenKind> {
        self.kinds.iter().next().copied()
    }

    /// Lowest grammar-assigned kind, skipping EOF and EPSILON.
    pub fn min_user_kind(&self) -> Option<TokenKind> {
        self.kinds.iter().copied().find(|k| k.is_user())
    }

    /// Number of grammar-assigned kinds in the set.
    pub fn user_len(&self) -> usize {
        self.kinds.iter().filter(|k| k.is_user()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = TokenKind> + '_ {
        self.kinds.iter().copied()
    }

    /// Complement of this set within `1..=max_kind`.
    pub fn complement(&self, max_kind: TokenKind) -> TokenSet {
        TokenSet {
            kinds: (TokenKind::MIN_USER.0..=max_kind.0)
                .map(TokenKind)
                .filter(|k| !self.kinds.contains(k))
                .collect(),
        }
    }

    /// Render for diagnostics: `A` for a single kind, `{A, B}` otherwise.
    pub fn to_display(&self, vocab: &Vocabulary) -> String {
        let names: Vec<String> = self
            .kinds
            .iter()
            .filter(|k| **k != TokenKind::EPSILON)
            .map(|k| vocab.display_name(*k))
            .collect();
        match names.as_slice() {
            [] => "{}".to_string(),
            [single] => single.clone(),
            _ => format!("{{{}}}", names.join(", ")),
        }
    }
}

impl fmt::Display for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.kinds.iter().map(|k| k.to_string()).collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

impl FromIterator<TokenKind> for TokenSet {
    fn from_iter<I: IntoIterator<Item = TokenKind>>(iter: I) -> Self {
        Self::of(iter)
    }
}

impl Extend<TokenKind> for TokenSet {
    fn extend<I: IntoIterator<Item = TokenKind>>(&mut self, iter: I) {
        self.kinds.extend(iter);
    }
}
