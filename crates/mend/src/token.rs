//! Token definitions shared by the input stream, the automaton and the
//! recovery strategies.
//!
//! Tokens are produced by an external lexer and are immutable once they
//! enter a [`TokenStream`](crate::stream::TokenStream). The only tokens this
//! crate creates itself are the EOF sentinel and conjured placeholders
//! synthesized by single-token insertion.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of a token.
///
/// User-defined kinds start at 1. A handful of negative kinds are reserved:
/// [`TokenKind::EOF`] marks the end of input and [`TokenKind::EPSILON`] only
/// ever appears inside lookahead sets, meaning "the end of the current rule
/// is reachable without consuming anything".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenKind(pub i32);

impl TokenKind {
    /// End of input
    pub const EOF: TokenKind = TokenKind(-1);

    /// Rule end reachable (analysis only)
    pub const EPSILON: TokenKind = TokenKind(-2);

    /// Invalid / unassigned kind
    pub const INVALID: TokenKind = TokenKind(0);

    /// Smallest kind a grammar may assign to its own tokens.
    pub const MIN_USER: TokenKind = TokenKind(1);

    /// Returns true for kinds assigned by a grammar (not EOF, EPSILON or INVALID).
    #[inline]
    pub fn is_user(self) -> bool {
        self.0 >= Self::MIN_USER.0
    }

    #[inline]
    pub fn is_eof(self) -> bool {
        self == Self::EOF
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TokenKind::EOF => write!(f, "<EOF>"),
            TokenKind::EPSILON => write!(f, "<EPSILON>"),
            TokenKind(n) => write!(f, "{}", n),
        }
    }
}

/// Source location information for a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Zero-width span at the start of this one.
    pub fn collapsed(&self) -> Span {
        Span::new(self.start, self.start, self.line, self.column)
    }

    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line: self.line.min(other.line),
            column: self.column.min(other.column),
        }
    }
}

/// A token as seen by the recognizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Token kind
    pub kind: TokenKind,

    /// Source text (for conjured tokens, a `<missing ...>` placeholder)
    pub text: String,

    /// Source location
    pub span: Span,

    /// Absolute index in the token stream; `None` for conjured tokens
    pub index: Option<usize>,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
            index: None,
        }
    }

    /// Create the end-of-input sentinel.
    pub fn eof(span: Span) -> Self {
        Self::new(TokenKind::EOF, "<EOF>", span)
    }

    /// Synthesize a placeholder for a token that is missing from the input.
    ///
    /// The placeholder sits at the start of `at` and has no stream index.
    pub fn missing(kind: TokenKind, display_name: &str, at: Span) -> Self {
        Self::new(kind, format!("<missing {}>", display_name), at.collapsed())
    }

    /// Attach the stream index (done by the stream when tokens are loaded).
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.kind.is_eof()
    }

    /// Returns true if this token was synthesized by error recovery.
    #[inline]
    pub fn is_conjured(&self) -> bool {
        self.index.is_none() && !self.is_eof()
    }

    /// Text for use in diagnostics: control characters escaped, EOF spelled out.
    pub fn error_display(&self) -> String {
        if self.is_eof() {
            return "<EOF>".to_string();
        }
        escape_ws(&self.text)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[@{} '{}' <{}> {}:{}]",
            self.index.map_or(-1, |i| i as i64),
            self.error_display(),
            self.kind,
            self.span.line,
            self.span.column
        )
    }
}

pub(crate) fn escape_ws(text: &str) -> String {
    text.replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Display names for token kinds.
///
/// Literal names are the quoted source spelling (`'{'`), symbolic names are
/// the grammar's identifier for the token (`LBRACE`).
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    literal: Vec<Option<String>>,
    symbolic: Vec<Option<String>>,
}

impl Vocabulary {
    /// Build a vocabulary from names indexed by token kind (index 0 is INVALID).
    pub fn new(literal: Vec<Option<String>>, symbolic: Vec<Option<String>>) -> Self {
        Self { literal, symbolic }
    }

    /// Build a vocabulary from `(kind, literal, symbolic)` triples.
    pub fn from_entries<'a>(
        entries: impl IntoIterator<Item = (TokenKind, Option<&'a str>, Option<&'a str>)>,
    ) -> Self {
        let mut vocab = Self::default();
        for (kind, literal, symbolic) in entries {
            if kind.0 < 0 {
                continue;
            }
            let slot = kind.0 as usize;
            if vocab.literal.len() <= slot {
                vocab.literal.resize(slot + 1, None);
                vocab.symbolic.resize(slot + 1, None);
            }
            vocab.literal[slot] = literal.map(str::to_string);
            vocab.symbolic[slot] = symbolic.map(str::to_string);
        }
        vocab
    }

    /// Highest kind with a name.
    pub fn max_kind(&self) -> TokenKind {
        TokenKind(self.literal.len().max(self.symbolic.len()) as i32 - 1)
    }

    pub fn literal_name(&self, kind: TokenKind) -> Option<&str> {
        self.lookup(&self.literal, kind)
    }

    pub fn symbolic_name(&self, kind: TokenKind) -> Option<&str> {
        if kind.is_eof() {
            return Some("EOF");
        }
        self.lookup(&self.symbolic, kind)
    }

    /// Name used in diagnostics: literal, then symbolic, then the raw number.
    pub fn display_name(&self, kind: TokenKind) -> String {
        if kind.is_eof() {
            return "<EOF>".to_string();
        }
        self.literal_name(kind)
            .or_else(|| self.symbolic_name(kind))
            .map(str::to_string)
            .unwrap_or_else(|| kind.0.to_string())
    }

    fn lookup<'a>(&'a self, names: &'a [Option<String>], kind: TokenKind) -> Option<&'a str> {
        if kind.0 < 0 {
            return None;
        }
        names.get(kind.0 as usize).and_then(|n| n.as_deref())
    }
}
