//! Token input streams.
//!
//! The recognizer reads its input through the [`TokenStream`] trait. The
//! only implementation shipped here, [`BufferedTokenStream`], holds the
//! whole pre-tokenized input in memory and always ends in an EOF token, so
//! lookahead past the end is well defined.

use crate::token::{Span, Token, TokenKind};

/// Handle returned by [`TokenStream::mark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    index: usize,
}

impl Marker {
    /// Stream index at the time the marker was taken.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Cursor over a sequence of tokens.
///
/// Offsets follow the usual lookahead convention: `1` is the current
/// token, `2` the one after it, `-1` the most recently consumed token.
/// Offset `0` is undefined and yields `INVALID` / `None`.
pub trait TokenStream {
    /// Kind of the token at `offset`. Past the end this is always EOF.
    fn la(&self, offset: isize) -> TokenKind;

    /// Token at `offset`, if any.
    fn lt(&self, offset: isize) -> Option<&Token>;

    /// Token at an absolute index.
    fn get(&self, index: usize) -> Option<&Token>;

    /// Advance past the current token. At EOF this does nothing.
    fn consume(&mut self);

    /// Absolute index of the current token.
    fn index(&self) -> usize;

    /// Remember the current position.
    fn mark(&mut self) -> Marker;

    /// Drop a marker obtained from [`mark`](TokenStream::mark).
    fn release(&mut self, marker: Marker);

    /// Move the cursor to an absolute index (clamped to the EOF token).
    fn seek(&mut self, index: usize);

    /// Number of tokens including the EOF sentinel.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory token stream.
#[derive(Debug, Clone)]
pub struct BufferedTokenStream {
    /// Pre-tokenized input, always terminated by EOF
    tokens: Vec<Token>,

    /// Current position in token stream
    pos: usize,

    /// Outstanding markers
    markers: usize,
}

impl BufferedTokenStream {
    /// Create a stream from tokens produced by a lexer.
    ///
    /// Indices are assigned here; an EOF token is appended if the input
    /// does not already end with one.
    pub fn new(tokens: impl IntoIterator<Item = Token>) -> Self {
        let mut tokens: Vec<Token> = tokens.into_iter().collect();

        if !tokens.last().is_some_and(Token::is_eof) {
            let eof_span = match tokens.last() {
                Some(last) => Span::new(
                    last.span.end,
                    last.span.end,
                    last.span.line,
                    last.span.column + last.span.len() as u32,
                ),
                None => Span::new(0, 0, 1, 1),
            };
            tokens.push(Token::eof(eof_span));
        }

        for (i, tok) in tokens.iter_mut().enumerate() {
            tok.index = Some(i);
        }

        Self {
            tokens,
            pos: 0,
            markers: 0,
        }
    }

    /// Create a stream from bare kinds. Handy for tests and benches.
    pub fn from_kinds(kinds: impl IntoIterator<Item = TokenKind>) -> Self {
        let tokens = kinds.into_iter().enumerate().map(|(i, kind)| {
            Token::new(kind, format!("t{}", i), Span::new(i, i + 1, 1, i as u32 + 1))
        });
        Self::new(tokens)
    }

    /// All tokens, EOF included.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Number of markers that have not been released.
    pub fn outstanding_markers(&self) -> usize {
        self.markers
    }

    fn resolve(&self, offset: isize) -> Option<usize> {
        match offset {
            0 => None,
            n if n > 0 => Some((self.pos + (n as usize - 1)).min(self.tokens.len() - 1)),
            n => self.pos.checked_sub(n.unsigned_abs()),
        }
    }
}

impl TokenStream for BufferedTokenStream {
    fn la(&self, offset: isize) -> TokenKind {
        self.lt(offset).map_or(TokenKind::INVALID, |t| t.kind)
    }

    fn lt(&self, offset: isize) -> Option<&Token> {
        self.resolve(offset).map(|i| &self.tokens[i])
    }

    fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    fn consume(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    fn index(&self) -> usize {
        self.pos
    }

    fn mark(&mut self) -> Marker {
        self.markers += 1;
        Marker { index: self.pos }
    }

    fn release(&mut self, _marker: Marker) {
        self.markers = self.markers.saturating_sub(1);
    }

    fn seek(&mut self, index: usize) {
        self.pos = index.min(self.tokens.len() - 1);
    }

    fn len(&self) -> usize {
        self.tokens.len()
    }
}
