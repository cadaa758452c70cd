//! Mend: error recovery for table-driven parsers
//!
//! Decides what a parser does when its input does not match the grammar:
//! which token kinds were expected, whether a single extraneous token can
//! be dropped or a single missing token conjured, how much input to skip
//! to get back in sync, and which errors reach the user.
//!
//! # Layout
//!
//! - [`atn`] / [`ll1`]: the transition network and the expected-set oracle
//! - [`recognizer`]: the handle a strategy acts on, plus recovery-mode state
//! - [`strategy`]: [`DefaultErrorStrategy`] and [`BailErrorStrategy`]
//! - [`session`]: a concrete recognizer for parsers to drive
//! - [`diagnostic`] / [`listener`]: formatted errors and where they go
//!
//! # Example
//!
//! ```ignore
//! let strategy = DefaultErrorStrategy::new();
//! let mut session = ParseSession::new(atn, vocab, BufferedTokenStream::new(tokens));
//! session.add_listener(ConsoleListener::new("input.txt", source));
//!
//! session.enter_rule(FILE);
//! if let Err(e) = session.match_token(LBRACE, &strategy) {
//!     session.handle_rule_error(&strategy, e)?;
//! }
//! ```

pub mod atn;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod listener;
pub mod ll1;
pub mod recognizer;
pub mod session;
pub mod strategy;
pub mod stream;
pub mod token;
pub mod token_set;

pub use atn::{Atn, AtnBuilder, AtnError, RuleIndex, StateId, StateKind, Transition};
pub use config::{ConfigError, RecoveryConfig};
pub use diagnostic::{ErrorCode, JsonDiagnostic, SyntaxDiagnostic};
pub use error::{ErrorKind, ErrorRecord, RecognitionError};
pub use listener::{CollectingListener, ConsoleListener, ErrorListener};
pub use recognizer::{Recognizer, RecoveryState, RuleFrame};
pub use session::ParseSession;
pub use strategy::{BailErrorStrategy, DefaultErrorStrategy, ErrorStrategy, RepairedSymbol};
pub use stream::{BufferedTokenStream, Marker, TokenStream};
pub use token::{Span, Token, TokenKind, Vocabulary};
pub use token_set::TokenSet;
