//! Toy language shared by the integration tests.
//!
//! ```text
//! file : stmt* EOF ;
//! stmt : ID '=' list ';' ;
//! list : '{' elem (',' elem)* '}' ;
//! elem : INT | {not_reserved}? ID ;
//! ```
//!
//! The parser below is written the way a parser generator would emit it:
//! every match is preceded by `set_state`, every loop decision by `sync`,
//! and every rule body is wrapped in the enter/catch/exit sequence.

#![allow(dead_code)]

use std::sync::Arc;

use logos::Logos;
use mend::{
    Atn, AtnBuilder, BufferedTokenStream, CollectingListener, ErrorStrategy, ParseSession,
    RecognitionError, Recognizer, RecoveryConfig, RuleIndex, Span, StateId, StateKind, Token,
    TokenKind, Vocabulary,
};

pub const LBRACE: TokenKind = TokenKind(1);
pub const RBRACE: TokenKind = TokenKind(2);
pub const COMMA: TokenKind = TokenKind(3);
pub const SEMI: TokenKind = TokenKind(4);
pub const ASSIGN: TokenKind = TokenKind(5);
pub const ID: TokenKind = TokenKind(6);
pub const INT: TokenKind = TokenKind(7);
/// Characters the lexer does not recognize
pub const ERR: TokenKind = TokenKind(8);

/// Identifiers rejected by the `not_reserved` predicate
pub const RESERVED: &[&str] = &["nil"];

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum Lexeme {
    #[regex(r"[ \t\r\n]+", logos::skip)]
    Whitespace,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(",")]
    Comma,

    #[token(";")]
    Semi,

    #[token("=")]
    Assign,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Id,

    #[regex(r"[0-9]+")]
    Int,
}

impl Lexeme {
    fn kind(self) -> TokenKind {
        match self {
            Lexeme::LBrace => LBRACE,
            Lexeme::RBrace => RBRACE,
            Lexeme::Comma => COMMA,
            Lexeme::Semi => SEMI,
            Lexeme::Assign => ASSIGN,
            Lexeme::Id => ID,
            Lexeme::Int => INT,
            Lexeme::Whitespace => ERR,
        }
    }
}

/// Tokenize `source`. Unknown characters become `ERR` tokens.
pub fn lex(source: &str) -> Vec<Token> {
    let mut lexer = Lexeme::lexer(source);
    let mut tokens = Vec::new();
    let mut line = 1u32;
    let mut column = 1u32;
    let mut last_end = 0;

    while let Some(result) = lexer.next() {
        let range = lexer.span();
        advance(&source[last_end..range.start], &mut line, &mut column);

        let kind = result.map_or(ERR, Lexeme::kind);
        let span = Span::new(range.start, range.end, line, column);
        tokens.push(Token::new(kind, lexer.slice(), span));

        advance(&source[range.start..range.end], &mut line, &mut column);
        last_end = range.end;
    }

    tokens
}

fn advance(text: &str, line: &mut u32, column: &mut u32) {
    for c in text.chars() {
        if c == '\n' {
            *line += 1;
            *column = 1;
        } else {
            *column += 1;
        }
    }
}

/// States the parser positions itself in.
#[derive(Debug, Clone, Copy)]
pub struct States {
    pub file: RuleIndex,
    pub stmt: RuleIndex,
    pub list: RuleIndex,
    pub elem: RuleIndex,

    pub file_loop: StateId,

    pub stmt_start: StateId,
    pub stmt_assign: StateId,
    pub stmt_list: StateId,
    pub stmt_semi: StateId,

    pub list_start: StateId,
    pub list_first: StateId,
    pub list_loop: StateId,
    pub list_next: StateId,

    pub elem_start: StateId,
    pub elem_id: StateId,
}

/// Automaton and vocabulary for the toy language, shareable across threads.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub atn: Arc<Atn>,
    pub vocab: Arc<Vocabulary>,
    pub s: States,
}

impl Grammar {
    pub fn new() -> Self {
        let mut b = AtnBuilder::new(ERR);
        let (file, file_start, file_stop) = b.add_rule("file");
        let (stmt, stmt_start, stmt_stop) = b.add_rule("stmt");
        let (list, list_start, list_stop) = b.add_rule("list");
        let (elem, elem_start, elem_stop) = b.add_rule("elem");

        // file : stmt* EOF
        let file_loop = b.add_state(file, StateKind::StarLoopEntry);
        b.epsilon(file_start, file_loop);
        b.call(file_loop, stmt, file_loop);
        b.atom(file_loop, TokenKind::EOF, file_stop);

        // stmt : ID '=' list ';'
        let stmt_assign = b.add_state(stmt, StateKind::Basic);
        let stmt_list = b.add_state(stmt, StateKind::Basic);
        let stmt_semi = b.add_state(stmt, StateKind::Basic);
        b.atom(stmt_start, ID, stmt_assign);
        b.atom(stmt_assign, ASSIGN, stmt_list);
        b.call(stmt_list, list, stmt_semi);
        b.atom(stmt_semi, SEMI, stmt_stop);

        // list : '{' elem (',' elem)* '}'
        let list_first = b.add_state(list, StateKind::Basic);
        let list_loop = b.add_state(list, StateKind::StarLoopEntry);
        let list_next = b.add_state(list, StateKind::Basic);
        b.atom(list_start, LBRACE, list_first);
        b.call(list_first, elem, list_loop);
        b.atom(list_loop, COMMA, list_next);
        b.call(list_next, elem, list_loop);
        b.atom(list_loop, RBRACE, list_stop);

        // elem : INT | {not_reserved}? ID
        let elem_id = b.add_state(elem, StateKind::Basic);
        b.atom(elem_start, INT, elem_stop);
        b.predicate(elem_start, elem, 0, elem_id);
        b.atom(elem_id, ID, elem_stop);

        let atn = b.build().expect("toy grammar is well formed");
        let vocab = Vocabulary::from_entries([
            (LBRACE, Some("'{'"), Some("LBRACE")),
            (RBRACE, Some("'}'"), Some("RBRACE")),
            (COMMA, Some("','"), Some("COMMA")),
            (SEMI, Some("';'"), Some("SEMI")),
            (ASSIGN, Some("'='"), Some("ASSIGN")),
            (ID, None, Some("ID")),
            (INT, None, Some("INT")),
            (ERR, None, Some("ERR")),
        ]);

        Self {
            atn: Arc::new(atn),
            vocab: Arc::new(vocab),
            s: States {
                file,
                stmt,
                list,
                elem,
                file_loop,
                stmt_start,
                stmt_assign,
                stmt_list,
                stmt_semi,
                list_start,
                list_first,
                list_loop,
                list_next,
                elem_start,
                elem_id,
            },
        }
    }

    /// A bare session over `source`, for driving the strategy by hand.
    pub fn session(&self, source: &str) -> ParseSession {
        self.session_with(source, RecoveryConfig::default())
    }

    pub fn session_with(&self, source: &str, config: RecoveryConfig) -> ParseSession {
        let input = BufferedTokenStream::new(lex(source));
        ParseSession::with_config(self.atn.clone(), self.vocab.clone(), input, config)
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stmt {
    pub name: String,
    pub elems: Vec<String>,
}

/// Recursive-descent parser for the toy language.
pub struct ListParser<'a> {
    pub session: ParseSession,
    pub listener: CollectingListener,
    strategy: &'a dyn ErrorStrategy,
    s: States,
}

impl<'a> ListParser<'a> {
    pub fn new(grammar: &Grammar, source: &str, strategy: &'a dyn ErrorStrategy) -> Self {
        Self::with_config(grammar, source, strategy, RecoveryConfig::default())
    }

    pub fn with_config(
        grammar: &Grammar,
        source: &str,
        strategy: &'a dyn ErrorStrategy,
        config: RecoveryConfig,
    ) -> Self {
        let mut session = grammar.session_with(source, config);
        let listener = CollectingListener::new();
        session.add_listener(listener.clone());
        Self {
            session,
            listener,
            strategy,
            s: grammar.s,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.listener.messages()
    }

    pub fn file(&mut self) -> Result<Vec<Stmt>, RecognitionError> {
        self.strategy.reset(&mut self.session);
        let rule = self.s.file;
        self.rule(rule, |p| {
            let mut stmts = Vec::new();
            loop {
                p.session.set_state(p.s.file_loop);
                p.strategy.sync(&mut p.session);
                if p.session.la(1) != ID {
                    break;
                }
                stmts.push(p.stmt()?);
            }
            p.session.match_token(TokenKind::EOF, p.strategy)?;
            Ok(stmts)
        })
    }

    fn stmt(&mut self) -> Result<Stmt, RecognitionError> {
        let rule = self.s.stmt;
        self.rule(rule, |p| {
            p.session.set_state(p.s.stmt_start);
            let name = p.session.match_token(ID, p.strategy)?.into_token().text;
            p.session.set_state(p.s.stmt_assign);
            p.session.match_token(ASSIGN, p.strategy)?;
            p.session.set_state(p.s.stmt_list);
            let elems = p.list()?;
            p.session.set_state(p.s.stmt_semi);
            p.session.match_token(SEMI, p.strategy)?;
            Ok(Stmt { name, elems })
        })
    }

    fn list(&mut self) -> Result<Vec<String>, RecognitionError> {
        let rule = self.s.list;
        self.rule(rule, |p| {
            p.session.set_state(p.s.list_start);
            p.session.match_token(LBRACE, p.strategy)?;
            p.session.set_state(p.s.list_first);
            let mut elems = vec![p.elem()?];
            loop {
                p.session.set_state(p.s.list_loop);
                p.strategy.sync(&mut p.session);
                if p.session.la(1) != COMMA {
                    break;
                }
                p.session.match_token(COMMA, p.strategy)?;
                p.session.set_state(p.s.list_next);
                elems.push(p.elem()?);
            }
            p.session.match_token(RBRACE, p.strategy)?;
            Ok(elems)
        })
    }

    fn elem(&mut self) -> Result<String, RecognitionError> {
        let rule = self.s.elem;
        self.rule(rule, |p| {
            p.session.set_state(p.s.elem_start);
            let la = p.session.la(1);
            if la == INT {
                Ok(p.session.match_token(INT, p.strategy)?.into_token().text)
            } else if la == ID {
                let text = p.session.current_token().text;
                let holds = !RESERVED.contains(&text.as_str());
                p.session
                    .check_predicate(p.strategy, holds, "not_reserved", None)?;
                p.session.set_state(p.s.elem_id);
                Ok(p.session.match_token(ID, p.strategy)?.into_token().text)
            } else {
                let start = p.session.current_token();
                Err(p.session.no_viable_alternative(start))
            }
        })
    }

    /// enter / body / catch / exit, as every generated rule does it.
    fn rule<T: Default>(
        &mut self,
        rule: RuleIndex,
        body: impl FnOnce(&mut Self) -> Result<T, RecognitionError>,
    ) -> Result<T, RecognitionError> {
        self.session.enter_rule(rule);
        let result = match body(&mut *self) {
            Ok(value) => Ok(value),
            Err(e) => self
                .session
                .handle_rule_error(self.strategy, e)
                .map(|()| T::default()),
        };
        self.session.exit_rule();
        result
    }
}
