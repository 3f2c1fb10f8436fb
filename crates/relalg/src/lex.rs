//! Tokenizer for relational-algebra queries
//!
//! Tokenizing never fails: whitespace is skipped and any character the
//! grammar does not know is dropped. Positions are character offsets into
//! the query string, so a query starting `π[` has its `[` at position 1.

use std::fmt;

use winnow::combinator::alt;
use winnow::prelude::*;
use winnow::stream::LocatingSlice;
use winnow::token::{any, take_while};

use crate::ast::Span;

type Input<'a> = LocatingSlice<&'a str>;
type PResult<T> = winnow::ModalResult<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Projection,
    Selection,
    Union,
    Join,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Underscore,
    Comma,
    /// Relation names, attribute names and condition fragments
    Identifier,
}

impl TokenKind {
    fn from_char(c: char) -> Option<Self> {
        let kind = match c {
            'π' => TokenKind::Projection,
            'σ' => TokenKind::Selection,
            '∪' => TokenKind::Union,
            '⋈' => TokenKind::Join,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '_' => TokenKind::Underscore,
            ',' => TokenKind::Comma,
            _ => return None,
        };
        Some(kind)
    }

    /// Spelling of a single-character token
    pub fn symbol(&self) -> Option<&'static str> {
        let s = match self {
            TokenKind::Projection => "π",
            TokenKind::Selection => "σ",
            TokenKind::Union => "∪",
            TokenKind::Join => "⋈",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::LeftBracket => "[",
            TokenKind::RightBracket => "]",
            TokenKind::LeftBrace => "{",
            TokenKind::RightBrace => "}",
            TokenKind::Underscore => "_",
            TokenKind::Comma => ",",
            TokenKind::Identifier => return None,
        };
        Some(s)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.symbol() {
            Some(s) => write!(f, "'{s}'"),
            None => write!(f, "identifier"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Source text of the token
    pub text: &'a str,
    /// Character offset of the first character
    pub position: usize,
}

impl Token<'_> {
    /// Character offset just past the token
    pub fn end(&self) -> usize {
        self.position + self.text.chars().count()
    }

    pub fn span(&self) -> Span {
        Span::new(self.position, self.end())
    }
}

/// Split a query into tokens, left to right
pub fn tokenize(query: &str) -> Vec<Token<'_>> {
    let mut input = LocatingSlice::new(query);
    let mut tokens = Vec::new();
    // `token` only fails once the input is exhausted
    while let Ok(next) = token.parse_next(&mut input) {
        tokens.extend(next);
    }
    to_char_positions(query, &mut tokens);
    log::trace!("tokenized {} bytes into {} tokens", query.len(), tokens.len());
    tokens
}

/// Rewrite the byte offsets winnow reports as character offsets
fn to_char_positions(query: &str, tokens: &mut [Token<'_>]) {
    let (mut byte, mut chars) = (0, 0);
    for token in tokens {
        chars += query
            .get(byte..token.position)
            .map_or(0, |gap| gap.chars().count());
        byte = token.position;
        token.position = chars;
    }
}

fn token<'a>(input: &mut Input<'a>) -> PResult<Option<Token<'a>>> {
    alt((
        take_while(1.., char::is_whitespace).value(None),
        symbol.map(Some),
        identifier.map(Some),
        any.value(None),
    ))
    .parse_next(input)
}

fn symbol<'a>(input: &mut Input<'a>) -> PResult<Token<'a>> {
    any.verify_map(TokenKind::from_char)
        .with_taken()
        .with_span()
        .map(|((kind, text), span)| Token {
            kind,
            text,
            position: span.start,
        })
        .parse_next(input)
}

fn identifier<'a>(input: &mut Input<'a>) -> PResult<Token<'a>> {
    take_while(1.., is_identifier_char)
        .with_span()
        .map(|(text, span)| Token {
            kind: TokenKind::Identifier,
            text,
            position: span.start,
        })
        .parse_next(input)
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '<' | '>' | '=' | '!' | '.')
}
