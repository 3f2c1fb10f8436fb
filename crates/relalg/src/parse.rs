//! Recursive-descent parser for relational-algebra queries
//!
//! Grammar:
//!
//! ```text
//! expression := primary ( join | union )?
//! join       := '⋈' '_' '{' <condition tokens> '}' primary   (repeats, left-assoc)
//! union      := '∪' expression                                (right side is the rest)
//! primary    := projection | selection | '(' expression ')' | identifier
//! projection := 'π' '[' ( identifier ( ',' identifier )* )? ']' '(' expression ')'
//! selection  := 'σ' '[' <condition tokens> ']' '(' expression ')'
//! ```
//!
//! Conditions are not parsed here: the texts of the tokens between the
//! delimiters are concatenated and stored on the node as-is.

use std::fmt;

use thiserror::Error;

use crate::ast::{Expr, Span};
use crate::lex::{Token, TokenKind, tokenize};

/// What the parser was looking for when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    Token(TokenKind),
    /// Start of a relation expression
    Expression,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Token(kind) => write!(f, "{kind}"),
            Expected::Expression => write!(f, "a relation expression"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("expected {expected}, found {found} at position {position}")]
    UnexpectedToken {
        expected: Expected,
        found: TokenKind,
        position: usize,
    },

    #[error("expected {expected}, found end of input")]
    UnexpectedEnd { expected: Expected },

    #[error("unexpected {found} at position {position} after a complete expression")]
    TrailingInput { found: TokenKind, position: usize },
}

impl SyntaxError {
    /// Character offset of the offending token, if there was one
    pub fn position(&self) -> Option<usize> {
        match self {
            SyntaxError::UnexpectedToken { position, .. }
            | SyntaxError::TrailingInput { position, .. } => Some(*position),
            SyntaxError::UnexpectedEnd { .. } => None,
        }
    }
}

type Result<T> = std::result::Result<T, SyntaxError>;

/// Tokenize and parse a query string
pub fn parse_query(query: &str) -> Result<Expr> {
    parse(&tokenize(query))
}

/// Parse a token sequence; every token must be consumed
pub fn parse(tokens: &[Token<'_>]) -> Result<Expr> {
    let mut parser = Parser { tokens, current: 0 };
    let expr = parser.expression()?;
    if let Some(token) = parser.peek() {
        return Err(SyntaxError::TrailingInput {
            found: token.kind,
            position: token.position,
        });
    }
    log::debug!(
        "parsed {} tokens into a {} tree of {} nodes",
        tokens.len(),
        expr.kind(),
        expr.node_count()
    );
    Ok(expr)
}

struct Parser<'t, 'a> {
    tokens: &'t [Token<'a>],
    current: usize,
}

impl<'a> Parser<'_, 'a> {
    // ============ Expressions ============

    fn expression(&mut self) -> Result<Expr> {
        let mut left = self.primary()?;

        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Join => {
                    self.advance();
                    self.expect(TokenKind::Underscore)?;
                    self.expect(TokenKind::LeftBrace)?;
                    let condition = self.raw_text_until(TokenKind::RightBrace);
                    self.expect(TokenKind::RightBrace)?;
                    let right = self.primary()?;
                    let span = Span::new(left.span().start, right.span().end);
                    left = Expr::Join {
                        condition,
                        left: Box::new(left),
                        right: Box::new(right),
                        span,
                    };
                }
                TokenKind::Union => {
                    self.advance();
                    let right = self.expression()?;
                    let span = Span::new(left.span().start, right.span().end);
                    return Ok(Expr::Union {
                        left: Box::new(left),
                        right: Box::new(right),
                        span,
                    });
                }
                _ => break,
            }
        }

        Ok(left)
    }

    fn primary(&mut self) -> Result<Expr> {
        let Some(token) = self.peek() else {
            return Err(SyntaxError::UnexpectedEnd {
                expected: Expected::Expression,
            });
        };

        match token.kind {
            TokenKind::Projection => self.projection(),
            TokenKind::Selection => self.selection(),
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.expect(TokenKind::RightParen)?;
                Ok(expr)
            }
            TokenKind::Identifier => {
                self.advance();
                Ok(Expr::Relation {
                    name: token.text.to_string(),
                    span: token.span(),
                })
            }
            found => Err(SyntaxError::UnexpectedToken {
                expected: Expected::Expression,
                found,
                position: token.position,
            }),
        }
    }

    fn projection(&mut self) -> Result<Expr> {
        let start = self.expect(TokenKind::Projection)?;
        self.expect(TokenKind::LeftBracket)?;

        let mut attributes = Vec::new();
        if !self.at(TokenKind::RightBracket) {
            loop {
                attributes.push(self.expect(TokenKind::Identifier)?.text.to_string());
                if !self.at(TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
        }
        self.expect(TokenKind::RightBracket)?;

        let (relation, end) = self.parenthesized()?;
        Ok(Expr::Projection {
            attributes,
            relation: Box::new(relation),
            span: Span::new(start.position, end),
        })
    }

    fn selection(&mut self) -> Result<Expr> {
        let start = self.expect(TokenKind::Selection)?;
        self.expect(TokenKind::LeftBracket)?;
        let condition = self.raw_text_until(TokenKind::RightBracket);
        self.expect(TokenKind::RightBracket)?;

        let (relation, end) = self.parenthesized()?;
        Ok(Expr::Selection {
            condition,
            relation: Box::new(relation),
            span: Span::new(start.position, end),
        })
    }

    /// `'(' expression ')'`, returning the offset just past the `)`
    fn parenthesized(&mut self) -> Result<(Expr, usize)> {
        self.expect(TokenKind::LeftParen)?;
        let expr = self.expression()?;
        let close = self.expect(TokenKind::RightParen)?;
        Ok((expr, close.end()))
    }

    /// Concatenate token texts up to (not including) `stop` or end of input
    fn raw_text_until(&mut self, stop: TokenKind) -> String {
        let mut text = String::new();
        while let Some(token) = self.peek() {
            if token.kind == stop {
                break;
            }
            text.push_str(token.text);
            self.advance();
        }
        text
    }

    // ============ Token helpers ============

    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.current).copied()
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|t| t.kind == kind)
    }

    fn advance(&mut self) {
        self.current += 1;
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'a>> {
        match self.peek() {
            Some(token) if token.kind == kind => {
                self.advance();
                Ok(token)
            }
            Some(token) => Err(SyntaxError::UnexpectedToken {
                expected: Expected::Token(kind),
                found: token.kind,
                position: token.position,
            }),
            None => Err(SyntaxError::UnexpectedEnd {
                expected: Expected::Token(kind),
            }),
        }
    }
}
