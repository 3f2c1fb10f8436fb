//! AST for relational-algebra expressions
//!
//! Every node carries the half-open character span of the source text it
//! was parsed from. Spans are for presentation only; evaluation ignores them.

use std::fmt;
use std::ops::Range;

use serde::Serialize;

/// Half-open character range `[start, end)` into the query string.
/// Offsets count Unicode scalar values, so `π` is one position wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The byte range of `source` this span covers, or `None` if it does not fit
    pub fn byte_range(&self, source: &str) -> Option<Range<usize>> {
        if self.start > self.end {
            return None;
        }
        let mut boundaries = source
            .char_indices()
            .map(|(byte, _)| byte)
            .chain(std::iter::once(source.len()));
        let start = boundaries.nth(self.start)?;
        let end = if self.end == self.start {
            start
        } else {
            boundaries.nth(self.end - self.start - 1)?
        };
        Some(start..end)
    }

    /// The covered text, or `None` if the span does not fit `source`
    pub fn slice<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.byte_range(source)?)
    }
}

/// The five relational operators (a relation reference counts as one)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperatorKind {
    Relation,
    Projection,
    Selection,
    Union,
    Join,
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperatorKind::Relation => "RELATION",
            OperatorKind::Projection => "PROJECTION",
            OperatorKind::Selection => "SELECTION",
            OperatorKind::Union => "UNION",
            OperatorKind::Join => "JOIN",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Named base relation: `Students`
    Relation { name: String, span: Span },
    /// `π[a, b](expr)`
    Projection {
        attributes: Vec<String>,
        relation: Box<Expr>,
        span: Span,
    },
    /// `σ[condition](expr)`; the condition is kept as raw text
    Selection {
        condition: String,
        relation: Box<Expr>,
        span: Span,
    },
    /// `left ∪ right`
    Union {
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    /// `left ⋈_{condition} right`; the condition is kept as raw text
    Join {
        condition: String,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Relation { span, .. }
            | Expr::Projection { span, .. }
            | Expr::Selection { span, .. }
            | Expr::Union { span, .. }
            | Expr::Join { span, .. } => *span,
        }
    }

    pub fn kind(&self) -> OperatorKind {
        match self {
            Expr::Relation { .. } => OperatorKind::Relation,
            Expr::Projection { .. } => OperatorKind::Projection,
            Expr::Selection { .. } => OperatorKind::Selection,
            Expr::Union { .. } => OperatorKind::Union,
            Expr::Join { .. } => OperatorKind::Join,
        }
    }

    /// Number of nodes in the tree, which is also the length of its trace
    pub fn node_count(&self) -> usize {
        match self {
            Expr::Relation { .. } => 1,
            Expr::Projection { relation, .. } | Expr::Selection { relation, .. } => {
                1 + relation.node_count()
            }
            Expr::Union { left, right, .. } | Expr::Join { left, right, .. } => {
                1 + left.node_count() + right.node_count()
            }
        }
    }}
