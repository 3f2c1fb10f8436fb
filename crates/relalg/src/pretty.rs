//! Pretty printing for relational-algebra ASTs
//!
//! `Display` writes canonical single-line query text that parses back to the
//! same tree shape; [`outline`] writes an indented tree, one node per line.

use std::fmt::{self, Display, Write};

use crate::ast::Expr;

// ============ Display (single-line) ============

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Relation { name, .. } => write!(f, "{name}"),
            Expr::Projection {
                attributes,
                relation,
                ..
            } => write!(f, "π[{}]({relation})", attributes.join(", ")),
            Expr::Selection {
                condition,
                relation,
                ..
            } => write!(f, "σ[{condition}]({relation})"),
            Expr::Union { left, right, .. } => {
                // the right side of ∪ extends to the end, so only the left needs care
                write_operand(f, left, matches!(**left, Expr::Union { .. }))?;
                write!(f, " ∪ {right}")
            }
            Expr::Join {
                condition,
                left,
                right,
                ..
            } => {
                write_operand(f, left, matches!(**left, Expr::Union { .. }))?;
                write!(f, " ⋈_{{{condition}}} ")?;
                write_operand(
                    f,
                    right,
                    matches!(**right, Expr::Union { .. } | Expr::Join { .. }),
                )
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, parens: bool) -> fmt::Result {
    if parens {
        write!(f, "({expr})")
    } else {
        write!(f, "{expr}")
    }
}

// ============ Outline ============

/// Indented tree rendering, e.g.
///
/// ```text
/// π [name]
///   σ age>25
///     Students
/// ```
pub fn outline(expr: &Expr) -> String {
    let mut out = String::new();
    write_outline(&mut out, expr, 0);
    out
}

fn write_outline(out: &mut String, expr: &Expr, depth: usize) {
    let indent = "  ".repeat(depth);
    // writing to a String cannot fail
    let _ = match expr {
        Expr::Relation { name, .. } => writeln!(out, "{indent}{name}"),
        Expr::Projection { attributes, .. } => {
            writeln!(out, "{indent}π [{}]", attributes.join(", "))
        }
        Expr::Selection { condition, .. } => writeln!(out, "{indent}σ {condition}"),
        Expr::Union { .. } => writeln!(out, "{indent}∪"),
        Expr::Join { condition, .. } => writeln!(out, "{indent}⋈ {condition}"),
    };
    match expr {
        Expr::Relation { .. } => {}
        Expr::Projection { relation, .. } | Expr::Selection { relation, .. } => {
            write_outline(out, relation, depth + 1)
        }
        Expr::Union { left, right, .. } | Expr::Join { left, right, .. } => {
            write_outline(out, left, depth + 1);
            write_outline(out, right, depth + 1);
        }
    }
}
