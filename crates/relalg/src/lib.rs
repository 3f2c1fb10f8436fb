//! relalg - a stepwise relational-algebra interpreter
//!
//! Queries combine projection `π[a, b](R)`, selection `σ[cond](R)`, union
//! `L ∪ R` and equi-join `L ⋈_{x=y} R` over named in-memory relations.
//! Evaluation records every intermediate relation so a query can be walked
//! through one operator at a time.
//!
//! Pipeline: tokenize() -> parse() -> Expr -> execute() -> Vec<Step>
//!
//! ## Quick Start
//!
//! ```
//! use std::collections::HashMap;
//! use relalg::{Relation, row, run};
//!
//! let students = Relation::from_rows(vec![
//!     row! { "id" => 1, "name" => "Alice", "age" => 22 },
//!     row! { "id" => 2, "name" => "Bob", "age" => 28 },
//! ]);
//! let db = HashMap::from([("Students".to_string(), students)]);
//!
//! let steps = run("π[name](σ[age>25](Students))", &db)?;
//! assert_eq!(steps.len(), 3);
//! assert_eq!(steps[2].data.rows(), &[row! { "name" => "Bob" }]);
//! # Ok::<(), relalg::RelalgError>(())
//! ```

mod ast;
mod condition;
mod eval;
mod lex;
mod parse;
mod pretty;
mod value;

use thiserror::Error;

// ============ Primary Public API ============

pub use ast::{Expr, OperatorKind, Span};
pub use eval::{EvalError, Step};
pub use parse::{Expected, SyntaxError};
pub use value::{Relation, RelationLookup, Row, Value};

/// Parse a query without evaluating it
pub fn compile(query: &str) -> Result<Expr, RelalgError> {
    Ok(parse::parse_query(query)?)
}

/// Parse and evaluate a query, returning every intermediate step.
///
/// The final step holds the query result. On error no steps are returned.
pub fn run(query: &str, relations: &impl RelationLookup) -> Result<Vec<Step>, RelalgError> {
    let expr = compile(query)?;
    run_compiled(&expr, relations)
}

/// Evaluate an already parsed query
pub fn run_compiled(expr: &Expr, relations: &impl RelationLookup) -> Result<Vec<Step>, RelalgError> {
    Ok(eval::execute(expr, relations)?)
}

// ============ Errors ============

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelalgError {
    #[error("Syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),
}

// ============ Advanced: pipeline stages ============

/// Individual pipeline stages, for tools that need tokens or a custom
/// evaluation loop
pub mod advanced {
    pub use crate::condition::{CompareOp, Comparison, Condition, evaluate};
    pub use crate::eval::{execute, join, project, select, union};
    pub use crate::lex::{Token, TokenKind, tokenize};
    pub use crate::parse::{parse, parse_query};
    pub use crate::pretty::outline;
}
