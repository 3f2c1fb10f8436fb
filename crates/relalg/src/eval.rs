//! Stepwise evaluator
//!
//! Walks the AST in post-order and records one [`Step`] per node. A node's
//! operand steps always come before it: for binary nodes the step right
//! before is the right operand's and `inputs` names both operands exactly.

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

use crate::ast::{Expr, OperatorKind, Span};
use crate::condition::Condition;
use crate::value::{Relation, RelationLookup, Row, RowKey};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("invalid join condition {condition:?}: expected `left_attribute=right_attribute`")]
    InvalidJoinCondition { condition: String, span: Span },
}

type Result<T> = std::result::Result<T, EvalError>;

/// One evaluated AST node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    pub kind: OperatorKind,
    pub description: String,
    pub data: Relation,
    /// Source text of the node this step evaluated
    pub span: Span,
    /// Distance from the root of the tree
    pub depth: usize,
    /// Trace indices of the operand steps, left operand first
    pub inputs: Vec<usize>,
}

/// Evaluate `expr` and return the full trace; the last step is the result
pub fn execute(expr: &Expr, relations: &impl RelationLookup) -> Result<Vec<Step>> {
    let mut steps = Vec::with_capacity(expr.node_count());
    Evaluator {
        relations,
        steps: &mut steps,
    }
    .visit(expr, 0)?;
    Ok(steps)
}

struct Evaluator<'r, L: ?Sized> {
    relations: &'r L,
    steps: &'r mut Vec<Step>,
}

impl<L: RelationLookup + ?Sized> Evaluator<'_, L> {
    /// Evaluate one node and return the index of its step
    fn visit(&mut self, expr: &Expr, depth: usize) -> Result<usize> {
        let (description, data, inputs) = match expr {
            Expr::Relation { name, .. } => {
                let data = match self.relations.relation(name) {
                    Some(relation) => relation.clone(),
                    None => {
                        log::warn!("unknown relation {name:?}, using an empty relation");
                        Relation::new()
                    }
                };
                (format!("Access base relation: {name}"), data, vec![])
            }
            Expr::Projection {
                attributes,
                relation,
                ..
            } => {
                let input = self.visit(relation, depth + 1)?;
                let data = project(&self.steps[input].data, attributes);
                let description = format!("Project attributes: [{}]", attributes.join(", "));
                (description, data, vec![input])
            }
            Expr::Selection {
                condition,
                relation,
                ..
            } => {
                let input = self.visit(relation, depth + 1)?;
                let data = select(&self.steps[input].data, &Condition::parse(condition));
                (format!("Filter rows where: {condition}"), data, vec![input])
            }
            Expr::Union { left, right, .. } => {
                let (l, r) = self.visit_pair(left, right, depth)?;
                let data = union(&self.steps[l].data, &self.steps[r].data);
                ("Union of two relations".to_string(), data, vec![l, r])
            }
            Expr::Join {
                condition,
                left,
                right,
                span,
            } => {
                let (l, r) = self.visit_pair(left, right, depth)?;
                let (left_attr, right_attr) = split_join_condition(condition).ok_or_else(|| {
                    EvalError::InvalidJoinCondition {
                        condition: condition.clone(),
                        span: *span,
                    }
                })?;
                let data = join(
                    &self.steps[l].data,
                    &self.steps[r].data,
                    left_attr,
                    right_attr,
                );
                (format!("Join on: {condition}"), data, vec![l, r])
            }
        };

        log::debug!(
            "step {}: {} -> {} rows",
            self.steps.len(),
            description,
            data.len()
        );
        self.steps.push(Step {
            kind: expr.kind(),
            description,
            data,
            span: expr.span(),
            depth,
            inputs,
        });
        Ok(self.steps.len() - 1)
    }

    fn visit_pair(&mut self, left: &Expr, right: &Expr, depth: usize) -> Result<(usize, usize)> {
        let l = self.visit(left, depth + 1)?;
        let r = self.visit(right, depth + 1)?;
        Ok((l, r))
    }
}

// ============ Operators ============

/// Keep the listed attributes each row actually has, in list order
pub fn project(input: &Relation, attributes: &[String]) -> Relation {
    input
        .iter()
        .map(|row| {
            attributes
                .iter()
                .filter_map(|attr| row.get(attr).map(|v| (attr.clone(), v.clone())))
                .collect::<Row>()
        })
        .collect()
}

pub fn select(input: &Relation, condition: &Condition) -> Relation {
    input
        .iter()
        .filter(|row| condition.matches(row))
        .cloned()
        .collect()
}

/// Concatenate and drop structurally equal rows, keeping the first
pub fn union(left: &Relation, right: &Relation) -> Relation {
    let mut seen = HashSet::new();
    left.iter()
        .chain(right.iter())
        .filter(|&row| seen.insert(RowKey::of(row)))
        .cloned()
        .collect()
}

/// Nested-loop equi-join. Values must be identical (no coercion); on name
/// collisions the right row's value wins.
pub fn join(left: &Relation, right: &Relation, left_attr: &str, right_attr: &str) -> Relation {
    let mut out = Relation::new();
    for l in left {
        for r in right {
            if l.get(left_attr) == r.get(right_attr) {
                let mut merged = l.clone();
                merged.extend(r.iter().map(|(k, v)| (k.clone(), v.clone())));
                out.push(merged);
            }
        }
    }
    out
}

/// `left=right` -> `(left, right)`, trimmed; `None` unless exactly one `=`
fn split_join_condition(condition: &str) -> Option<(&str, &str)> {
    let mut parts = condition.split('=');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(l), Some(r), None) => Some((l.trim(), r.trim())),
        _ => None,
    }
}
