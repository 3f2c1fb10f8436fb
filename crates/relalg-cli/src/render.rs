//! Terminal rendering of execution traces
//!
//! Text tables for step data, source highlighting for step spans and Mermaid
//! diagrams of how steps feed each other.

use std::fmt::Write;

use relalg::{OperatorKind, Relation, Span, Step};

/// How [`highlight`] marks the span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightStyle {
    /// Reverse video
    Ansi,
    /// `⟦` and `⟧` around the span
    Brackets,
}

/// The query text with `span` marked
pub fn highlight(query: &str, span: Span, style: HighlightStyle) -> String {
    let Some(range) = span.byte_range(query) else {
        log::warn!(
            "span {span:?} does not fit query of {} characters",
            query.chars().count()
        );
        return query.to_string();
    };
    let (before, marked, after) = (
        &query[..range.start],
        &query[range.clone()],
        &query[range.end..],
    );
    match style {
        HighlightStyle::Ansi => format!("{before}\x1b[7m{marked}\x1b[0m{after}"),
        HighlightStyle::Brackets => format!("{before}⟦{marked}⟧{after}"),
    }
}

// ============ Tables ============

/// Render rows as a pipe table. Columns are every attribute seen in the
/// relation; a row without an attribute gets an empty cell.
pub fn table(relation: &Relation) -> String {
    if relation.is_empty() {
        return "No data (empty result set)\n".to_string();
    }

    let headers = relation.attribute_names();
    let cells: Vec<Vec<String>> = relation
        .iter()
        .map(|row| {
            headers
                .iter()
                .map(|h| row.get(*h).map(ToString::to_string).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    write_line(&mut out, headers.iter().copied(), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    write_line(&mut out, rule.iter().map(String::as_str), &widths);
    for row in &cells {
        write_line(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn write_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    out.push('|');
    for (cell, width) in cells.zip(widths) {
        let pad = width - cell.chars().count();
        let _ = write!(out, " {cell}{} |", " ".repeat(pad));
    }
    out.push('\n');
}

// ============ Mermaid ============

fn fill_color(kind: OperatorKind) -> &'static str {
    match kind {
        OperatorKind::Relation => "#90EE90",
        OperatorKind::Projection => "#87CEEB",
        OperatorKind::Selection => "#FFB6C1",
        OperatorKind::Union => "#DDA0DD",
        OperatorKind::Join => "#FFD700",
    }
}

fn label(prefix: &str, step: &Step) -> String {
    let description = step.description.replace('"', "#quot;");
    format!("{prefix}{description}\\n{} rows", step.data.len())
}

/// Diagram of one step and the steps it consumes directly
pub fn step_graph(steps: &[Step], index: usize) -> Option<String> {
    let step = steps.get(index)?;
    let mut diagram = String::from("graph TD\n");

    let prefixes: &[&str] = match step.inputs.len() {
        1 => &["Previous: "],
        _ => &["Left: ", "Right: "],
    };
    for (&input, prefix) in step.inputs.iter().zip(prefixes) {
        let operand = steps.get(input)?;
        let _ = writeln!(diagram, "    step{input}[\"{}\"]", label(prefix, operand));
    }
    let _ = writeln!(diagram, "    step{index}[\"{}\"]", label("", step));
    for input in &step.inputs {
        let _ = writeln!(diagram, "    step{input} --> step{index}");
    }
    let _ = writeln!(diagram, "    style step{index} fill:{}", fill_color(step.kind));
    Some(diagram)
}

/// Diagram of the whole trace with `current` outlined
pub fn execution_graph(steps: &[Step], current: usize) -> String {
    let mut diagram = String::from("graph TD\n");

    for (idx, step) in steps.iter().enumerate() {
        let marker = if idx == current { "▶ " } else { "" };
        let prefix = format!("{marker}Step {}: ", idx + 1);
        let _ = writeln!(diagram, "    step{idx}[\"{}\"]", label(&prefix, step));
        let _ = write!(diagram, "    style step{idx} fill:{}", fill_color(step.kind));
        if idx == current {
            diagram.push_str(",stroke:#FF0000,stroke-width:4px");
        }
        diagram.push('\n');
    }

    for (idx, step) in steps.iter().enumerate() {
        for input in &step.inputs {
            let _ = writeln!(diagram, "    step{input} --> step{idx}");
        }
    }

    diagram
}
