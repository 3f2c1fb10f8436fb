//! Black-box integration tests for relalg
//!
//! These tests exercise the full tokenize → parse → eval pipeline.

use std::collections::HashMap;

use relalg::advanced::{evaluate, tokenize};
use relalg::{
    EvalError, Expected, OperatorKind, Relation, RelalgError, Row, Span, Step, SyntaxError, row,
    run,
};

fn students() -> Relation {
    Relation::from_rows(vec![
        row! { "id" => 1, "name" => "Alice", "age" => 22, "major" => "CS" },
        row! { "id" => 2, "name" => "Bob", "age" => 28, "major" => "Math" },
    ])
}

fn university() -> HashMap<String, Relation> {
    let mut db = HashMap::new();
    db.insert("Students".to_string(), students());
    db.insert(
        "Teachers".to_string(),
        Relation::from_rows(vec![
            row! { "id" => 101, "name" => "Prof. Smith", "age" => 45, "subject" => "CS" },
            row! { "id" => 103, "name" => "Alice", "age" => 22, "subject" => "Physics" },
        ]),
    );
    db.insert(
        "Enrollments".to_string(),
        Relation::from_rows(vec![
            row! { "student_id" => 1, "course" => "DB", "grade" => "A" },
        ]),
    );
    db
}

fn result(query: &str) -> Vec<Row> {
    let steps = run(query, &university()).unwrap();
    steps.last().unwrap().data.clone().into_rows()
}

// ============ End-to-end scenarios ============

#[test]
fn projection_scenario() {
    assert_eq!(
        result("π[name,age](Students)"),
        vec![
            row! { "name" => "Alice", "age" => 22 },
            row! { "name" => "Bob", "age" => 28 },
        ]
    );
}

#[test]
fn selection_scenario() {
    assert_eq!(
        result("σ[age>25](Students)"),
        vec![row! { "id" => 2, "name" => "Bob", "age" => 28, "major" => "Math" }]
    );
}

#[test]
fn join_scenario() {
    assert_eq!(
        result("Students ⋈_{id=student_id} Enrollments"),
        vec![row! {
            "id" => 1, "name" => "Alice", "age" => 22, "major" => "CS",
            "student_id" => 1, "course" => "DB", "grade" => "A",
        }]
    );
}

#[test]
fn malformed_query_scenario() {
    let err = run("π[name(Students)", &university()).unwrap_err();
    let RelalgError::Syntax(syntax) = err else {
        panic!("expected a syntax error, got {err:?}");
    };
    assert_eq!(
        syntax,
        SyntaxError::UnexpectedToken {
            expected: Expected::Token(relalg::advanced::TokenKind::RightBracket),
            found: relalg::advanced::TokenKind::LeftParen,
            position: 6,
        }
    );
    assert!(syntax.to_string().contains("']'"));
}

// ============ Trace shape ============

#[test]
fn trace_records_every_node() {
    let query = "π[name](Students) ∪ π[name](Teachers)";
    let steps = run(query, &university()).unwrap();
    let summary: Vec<(OperatorKind, usize, &str)> = steps
        .iter()
        .map(|s| (s.kind, s.depth, s.span.slice(query).unwrap()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (OperatorKind::Relation, 2, "Students"),
            (OperatorKind::Projection, 1, "π[name](Students)"),
            (OperatorKind::Relation, 2, "Teachers"),
            (OperatorKind::Projection, 1, "π[name](Teachers)"),
            (OperatorKind::Union, 0, query),
        ]
    );
    // Alice appears in both operands but only once in the union
    let names: Vec<String> = steps[4].data.iter().map(|r| r["name"].to_string()).collect();
    assert_eq!(names, vec!["Alice", "Bob", "Prof. Smith"]);
}

#[test]
fn binary_step_is_preceded_by_right_operand() {
    let steps = run("σ[age>20](Students) ⋈_{id=student_id} Enrollments", &university()).unwrap();
    let join: &Step = steps.last().unwrap();
    assert_eq!(join.kind, OperatorKind::Join);
    let [left, right] = join.inputs[..] else {
        panic!("join should have two inputs");
    };
    assert_eq!(right, steps.len() - 2);
    assert_eq!(steps[right].description, "Access base relation: Enrollments");
    assert_eq!(steps[left].kind, OperatorKind::Selection);
    assert_eq!(join.description, "Join on: id=student_id");
}

#[test]
fn spans_highlight_the_source() {
    let query = "π[name,course](Students ⋈_{id=student_id} Enrollments)";
    let steps = run(query, &university()).unwrap();
    let join = &steps[2];
    assert_eq!(join.span.slice(query), Some("Students ⋈_{id=student_id} Enrollments"));
    assert_eq!(steps[3].span, Span::new(0, query.chars().count()));
    assert_eq!(join.span, Span::new(15, 53));
    assert_eq!(
        steps[3].data.rows(),
        &[row! { "name" => "Alice", "course" => "DB" }]
    );
}

#[test]
fn positions_count_characters_not_bytes() {
    let query = "π[name,age](Students)";
    let steps = run(query, &university()).unwrap();
    assert_eq!(steps[1].span, Span::new(0, 21));
    assert_eq!(steps[0].span, Span::new(12, 20));
    assert_eq!(steps[0].span.slice(query), Some("Students"));

    let tokens = relalg::advanced::tokenize(query);
    assert_eq!(tokens[1].position, 1);
}

// ============ Edge cases ============

#[test]
fn unknown_relation_yields_no_rows() {
    let steps = run("σ[x=1](Nobody) ∪ Students", &university()).unwrap();
    assert!(steps[0].data.is_empty());
    assert_eq!(steps.last().unwrap().data, students());
}

#[test]
fn selection_without_operator_is_noop() {
    assert_eq!(result("σ[bogus](Students)"), students().into_rows());
}

#[test]
fn not_equal_is_read_as_equality_on_a_bang_attribute() {
    // `=` is tried before `!=`, so this compares attribute `age!` with 22
    assert!(result("σ[age!=22](Students)").is_empty());
}

#[test]
fn bad_join_condition_returns_no_steps() {
    let err = run("Students ⋈_{id} Enrollments", &university()).unwrap_err();
    assert!(matches!(
        err,
        RelalgError::Eval(EvalError::InvalidJoinCondition { .. })
    ));
}

#[test]
fn whitespace_only_query() {
    assert!(tokenize("   ").is_empty());
    assert!(matches!(
        run("   ", &university()),
        Err(RelalgError::Syntax(SyntaxError::UnexpectedEnd { .. }))
    ));
}

#[test]
fn join_row_order_is_left_major() {
    let mut db = university();
    db.insert(
        "Enrollments".to_string(),
        Relation::from_rows(vec![
            row! { "student_id" => 2, "course" => "Algorithms" },
            row! { "student_id" => 1, "course" => "DB" },
            row! { "student_id" => 1, "course" => "ML" },
        ]),
    );
    let steps = run("Students ⋈_{id=student_id} Enrollments", &db).unwrap();
    let courses: Vec<String> = steps[2]
        .data
        .iter()
        .map(|r| format!("{}:{}", r["name"], r["course"]))
        .collect();
    assert_eq!(courses, vec!["Alice:DB", "Alice:ML", "Bob:Algorithms"]);
}

#[test]
fn join_overwrite_follows_operand_order() {
    let db = university();
    let ab = run("Students ⋈_{name=name} Teachers", &db).unwrap();
    let ba = run("Teachers ⋈_{name=name} Students", &db).unwrap();
    let ab = &ab.last().unwrap().data.rows()[0];
    let ba = &ba.last().unwrap().data.rows()[0];
    // the right operand wins the shared `id` attribute
    assert_eq!(ab["id"].to_string(), "103");
    assert_eq!(ba["id"].to_string(), "1");
    assert_eq!(ab["major"], ba["major"]);
    assert_eq!(ab["subject"], ba["subject"]);
}

#[test]
fn condition_evaluator_is_usable_directly() {
    let row = row! { "name" => "Alice", "age" => 22 };
    assert!(evaluate(&row, "name='Alice'"));
    assert!(!evaluate(&row, "age>=23"));
}

#[test]
fn steps_serialize_for_display_layers() {
    let steps = run("π[name](Students)", &university()).unwrap();
    let json = serde_json::to_value(&steps[1]).unwrap();
    assert_eq!(json["kind"], "PROJECTION");
    assert_eq!(json["span"]["start"], 0);
    assert_eq!(json["data"][1]["name"], "Bob");
    assert_eq!(json["inputs"][0], 0);
}
