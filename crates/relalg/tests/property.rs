use std::collections::HashMap;

use proptest::prelude::*;
use relalg::advanced::{Condition, project, select, union};
use relalg::{Relation, Row, Value, compile, run};

fn arb_relation_name() -> impl Strategy<Value = String> {
    prop_oneof![Just("R".to_string()), Just("S".to_string())]
}

fn arb_condition() -> impl Strategy<Value = String> {
    (
        prop_oneof![Just("a"), Just("b"), Just("c")],
        prop_oneof![Just(">"), Just("<"), Just(">="), Just("<="), Just("=")],
        0i64..10,
    )
        .prop_map(|(attr, op, n)| format!("{attr}{op}{n}"))
}

fn arb_query(depth: u32) -> BoxedStrategy<String> {
    if depth == 0 {
        return arb_relation_name().boxed();
    }

    let leaf = arb_relation_name();
    let inner = arb_query(depth - 1);
    prop_oneof![
        leaf,
        (prop::sample::subsequence(vec!["a", "b", "c"], 0..=3), inner.clone())
            .prop_map(|(attrs, q)| format!("π[{}]({q})", attrs.join(",")))
            .boxed(),
        (arb_condition(), inner.clone())
            .prop_map(|(cond, q)| format!("σ[{cond}]({q})"))
            .boxed(),
        (inner.clone(), inner.clone())
            .prop_map(|(l, r)| format!("({l}) ∪ ({r})"))
            .boxed(),
        (inner, arb_relation_name())
            .prop_map(|(l, r)| format!("({l}) ∪ {r}"))
            .boxed(),
        // joins only over base relations to keep the nested loop small
        (arb_relation_name(), arb_relation_name())
            .prop_map(|(l, r)| format!("{l} ⋈_{{a=a}} {r}"))
            .boxed(),
    ]
    .boxed()
}

fn arb_row() -> impl Strategy<Value = Row> {
    (
        prop::option::of(0i64..5),
        prop::option::of(0i64..5),
        prop::option::of(prop_oneof![Just("x"), Just("y")]),
    )
        .prop_map(|(a, b, c)| {
            let mut row = Row::new();
            if let Some(a) = a {
                row.insert("a".into(), Value::from(a));
            }
            if let Some(b) = b {
                row.insert("b".into(), Value::from(b));
            }
            if let Some(c) = c {
                row.insert("c".into(), Value::from(c));
            }
            row
        })
}

fn arb_relation() -> impl Strategy<Value = Relation> {
    prop::collection::vec(arb_row(), 0..8).prop_map(Relation::from_rows)
}

proptest! {
    #[test]
    fn display_is_a_parse_fixpoint(query in arb_query(3)) {
        let parsed = compile(&query).expect("generated query should parse");
        let rendered = parsed.to_string();
        let reparsed = compile(&rendered).expect("rendered query should reparse");
        prop_assert_eq!(rendered, reparsed.to_string());
    }

    #[test]
    fn trace_has_one_step_per_node(query in arb_query(3), r in arb_relation(), s in arb_relation()) {
        let db = HashMap::from([("R".to_string(), r), ("S".to_string(), s)]);
        let expr = compile(&query).unwrap();
        let steps = run(&query, &db).expect("generated query should evaluate");
        prop_assert_eq!(steps.len(), expr.node_count());
        prop_assert_eq!(steps.last().unwrap().depth, 0);
        for (i, step) in steps.iter().enumerate() {
            prop_assert!(step.inputs.iter().all(|&input| input < i));
        }
    }

    #[test]
    fn union_with_self_collapses_duplicates(r in arb_relation()) {
        let out = union(&r, &r);
        prop_assert!(out.len() <= r.len());
        for row in &r {
            prop_assert!(out.iter().any(|o| o == row));
        }
        // first-seen order: the first row survives in front
        if let Some(first) = r.rows().first() {
            prop_assert_eq!(&out.rows()[0], first);
        }
    }

    #[test]
    fn projection_keeps_present_attributes(r in arb_relation(), attrs in prop::sample::subsequence(vec!["a", "c"], 0..=2)) {
        let attrs: Vec<String> = attrs.into_iter().map(String::from).collect();
        let out = project(&r, &attrs);
        prop_assert_eq!(out.len(), r.len());
        for (src, dst) in r.iter().zip(out.iter()) {
            for attr in &attrs {
                prop_assert_eq!(src.get(attr), dst.get(attr));
            }
            prop_assert!(dst.keys().all(|k| attrs.contains(k)));
        }
    }

    #[test]
    fn selection_without_operator_is_identity(r in arb_relation(), word in "[a-z]{0,8}") {
        prop_assert_eq!(select(&r, &Condition::parse(&word)), r);
    }
}
