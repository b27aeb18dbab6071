//! Tests for condition guards

use super::super::*;
use super::helpers::{run, run_with, RecordingDispatcher};
use maplit::hashmap;
use serde_json::json;

const NUMERIC_GUARD: &str = r#"
workflow w v1 {
    step s {
        if $x > 3 { hit() }
    }
}
"#;

#[tokio::test]
async fn test_integer_register_compares_numerically() {
    let (result, dispatcher) = run(NUMERIC_GUARD, hashmap! { "x".to_string() => Val::Int(5) }).await;
    assert!(result.is_ok());
    assert_eq!(dispatcher.rendered(), vec!["hit()"]);

    let (_, dispatcher) = run(NUMERIC_GUARD, hashmap! { "x".to_string() => Val::Int(2) }).await;
    assert!(dispatcher.calls().is_empty());
}

#[tokio::test]
async fn test_string_register_is_not_coerced() {
    let (result, dispatcher) = run(NUMERIC_GUARD, hashmap! { "x".to_string() => Val::from("5") }).await;

    let err = result.unwrap_err();
    assert!(matches!(err.kind(), RuntimeError::TypeMismatch(_)));
    assert_eq!(err.step, "s");
    assert_eq!(err.path, StatementPath(vec![0]));
    assert!(dispatcher.calls().is_empty());
}

#[tokio::test]
async fn test_json_number_from_dispatcher_is_numeric() {
    let source = r#"
workflow w v1 {
    step s {
        $score = call rate("doc")
        if $score >= 10 { accept() }
    }
}
"#;
    let dispatcher = RecordingDispatcher::new().respond("rate", json!(12));
    let (result, dispatcher) = run_with(source, hashmap! {}, dispatcher).await;

    assert!(result.is_ok());
    assert_eq!(dispatcher.rendered(), vec!["rate(doc)", "accept()"]);
}

#[tokio::test]
async fn test_negative_dispatcher_values() {
    let source = r#"
workflow w v1 {
    step s {
        $delta = call diff()
        if $delta < 0 { shrink() }
    }
}
"#;
    let dispatcher = RecordingDispatcher::new().respond("diff", Val::Int(-4));
    let (_, dispatcher) = run_with(source, hashmap! {}, dispatcher).await;
    assert_eq!(dispatcher.rendered(), vec!["diff()", "shrink()"]);
}

#[tokio::test]
async fn test_equality_domains() {
    let source = r#"
workflow w v1 {
    step s {
        if $name == "bob" { same_string() }
        if $name != "alice" { different_string() }
        if $flag == true { same_bool() }
        if $n == 5 { same_int() }
        if $n == "5" { int_vs_text() }
        if $flag != "yes" { bool_vs_text() }
    }
}
"#;
    let bindings = hashmap! {
        "name".to_string() => Val::from("bob"),
        "flag".to_string() => Val::Bool(true),
        "n".to_string() => Val::Int(5),
    };
    let (result, dispatcher) = run(source, bindings).await;

    assert!(result.is_ok());
    assert_eq!(
        dispatcher.rendered(),
        vec![
            "same_string()",
            "different_string()",
            "same_bool()",
            "same_int()",
            "int_vs_text()",
            "bool_vs_text()",
        ]
    );
}

#[tokio::test]
async fn test_truthy_guards() {
    let source = r#"
workflow w v1 {
    step s {
        if $empty { a() }
        if $text { b() }
        if $zero { c() }
        if $one { d() }
        if $off { e() }
        if true { f() }
        if 0 { g() }
        if "" { h() }
        if $list { i() }
    }
}
"#;
    let bindings = hashmap! {
        "empty".to_string() => Val::from(""),
        "text".to_string() => Val::from("x"),
        "zero".to_string() => Val::Int(0),
        "one".to_string() => Val::Int(1),
        "off".to_string() => Val::Bool(false),
        "list".to_string() => Val::Json(json!([1])),
    };
    let (_, dispatcher) = run(source, bindings).await;
    assert_eq!(dispatcher.rendered(), vec!["b()", "d()", "f()", "i()"]);
}

#[tokio::test]
async fn test_false_guard_has_no_side_effects() {
    let source = r#"
workflow w v1 {
    step s {
        if $go { $touched = call touch() }
        after()
    }
}
"#;
    let (result, dispatcher) = run(source, hashmap! { "go".to_string() => Val::Bool(false) }).await;

    assert!(!result.unwrap().registers.contains_key("touched"));
    assert_eq!(dispatcher.rendered(), vec!["after()"]);
}

#[tokio::test]
async fn test_range_guard() {
    let source = r#"
workflow w v1 {
    step s {
        if low..high { forward() }
        if high..low { backward() }
        if 3..3 { single() }
    }
}
"#;
    let bindings = hashmap! {
        "low".to_string() => Val::Int(1),
        "high".to_string() => Val::Int(4),
    };
    let (_, dispatcher) = run(source, bindings).await;
    assert_eq!(dispatcher.rendered(), vec!["forward()", "single()"]);
}

#[tokio::test]
async fn test_ordering_on_strings_is_type_mismatch() {
    let source = r#"workflow w v1 { step s { if "a" < "b" { x() } } }"#;
    let (result, _) = run(source, hashmap! {}).await;
    assert!(matches!(
        result.unwrap_err().kind(),
        RuntimeError::TypeMismatch(_)
    ));
}
