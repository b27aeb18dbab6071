//! Tests for failure semantics

use super::super::*;
use super::helpers::{parse, run, run_with, RecordingDispatcher};
use maplit::hashmap;

#[tokio::test]
async fn test_dispatch_failure_in_nested_loop_aborts_run() {
    let source = r#"
workflow w v1 {
    step first {
        for i in 1..3 {
            if i == 2 { call explode(i) }
            visit(i)
        }
        after_loop()
    }
    step second { never() }
}
"#;
    let dispatcher = RecordingDispatcher::new().fail_on("explode", "boom");
    let (result, dispatcher) = run_with(source, hashmap! {}, dispatcher).await;

    // No sibling iterations, no later statements, no later steps
    assert_eq!(dispatcher.rendered(), vec!["visit(1)", "explode(2)"]);

    let err = result.unwrap_err();
    assert_eq!(err.step, "first");
    assert_eq!(err.path, StatementPath(vec![0, 0, 0]));
    match err.kind() {
        RuntimeError::Dispatch { function, source } => {
            assert_eq!(function, "explode");
            assert_eq!(source, &DispatchError::failed("boom"));
        }
        other => panic!("Expected dispatch error, got {:?}", other),
    }
    assert_eq!(
        err.to_string(),
        "step 'first' at statement 0.0.0: call to 'explode' failed: boom"
    );
}

#[tokio::test]
async fn test_failed_run_keeps_earlier_effects_only() {
    let workflow = parse(
        r#"
workflow w v1 {
    step a { $kept = 1 }
    step b { $lost = call broken() $never = 2 }
}
"#,
    );
    let dispatcher = RecordingDispatcher::new().fail_on("broken", "down");
    let mut execution = Execution::new(&workflow, hashmap! {}, &dispatcher);

    let err = execution.run().await.unwrap_err();
    assert_eq!(err.step, "b");
    assert_eq!(execution.state(), RunState::Failed);
    assert_eq!(execution.registers().get("kept"), Some(&Val::Int(1)));
    assert!(!execution.registers().contains("lost"));
    assert!(!execution.registers().contains("never"));
    assert_eq!(execution.history().len(), 1);

    // The failure is reported again, not re-run
    let again = execution.advance_step().await.unwrap_err();
    assert_eq!(again, err);
    assert_eq!(dispatcher.calls().len(), 1);
}

#[tokio::test]
async fn test_unresolved_register() {
    let (result, _) = run(r#"workflow w v1 { step s { use($missing) } }"#, hashmap! {}).await;
    assert_eq!(
        result.unwrap_err().kind(),
        &RuntimeError::Resolution(ResolutionError::Register("missing".into()))
    );
}

#[tokio::test]
async fn test_register_reference_ignores_loop_variables() {
    let source = r#"workflow w v1 { step s { for v in 1..1 { use($v) } } }"#;
    let (result, dispatcher) = run(source, hashmap! {}).await;

    let err = result.unwrap_err();
    assert_eq!(
        err.kind(),
        &RuntimeError::Resolution(ResolutionError::Register("v".into()))
    );
    assert_eq!(err.path, StatementPath(vec![0, 0]));
    assert!(dispatcher.calls().is_empty());
}

#[tokio::test]
async fn test_range_bound_must_be_integer() {
    let source = r#"workflow w v1 { step s { for i in 1..label { use(i) } } }"#;
    let (result, _) = run(source, hashmap! { "label".to_string() => Val::from("ten") }).await;
    assert!(matches!(
        result.unwrap_err().kind(),
        RuntimeError::TypeMismatch(_)
    ));
}

#[tokio::test]
async fn test_unknown_function_in_registry() {
    let workflow = parse(r#"workflow w v1 { step s { $x = call nowhere() } }"#);
    let registry = FunctionRegistry::new();

    let err = execute(&workflow, hashmap! {}, &registry).await.unwrap_err();
    match err.kind() {
        RuntimeError::Dispatch { function, source } => {
            assert_eq!(function, "nowhere");
            assert!(matches!(source, DispatchError::UnknownFunction(name) if name == "nowhere"));
        }
        other => panic!("Expected dispatch error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_oversized_literal_fails_at_runtime() {
    let (result, _) = run(
        r#"workflow w v1 { step s { $big = 18446744073709551615 } }"#,
        hashmap! {},
    )
    .await;
    assert!(matches!(
        result.unwrap_err().kind(),
        RuntimeError::TypeMismatch(_)
    ));
}

#[tokio::test]
async fn test_literal_beyond_u64_parses_and_fails_at_runtime() {
    let (result, dispatcher) = run(
        r#"workflow w v1 { step s { $ok = 1 f(99999999999999999999999) } }"#,
        hashmap! {},
    )
    .await;
    let err = result.unwrap_err();

    assert!(matches!(err.kind(), RuntimeError::TypeMismatch(_)));
    assert_eq!(err.step, "s");
    assert_eq!(err.path, StatementPath(vec![1]));
    assert!(dispatcher.calls().is_empty());
}
