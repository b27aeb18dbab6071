//! Tests for cooperative cancellation

use super::super::*;
use super::helpers::{parse, RecordingDispatcher};
use maplit::hashmap;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_cancel_before_start() {
    let workflow = parse(r#"workflow w v1 { step s { work() } }"#);
    let dispatcher = RecordingDispatcher::new();
    let token = CancellationToken::new();
    token.cancel();

    let mut execution = Execution::new(&workflow, hashmap! {}, &dispatcher).with_cancellation(token);
    let err = execution.run().await.unwrap_err();

    assert!(err.kind().is_cancelled());
    assert!(dispatcher.calls().is_empty());
    assert_eq!(execution.state(), RunState::Failed);
}

#[tokio::test]
async fn test_cancel_during_dispatch_stops_before_next_statement() {
    let workflow = parse(
        r#"
workflow w v1 {
    step s {
        $first = call stop()
        $second = call work()
    }
    step t { more() }
}
"#,
    );
    let token = CancellationToken::new();
    let dispatcher = RecordingDispatcher::new().cancel_on("stop", token.clone());

    let mut execution = Execution::new(&workflow, hashmap! {}, &dispatcher).with_cancellation(token);
    let err = execution.run().await.unwrap_err();

    assert_eq!(err.kind(), &RuntimeError::Cancelled);
    assert_eq!(err.step, "s");
    // The call that was in flight still finished
    assert_eq!(dispatcher.rendered(), vec!["stop()"]);
    assert!(execution.registers().contains("first"));
    assert!(!execution.registers().contains("second"));
}

#[tokio::test]
async fn test_cancel_after_completion_is_ignored() {
    let workflow = parse(r#"workflow w v1 { step s { $x = 1 } }"#);
    let dispatcher = RecordingDispatcher::new();
    let token = CancellationToken::new();

    let mut execution =
        Execution::new(&workflow, hashmap! {}, &dispatcher).with_cancellation(token.clone());
    execution.run().await.unwrap();
    token.cancel();

    assert_eq!(execution.state(), RunState::Completed);
    assert!(execution.run().await.is_ok());
}

#[tokio::test]
async fn test_cancel_between_steps() {
    let workflow = parse(r#"workflow w v1 { step a { one() } step b { two() } }"#);
    let dispatcher = RecordingDispatcher::new();
    let token = CancellationToken::new();

    let mut execution =
        Execution::new(&workflow, hashmap! {}, &dispatcher).with_cancellation(token.clone());
    assert_eq!(execution.advance_step().await.unwrap().unwrap().name, "a");

    token.cancel();
    let err = execution.advance_step().await.unwrap_err();
    assert!(err.kind().is_cancelled());
    assert_eq!(err.step, "b");
    assert_eq!(err.path, StatementPath::root());
    assert_eq!(dispatcher.rendered(), vec!["one()"]);
}
