use rivulet::time::{delay, delay_value};
use rivulet::{EventLoop, ready};

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

#[test]
fn test_spawn_runs_eagerly_to_completion() {
    let ev = EventLoop::new();

    let op = ev.spawn(async { 40 + 2 });
    assert!(
        op.is_ready(),
        "A body with no suspension point should finish inside spawn"
    );
    assert_eq!(op.get().unwrap(), 42);
}

#[test]
fn test_spawned_body_awaits_ops() {
    let ev = EventLoop::new();
    let timer = ev.clone();

    let op = ev.spawn(async move {
        let n = delay_value(&timer, 3, Duration::from_millis(5)).await.unwrap();
        n + 4
    });

    assert!(!op.is_ready());
    assert_eq!(ev.run_until(op).unwrap(), 7);
}

#[test]
fn test_spawned_body_awaits_a_pipeline() {
    let ev = EventLoop::new();
    let timer = ev.clone();

    let op = ev.spawn(async move {
        let chain = delay_value(&timer, "5".to_string(), Duration::from_millis(5))
            | (|s: String| s.parse::<i32>().unwrap())
            | (|n: i32| n + 5);
        chain.await.unwrap()
    });

    assert_eq!(ev.run_until(op).unwrap(), 10);
}

#[test]
fn test_pipeline_over_a_spawned_op() {
    let ev = EventLoop::new();
    let timer = ev.clone();

    let op = ev.spawn(async move {
        delay(&timer, Duration::from_millis(5)).await.unwrap();
        7
    }) | (|n: i32| n + 1);

    assert_eq!(ev.run_until(op).unwrap(), 8);
}

#[test]
fn test_awaiting_a_captured_failure() {
    let ev = EventLoop::new();

    let op = ev.spawn(async move {
        let outcome = rivulet::failed::<i32>(anyhow::anyhow!("boom")).await;
        outcome.map_err(|e| e.to_string())
    });

    assert_eq!(ev.run_until(op).unwrap(), Err("boom".to_string()));
}

#[test]
fn test_dropping_the_op_cancels_the_body() {
    let ev = EventLoop::new();
    let timer = ev.clone();

    let before = Rc::new(Cell::new(false));
    let after = Rc::new(Cell::new(false));
    let before_flag = before.clone();
    let after_flag = after.clone();

    let op = ev.spawn(async move {
        before_flag.set(true);
        delay(&timer, Duration::from_millis(5)).await.unwrap();
        after_flag.set(true);
    });

    assert!(before.get(), "The body should run up to its first await");
    drop(op);

    // drain the timer the abandoned body was waiting on
    ev.run();

    assert!(
        !after.get(),
        "Statements past the suspension point of a cancelled body should never run"
    );
}

#[test]
fn test_spawn_interoperates_with_manual_ops() {
    let ev = EventLoop::new();
    let driver = ev.clone();

    let op = ev.spawn(async move {
        // a manual producer completed by a timer callback
        let (inner, completer) = rivulet::AsyncOp::manual();
        driver.invoke_after(Duration::from_millis(5), move || completer.set_ready(11));
        inner.await.unwrap()
    });

    assert_eq!(ev.run_until(op).unwrap(), 11);
}

#[test]
fn test_run_until_on_an_already_finished_op() {
    let ev = EventLoop::new();
    assert_eq!(ev.run_until(ready(5)).unwrap(), 5);
}
