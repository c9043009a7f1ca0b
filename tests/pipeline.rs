use rivulet::time::delay_value;
use rivulet::{AsyncOp, EventLoop, failed, ready};

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

fn to_int(s: String) -> i32 {
    s.parse().expect("input should be numeric")
}

fn add_five(n: i32) -> i32 {
    n + 5
}

fn to_string(n: i32) -> String {
    n.to_string()
}

#[test]
fn test_sync_pipeline_over_ready_value() {
    let op = ready("5".to_string()) | to_int | add_five | to_string;

    assert!(
        op.is_ready(),
        "A pipeline over a finished operand should finish synchronously"
    );
    assert_eq!(op.get().unwrap(), "10");
}

#[test]
fn test_pipeline_with_closures() {
    let doubled = Rc::new(Cell::new(0));
    let seen = doubled.clone();

    let op = ready(21) | (move |n: i32| {
        seen.set(n);
        n * 2
    });

    assert_eq!(op.get().unwrap(), 42);
    assert_eq!(doubled.get(), 21, "The stage should see the input value");
}

#[test]
fn test_async_pipeline_via_event_loop() {
    let ev = EventLoop::new();

    let op = delay_value(&ev, "5".to_string(), Duration::from_millis(10))
        | to_int
        | add_five
        | to_string;

    assert!(
        !op.is_ready(),
        "The pipeline should not finish before the loop runs"
    );
    assert_eq!(ev.run_until(op).unwrap(), "10");
}

#[test]
fn test_stage_returning_op_joins_the_chain() {
    let ev = EventLoop::new();
    let timer = ev.clone();

    let op = delay_value(&ev, 2, Duration::from_millis(5))
        | (move |n: i32| delay_value(&timer, n * 10, Duration::from_millis(5)))
        | add_five;

    assert_eq!(ev.run_until(op).unwrap(), 25);
}

#[test]
fn test_failure_skips_remaining_stages() {
    let ran = Rc::new(Cell::new(false));
    let flag = ran.clone();

    let op = failed::<i32>(anyhow::anyhow!("boom")) | (move |n: i32| {
        flag.set(true);
        n
    });

    assert!(op.is_ready(), "A failed operand should finish synchronously");
    let err = op.get().unwrap_err();
    assert_eq!(err.to_string(), "boom");
    assert!(!ran.get(), "Stages after a failure should never run");
}

#[test]
fn test_failure_mid_chain_surfaces_at_the_end() {
    let ev = EventLoop::new();
    let ran = Rc::new(Cell::new(false));
    let flag = ran.clone();

    let op = delay_value(&ev, 1, Duration::from_millis(5))
        | (|_n: i32| AsyncOp::<i32>::failed(anyhow::anyhow!("stage broke")))
        | (move |n: i32| {
            flag.set(true);
            n
        });

    let err = ev.run_until(op).unwrap_err();
    assert_eq!(err.to_string(), "stage broke");
    assert!(!ran.get(), "Stages after the failing one should never run");
}

#[test]
fn test_lazy_chain_starts_on_run_until() {
    let ev = EventLoop::new();
    let started = Rc::new(Cell::new(false));
    let flag = started.clone();

    let op = AsyncOp::lazy(move |completer| {
        flag.set(true);
        completer.set_ready(3);
    }) | add_five;

    assert!(
        !started.get(),
        "A lazy chain should not run before it is started"
    );
    assert_eq!(ev.run_until(op).unwrap(), 8);
    assert!(started.get());
}
