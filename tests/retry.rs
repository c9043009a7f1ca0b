use rivulet::time::delay_value;
use rivulet::tools::{redo_while, retry};
use rivulet::{AsyncOp, EventLoop, ready};

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

#[test]
fn test_redo_while_reruns_until_the_predicate_clears() {
    let attempts = Rc::new(Cell::new(0));
    let counter = attempts.clone();

    let op = redo_while(
        move || {
            counter.set(counter.get() + 1);
            ready(counter.get())
        },
        |n| *n < 3,
    );

    op.start();
    assert!(op.is_ready());
    assert_eq!(op.get().unwrap(), 3);
    assert_eq!(attempts.get(), 3, "Should have run 3 rounds");
}

#[test]
fn test_redo_while_is_lazy() {
    let attempts = Rc::new(Cell::new(0));
    let counter = attempts.clone();

    let op = redo_while(
        move || {
            counter.set(counter.get() + 1);
            ready(counter.get())
        },
        |_| false,
    );

    assert_eq!(attempts.get(), 0, "No round should run before start");
    op.start();
    assert_eq!(attempts.get(), 1);
    assert_eq!(op.get().unwrap(), 1);
}

#[test]
fn test_redo_while_with_async_rounds() {
    let ev = EventLoop::new();
    let attempts = Rc::new(Cell::new(0));
    let counter = attempts.clone();
    let timer = ev.clone();

    let op = redo_while(
        move || {
            counter.set(counter.get() + 1);
            delay_value(&timer, counter.get(), Duration::from_millis(5))
        },
        |n| *n < 3,
    );

    assert_eq!(ev.run_until(op).unwrap(), 3);
    assert_eq!(attempts.get(), 3);
}

#[test]
fn test_redo_while_forwards_failures() {
    let attempts = Rc::new(Cell::new(0));
    let counter = attempts.clone();

    let op = redo_while(
        move || {
            counter.set(counter.get() + 1);
            if counter.get() == 2 {
                AsyncOp::failed(anyhow::anyhow!("round 2 broke"))
            } else {
                ready(counter.get())
            }
        },
        |_| true,
    );

    op.start();
    assert_eq!(op.get().unwrap_err().to_string(), "round 2 broke");
    assert_eq!(attempts.get(), 2, "A failure should end the loop");
}

#[test]
fn test_retry_succeeds_before_limit() {
    let attempts = Rc::new(Cell::new(0));
    let counter = attempts.clone();

    let op = retry(5, move || {
        let n = counter.get();
        counter.set(n + 1);
        if n < 2 {
            AsyncOp::failed(anyhow::anyhow!("fail"))
        } else {
            ready(42)
        }
    });

    op.start();
    assert!(
        matches!(op.get(), Ok(42)),
        "Retry should succeed before limit"
    );
    assert_eq!(attempts.get(), 3, "Should have made 3 attempts");
}

#[test]
fn test_retry_fails_after_limit() {
    let attempts = Rc::new(Cell::new(0));
    let counter = attempts.clone();

    let op = retry(3, move || {
        counter.set(counter.get() + 1);
        AsyncOp::<usize>::failed(anyhow::anyhow!("fail"))
    });

    op.start();
    assert!(op.get().is_err(), "Retry should fail after limit");
    assert_eq!(
        attempts.get(),
        4,
        "3 retries should mean 4 attempts in total"
    );
}

#[test]
fn test_retry_with_async_attempts() {
    let ev = EventLoop::new();
    let attempts = Rc::new(Cell::new(0));
    let counter = attempts.clone();
    let timer = ev.clone();

    let op = retry(5, move || {
        let n = counter.get();
        counter.set(n + 1);
        delay_value(&timer, n, Duration::from_millis(5)) | (|n: i32| {
            if n < 2 {
                AsyncOp::failed(anyhow::anyhow!("not yet"))
            } else {
                AsyncOp::ready(n)
            }
        })
    });

    assert_eq!(ev.run_until(op).unwrap(), 2);
    assert_eq!(attempts.get(), 3);
}
