use crate::op::{AsyncOp, Failure};
use crate::reactor::EventLoop;

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// The timeout side of a [`timeout`] race won.
///
/// Delivered in the value channel rather than as a [`Failure`]: hitting
/// a deadline is an expected outcome the caller branches on, not a
/// pipeline-aborting error.
#[derive(Debug, thiserror::Error)]
#[error("operation timed out")]
pub struct Elapsed;

/// Races `op` against a deadline on the given event loop.
///
/// The returned op completes with `Ok(value)` if `op` finishes first,
/// and with `Err(Elapsed)` if the deadline passes first. A failure
/// captured by `op` before the deadline still travels the failure
/// channel.
///
/// Whichever side loses the race is discarded: a late completion from
/// `op` after the deadline fired has no taker, and the timer firing
/// after `op` completed delivers nothing. Completing twice is
/// impossible by construction.
pub fn timeout<T: 'static>(
    ev: &EventLoop,
    op: AsyncOp<T>,
    duration: Duration,
) -> AsyncOp<Result<T, Elapsed>> {
    let (out, completer) = AsyncOp::manual();
    let won = Rc::new(Cell::new(false));

    op.start();
    {
        let completer = completer.clone();
        let won = won.clone();
        op.on_ready(move |outcome: Result<T, Failure>| {
            if won.replace(true) {
                return;
            }
            match outcome {
                Ok(value) => completer.set_ready(Ok(value)),
                Err(err) => completer.set_error(err),
            }
        });
    }
    completer.adopt(Box::new(op));

    ev.invoke_after(duration, move || {
        if won.replace(true) {
            return;
        }
        completer.set_ready(Err(Elapsed));
    });

    out
}
