use crate::op::AsyncOp;
use crate::reactor::EventLoop;

use std::time::Duration;

/// Returns an op that completes with `()` once `duration` has elapsed
/// on the given event loop.
///
/// Dropping the op abandons the wake-up; the timer entry still fires
/// on schedule but its delivery is a no-op.
///
/// # Examples
///
/// ```rust,ignore
/// let ev = EventLoop::new();
/// ev.run_until(delay(&ev, Duration::from_millis(50))).unwrap();
/// ```
pub fn delay(ev: &EventLoop, duration: Duration) -> AsyncOp<()> {
    delay_value(ev, (), duration)
}

/// Returns an op that completes with `value` once `duration` has
/// elapsed.
///
/// Handy for simulating a slow producer in tests or staging a value
/// into a pipeline at a later reactor turn.
pub fn delay_value<T: 'static>(ev: &EventLoop, value: T, duration: Duration) -> AsyncOp<T> {
    let (op, completer) = AsyncOp::manual();
    ev.invoke_after(duration, move || completer.set_ready(value));
    op
}
