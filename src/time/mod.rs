//! Timer-backed operations.
//!
//! Everything here is built on [`EventLoop::invoke_after`]: a delay is
//! an op completed by a timer callback, and a timeout is a race between
//! an op and such a delay.
//!
//! [`EventLoop::invoke_after`]: crate::reactor::EventLoop::invoke_after

mod delay;
mod timeout;

pub use delay::{delay, delay_value};
pub use timeout::{Elapsed, timeout};
