//! Single-threaded reactor.
//!
//! The reactor is the scheduling authority of the crate:
//!
//! - a timer queue drives [`EventLoop::invoke_after`] callbacks in
//!   deadline order, FIFO for equal deadlines,
//! - a task table holds structured-style bodies handed to
//!   [`EventLoop::spawn`], resumed through a wake queue,
//! - [`EventLoop::run_until`] bridges back to synchronous code.
//!
//! Everything runs on the thread that calls [`EventLoop::run`].
//! Wakers are the only pieces that may travel; they communicate with
//! the loop through a mutex-guarded id queue.

mod core;
mod task;
mod timer;

pub use core::EventLoop;
