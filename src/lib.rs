//! # Rivulet
//!
//! **Rivulet** is a single-threaded pipeline runtime for Rust, built
//! around one primitive: the awaitable result container [`AsyncOp`].
//!
//! Unlike general-purpose runtimes like Tokio or async-std, Rivulet
//! focuses on composing asynchronous work into pipelines. A stage is a
//! plain callback; `op | callback` chains it onto an op, nested ops
//! flatten automatically, and dropping the handle at the end of a chain
//! cancels everything behind it. Callback-style producers and `async`
//! bodies feed the same container and mix freely in one pipeline.
//!
//! The crate offers:
//!
//! - An **awaitable container** with a three-way result slot: not yet
//!   available, a value, or a captured failure
//! - The **pipe operator** for chaining callbacks, with compile-time
//!   dispatch between plain values and nested ops
//! - **Cancellation by drop** with no explicit cancel call anywhere
//! - A **single-threaded event loop** with timers, task spawning, and a
//!   synchronous [`run_until`](reactor::EventLoop::run_until) bridge
//! - **Combinators** for retry loops, ordered batch mapping, and
//!   lifting fallible synchronous calls
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rivulet::{EventLoop, ready};
//! use rivulet::time::delay_value;
//! use std::time::Duration;
//!
//! let ev = EventLoop::new();
//!
//! // a pipeline over a value arriving later
//! let op = delay_value(&ev, "5".to_string(), Duration::from_millis(10))
//!     | (|s: String| s.parse::<i32>().unwrap())
//!     | (|n: i32| n + 5)
//!     | (|n: i32| n.to_string());
//!
//! assert_eq!(ev.run_until(op).unwrap(), "10");
//! ```
//!
//! ## Modules
//!
//! - [`op`] — The awaitable container, its producer side, and states
//! - [`pipe`] — The pipe operator and the [`IntoAsyncOp`] dispatch trait
//! - [`reactor`] — The event loop: timers, tasks, `run_until`
//! - [`time`] — Delays and timeouts
//! - [`tools`] — Retry loops, batch mapping, `mtry`

mod utils;

pub mod op;
pub mod pipe;
pub mod reactor;
pub mod time;
pub mod tools;

pub use op::{AsyncOp, Completer, Failure, State};
pub use pipe::{IntoAsyncOp, failed, ready};
pub use reactor::EventLoop;
