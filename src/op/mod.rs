//! The awaitable value container and its completion state machine.
//!
//! An [`AsyncOp`] is a move-only box holding the eventual result of an
//! operation: not yet available, a value, or a captured failure. It is
//! the building block every pipeline is made of; a whole chain of
//! stages is itself just one `AsyncOp` that owns all the links before
//! it.
//!
//! Two producer styles feed an op and interoperate freely:
//! - manual: [`AsyncOp::manual`] hands out a [`Completer`] that a
//!   callback-style producer fires exactly once,
//! - structured: an `async` body spawned onto the
//!   [`EventLoop`](crate::reactor::EventLoop), with `AsyncOp` itself
//!   awaitable from such bodies.
//!
//! Dropping an op is the only cancellation primitive: the chain it
//! owns unwinds, pending work is abandoned silently, and leftover
//! completions become no-ops.

mod core;
mod state;

pub use core::{AsyncOp, Completer, Failure};
pub use state::State;
