//! The pipe operator: composition of ops with callbacks.
//!
//! `op | callback` builds a new [`AsyncOp`] that owns `op` and runs
//! `callback` with its value once it is available. The callback may
//! return a plain value, which completes the new op on the spot, or
//! another `AsyncOp`, which the runtime subscribes to and flattens —
//! a stage never exposes a nested "op of an op" to the next stage, no
//! matter how deeply a callback's result is wrapped.
//!
//! Dispatch between the two callback shapes happens at compile time
//! through the [`IntoAsyncOp`] trait on the callback's return type.
//! Plain ("leaf") values implement it for the standard scalar and
//! container types; downstream value types opt in with one line of
//! [`pipe_operand!`](crate::pipe_operand).
//!
//! A finished left operand runs the callback synchronously at
//! composition time, so pipelines over already-known values cost no
//! reactor turn. Plain values enter a pipeline through [`ready`]:
//!
//! ```rust,ignore
//! let op = ready("5".to_string()) | to_int | add_five | to_string;
//! assert_eq!(op.get().unwrap(), "10");
//! ```
//!
//! Failures travel the same rails as values: a failed predecessor
//! skips every following callback and surfaces from `get()` at the
//! end of the chain.

mod value;

use crate::op::{AsyncOp, Completer, Failure};

use std::ops::BitOr;

/// A value the pipe operator can produce a single-level op from.
///
/// Implemented for `AsyncOp<T>` (subscribe and flatten, recursively)
/// and for leaf value types (complete immediately). The callback side
/// of `op | callback` must return a type implementing this.
pub trait IntoAsyncOp: Sized + 'static {
    /// The value type left after all op nesting is collapsed.
    type Item: 'static;

    /// Wraps `self` into a single-level op.
    fn into_async_op(self) -> AsyncOp<Self::Item>;

    /// Delivers `self` into `target`, collapsing nesting on the way.
    fn bind_into(self, target: Completer<Self::Item>);
}

impl<T: IntoAsyncOp> IntoAsyncOp for AsyncOp<T> {
    type Item = T::Item;

    fn into_async_op(self) -> AsyncOp<T::Item> {
        let (node, completer) = AsyncOp::manual();
        self.bind_into(completer);
        node
    }

    fn bind_into(self, target: Completer<T::Item>) {
        // returned mid-flight: a lazily created inner op starts now
        self.start();

        let holder = target.clone();
        self.on_ready(move |outcome| match outcome {
            Ok(value) => value.bind_into(target),
            Err(err) => target.complete(Err(err)),
        });
        // the waiter owns the inner op; dropping the waiter abandons it
        holder.adopt(Box::new(self));
    }
}

impl<T, F, R> BitOr<F> for AsyncOp<T>
where
    T: 'static,
    F: FnOnce(T) -> R + 'static,
    R: IntoAsyncOp,
{
    type Output = AsyncOp<R::Item>;

    /// Chains `callback` onto this op.
    ///
    /// A finished operand runs the callback synchronously; otherwise a
    /// chain link is built that owns this op and fires the callback
    /// from its completion path.
    fn bitor(self, callback: F) -> AsyncOp<R::Item> {
        if self.is_ready() {
            return match self.get() {
                Ok(value) => callback(value).into_async_op(),
                Err(err) => AsyncOp::failed(err),
            };
        }

        AsyncOp::link(self, move |value, completer| {
            callback(value).bind_into(completer);
        })
    }
}

/// Lifts a plain value into an immediately finished op, the entry
/// point of a pipeline over an already-known value.
pub fn ready<T: 'static>(value: T) -> AsyncOp<T> {
    AsyncOp::ready(value)
}

/// Lifts a captured failure into an immediately finished op.
pub fn failed<T: 'static>(error: Failure) -> AsyncOp<T> {
    AsyncOp::failed(error)
}
