//! Leaf implementations of [`IntoAsyncOp`](super::IntoAsyncOp).
//!
//! A leaf value completes the receiving op on the spot. The standard
//! scalars and the common container shapes are covered here; domain
//! value types opt in with [`pipe_operand!`](crate::pipe_operand).

use super::IntoAsyncOp;
use crate::op::{AsyncOp, Completer};

/// Marks value types as plain pipe operands.
///
/// A stage returning one of these completes its op immediately, as
/// opposed to returning an [`AsyncOp`](crate::op::AsyncOp), which is
/// subscribed to and flattened.
///
/// # Examples
///
/// ```rust,ignore
/// struct RepoInfo { alias: String }
///
/// rivulet::pipe_operand!(RepoInfo);
///
/// let op = fetch_index(url) | (|raw| RepoInfo { alias: parse(raw) });
/// ```
#[macro_export]
macro_rules! pipe_operand {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::pipe::IntoAsyncOp for $ty {
            type Item = Self;

            fn into_async_op(self) -> $crate::op::AsyncOp<Self> {
                $crate::op::AsyncOp::ready(self)
            }

            fn bind_into(self, target: $crate::op::Completer<Self>) {
                target.set_ready(self);
            }
        }
    )+};
}

pipe_operand!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    String,
    &'static str,
    std::path::PathBuf,
    std::time::Duration,
);

// The generic containers cannot go through the macro; they carry their
// element types along as leaves.

impl<T: 'static> IntoAsyncOp for Vec<T> {
    type Item = Self;

    fn into_async_op(self) -> AsyncOp<Self> {
        AsyncOp::ready(self)
    }

    fn bind_into(self, target: Completer<Self>) {
        target.set_ready(self);
    }
}

impl<T: 'static> IntoAsyncOp for Option<T> {
    type Item = Self;

    fn into_async_op(self) -> AsyncOp<Self> {
        AsyncOp::ready(self)
    }

    fn bind_into(self, target: Completer<Self>) {
        target.set_ready(self);
    }
}

impl<T: 'static> IntoAsyncOp for Box<T> {
    type Item = Self;

    fn into_async_op(self) -> AsyncOp<Self> {
        AsyncOp::ready(self)
    }

    fn bind_into(self, target: Completer<Self>) {
        target.set_ready(self);
    }
}

/// `Result` flows through pipelines as a plain value: recoverable,
/// inspectable errors belong in the value channel, the captured
/// [`Failure`](crate::op::Failure) path is for conditions no stage
/// handles.
impl<T: 'static, E: 'static> IntoAsyncOp for Result<T, E> {
    type Item = Self;

    fn into_async_op(self) -> AsyncOp<Self> {
        AsyncOp::ready(self)
    }

    fn bind_into(self, target: Completer<Self>) {
        target.set_ready(self);
    }
}
