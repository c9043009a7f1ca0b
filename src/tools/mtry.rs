use crate::op::{AsyncOp, Failure};

/// Lifts a fallible synchronous call into an already finished op.
///
/// An `Err` becomes a captured failure, so fallible setup code can sit
/// at the head of a pipeline and ride the same failure channel as the
/// asynchronous stages behind it.
///
/// # Examples
///
/// ```rust,ignore
/// let op = mtry(|| std::fs::read("manifest.lock")) | parse_manifest;
/// ```
pub fn mtry<T, E, F>(call: F) -> AsyncOp<T>
where
    T: 'static,
    E: Into<Failure>,
    F: FnOnce() -> Result<T, E>,
{
    match call() {
        Ok(value) => AsyncOp::ready(value),
        Err(err) => AsyncOp::failed(err.into()),
    }
}
