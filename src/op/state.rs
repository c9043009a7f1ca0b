/// Lifecycle state of an [`AsyncOp`](super::AsyncOp).
///
/// Transitions are monotonic: `Pending → Running → Finished`, or
/// `Running → Finished` directly for work that begins at construction.
/// A state never moves backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Created but not started. Only lazily started operations are
    /// ever observed in this state.
    Pending,

    /// The body is executing, or suspended somewhere mid-body waiting
    /// for an external event.
    Running,

    /// The result is available. No further execution happens.
    Finished,
}
