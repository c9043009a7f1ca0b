use std::cmp::Ordering;
use std::time::Instant;

/// An entry in the reactor timer queue.
///
/// `TimerEntry` represents a callback scheduled for a specific
/// deadline, stored inside a binary heap ordered by deadline.
///
/// Entries sharing a deadline fire in registration order; the
/// sequence number breaks the tie.
pub(crate) struct TimerEntry {
    /// The time at which the timer should fire.
    pub(crate) deadline: Instant,

    /// Registration sequence number, monotonically increasing.
    pub(crate) seq: u64,

    /// Callback to run when the deadline is reached.
    pub(crate) callback: Box<dyn FnOnce()>,
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    /// Two timer entries are equal if deadline and sequence match.
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Ord for TimerEntry {
    /// Orders timer entries by deadline, then registration order.
    ///
    /// Note that the comparison is **reversed** so that a
    /// `BinaryHeap<TimerEntry>` behaves as a min-heap,
    /// where the earliest deadline is popped first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for TimerEntry {
    /// Partial ordering consistent with [`Ord`].
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
