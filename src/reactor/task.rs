use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Wake, Waker};

/// A structured-style body spawned onto the event loop, boxed and
/// pinned for the duration of its life in the task table.
pub(crate) type TaskFuture = Pin<Box<dyn Future<Output = ()>>>;

/// Queue of task ids whose wakers fired.
///
/// The loop is strictly single-threaded, but `Waker` must be `Send`
/// and `Sync` by contract, so the hand-off goes through a mutex. This
/// is the only synchronization in the crate.
pub(crate) type WakeQueue = Arc<Mutex<VecDeque<usize>>>;

/// Wakes a task by pushing its id onto the reactor's wake queue.
///
/// The reactor polls woken tasks in the order their wake-ups arrive;
/// there is no ordering guarantee across independent pipelines beyond
/// that.
pub(crate) struct TaskWaker {
    id: usize,
    queue: WakeQueue,
}

impl Wake for TaskWaker {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.queue
            .lock()
            .expect("wake queue poisoned")
            .push_back(self.id);
    }
}

/// Creates a [`Waker`] that reschedules the task with the given id.
pub(crate) fn make_waker(id: usize, queue: WakeQueue) -> Waker {
    Waker::from(Arc::new(TaskWaker { id, queue }))
}
