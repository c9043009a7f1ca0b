use super::task::{TaskFuture, WakeQueue, make_waker};
use super::timer::TimerEntry;
use crate::op::{AsyncOp, Failure};
use crate::utils::slab::Slab;

use std::cell::{Cell, RefCell};
use std::collections::{BinaryHeap, VecDeque};
use std::future::Future;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::thread;
use std::time::{Duration, Instant};

/// The single-threaded event loop driving resumption.
///
/// The loop owns a timer queue and a table of spawned tasks. One turn
/// fires every due timer in deadline order (FIFO on equal deadlines)
/// and then polls every task whose waker fired. Between turns the
/// thread sleeps until the next deadline.
///
/// `EventLoop` is a cheap handle; clones refer to the same loop.
///
/// # Examples
///
/// ```rust,ignore
/// let ev = EventLoop::new();
/// let op = delay_value(&ev, 42, Duration::from_millis(10));
/// assert_eq!(ev.run_until(op).unwrap(), 42);
/// ```
#[derive(Clone)]
pub struct EventLoop {
    inner: Rc<Inner>,
}

pub(crate) struct Inner {
    /// Pending timers, earliest deadline first.
    timers: RefCell<BinaryHeap<TimerEntry>>,

    /// Registration counter for FIFO firing of equal deadlines.
    timer_seq: Cell<u64>,

    /// Spawned tasks. A slot is `None` while its future is taken out
    /// for polling.
    tasks: RefCell<Slab<Option<TaskFuture>>>,

    /// Ids of tasks whose wakers fired since the last turn.
    woken: WakeQueue,

    /// Set by [`EventLoop::quit`]; checked after every turn.
    quit: Cell<bool>,
}

impl EventLoop {
    /// Creates a new, empty event loop.
    pub fn new() -> Self {
        EventLoop {
            inner: Rc::new(Inner {
                timers: RefCell::new(BinaryHeap::new()),
                timer_seq: Cell::new(0),
                tasks: RefCell::new(Slab::new(16)),
                woken: Arc::new(Mutex::new(VecDeque::new())),
                quit: Cell::new(false),
            }),
        }
    }

    /// Schedules `callback` to run once `delay` has elapsed.
    ///
    /// A zero delay runs the callback on the next pass over the timer
    /// queue. This is the scheduling primitive notify callbacks use to
    /// defer teardown to a later reactor turn instead of destroying an
    /// op from inside its own completion path.
    pub fn invoke_after(&self, delay: Duration, callback: impl FnOnce() + 'static) {
        let seq = self.inner.timer_seq.get();
        self.inner.timer_seq.set(seq + 1);
        self.inner.timers.borrow_mut().push(TimerEntry {
            deadline: Instant::now() + delay,
            seq,
            callback: Box::new(callback),
        });
    }

    /// Spawns a structured-style body onto the loop, returning the op
    /// for its result.
    ///
    /// The body runs eagerly up to its first suspension point before
    /// `spawn` returns. Dropping the returned op cancels the task:
    /// statements past the suspension point it is parked at never run.
    pub fn spawn<T: 'static>(&self, future: impl Future<Output = T> + 'static) -> AsyncOp<T> {
        let (op, completer) = AsyncOp::manual();
        let wrapped: TaskFuture = Box::pin(async move {
            completer.set_ready(future.await);
        });
        let id = self.inner.tasks.borrow_mut().insert(Some(wrapped));

        let weak = Rc::downgrade(&self.inner);
        op.register_destroy(move || {
            if let Some(inner) = weak.upgrade() {
                inner.cancel_task(id);
            }
        });

        self.inner.poll_task(id);
        op
    }

    /// Runs the loop until [`quit`](Self::quit) is called or nothing
    /// that could ever fire remains.
    pub fn run(&self) {
        self.inner.quit.set(false);

        while !self.inner.quit.get() {
            self.turn();
            if self.inner.quit.get() {
                break;
            }

            let runnable = !self
                .inner
                .woken
                .lock()
                .expect("wake queue poisoned")
                .is_empty();
            if runnable {
                continue;
            }

            let next_deadline = self.inner.timers.borrow().peek().map(|t| t.deadline);
            match next_deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if deadline > now {
                        thread::sleep(deadline - now);
                    }
                }
                None => {
                    if !self.inner.tasks.borrow().is_empty() {
                        log::warn!(
                            "event loop stopping with suspended tasks but nothing to wake them"
                        );
                    }
                    break;
                }
            }
        }
    }

    /// Runs one pass: due timers first, then woken tasks.
    fn turn(&self) {
        loop {
            let due = {
                let mut timers = self.inner.timers.borrow_mut();
                match timers.peek() {
                    Some(entry) if entry.deadline <= Instant::now() => timers.pop(),
                    _ => None,
                }
            };
            match due {
                Some(entry) => {
                    log::trace!("firing timer seq {}", entry.seq);
                    (entry.callback)();
                }
                None => break,
            }
        }

        loop {
            let id = self
                .inner
                .woken
                .lock()
                .expect("wake queue poisoned")
                .pop_front();
            match id {
                Some(id) => {
                    log::trace!("resuming task {id}");
                    self.inner.poll_task(id);
                }
                None => break,
            }
        }
    }

    /// Asks the loop to stop after the current turn.
    pub fn quit(&self) {
        self.inner.quit.set(true);
    }

    /// Drives the loop until `op` completes, then extracts its result.
    ///
    /// Starts a lazily created chain first. This is the synchronous
    /// entry point used at the outermost edge of an application or a
    /// test.
    ///
    /// # Panics
    ///
    /// Panics if the loop runs out of work before the op completes.
    pub fn run_until<T: 'static>(&self, op: AsyncOp<T>) -> Result<T, Failure> {
        op.start();
        if !op.is_ready() {
            let weak = Rc::downgrade(&self.inner);
            op.register_notify(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.quit.set(true);
                }
            });
            self.run();
        }
        op.get()
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    /// Polls the task with the given id, if it still exists.
    ///
    /// The future is taken out of its slot for the duration of the
    /// poll so that code running inside it may freely spawn or cancel
    /// other tasks.
    fn poll_task(&self, id: usize) {
        let taken = self
            .tasks
            .borrow_mut()
            .get_mut(id)
            .and_then(Option::take);
        let Some(mut future) = taken else {
            // already finished or cancelled; stale wake-ups are no-ops
            return;
        };

        let waker = make_waker(id, self.woken.clone());
        let mut cx = Context::from_waker(&waker);

        match future.as_mut().poll(&mut cx) {
            Poll::Pending => {
                let mut future = Some(future);
                {
                    let mut tasks = self.tasks.borrow_mut();
                    if let Some(slot) = tasks.get_mut(id) {
                        *slot = future.take();
                    }
                }
                // cancelled while out being polled; the frame unwinds
                // here, outside the table borrow
                drop(future);
            }
            Poll::Ready(()) => {
                let freed = self.tasks.borrow_mut().remove(id);
                drop(freed);
                drop(future);
            }
        }
    }

    /// Drops the task with the given id, abandoning its body.
    fn cancel_task(&self, id: usize) {
        // take it out first: dropping the future can re-enter the
        // table (tasks own ops that own tasks)
        let removed = self.tasks.borrow_mut().remove(id);
        drop(removed);
    }
}
