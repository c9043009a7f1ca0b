use super::state::State;

use std::any::Any;
use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll, Waker};

/// A failure captured by a pipeline stage.
///
/// Stored in the result slot in place of a value and re-raised when
/// [`AsyncOp::get`] is called, or forwarded transparently through the
/// remaining links of a chain.
pub type Failure = anyhow::Error;

type ReadyFn<T> = Box<dyn FnOnce(Result<T, Failure>)>;
type BodyFn<T> = Box<dyn FnOnce(Completer<T>)>;

/// Shared completion record behind an [`AsyncOp`] handle.
///
/// All mutation happens on the single reactor thread, either during
/// composition or inside a single resumption callback, so interior
/// mutability through `RefCell` is sufficient.
pub(crate) struct Shared<T> {
    state: State,

    /// Result slot; filled exactly once, and only when no continuation
    /// is registered to forward the result instead.
    slot: Option<Result<T, Failure>>,

    /// Deferred body of a lazily started operation.
    body: Option<BodyFn<T>>,

    /// Continuation registered by the next chain link. At most one; an
    /// op has exactly one consumer.
    ready_cb: Option<ReadyFn<T>>,

    /// Waker of a structured-style consumer awaiting this op.
    waker: Option<Waker>,

    /// Non-owning observer, fired synchronously on completion when no
    /// continuation consumed the result.
    notify_cb: Option<Box<dyn FnOnce()>>,

    /// Producer cleanup, fired when the op is dropped before it
    /// finished. Registration order is preserved, firing is newest
    /// first.
    destroy_cbs: Vec<Box<dyn FnOnce()>>,

    /// Everything this op keeps alive: predecessor links, inner ops a
    /// callback returned, parked producers. Dropping the op drops
    /// these, which is what abandons the work they represent.
    owned: Vec<Box<dyn Any>>,
}

impl<T> Drop for Shared<T> {
    /// Runs the registered destroy callbacks if the op never finished.
    ///
    /// The `owned` chain links drop right after, unwinding the whole
    /// pipeline behind this op.
    fn drop(&mut self) {
        if self.state != State::Finished {
            for cb in self.destroy_cbs.drain(..).rev() {
                cb();
            }
        }
    }
}

/// A handle to the eventual result of an operation.
///
/// An `AsyncOp` is move-only and has exactly one consumer. It can be
/// composed with further stages through the pipe operator (see the
/// [`pipe`](crate::pipe) module), awaited from an `async` body, or
/// observed through [`register_notify`](Self::register_notify).
///
/// There is no explicit cancel operation: dropping the handle abandons
/// whatever work is still in flight. Side effects already performed
/// are not undone, but nothing past the current suspension point runs
/// and no callback fires afterwards.
pub struct AsyncOp<T> {
    pub(crate) shared: Rc<RefCell<Shared<T>>>,
}

impl<T: 'static> AsyncOp<T> {
    fn with_state(state: State) -> Self {
        AsyncOp {
            shared: Rc::new(RefCell::new(Shared {
                state,
                slot: None,
                body: None,
                ready_cb: None,
                waker: None,
                notify_cb: None,
                destroy_cbs: Vec::new(),
                owned: Vec::new(),
            })),
        }
    }

    /// Creates an op that is finished before any reactor turn, holding
    /// `value`.
    pub fn ready(value: T) -> Self {
        let op = Self::with_state(State::Finished);
        op.shared.borrow_mut().slot = Some(Ok(value));
        op
    }

    /// Creates an op that is finished right away with a captured
    /// failure. [`get`](Self::get) re-raises it.
    pub fn failed(error: Failure) -> Self {
        let op = Self::with_state(State::Finished);
        op.shared.borrow_mut().slot = Some(Err(error));
        op
    }

    /// Creates a pending op together with its producer side.
    ///
    /// This is the integration path for callback-style producers that
    /// do their own work and deliver exactly once through the
    /// [`Completer`]. The work is assumed to already be under way, so
    /// the op starts in the `Running` state.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let (op, completer) = AsyncOp::manual();
    /// legacy_api.fetch(url, move |bytes| completer.set_ready(bytes));
    /// ```
    pub fn manual() -> (Self, Completer<T>) {
        let op = Self::with_state(State::Running);
        let completer = Completer {
            shared: Rc::downgrade(&op.shared),
        };
        (op, completer)
    }

    /// Creates an op whose body does not run until [`start`](Self::start)
    /// is called or the op is first awaited.
    pub fn lazy(body: impl FnOnce(Completer<T>) + 'static) -> Self {
        let op = Self::with_state(State::Pending);
        op.shared.borrow_mut().body = Some(Box::new(body));
        op
    }

    /// Creates an op whose body begins running at construction, up to
    /// its first suspension point.
    pub fn eager(body: impl FnOnce(Completer<T>) + 'static) -> Self {
        let op = Self::with_state(State::Running);
        let completer = Completer {
            shared: Rc::downgrade(&op.shared),
        };
        body(completer);
        op
    }

    /// Starts a lazily created op.
    ///
    /// A no-op unless the op is still `Pending`. On a chain this
    /// cascades down to the innermost unstarted link.
    pub fn start(&self) {
        start_shared(&self.shared);
    }

    /// Returns true once the result is available.
    pub fn is_ready(&self) -> bool {
        self.shared.borrow().state == State::Finished
    }

    /// Returns the current lifecycle state. States only ever advance,
    /// `Pending` to `Running` to `Finished`.
    pub fn state(&self) -> State {
        self.shared.borrow().state
    }

    /// Extracts the stored value, or re-raises the captured failure.
    ///
    /// # Panics
    ///
    /// Panics if the op is not ready. Reading a result that does not
    /// exist yet is a usage error, not a recoverable condition; drive
    /// the reactor (or check [`is_ready`](Self::is_ready)) first.
    pub fn get(self) -> Result<T, Failure> {
        let mut shared = self.shared.borrow_mut();
        assert!(
            shared.state == State::Finished,
            "attempted to read an async op that is not ready"
        );
        shared.slot.take().expect("result already taken")
    }

    /// Registers an observer fired synchronously when the op finishes.
    ///
    /// If the op is already finished the callback runs immediately,
    /// exactly once, during registration. An existing callback is
    /// replaced.
    ///
    /// The callback fires from within the completing producer's own
    /// call frame. It must not destroy this op synchronously while
    /// other handles to it are still live on that frame; the safe
    /// pattern is to post follow-up work to the event loop with
    /// [`invoke_after`](crate::reactor::EventLoop::invoke_after) and
    /// return, deferring teardown to a later reactor turn.
    pub fn register_notify(&self, callback: impl FnOnce() + 'static) {
        if self.is_ready() {
            callback();
            return;
        }
        self.shared.borrow_mut().notify_cb = Some(Box::new(callback));
    }

    /// Removes a previously registered notify callback.
    ///
    /// Must be called when the resources captured by the callback go
    /// out of scope before the op completes.
    pub fn clear_notify(&self) {
        self.shared.borrow_mut().notify_cb = None;
    }

    /// Registers cleanup that runs if the op is dropped before it
    /// finished.
    ///
    /// Producers whose side effects are externally visible (a request
    /// already handed to a dispatcher, a temporary file) use this to
    /// tie their cleanup to abandonment. Callbacks never fire after a
    /// normal completion.
    pub fn register_destroy(&self, callback: impl FnOnce() + 'static) {
        let mut shared = self.shared.borrow_mut();
        if shared.state != State::Finished {
            shared.destroy_cbs.push(Box::new(callback));
        }
    }

    /// Registers the single continuation consuming this op's result.
    ///
    /// If the result is already stored the continuation runs
    /// immediately; otherwise it fires from within the producer's
    /// completion path, which is free to drop this op as soon as the
    /// continuation returns.
    pub(crate) fn on_ready(&self, callback: impl FnOnce(Result<T, Failure>) + 'static) {
        if self.is_ready() {
            let outcome = self
                .shared
                .borrow_mut()
                .slot
                .take()
                .expect("result already taken");
            callback(outcome);
            return;
        }
        let mut shared = self.shared.borrow_mut();
        debug_assert!(
            shared.ready_cb.is_none(),
            "an async op has exactly one consumer"
        );
        shared.ready_cb = Some(Box::new(callback));
    }

    /// Parks something this op must keep alive until it completes or
    /// is dropped.
    pub(crate) fn adopt(&self, owned: Box<dyn Any>) {
        self.shared.borrow_mut().owned.push(owned);
    }

    /// Builds a chain link that owns `prev` and produces its own
    /// result from `prev`'s through `apply`.
    ///
    /// The link mirrors `prev`'s starting policy: if `prev` has not
    /// been started, neither has the link, and starting the link
    /// cascades down.
    pub(crate) fn link<P: 'static>(
        prev: AsyncOp<P>,
        apply: impl FnOnce(P, Completer<T>) + 'static,
    ) -> AsyncOp<T> {
        let node = if prev.state() == State::Pending {
            let prev_shared = prev.shared.clone();
            AsyncOp::lazy(move |_| start_shared(&prev_shared))
        } else {
            AsyncOp::with_state(State::Running)
        };

        let completer = Completer {
            shared: Rc::downgrade(&node.shared),
        };
        prev.on_ready(move |outcome| match outcome {
            Ok(value) => apply(value, completer),
            // a failed predecessor skips the stage entirely
            Err(err) => completer.complete(Err(err)),
        });
        node.adopt(Box::new(prev));
        node
    }
}

/// Starts a pending op through its shared record.
///
/// Split out of [`AsyncOp::start`] so chain links can cascade a start
/// to a predecessor they only hold a shared record of.
pub(crate) fn start_shared<T>(shared: &Rc<RefCell<Shared<T>>>) {
    let body = {
        let mut s = shared.borrow_mut();
        if s.state != State::Pending {
            return;
        }
        s.state = State::Running;
        s.body.take()
    };
    if let Some(body) = body {
        body(Completer {
            shared: Rc::downgrade(shared),
        });
    }
}

/// Delivers the final outcome into a shared record.
///
/// Exactly one of two things happens:
/// - a registered continuation receives the outcome directly, without
///   it ever being stored, or
/// - the outcome is stored in the slot, and the waker and notify
///   callback (if any) fire.
///
/// Everything the op kept alive is released first: by the time the
/// outcome moves on, the links behind this op have fully unwound.
///
/// The continuation is allowed to drop this op as soon as it has the
/// outcome, so nothing here touches `shared` after handing it over.
pub(crate) fn complete_shared<T>(shared: Rc<RefCell<Shared<T>>>, outcome: Result<T, Failure>) {
    enum Next<T> {
        Forward(ReadyFn<T>, Result<T, Failure>),
        Store(Option<Waker>, Option<Box<dyn FnOnce()>>),
    }

    let (next, owned) = {
        let mut s = shared.borrow_mut();
        if s.state == State::Finished {
            // producers must deliver exactly once; the first result stands
            debug_assert!(false, "async op completed twice");
            log::warn!("async op completed twice, dropping the second result");
            return;
        }
        s.state = State::Finished;
        let owned = std::mem::take(&mut s.owned);
        let next = if let Some(cb) = s.ready_cb.take() {
            Next::Forward(cb, outcome)
        } else {
            s.slot = Some(outcome);
            Next::Store(s.waker.take(), s.notify_cb.take())
        };
        (next, owned)
    };

    drop(owned);

    match next {
        Next::Forward(cb, outcome) => cb(outcome),
        Next::Store(waker, notify) => {
            if let Some(waker) = waker {
                waker.wake();
            }
            if let Some(notify) = notify {
                notify();
            }
        }
    }
}

/// The producer side of an [`AsyncOp`].
///
/// Holds only a weak reference to the op: if the consumer abandoned
/// the operation by dropping its handle, delivering a result through a
/// leftover completer is a silent no-op. This is also what makes the
/// losing side of a completion/timeout race harmless.
pub struct Completer<T> {
    pub(crate) shared: Weak<RefCell<Shared<T>>>,
}

impl<T> Clone for Completer<T> {
    fn clone(&self) -> Self {
        Completer {
            shared: self.shared.clone(),
        }
    }
}

impl<T: 'static> Completer<T> {
    /// Delivers the result. Must be called at most once across all
    /// clones of this completer; a second delivery is a producer bug
    /// (asserted in debug builds, logged and dropped otherwise).
    pub fn set_ready(self, value: T) {
        self.complete(Ok(value));
    }

    /// Delivers a captured failure in place of a value.
    pub fn set_error(self, error: Failure) {
        self.complete(Err(error));
    }

    pub(crate) fn complete(self, outcome: Result<T, Failure>) {
        let Some(shared) = self.shared.upgrade() else {
            // the op was abandoned, the work's result has no taker
            return;
        };
        complete_shared(shared, outcome);
    }

    /// True while the op is still alive and unfinished.
    pub(crate) fn is_open(&self) -> bool {
        self.shared
            .upgrade()
            .map(|s| s.borrow().state != State::Finished)
            .unwrap_or(false)
    }

    /// Parks `owned` inside the op this completer feeds.
    pub(crate) fn adopt(&self, owned: Box<dyn Any>) {
        if let Some(shared) = self.shared.upgrade() {
            shared.borrow_mut().owned.push(owned);
        }
    }

    /// Like [`adopt`](Self::adopt), but replaces everything parked so
    /// far. Used by combinators that hold one attempt at a time.
    pub(crate) fn adopt_replacing(&self, owned: Box<dyn Any>) {
        if let Some(shared) = self.shared.upgrade() {
            let mut s = shared.borrow_mut();
            s.owned.clear();
            s.owned.push(owned);
        }
    }
}

impl<T: 'static> Future for AsyncOp<T> {
    /// Awaiting an op yields its value or the captured failure.
    type Output = Result<T, Failure>;

    /// Polls the op.
    ///
    /// The first poll starts a lazily created op, matching the rule
    /// that awaiting counts as starting. While unfinished, the waker
    /// is (re-)registered and the poll returns `Pending`.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        start_shared(&self.shared);

        let mut shared = self.shared.borrow_mut();
        if shared.state == State::Finished {
            return Poll::Ready(shared.slot.take().expect("result already taken"));
        }
        shared.waker = Some(cx.waker().clone());
        Poll::Pending
    }
}
