use crate::op::{AsyncOp, Completer};

/// Re-runs a pipeline while `pred` returns true for its result.
///
/// `make` builds a fresh pipeline for every round. The returned op is
/// lazy; the first round begins when it is started or awaited. Each
/// round runs to completion before `pred` inspects the value, and the
/// first value the predicate lets through becomes the result.
///
/// A failure ends the loop immediately and is forwarded as-is; use
/// [`retry`] when failures are what should trigger another round.
///
/// Only the current round is kept alive. Dropping the returned op
/// abandons it and no further round starts.
///
/// # Examples
///
/// ```rust,ignore
/// // poll a job until it leaves the queue
/// let op = redo_while(
///     move || fetch_status(&client, job),
///     |status| *status == Status::Queued,
/// );
/// ```
pub fn redo_while<T, F, P>(make: F, pred: P) -> AsyncOp<T>
where
    T: 'static,
    F: FnMut() -> AsyncOp<T> + 'static,
    P: FnMut(&T) -> bool + 'static,
{
    AsyncOp::lazy(move |completer| attempt(make, pred, completer))
}

fn attempt<T, F, P>(mut make: F, mut pred: P, completer: Completer<T>)
where
    T: 'static,
    F: FnMut() -> AsyncOp<T> + 'static,
    P: FnMut(&T) -> bool + 'static,
{
    loop {
        if !completer.is_open() {
            return;
        }
        let op = make();
        op.start();

        // rounds that finish synchronously loop here instead of
        // recursing through their own completion path
        if op.is_ready() {
            match op.get() {
                Ok(value) => {
                    if pred(&value) {
                        continue;
                    }
                    completer.set_ready(value);
                }
                Err(err) => completer.set_error(err),
            }
            return;
        }

        let c = completer.clone();
        op.on_ready(move |outcome| match outcome {
            Ok(value) => {
                if pred(&value) {
                    attempt(make, pred, c);
                } else {
                    c.set_ready(value);
                }
            }
            Err(err) => c.set_error(err),
        });
        completer.adopt_replacing(Box::new(op));
        return;
    }
}

/// Re-runs a pipeline after a failure, up to `limit` extra rounds.
///
/// `retry(3, make)` makes at most four attempts: the initial one plus
/// three retries. The first successful value wins; once the limit is
/// exhausted the last failure is forwarded.
pub fn retry<T, F>(limit: usize, make: F) -> AsyncOp<T>
where
    T: 'static,
    F: FnMut() -> AsyncOp<T> + 'static,
{
    AsyncOp::lazy(move |completer| retry_attempt(limit, make, completer))
}

fn retry_attempt<T, F>(mut left: usize, mut make: F, completer: Completer<T>)
where
    T: 'static,
    F: FnMut() -> AsyncOp<T> + 'static,
{
    loop {
        if !completer.is_open() {
            return;
        }
        let op = make();
        op.start();

        if op.is_ready() {
            match op.get() {
                Ok(value) => completer.set_ready(value),
                Err(err) if left == 0 => completer.set_error(err),
                Err(err) => {
                    left -= 1;
                    log::debug!("attempt failed, retrying ({left} left): {err:#}");
                    continue;
                }
            }
            return;
        }

        let c = completer.clone();
        op.on_ready(move |outcome| match outcome {
            Ok(value) => c.set_ready(value),
            Err(err) if left == 0 => c.set_error(err),
            Err(err) => {
                log::debug!("attempt failed, retrying ({} left): {err:#}", left - 1);
                retry_attempt(left - 1, make, c);
            }
        });
        completer.adopt_replacing(Box::new(op));
        return;
    }
}
