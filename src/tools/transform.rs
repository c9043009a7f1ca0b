use crate::op::AsyncOp;
use crate::pipe::IntoAsyncOp;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Maps `stage` over a batch and collects the results in input order.
///
/// Every element's op runs concurrently on the loop; completion order
/// does not matter, each result lands in its element's slot. The
/// returned op completes once every slot is filled.
///
/// The first failure completes the batch with that failure: remaining
/// in-flight elements are abandoned and elements not yet handed to
/// `stage` never are.
///
/// A synchronous stage (one returning plain values) makes the whole
/// batch finish synchronously.
pub fn transform<I, F, R>(items: Vec<I>, mut stage: F) -> AsyncOp<Vec<R::Item>>
where
    I: 'static,
    R: IntoAsyncOp,
    F: FnMut(I) -> R + 'static,
{
    let (out, completer) = AsyncOp::manual();

    let total = items.len();
    if total == 0 {
        completer.set_ready(Vec::new());
        return out;
    }

    let results: Rc<RefCell<Vec<Option<R::Item>>>> =
        Rc::new(RefCell::new((0..total).map(|_| None).collect()));
    let remaining = Rc::new(Cell::new(total));

    for (index, item) in items.into_iter().enumerate() {
        // a failure already completed the batch, skip the rest
        if !completer.is_open() {
            break;
        }

        let op = stage(item).into_async_op();
        op.start();

        let results = results.clone();
        let remaining = remaining.clone();
        let c = completer.clone();
        op.on_ready(move |outcome| match outcome {
            Ok(value) => {
                results.borrow_mut()[index] = Some(value);
                remaining.set(remaining.get() - 1);
                if remaining.get() == 0 {
                    let done: Vec<R::Item> = results
                        .borrow_mut()
                        .iter_mut()
                        .map(|slot| slot.take().expect("batch slot filled twice"))
                        .collect();
                    c.set_ready(done);
                }
            }
            Err(err) => c.set_error(err),
        });
        completer.adopt(Box::new(op));
    }

    out
}
