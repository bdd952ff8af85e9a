//! Deferred Scheduling
//!
//! The scheduler coalesces bursts of input writes into a single computation
//! per deferred node. There are no worker threads: "deferred" means the
//! computation runs on this same thread, after the current batch of
//! synchronous port writes unwinds.
//!
//! # How batches work
//!
//! Every [`InputPort::set`](crate::port::InputPort::set) enters a write
//! scope. Write scopes nest; a thread-local depth counter tracks how deep we
//! are. Nodes that choose deferral enqueue themselves instead of running
//! inline, and when the *outermost* scope exits, the queue is drained. A
//! lone top-level write is therefore its own batch, while [`batch`] lets a
//! caller group several writes so a deferred node observes the final value
//! of every input and runs once.
//!
//! Draining itself holds a scope open, so computations that push values
//! further downstream feed any newly deferred nodes into the same drain
//! rather than recursing.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::sync::{Arc, Weak};

use tracing::trace;

use crate::graph::Node;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
    static QUEUE: RefCell<VecDeque<Weak<Node>>> = const { RefCell::new(VecDeque::new()) };
}

/// Scope guard keeping the depth counter balanced across panics.
struct ScopeGuard;

impl ScopeGuard {
    fn enter() -> Self {
        DEPTH.with(|depth| depth.set(depth.get() + 1));
        Self
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get() - 1));
    }
}

/// Group several port writes into one logical batch.
///
/// Deferred nodes triggered inside the closure run once, after the closure
/// returns, against the final state of their inputs.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    write_scope(f)
}

/// Run `f` inside a write scope, draining deferred work when the outermost
/// scope exits.
pub(crate) fn write_scope<R>(f: impl FnOnce() -> R) -> R {
    let guard = ScopeGuard::enter();
    let result = f();
    drop(guard);
    drain_if_idle();
    result
}

/// Enqueue a node for execution at the end of the current batch.
///
/// Duplicate requests for a node already pending are coalesced. A request
/// made outside any write scope (a manual `run` call) drains immediately.
pub(crate) fn defer(node: &Arc<Node>) {
    QUEUE.with(|queue| {
        let mut queue = queue.borrow_mut();
        let already_pending = queue
            .iter()
            .any(|weak| weak.upgrade().is_some_and(|pending| pending.id() == node.id()));
        if !already_pending {
            trace!(node = node.id().raw(), "queued deferred run");
            queue.push_back(Arc::downgrade(node));
        }
    });
    drain_if_idle();
}

fn drain_if_idle() {
    if DEPTH.with(Cell::get) > 0 {
        return;
    }
    if QUEUE.with(|queue| queue.borrow().is_empty()) {
        return;
    }

    // Hold a scope open for the whole drain so nested writes and deferrals
    // join this drain instead of starting another.
    let _guard = ScopeGuard::enter();
    loop {
        let next = QUEUE.with(|queue| queue.borrow_mut().pop_front());
        let Some(weak) = next else { break };
        // Nodes torn down while pending are skipped.
        if let Some(node) = weak.upgrade() {
            node.process_now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Completion, Compute, InputTrigger};
    use crate::port::InputPort;
    use crate::value::Value;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records the values of both inputs at computation time.
    struct Snapshot {
        observed: Arc<Mutex<Vec<(Option<Value>, Option<Value>)>>>,
    }

    impl Compute for Snapshot {
        fn compute(&self, node: &Arc<Node>, done: Completion) {
            let inputs = node.inputs();
            self.observed.lock().push((inputs[0].get(), inputs[1].get()));
            done.finish();
        }
    }

    fn snapshot_node() -> (Arc<Node>, Arc<Mutex<Vec<(Option<Value>, Option<Value>)>>>) {
        let observed = Arc::new(Mutex::new(Vec::new()));
        let node = Node::with_compute(
            InputTrigger::Any,
            Snapshot {
                observed: observed.clone(),
            },
        );
        node.attach_input(InputPort::with_key("a"));
        node.attach_input(InputPort::with_key("b"));
        (node, observed)
    }

    #[test]
    fn batched_writes_coalesce_into_one_run() {
        let (node, observed) = snapshot_node();

        batch(|| {
            node.input("a").unwrap().set(Some(Value::from(1.0)));
            node.input("b").unwrap().set(Some(Value::from(2.0)));
            // Nothing has run inside the batch.
            assert!(observed.lock().is_empty());
        });

        let runs = observed.lock();
        assert_eq!(runs.len(), 1);
        assert_eq!(
            runs[0],
            (Some(Value::Number(1.0)), Some(Value::Number(2.0)))
        );
    }

    #[test]
    fn separate_top_level_writes_are_separate_batches() {
        let (node, observed) = snapshot_node();

        node.input("a").unwrap().set(Some(Value::from(1.0)));
        node.input("b").unwrap().set(Some(Value::from(2.0)));

        let runs = observed.lock();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0], (Some(Value::Number(1.0)), None));
        assert_eq!(
            runs[1],
            (Some(Value::Number(1.0)), Some(Value::Number(2.0)))
        );
    }

    #[test]
    fn manual_run_outside_a_batch_executes_before_returning() {
        let (node, observed) = snapshot_node();
        node.run();
        assert_eq!(observed.lock().len(), 1);
    }

    #[test]
    fn nested_batches_drain_once_at_the_outermost_exit() {
        let (node, observed) = snapshot_node();

        batch(|| {
            batch(|| {
                node.input("a").unwrap().set(Some(Value::from(1.0)));
            });
            // Still inside the outer batch.
            assert!(observed.lock().is_empty());
            node.input("b").unwrap().set(Some(Value::from(2.0)));
        });

        assert_eq!(observed.lock().len(), 1);
    }

    #[test]
    fn node_dropped_while_pending_is_skipped() {
        let runs = Arc::new(AtomicUsize::new(0));

        struct Counting {
            runs: Arc<AtomicUsize>,
        }
        impl Compute for Counting {
            fn compute(&self, _node: &Arc<Node>, done: Completion) {
                self.runs.fetch_add(1, Ordering::SeqCst);
                done.finish();
            }
        }

        let node = Node::with_compute(InputTrigger::Any, Counting { runs: runs.clone() });
        node.attach_input(InputPort::with_key("a"));
        node.attach_input(InputPort::with_key("b"));
        let a = node.input("a").unwrap();

        batch(move || {
            a.set(Some(Value::from(1.0)));
            drop(node);
        });

        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
