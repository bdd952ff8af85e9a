//! Pluggable Computation
//!
//! A concrete node type supplies its behavior through the [`Compute`] trait
//! instead of subclassing. The shared node machinery decides *when* to run;
//! the strategy decides *what* running means:
//!
//! 1. Read the current input values.
//! 2. Send results to the node's outputs.
//! 3. Call [`Completion::finish`] exactly once.
//!
//! The completion token is move-only, so a computation cannot finish twice.
//! A computation that drops its token without finishing leaves the node in
//! the processing state; the core does not detect or recover from that
//! contract violation.

use std::sync::{Arc, Weak};

use crate::graph::Node;
use crate::value::Value;

/// The pluggable computation step of a node.
///
/// `compute` may finish synchronously or hold on to the [`Completion`] token
/// and finish later; either way the node stays in the processing state (and
/// ignores further run requests) until the token is consumed.
pub trait Compute: Send + Sync {
    /// Perform the node's work against its current input values.
    fn compute(&self, node: &Arc<Node>, done: Completion);

    /// Trigger hook for [`InputTrigger::Custom`](crate::graph::InputTrigger::Custom)
    /// nodes. Ignored for every other policy.
    fn should_run(&self, _node: &Node) -> bool {
        true
    }

    /// Whether a run should be deferred to the end of the current write
    /// batch. The default defers when the node has more than one input and a
    /// policy that can fire on a single input change, so that a burst of
    /// writes produces one run against the final input state.
    fn use_deferred(&self, node: &Node) -> bool {
        node.input_count() > 1 && node.trigger().fires_on_single_input()
    }

    /// Called exactly once when the node transitions to cancelling.
    fn cancelled(&self, _node: &Node) {}

    /// Type tag for serialization, e.g. `"Sum"`.
    ///
    /// `None` (the default) marks the node as not serializable.
    fn serialized_type(&self) -> Option<&str> {
        None
    }

    /// Extra state needed to restore this computation's configuration.
    fn serialized_data(&self) -> Option<serde_json::Value> {
        None
    }
}

/// Move-only completion token for one run of a node.
///
/// Consuming the token records the node's processing time and clears its
/// processing flag.
pub struct Completion {
    node: Weak<Node>,
}

impl Completion {
    pub(crate) fn new(node: Weak<Node>) -> Self {
        Self { node }
    }

    /// Mark the run as finished.
    pub fn finish(self) {
        if let Some(node) = self.node.upgrade() {
            node.finish_processing();
        }
    }
}

/// Default computation: forwards the first present input value to every
/// output and finishes synchronously.
///
/// A placeholder so a bare node is still wired end to end, not a model for
/// real node semantics.
pub struct Passthrough;

impl Compute for Passthrough {
    fn compute(&self, node: &Arc<Node>, done: Completion) {
        let value = node.inputs().iter().find_map(|input| input.get());
        node.broadcast(value);
        done.finish();
    }

    fn serialized_type(&self) -> Option<&str> {
        Some("Passthrough")
    }
}

/// Adds every present numeric input and broadcasts the total.
pub struct Sum;

impl Compute for Sum {
    fn compute(&self, node: &Arc<Node>, done: Completion) {
        let total: f64 = node
            .inputs()
            .iter()
            .filter_map(|input| input.get().and_then(|v| v.as_number()))
            .sum();
        node.broadcast(Some(Value::Number(total)));
        done.finish();
    }

    fn serialized_type(&self) -> Option<&str> {
        Some("Sum")
    }
}

/// Assembles a color from numeric inputs keyed `r`, `g` and `b`.
///
/// Missing components default to zero; all components are clamped to the
/// `0.0..=1.0` range. Alpha is always one.
pub struct AssembleColor;

impl AssembleColor {
    fn component(node: &Node, key: &str) -> f64 {
        node.input(key)
            .and_then(|input| input.get())
            .and_then(|v| v.as_number())
            .unwrap_or(0.0)
            .clamp(0.0, 1.0)
    }
}

impl Compute for AssembleColor {
    fn compute(&self, node: &Arc<Node>, done: Completion) {
        let color = Value::color(
            Self::component(node, "r"),
            Self::component(node, "g"),
            Self::component(node, "b"),
        );
        node.broadcast(Some(color));
        done.finish();
    }

    fn serialized_type(&self) -> Option<&str> {
        Some("AssembleColor")
    }
}
