//! Trigger Policies
//!
//! A trigger policy decides what inputs need to be set in order for a node
//! to run.

/// Decides when a node's accumulated input state is sufficient to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputTrigger {
    /// The node never runs automatically; the caller invokes `run` directly.
    Manual,
    /// Run as soon as any input holds a present value.
    Any,
    /// Run only when every input holds a present value.
    All,
    /// Run once every input has been set at least once over the node's
    /// lifetime; values are retained, so afterwards any single change
    /// retriggers.
    AllAtLeastOnce,
    /// The node always reports itself runnable; the node's own computation
    /// decides via [`Compute::should_run`](crate::graph::Compute::should_run).
    Custom,
}

impl InputTrigger {
    /// True for policies that can fire on a single input change.
    ///
    /// A node with more than one input and such a policy defers its
    /// computation, so a burst of writes in one batch produces one run.
    pub(crate) fn fires_on_single_input(self) -> bool {
        matches!(self, Self::Any | Self::AllAtLeastOnce | Self::Custom)
    }
}
