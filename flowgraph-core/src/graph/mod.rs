//! Graph Execution
//!
//! This module holds the execution unit of the dataflow graph and its
//! supporting machinery:
//!
//! - [`Node`]: owns input and output ports, evaluates its trigger policy on
//!   every input change, and schedules its computation directly or deferred.
//! - [`InputTrigger`]: the per-node rule deciding when enough inputs are
//!   present to run.
//! - [`Compute`]: the pluggable computation a concrete node type supplies.
//! - [`scheduler`]: the same-thread deferral queue that coalesces bursts of
//!   input writes into a single run.
//! - [`Graph`]: a thin collection of nodes with a serializability check.
//!
//! # Design Decisions
//!
//! 1. Nodes are concrete; per-type behavior lives in a [`Compute`] strategy
//!    rather than subclassing. The shared trigger and scheduling machinery
//!    never needs to know what a node computes.
//!
//! 2. Deferral is cooperative and same-thread. "Deferred" means the
//!    computation runs after the current batch of synchronous port writes
//!    unwinds, never on another thread.
//!
//! 3. Cancellation is a one-shot flag per node. The flag doubles as the
//!    cycle guard: the second visit to a node in a cancellation sweep is
//!    short-circuited, so side effects fire exactly once even in cyclic
//!    graphs.

mod collection;
mod compute;
mod node;
pub mod scheduler;
mod trigger;

pub use collection::Graph;
pub use compute::{AssembleColor, Completion, Compute, Passthrough, Sum};
pub use node::{Node, NodeId};
pub use scheduler::batch;
pub use trigger::InputTrigger;
