//! Flowgraph Core
//!
//! A push-based dataflow graph engine: a network of processing nodes
//! connected by typed input and output ports, where setting an input value
//! can trigger a node's computation and push results downstream. The crate
//! is the execution core for a host application that builds the topology
//! and owns everything around it (UI, persistence, node libraries).
//!
//! # Architecture
//!
//! - `value`: the type-erased [`Value`] carried between ports
//! - `port`: [`InputPort`] (validated value slot, change notification) and
//!   [`OutputPort`] (weak fan-out to downstream inputs)
//! - `graph`: [`Node`] execution, [`InputTrigger`] policies, the [`Compute`]
//!   strategy, same-thread deferred scheduling, and the [`Graph`] aggregator
//! - `serialize`: dictionary-shaped node representations for hosts that
//!   persist graphs
//!
//! # Example
//!
//! ```rust
//! use flowgraph_core::{batch, InputPort, InputTrigger, Node, OutputPort, Sum, Value};
//!
//! // A two-input adder that runs when any input changes.
//! let adder = Node::with_compute(InputTrigger::Any, Sum);
//! adder.attach_input(InputPort::number("a"));
//! adder.attach_input(InputPort::number("b"));
//! let out = adder.attach_output(OutputPort::new());
//!
//! // Observe the result downstream.
//! let result = InputPort::new();
//! out.connect(&result);
//!
//! // Two writes, one batch: the adder computes once, against both values.
//! batch(|| {
//!     adder.input("a").unwrap().set(Some(Value::from(20.0)));
//!     adder.input("b").unwrap().set(Some(Value::from(22.0)));
//! });
//! assert_eq!(result.get(), Some(Value::Number(42.0)));
//! ```
//!
//! Graphs may legally contain cycles; cancellation propagates through them
//! exactly once per node. See [`Node::cancel`].

pub mod graph;
pub mod port;
pub mod serialize;
pub mod value;

pub use graph::{
    batch, AssembleColor, Completion, Compute, Graph, InputTrigger, Node, NodeId, Passthrough, Sum,
};
pub use port::{InputPort, OutputPort, PortId};
pub use serialize::SerializeError;
pub use value::Value;
