//! Ports
//!
//! Ports are the connection points of the graph. An input port holds the
//! latest value pushed to it and notifies its owning node when that value
//! changes. An output port fans a computed result out to any number of
//! downstream input ports.
//!
//! # Ownership
//!
//! A node owns its ports (`Arc`), while an output port references downstream
//! inputs weakly. A downstream node can be torn down at any time; its input
//! ports simply disappear from the connection tables of whatever outputs
//! pointed at them.
//!
//! # Identity
//!
//! Ports are identified by a process-unique [`PortId`], never by key or
//! value. Two ports created with the same key are still distinct ports.

mod input;
mod output;

pub use input::{InputPort, PortId};
pub use output::OutputPort;
