//! Output Port
//!
//! An output port is a fan-out point: it holds weak references to downstream
//! input ports and broadcasts each computed result to all of them. Because
//! the references are weak, a downstream node can be dropped while still
//! connected; its input simply stops appearing in the broadcast set. Dead
//! entries are pruned lazily on the next `send`.

use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::trace;

use crate::port::{InputPort, PortId};
use crate::value::Value;

/// A named fan-out point broadcasting a result to connected inputs.
///
/// The key can signify what part of a result the output carries, e.g. the
/// `r` output of an RGB node. Connections are keyed by input-port identity,
/// so reconnecting an already-connected input is a no-op.
pub struct OutputPort {
    key: Option<String>,
    connections: Mutex<IndexMap<PortId, Weak<InputPort>>>,
}

impl OutputPort {
    /// Create an output without a key.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            key: None,
            connections: Mutex::new(IndexMap::new()),
        })
    }

    /// Create an output with a key.
    pub fn with_key(key: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            key: Some(key.into()),
            connections: Mutex::new(IndexMap::new()),
        })
    }

    /// The optional key of this output.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Add a downstream connection.
    ///
    /// The reference is non-owning. Adding an already-connected input is
    /// idempotent.
    pub fn connect(&self, input: &Arc<InputPort>) {
        self.connections
            .lock()
            .insert(input.id(), Arc::downgrade(input));
    }

    /// Remove a downstream connection. No-op if not connected.
    pub fn disconnect(&self, input: &InputPort) {
        self.connections.lock().shift_remove(&input.id());
    }

    /// Number of currently live connections.
    pub fn connection_count(&self) -> usize {
        self.connections
            .lock()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Currently live downstream inputs, in connection order.
    ///
    /// Dead entries are dropped from the table as a side effect.
    pub fn live_connections(&self) -> Vec<Arc<InputPort>> {
        let mut table = self.connections.lock();
        table.retain(|_, weak| weak.strong_count() > 0);
        table.values().filter_map(Weak::upgrade).collect()
    }

    /// Broadcast a result to every live connection.
    ///
    /// Delivery is a plain `set` on each input, so each downstream node goes
    /// through its normal validation, change detection and trigger path.
    pub fn send(&self, value: Option<Value>) {
        // Collect before delivering: a delivery can recurse back into this
        // output through a cycle.
        let targets = self.live_connections();
        trace!(
            key = self.key.as_deref(),
            targets = targets.len(),
            "broadcasting result"
        );
        for input in targets {
            input.set(value.clone());
        }
    }
}

impl std::fmt::Debug for OutputPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputPort")
            .field("key", &self.key)
            .field("connections", &self.connection_count())
            .finish()
    }
}
