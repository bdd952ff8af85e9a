//! Input Port
//!
//! An input port is a single named value slot owned by a node. Writes go
//! through three gates before anyone hears about them:
//!
//! 1. The validation predicate, if one is installed. A rejected candidate
//!    leaves the stored value untouched and raises no signal.
//! 2. An equality check against the stored value. Writing the value that is
//!    already there (including absent over absent) is a no-op.
//! 3. Only then is the value replaced and the owning node notified,
//!    synchronously, on the writing thread.
//!
//! Every write runs inside a scheduler write scope so that nodes which chose
//! deferred processing run when the outermost write of the batch unwinds.

use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::trace;

use crate::graph::scheduler;
use crate::graph::Node;
use crate::value::Value;

/// Unique identifier for an input port.
///
/// Port identity for equality and hashing is this id, never the key or the
/// stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortId(u64);

impl PortId {
    /// Generate a new unique port ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for PortId {
    fn default() -> Self {
        Self::new()
    }
}

type Validator = Box<dyn Fn(&Value) -> bool + Send + Sync>;

/// A named, validated slot for a value pushed from upstream.
///
/// Inputs do not reference upstream nodes; they keep the latest result an
/// upstream node (or the host) pushed to them, ready for the owning node's
/// next computation.
pub struct InputPort {
    id: PortId,
    key: Option<String>,
    value: RwLock<Option<Value>>,
    validator: Option<Validator>,
    owner: RwLock<Weak<Node>>,
}

impl InputPort {
    /// Create an input without a key.
    pub fn new() -> Arc<Self> {
        Self::build(None, None)
    }

    /// Create an input with a key.
    pub fn with_key(key: impl Into<String>) -> Arc<Self> {
        Self::build(Some(key.into()), None)
    }

    /// Create an input with an optional key and a validation predicate.
    ///
    /// The predicate sees every present candidate value; clearing the port
    /// to absent always passes validation.
    pub fn with_validator<F>(key: Option<&str>, validator: F) -> Arc<Self>
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::build(key.map(str::to_string), Some(Box::new(validator)))
    }

    /// Create an input that only accepts [`Value::Number`].
    pub fn number(key: impl Into<String>) -> Arc<Self> {
        let key = key.into();
        Self::with_validator(Some(&key), Value::is_number)
    }

    /// Create an input that only accepts [`Value::Color`].
    pub fn color(key: impl Into<String>) -> Arc<Self> {
        let key = key.into();
        Self::with_validator(Some(&key), Value::is_color)
    }

    fn build(key: Option<String>, validator: Option<Validator>) -> Arc<Self> {
        Arc::new(Self {
            id: PortId::new(),
            key,
            value: RwLock::new(None),
            validator,
            owner: RwLock::new(Weak::new()),
        })
    }

    /// Get the port's unique ID.
    pub fn id(&self) -> PortId {
        self.id
    }

    /// The optional key of this input.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// The node this input belongs to, if it is attached and still alive.
    pub fn owner(&self) -> Option<Arc<Node>> {
        self.owner.read().upgrade()
    }

    /// Attach this port to its owning node.
    pub(crate) fn bind(&self, owner: Weak<Node>) {
        *self.owner.write() = owner;
    }

    /// Check a candidate against the validation predicate.
    ///
    /// Present candidates are passed to the predicate; the absent value is
    /// always considered valid.
    pub fn is_valid(&self, candidate: &Option<Value>) -> bool {
        match (candidate, &self.validator) {
            (Some(value), Some(validator)) => validator(value),
            _ => true,
        }
    }

    /// Get the current value.
    ///
    /// Pure read, no side effects.
    pub fn get(&self) -> Option<Value> {
        self.value.read().clone()
    }

    /// Push a value into this input.
    ///
    /// Fails silently if the validator rejects the candidate. Writing the
    /// currently stored value is a no-op. An applied write synchronously
    /// notifies the owning node, which evaluates its trigger policy and may
    /// run.
    pub fn set(&self, candidate: Option<Value>) {
        scheduler::write_scope(|| {
            if !self.is_valid(&candidate) {
                trace!(port = self.id.raw(), "input rejected by validator");
                return;
            }

            {
                let mut slot = self.value.write();
                if *slot == candidate {
                    return;
                }
                *slot = candidate;
            }
            trace!(port = self.id.raw(), key = self.key.as_deref(), "input changed");

            // Lock released above; notification may recurse into the graph.
            if let Some(owner) = self.owner.read().upgrade() {
                owner.input_changed(self);
            }
        });
    }
}

impl PartialEq for InputPort {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for InputPort {}

impl Hash for InputPort {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Debug for InputPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputPort")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("value", &self.get())
            .field("validated", &self.validator.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_ids_are_unique() {
        assert_ne!(PortId::new(), PortId::new());
    }

    #[test]
    fn detached_port_stores_values() {
        let input = InputPort::new();
        assert_eq!(input.get(), None);
        assert!(input.owner().is_none());

        input.set(Some(Value::from(42.0)));
        assert_eq!(input.get(), Some(Value::Number(42.0)));

        input.set(None);
        assert_eq!(input.get(), None);
    }

    #[test]
    fn validator_rejects_wrong_variant() {
        let input = InputPort::number("n");
        input.set(Some(Value::from("not a number")));
        assert_eq!(input.get(), None);

        input.set(Some(Value::from(7.0)));
        assert_eq!(input.get(), Some(Value::Number(7.0)));
    }

    #[test]
    fn clearing_a_validated_port_is_always_valid() {
        let input = InputPort::number("n");
        input.set(Some(Value::from(7.0)));
        input.set(None);
        assert_eq!(input.get(), None);
    }

    #[test]
    fn missing_validator_accepts_anything() {
        let input = InputPort::new();
        assert!(input.is_valid(&Some(Value::from(true))));
        assert!(input.is_valid(&None));
    }

    #[test]
    fn identity_ignores_key_and_value() {
        let a = InputPort::with_key("same");
        let b = InputPort::with_key("same");
        assert_ne!(*a, *b);
        assert_eq!(*a, *a);

        let mut set = std::collections::HashSet::new();
        set.insert(a.id());
        set.insert(b.id());
        assert_eq!(set.len(), 2);
    }
}
