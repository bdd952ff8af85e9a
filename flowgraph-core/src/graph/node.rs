//! Graph Node
//!
//! The execution unit of the graph. A node owns a set of input ports and
//! output ports, a trigger policy deciding when enough inputs are present to
//! run, and the scheduling choice between running inline and deferring to
//! the end of the current write batch.
//!
//! # Run lifecycle
//!
//! `idle -> processing -> idle`. A run request while processing is dropped,
//! never queued; combined with deferral this is what coalesces a burst of
//! input writes into a single computation.
//!
//! # Cancellation
//!
//! `cancel` is a one-shot, depth-first sweep over the live downstream
//! connection graph. The per-node cancelling flag is never reset and doubles
//! as the cycle guard: in a cycle A -> B -> A the second visit to A is
//! short-circuited, so every node's cancellation side effect fires exactly
//! once regardless of cycle length or fan-in.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use smallvec::SmallVec;
use tracing::debug;

use crate::graph::compute::{Completion, Compute, Passthrough};
use crate::graph::scheduler;
use crate::graph::trigger::InputTrigger;
use crate::port::{InputPort, OutputPort, PortId};
use crate::value::Value;

/// Unique identifier for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// An execution unit with input/output ports and a trigger policy.
///
/// Nodes are handed out as `Arc<Node>`; input ports hold a weak back
/// reference to their owner and downstream connections are weak, so dropping
/// the last `Arc` tears the node out of the graph without any unregistration
/// step.
pub struct Node {
    id: NodeId,
    trigger: InputTrigger,
    name: RwLock<Option<String>>,
    description: RwLock<Option<String>>,
    inputs: RwLock<SmallVec<[Arc<InputPort>; 4]>>,
    outputs: RwLock<SmallVec<[Arc<OutputPort>; 2]>>,
    compute: Box<dyn Compute>,
    processing: AtomicBool,
    cancelling: AtomicBool,
    started: Mutex<Option<Instant>>,
    elapsed: Mutex<Duration>,
    /// Inputs that have reported at least one applied write, for the
    /// `AllAtLeastOnce` policy.
    seen: Mutex<HashSet<PortId>>,
}

impl Node {
    /// Create a node with the default passthrough computation.
    pub fn new(trigger: InputTrigger) -> Arc<Self> {
        Self::with_compute(trigger, Passthrough)
    }

    /// Create a node with a concrete computation.
    pub fn with_compute(trigger: InputTrigger, compute: impl Compute + 'static) -> Arc<Self> {
        Arc::new(Self {
            id: NodeId::new(),
            trigger,
            name: RwLock::new(None),
            description: RwLock::new(None),
            inputs: RwLock::new(SmallVec::new()),
            outputs: RwLock::new(SmallVec::new()),
            compute: Box::new(compute),
            processing: AtomicBool::new(false),
            cancelling: AtomicBool::new(false),
            started: Mutex::new(None),
            elapsed: Mutex::new(Duration::ZERO),
            seen: Mutex::new(HashSet::new()),
        })
    }

    /// Get the node's ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The node's trigger policy.
    pub fn trigger(&self) -> InputTrigger {
        self.trigger
    }

    /// Human-readable name. Metadata only.
    pub fn name(&self) -> Option<String> {
        self.name.read().clone()
    }

    /// Set the human-readable name.
    pub fn set_name(&self, name: impl Into<String>) {
        *self.name.write() = Some(name.into());
    }

    /// Describes what the node does or can be used for. Metadata only.
    pub fn description(&self) -> Option<String> {
        self.description.read().clone()
    }

    /// Set the description.
    pub fn set_description(&self, description: impl Into<String>) {
        *self.description.write() = Some(description.into());
    }

    /// Attach an input port, binding it to this node.
    ///
    /// Returns the port for convenient wiring.
    pub fn attach_input(self: &Arc<Self>, port: Arc<InputPort>) -> Arc<InputPort> {
        port.bind(Arc::downgrade(self));
        self.inputs.write().push(port.clone());
        port
    }

    /// Attach an output port.
    pub fn attach_output(&self, port: Arc<OutputPort>) -> Arc<OutputPort> {
        self.outputs.write().push(port.clone());
        port
    }

    /// The node's input ports.
    pub fn inputs(&self) -> Vec<Arc<InputPort>> {
        self.inputs.read().iter().cloned().collect()
    }

    /// The node's output ports.
    pub fn outputs(&self) -> Vec<Arc<OutputPort>> {
        self.outputs.read().iter().cloned().collect()
    }

    /// Number of input ports.
    pub fn input_count(&self) -> usize {
        self.inputs.read().len()
    }

    /// First input port with the given key.
    pub fn input(&self, key: &str) -> Option<Arc<InputPort>> {
        self.inputs
            .read()
            .iter()
            .find(|port| port.key() == Some(key))
            .cloned()
    }

    /// First output port with the given key.
    pub fn output(&self, key: &str) -> Option<Arc<OutputPort>> {
        self.outputs
            .read()
            .iter()
            .find(|port| port.key() == Some(key))
            .cloned()
    }

    /// Whether a run is currently in flight.
    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    /// Whether this node has been cancelled.
    pub fn is_cancelling(&self) -> bool {
        self.cancelling.load(Ordering::SeqCst)
    }

    /// Duration of the most recently completed run. Diagnostic only.
    pub fn processing_time(&self) -> Duration {
        *self.elapsed.lock()
    }

    /// Whether this node's computation supports serialization.
    pub fn is_serializable(&self) -> bool {
        self.compute.serialized_type().is_some()
    }

    /// Type tag of the computation, if it supports serialization.
    pub fn serialized_type(&self) -> Option<&str> {
        self.compute.serialized_type()
    }

    /// Configuration state of the computation, if any.
    pub fn serialized_data(&self) -> Option<serde_json::Value> {
        self.compute.serialized_data()
    }

    /// Send a result to every output port.
    ///
    /// Computations call this before finishing.
    pub fn broadcast(&self, value: Option<Value>) {
        for output in self.outputs() {
            output.send(value.clone());
        }
    }

    /// Run the node's computation.
    ///
    /// A no-op if a run is already in flight. Otherwise marks the node
    /// processing, records the start time, and either executes inline or
    /// defers to the end of the current write batch, as decided by
    /// [`Compute::use_deferred`].
    pub fn run(self: &Arc<Self>) {
        if self.processing.swap(true, Ordering::SeqCst) {
            return;
        }
        *self.started.lock() = Some(Instant::now());

        if self.compute.use_deferred(self) {
            debug!(node = self.id.raw(), "deferring computation");
            scheduler::defer(self);
        } else {
            self.process_now();
        }
    }

    /// Cancel this node and, recursively, every live downstream node.
    ///
    /// A no-op if the node is already cancelling; that guard terminates the
    /// recursion in cyclic graphs. Does not abort an in-flight computation.
    pub fn cancel(&self) {
        if self.cancelling.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!(node = self.id.raw(), "cancelling");
        self.compute.cancelled(self);

        for output in self.outputs() {
            for input in output.live_connections() {
                if let Some(owner) = input.owner() {
                    owner.cancel();
                }
            }
        }
    }

    /// Execute the computation inline. Called by `run` on the direct path
    /// and by the scheduler when a deferred run comes due.
    pub(crate) fn process_now(self: &Arc<Self>) {
        let done = Completion::new(Arc::downgrade(self));
        self.compute.compute(self, done);
    }

    /// Completion bookkeeping: record elapsed time, clear the processing
    /// flag.
    pub(crate) fn finish_processing(&self) {
        if let Some(start) = self.started.lock().take() {
            *self.elapsed.lock() = start.elapsed();
        }
        self.processing.store(false, Ordering::SeqCst);
    }

    /// Change notification from one of this node's input ports.
    pub(crate) fn input_changed(self: &Arc<Self>, port: &InputPort) {
        self.seen.lock().insert(port.id());
        if self.can_run() {
            self.run();
        }
    }

    /// Evaluate the trigger policy against the current input state.
    fn can_run(&self) -> bool {
        match self.trigger {
            InputTrigger::Manual => false,
            // No port lock held here: the computation may inspect the node.
            InputTrigger::Custom => self.compute.should_run(self),
            InputTrigger::Any => self.inputs.read().iter().any(|input| input.get().is_some()),
            InputTrigger::All => self.inputs.read().iter().all(|input| input.get().is_some()),
            InputTrigger::AllAtLeastOnce => {
                let inputs = self.inputs.read();
                let seen = self.seen.lock();
                inputs.iter().all(|input| seen.contains(&input.id()))
            }
        }
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("trigger", &self.trigger)
            .field("inputs", &self.input_count())
            .field("outputs", &self.outputs.read().len())
            .field("processing", &self.is_processing())
            .field("cancelling", &self.is_cancelling())
            .finish()
    }
}
