//! Node Collection
//!
//! A thin aggregator over a set of nodes. It carries no execution logic;
//! its one derived fact is whether every member supports serialization, a
//! capability query consumed by whatever external collaborator persists the
//! graph.

use std::sync::Arc;

use crate::graph::Node;

/// A collection of nodes forming a graph.
///
/// Membership is identity-based; inserting a node twice keeps one entry.
#[derive(Default)]
pub struct Graph {
    nodes: Vec<Arc<Node>>,
}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. A no-op if the node is already a member.
    pub fn insert(&mut self, node: Arc<Node>) {
        if !self.nodes.iter().any(|member| member.id() == node.id()) {
            self.nodes.push(node);
        }
    }

    /// Remove a node. Returns whether it was a member.
    pub fn remove(&mut self, node: &Node) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|member| member.id() != node.id());
        self.nodes.len() != before
    }

    /// Number of member nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the graph has no members.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over the member nodes.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Node>> {
        self.nodes.iter()
    }

    /// True iff every member node supports serialization.
    pub fn is_serializable(&self) -> bool {
        self.nodes.iter().all(|node| node.is_serializable())
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph").field("nodes", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Completion, Compute, InputTrigger};

    struct Opaque;

    impl Compute for Opaque {
        fn compute(&self, _node: &Arc<Node>, done: Completion) {
            done.finish();
        }
        // No serialized_type: not serializable.
    }

    #[test]
    fn insert_is_identity_deduped() {
        let mut graph = Graph::new();
        let node = Node::new(InputTrigger::Any);

        graph.insert(node.clone());
        graph.insert(node.clone());
        assert_eq!(graph.len(), 1);

        assert!(graph.remove(&node));
        assert!(!graph.remove(&node));
        assert!(graph.is_empty());
    }

    #[test]
    fn empty_graph_is_serializable() {
        assert!(Graph::new().is_serializable());
    }

    #[test]
    fn serializable_only_when_every_member_is() {
        let mut graph = Graph::new();
        graph.insert(Node::new(InputTrigger::Any));
        assert!(graph.is_serializable());

        let opaque = Node::with_compute(InputTrigger::Any, Opaque);
        graph.insert(opaque.clone());
        assert!(!graph.is_serializable());

        graph.remove(&opaque);
        assert!(graph.is_serializable());
    }
}
