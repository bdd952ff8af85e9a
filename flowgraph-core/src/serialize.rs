//! Serialized Representations
//!
//! Helpers producing the dictionary-shaped representation of a node and of
//! its downstream connections. Persistence itself (file formats, the node
//! registry needed to rebuild a graph) is the host's concern; these helpers
//! only flatten what a single node is and where its outputs point.
//!
//! A node is serializable when its computation reports a type tag. The
//! representation of a node:
//!
//! ```json
//! {
//!   "type": "AssembleColor",
//!   "inputs": ["r", "g", "b"],
//!   "outputs": ["color"],
//!   "name": "Assemble",
//!   "description": "Builds a color from components",
//!   "data": {}
//! }
//! ```
//!
//! Connections are expressed against a caller-supplied mapping from stable
//! names to nodes, so the instance identity never leaks into the output:
//!
//! ```json
//! { "color": [ { "node": "background", "input": "color" } ] }
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{json, Map, Value as Json};
use thiserror::Error;

use crate::graph::Node;

/// Placeholder used for unkeyed ports in serialized output.
const NO_KEY: &str = "no_key";

/// Errors produced by the serialization helpers.
#[derive(Debug, Error)]
pub enum SerializeError {
    /// The node's computation does not report a type tag.
    #[error("node `{node}` does not support serialization")]
    NotSerializable { node: String },
}

fn describe(node: &Node) -> String {
    node.name()
        .unwrap_or_else(|| format!("#{}", node.id().raw()))
}

/// Serialized representation of a single node.
///
/// Covers what the node itself is, not what connections have been made;
/// see [`output_connections`] for those.
pub fn node_repr(node: &Node) -> Result<Json, SerializeError> {
    let ty = node
        .serialized_type()
        .ok_or_else(|| SerializeError::NotSerializable {
            node: describe(node),
        })?;

    let port_keys = |keys: Vec<Option<String>>| -> Json {
        Json::Array(
            keys.into_iter()
                .map(|key| Json::String(key.unwrap_or_else(|| NO_KEY.to_string())))
                .collect(),
        )
    };

    let mut map = Map::new();
    map.insert("type".to_string(), Json::String(ty.to_string()));
    map.insert(
        "inputs".to_string(),
        port_keys(
            node.inputs()
                .iter()
                .map(|port| port.key().map(str::to_string))
                .collect(),
        ),
    );
    map.insert(
        "outputs".to_string(),
        port_keys(
            node.outputs()
                .iter()
                .map(|port| port.key().map(str::to_string))
                .collect(),
        ),
    );
    if let Some(name) = node.name() {
        map.insert("name".to_string(), Json::String(name));
    }
    if let Some(description) = node.description() {
        map.insert("description".to_string(), Json::String(description));
    }
    if let Some(data) = node.serialized_data() {
        map.insert("data".to_string(), data);
    }

    Ok(Json::Object(map))
}

/// Serialized downstream connections of a node.
///
/// For every output, lists the live connections whose owning node appears in
/// `mapping`, referenced by their mapped name. Connections to nodes absent
/// from the mapping, and dangling connections, are omitted.
pub fn output_connections(
    node: &Node,
    mapping: &IndexMap<String, Arc<Node>>,
) -> Result<Json, SerializeError> {
    if !node.is_serializable() {
        return Err(SerializeError::NotSerializable {
            node: describe(node),
        });
    }

    let mut map = Map::new();
    for output in node.outputs() {
        let mut entries = Vec::new();
        for input in output.live_connections() {
            let Some(owner) = input.owner() else { continue };
            let mapped = mapping
                .iter()
                .find(|(_, candidate)| candidate.id() == owner.id());
            if let Some((name, _)) = mapped {
                entries.push(json!({
                    "node": name,
                    "input": input.key().unwrap_or(NO_KEY),
                }));
            }
        }
        map.insert(
            output.key().unwrap_or(NO_KEY).to_string(),
            Json::Array(entries),
        );
    }

    Ok(Json::Object(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Completion, Compute, InputTrigger};
    use crate::port::{InputPort, OutputPort};

    struct Configured;

    impl Compute for Configured {
        fn compute(&self, _node: &Arc<Node>, done: Completion) {
            done.finish();
        }
        fn serialized_type(&self) -> Option<&str> {
            Some("Configured")
        }
        fn serialized_data(&self) -> Option<Json> {
            Some(json!({ "scale": 2.0 }))
        }
    }

    struct Opaque;

    impl Compute for Opaque {
        fn compute(&self, _node: &Arc<Node>, done: Completion) {
            done.finish();
        }
    }

    #[test]
    fn node_repr_has_the_documented_shape() {
        let node = Node::with_compute(InputTrigger::All, Configured);
        node.attach_input(InputPort::with_key("a"));
        node.attach_input(InputPort::new());
        node.attach_output(OutputPort::with_key("out"));
        node.set_name("configured node");
        node.set_description("test fixture");

        let repr = node_repr(&node).unwrap();
        assert_eq!(repr["type"], "Configured");
        assert_eq!(repr["inputs"], json!(["a", "no_key"]));
        assert_eq!(repr["outputs"], json!(["out"]));
        assert_eq!(repr["name"], "configured node");
        assert_eq!(repr["description"], "test fixture");
        assert_eq!(repr["data"], json!({ "scale": 2.0 }));
    }

    #[test]
    fn node_repr_omits_absent_metadata() {
        let node = Node::new(InputTrigger::Any);
        let repr = node_repr(&node).unwrap();
        assert_eq!(repr["type"], "Passthrough");
        assert!(repr.get("name").is_none());
        assert!(repr.get("description").is_none());
        assert!(repr.get("data").is_none());
    }

    #[test]
    fn node_repr_fails_without_the_capability() {
        let node = Node::with_compute(InputTrigger::Any, Opaque);
        node.set_name("opaque");

        let err = node_repr(&node).unwrap_err();
        assert!(matches!(err, SerializeError::NotSerializable { ref node } if node == "opaque"));
    }

    #[test]
    fn output_connections_reference_mapped_names() {
        let source = Node::new(InputTrigger::Any);
        let output = source.attach_output(OutputPort::with_key("value"));

        let sink = Node::new(InputTrigger::Any);
        let sink_input = sink.attach_input(InputPort::with_key("in"));
        output.connect(&sink_input);

        // A connection to a node outside the mapping is omitted.
        let stranger = Node::new(InputTrigger::Any);
        let stranger_input = stranger.attach_input(InputPort::with_key("x"));
        output.connect(&stranger_input);

        let mut mapping = IndexMap::new();
        mapping.insert("source".to_string(), source.clone());
        mapping.insert("sink".to_string(), sink.clone());

        let connections = output_connections(&source, &mapping).unwrap();
        assert_eq!(
            connections,
            json!({ "value": [ { "node": "sink", "input": "in" } ] })
        );
    }

    #[test]
    fn output_connections_skip_dangling_inputs() {
        let source = Node::new(InputTrigger::Any);
        let output = source.attach_output(OutputPort::with_key("value"));
        {
            let dropped = InputPort::with_key("gone");
            output.connect(&dropped);
        }

        let mapping = IndexMap::new();
        let connections = output_connections(&source, &mapping).unwrap();
        assert_eq!(connections, json!({ "value": [] }));
    }
}
