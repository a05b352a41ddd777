//! Arena storage for shareable nodes.

use std::collections::BTreeMap;

use crate::value::{Node, Value};

/// Stable handle to a node inside one [`Graph`].
///
/// Handles never dangle within the graph that issued them: the arena is
/// append-only, so an id stays valid (and keeps pointing at the same node)
/// for the graph's whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Build a handle from a raw arena index.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// The raw arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Append-only arena owning every shareable node of one value graph.
///
/// Applications build their graph here and hold `NodeId` handles into it;
/// the synchronization engine mutates nodes in place on the receiving side,
/// so those handles stay valid across updates.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    /// Create an empty graph.
    #[must_use]
    pub const fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Insert a node, returning its permanent handle.
    pub fn insert(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Look up a node by handle.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Look up a node for in-place mutation.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Insert an empty plain object.
    pub fn object(&mut self) -> NodeId {
        self.insert(Node::Object(BTreeMap::new()))
    }

    /// Insert an empty array.
    pub fn array(&mut self) -> NodeId {
        self.insert(Node::Array(Vec::new()))
    }

    /// Insert a date node from epoch milliseconds.
    pub fn date(&mut self, epoch_millis: i64) -> NodeId {
        self.insert(Node::Date(epoch_millis))
    }

    /// Insert a regular expression node.
    pub fn regexp<S: Into<String>, F: Into<String>>(&mut self, source: S, flags: F) -> NodeId {
        self.insert(Node::Regexp {
            source: source.into(),
            flags: flags.into(),
        })
    }

    /// Insert an error node.
    pub fn error<M: Into<String>, T: Into<String>>(&mut self, message: M, stack: T) -> NodeId {
        self.insert(Node::Error {
            message: message.into(),
            stack: stack.into(),
            fields: BTreeMap::new(),
        })
    }

    /// Insert an empty instance of a registered class.
    pub fn instance<C: Into<String>>(&mut self, class: C) -> NodeId {
        self.insert(Node::Instance {
            class: class.into(),
            fields: BTreeMap::new(),
        })
    }

    /// Set a named field on a field-bearing node.
    ///
    /// No-op if the handle does not resolve to an object, error, or instance;
    /// that is an application bug, not a graph state change.
    pub fn set_field<K: Into<String>>(&mut self, id: NodeId, key: K, value: Value) {
        if let Some(fields) = self.get_mut(id).and_then(Node::fields_mut) {
            fields.insert(key.into(), value);
        }
    }

    /// Read a named field from a field-bearing node.
    #[must_use]
    pub fn field(&self, id: NodeId, key: &str) -> Option<&Value> {
        self.get(id).and_then(Node::fields)?.get(key)
    }

    /// Remove a named field from a field-bearing node.
    pub fn remove_field(&mut self, id: NodeId, key: &str) -> Option<Value> {
        self.get_mut(id).and_then(Node::fields_mut)?.remove(key)
    }

    /// Append an element to an array node. No-op for other categories.
    pub fn push(&mut self, id: NodeId, value: Value) {
        if let Some(elements) = self.get_mut(id).and_then(Node::elements_mut) {
            elements.push(value);
        }
    }

    /// Read an array element by position.
    #[must_use]
    pub fn element(&self, id: NodeId, index: usize) -> Option<&Value> {
        self.get(id).and_then(Node::elements)?.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_stay_valid_across_inserts() {
        let mut graph = Graph::new();
        let first = graph.object();
        for _ in 0..100 {
            graph.array();
        }
        graph.set_field(first, "answer", Value::Number(42.0));
        assert_eq!(
            graph.field(first, "answer"),
            Some(&Value::Number(42.0))
        );
    }

    #[test]
    fn test_cycle_through_ids() {
        let mut graph = Graph::new();
        let a = graph.object();
        let b = graph.object();
        graph.set_field(a, "b", Value::Node(b));
        graph.set_field(b, "a", Value::Node(a));

        let back = graph.field(b, "a").and_then(Value::as_node).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn test_self_reference() {
        let mut graph = Graph::new();
        let a = graph.object();
        graph.set_field(a, "me", Value::Node(a));
        assert_eq!(graph.field(a, "me"), Some(&Value::Node(a)));
    }

    #[test]
    fn test_array_helpers() {
        let mut graph = Graph::new();
        let arr = graph.array();
        graph.push(arr, Value::Text("x".to_string()));
        graph.push(arr, Value::Null);
        assert_eq!(graph.element(arr, 0), Some(&Value::Text("x".to_string())));
        assert_eq!(graph.element(arr, 2), None);
    }
}
