//! Identity tables: the mapping between live nodes and stable wire ids.

use std::collections::HashMap;

use graphsync_core::{Node, NodeId};

/// Sender-side synchronization state for one shareable node.
#[derive(Debug)]
pub struct SenderState {
    /// Wire id assigned on first sight; permanent for the context's lifetime.
    pub wire_id: String,
    /// Shallow snapshot of the node as last transmitted.
    pub snapshot: Option<Node>,
    /// Last round in which this node was processed.
    pub generation: u64,
}

/// Sender-side identity table, keyed by live node handle.
///
/// Exactly one state record exists per distinct shareable node ever seen by a
/// context, and its wire id never changes once assigned.
#[derive(Debug)]
pub struct SenderTable {
    states: HashMap<NodeId, SenderState>,
    next_id: u64,
}

impl Default for SenderTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SenderTable {
    /// Create an empty table with the id allocator at its start.
    #[must_use]
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
            next_id: 1,
        }
    }

    /// Look up a node's state, allocating a fresh wire id on first sight.
    pub fn state_mut(&mut self, node: NodeId) -> &mut SenderState {
        let next_id = &mut self.next_id;
        self.states.entry(node).or_insert_with(|| {
            let wire_id = next_id.to_string();
            *next_id += 1;
            tracing::debug!(%node, wire_id, "allocated wire id");
            SenderState {
                wire_id,
                snapshot: None,
                generation: 0,
            }
        })
    }

    /// Look up a node's state without allocating.
    #[must_use]
    pub fn get(&self, node: NodeId) -> Option<&SenderState> {
        self.states.get(&node)
    }

    /// Number of tracked nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no node has been tracked yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Receiver-side synchronization state for one wire id.
#[derive(Debug)]
pub struct ReceiverState {
    /// The live instance materialized for this id.
    pub node: NodeId,
    /// Last round in which this id was processed.
    pub generation: u64,
}

/// Receiver-side identity table, keyed by wire id.
///
/// The id-to-instance binding is permanent for the context's lifetime, which
/// is what keeps application references into the deserialized graph valid
/// across rounds.
#[derive(Debug, Default)]
pub struct ReceiverTable {
    states: HashMap<String, ReceiverState>,
}

impl ReceiverTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the state bound to a wire id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ReceiverState> {
        self.states.get(id)
    }

    /// Look up the state bound to a wire id for mutation.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut ReceiverState> {
        self.states.get_mut(id)
    }

    /// Bind a freshly materialized instance to its wire id.
    pub fn bind(&mut self, id: String, node: NodeId) {
        self.states.insert(
            id,
            ReceiverState {
                node,
                generation: 0,
            },
        );
    }

    /// Number of bound ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no id has been bound yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
