//! Serialization path: graph traversal into a transport message.

use std::collections::BTreeMap;

use graphsync_core::{Graph, Node, NodeId, Value};
use graphsync_proto::{Marker, Message, ObjectRecord, Payload, RecordType, WireValue};

use crate::change;
use crate::error::SyncError;
use crate::leaf;
use crate::registry::ClassRegistry;
use crate::state::SenderTable;

/// Serialize one round: traverse the graph from `root`, emitting records only
/// for nodes created or changed since the previous round.
///
/// # Errors
/// Returns error if the graph contains an unsupported value or a dangling
/// handle.
pub fn encode_root(
    graph: &Graph,
    root: &Value,
    registry: &ClassRegistry,
    table: &mut SenderTable,
    generation: u64,
) -> Result<Message, SyncError> {
    let mut encoder = Encoder {
        graph,
        registry,
        table,
        generation,
        objects: BTreeMap::new(),
    };
    let root = encoder.encode_value(root)?;
    let objects = encoder.objects;
    tracing::trace!(generation, records = objects.len(), "encoded round");
    Ok(Message { root, objects })
}

struct Encoder<'a> {
    graph: &'a Graph,
    registry: &'a ClassRegistry,
    table: &'a mut SenderTable,
    generation: u64,
    objects: BTreeMap<String, ObjectRecord>,
}

impl Encoder<'_> {
    fn encode_value(&mut self, value: &Value) -> Result<WireValue, SyncError> {
        match value {
            Value::Node(id) => self.encode_node(*id),
            other => leaf::encode(other)
                .ok_or_else(|| SyncError::Unsupported(format!("unencodable leaf {other:?}"))),
        }
    }

    fn encode_node(&mut self, id: NodeId) -> Result<WireValue, SyncError> {
        let node = self.graph.get(id).ok_or(SyncError::DanglingNode(id))?;
        if let Node::Bytes(_) = node {
            return Err(unsupported_buffer());
        }

        // Children are held by id, so a plain clone is exactly one level deep.
        let snapshot = node.clone();
        let (wire_id, changed, removed) = {
            let state = self.table.state_mut(id);
            if state.generation == self.generation {
                // Already visited this round: a cycle or a shared sub-object.
                return Ok(WireValue::reference(state.wire_id.clone()));
            }
            state.generation = self.generation;

            let changed = match &state.snapshot {
                Some(previous) => !change::shallow_eq(previous, &snapshot),
                None => true,
            };
            let removed = if changed {
                removed_fields(state.snapshot.as_ref(), &snapshot)
            } else {
                Vec::new()
            };
            if changed {
                state.snapshot = Some(snapshot);
            }
            (state.wire_id.clone(), changed, removed)
        };

        if changed {
            let record = ObjectRecord {
                id: wire_id.clone(),
                record_type: record_type(node)?,
                value: self.encode_payload(node, &removed)?,
            };
            tracing::debug!(id = wire_id, kind = node.kind(), "emitting record");
            self.objects.insert(wire_id.clone(), record);
        } else {
            // The receiver already has this node's immediate shape; children
            // still get traversed so their own state is re-evaluated.
            tracing::trace!(id = wire_id, "unchanged, record skipped");
            self.visit_children(node)?;
        }

        Ok(WireValue::reference(wire_id))
    }

    fn encode_payload(&mut self, node: &Node, removed: &[String]) -> Result<Payload, SyncError> {
        match node {
            Node::Object(fields) => {
                let mut out = BTreeMap::new();
                for (key, value) in fields {
                    out.insert(key.clone(), self.encode_value(value)?);
                }
                tombstone(&mut out, removed);
                Ok(Payload::Fields(out))
            }
            Node::Array(elements) => {
                let mut out = Vec::with_capacity(elements.len());
                for value in elements {
                    out.push(self.encode_value(value)?);
                }
                Ok(Payload::Elements(out))
            }
            #[allow(clippy::cast_precision_loss)]
            Node::Date(epoch_millis) => Ok(Payload::Timestamp(*epoch_millis as f64)),
            Node::Regexp { source, flags } => Ok(Payload::Fields(BTreeMap::from([
                ("source".to_string(), WireValue::Text(source.clone())),
                ("flags".to_string(), WireValue::Text(flags.clone())),
            ]))),
            Node::Error {
                message,
                stack,
                fields,
            } => {
                let mut out = BTreeMap::new();
                for (key, value) in fields {
                    out.insert(key.clone(), self.encode_value(value)?);
                }
                tombstone(&mut out, removed);
                // message and stack always travel, whatever the field map holds
                out.insert("message".to_string(), WireValue::Text(message.clone()));
                out.insert("stack".to_string(), WireValue::Text(stack.clone()));
                Ok(Payload::Fields(out))
            }
            Node::Instance { class, fields } => {
                let spec = self.registry.get(class);
                let mut out = BTreeMap::new();
                for (key, value) in fields {
                    if spec.is_some_and(|s| !s.admits(key)) {
                        continue;
                    }
                    let value = match spec {
                        Some(s) => s.map_out(key, value.clone()),
                        None => value.clone(),
                    };
                    out.insert(key.clone(), self.encode_value(&value)?);
                }
                // tombstones only for fields that were actually transported
                for key in removed {
                    if spec.is_some_and(|s| !s.admits(key)) {
                        continue;
                    }
                    out.entry(key.clone())
                        .or_insert(WireValue::Marker(Marker::DeleteProp));
                }
                Ok(Payload::Fields(out))
            }
            Node::Bytes(_) => Err(unsupported_buffer()),
        }
    }

    /// Traverse a node's children without re-encoding the node itself.
    fn visit_children(&mut self, node: &Node) -> Result<(), SyncError> {
        match node {
            Node::Object(fields) | Node::Error { fields, .. } => {
                for value in fields.values() {
                    self.encode_value(value)?;
                }
            }
            Node::Instance { class, fields } => {
                let spec = self.registry.get(class);
                for (key, value) in fields {
                    if spec.is_some_and(|s| !s.admits(key)) {
                        continue;
                    }
                    self.encode_value(value)?;
                }
            }
            Node::Array(elements) => {
                for value in elements {
                    self.encode_value(value)?;
                }
            }
            Node::Date(_) | Node::Regexp { .. } | Node::Bytes(_) => {}
        }
        Ok(())
    }
}

/// Fields present in the previous snapshot but absent from the current one.
/// Their tombstones tell the receiver to delete in place.
fn removed_fields(previous: Option<&Node>, current: &Node) -> Vec<String> {
    match (previous.and_then(Node::fields), current.fields()) {
        (Some(previous), Some(current)) => previous
            .keys()
            .filter(|key| !current.contains_key(*key))
            .cloned()
            .collect(),
        _ => Vec::new(),
    }
}

fn tombstone(out: &mut BTreeMap<String, WireValue>, removed: &[String]) {
    for key in removed {
        out.entry(key.clone())
            .or_insert(WireValue::Marker(Marker::DeleteProp));
    }
}

fn record_type(node: &Node) -> Result<RecordType, SyncError> {
    match node {
        Node::Object(_) => Ok(RecordType::Object),
        Node::Array(_) => Ok(RecordType::Array),
        Node::Date(_) => Ok(RecordType::Date),
        Node::Regexp { .. } => Ok(RecordType::Regexp),
        Node::Error { .. } => Ok(RecordType::Error),
        Node::Instance { class, .. } => Ok(RecordType::Class(class.clone())),
        Node::Bytes(_) => Err(unsupported_buffer()),
    }
}

fn unsupported_buffer() -> SyncError {
    SyncError::Unsupported("raw binary buffers are not serializable".to_string())
}
