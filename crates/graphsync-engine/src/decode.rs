//! Deserialization path: rebuilding or updating instances from a message.

use std::collections::BTreeMap;

use graphsync_core::{Graph, Node, NodeId, Value};
use graphsync_proto::{Marker, Message, ObjectRecord, Payload, RecordType, WireValue};

use crate::error::SyncError;
use crate::leaf;
use crate::registry::ClassRegistry;
use crate::state::ReceiverTable;

/// Deserialize one round against receiver-side state.
///
/// Instances are constructed empty and bound to their id before their fields
/// are filled (two-phase construction), so cyclic back-references resolve.
/// Previously materialized instances are mutated in place; the returned root
/// is identical across rounds for an identity-stable sender root.
///
/// # Errors
/// Returns error if the message is malformed or references an id this context
/// has never seen.
pub fn decode_root(
    message: &Message,
    registry: &ClassRegistry,
    graph: &mut Graph,
    table: &mut ReceiverTable,
    generation: u64,
) -> Result<Value, SyncError> {
    // A record filed under a key other than its own id can never be found by
    // the references that point at it; resolving one would re-materialize the
    // record endlessly instead of hitting the binding. Reject up front.
    for (key, record) in &message.objects {
        if record.id != *key {
            return Err(SyncError::InvalidRecord(format!(
                "record {} filed under key {key}",
                record.id
            )));
        }
    }

    let mut decoder = Decoder {
        graph,
        registry,
        table,
        generation,
        message,
    };
    let root = decoder.decode_value(&message.root)?;

    // A record can be unreachable from the root when a deep child changed
    // under ancestors whose own records were skipped as unchanged. Sweep the
    // table so every carried update lands; the generation guard makes this a
    // no-op for records the root traversal already processed.
    for record in message.objects.values() {
        decoder.apply_record(record)?;
    }

    Ok(root)
}

struct Decoder<'a> {
    graph: &'a mut Graph,
    registry: &'a ClassRegistry,
    table: &'a mut ReceiverTable,
    generation: u64,
    message: &'a Message,
}

impl Decoder<'_> {
    fn decode_value(&mut self, wire: &WireValue) -> Result<Value, SyncError> {
        if let Some(value) = leaf::decode(wire) {
            return Ok(value);
        }
        match wire {
            WireValue::Marker(Marker::Ref { value }) => self.resolve_ref(value),
            _ => Err(SyncError::InvalidRecord(
                "delete-prop marker outside a field map".to_string(),
            )),
        }
    }

    fn resolve_ref(&mut self, id: &str) -> Result<Value, SyncError> {
        let known = self.table.get(id).map(|state| (state.node, state.generation));
        let record = self.message.record(id);

        match (known, record) {
            // Fully conveyed earlier and unchanged this round.
            (Some((node, _)), None) => Ok(Value::Node(node)),
            // Known instance with a carried update: apply in place, once.
            (Some((node, generation)), Some(record)) => {
                if generation < self.generation {
                    self.fill(node, record)?;
                }
                Ok(Value::Node(node))
            }
            // First sight through a reference: materialize now.
            (None, Some(record)) => self.materialize(record),
            (None, None) => Err(SyncError::UnknownReference(id.to_string())),
        }
    }

    /// Apply one carried record regardless of whether the root traversal
    /// reached it.
    fn apply_record(&mut self, record: &ObjectRecord) -> Result<(), SyncError> {
        match self.table.get(&record.id) {
            Some(state) if state.generation < self.generation => {
                let node = state.node;
                self.fill(node, record)
            }
            Some(_) => Ok(()),
            None => self.materialize(record).map(|_| ()),
        }
    }

    fn materialize(&mut self, record: &ObjectRecord) -> Result<Value, SyncError> {
        let empty = match &record.record_type {
            RecordType::Object => Node::Object(BTreeMap::new()),
            RecordType::Array => Node::Array(Vec::new()),
            RecordType::Date => Node::Date(timestamp(record)?),
            RecordType::Regexp => {
                let (source, flags) = regexp_parts(record)?;
                Node::Regexp { source, flags }
            }
            RecordType::Error => Node::Error {
                message: String::new(),
                stack: String::new(),
                fields: BTreeMap::new(),
            },
            RecordType::Class(name) => {
                let spec = self
                    .registry
                    .get(name)
                    .ok_or_else(|| SyncError::UnknownType(name.clone()))?;
                Node::Instance {
                    class: name.clone(),
                    fields: spec.construct()?,
                }
            }
        };

        let node = self.graph.insert(empty);
        self.table.bind(record.id.clone(), node);
        tracing::debug!(id = record.id, kind = %record.record_type, "materialized instance");

        self.fill(node, record)?;
        Ok(Value::Node(node))
    }

    /// Fill an instance's children from a record, in place.
    fn fill(&mut self, node: NodeId, record: &ObjectRecord) -> Result<(), SyncError> {
        // Mark current before recursing so a back-reference to this id from
        // one of its own children resolves instead of re-entering.
        if let Some(state) = self.table.get_mut(&record.id) {
            state.generation = self.generation;
        }

        match (&record.record_type, &record.value) {
            (RecordType::Array, Payload::Elements(elements)) => {
                let mut decoded = Vec::with_capacity(elements.len());
                for wire in elements {
                    decoded.push(self.decode_value(wire)?);
                }
                let Some(target) = self.graph.get_mut(node).and_then(Node::elements_mut) else {
                    return Err(mismatch(record, "array"));
                };
                *target = decoded;
                Ok(())
            }
            (
                RecordType::Object | RecordType::Error | RecordType::Class(_),
                Payload::Fields(fields),
            ) => self.fill_fields(node, record, fields),
            // Dates and regexps have no children; an in-place update just
            // replaces the scalar payload.
            (RecordType::Date, Payload::Timestamp(_)) => {
                let Some(Node::Date(target)) = self.graph.get_mut(node) else {
                    return Err(mismatch(record, "date"));
                };
                *target = timestamp(record)?;
                Ok(())
            }
            (RecordType::Regexp, Payload::Fields(_)) => {
                let (source, flags) = regexp_parts(record)?;
                let Some(Node::Regexp {
                    source: target_source,
                    flags: target_flags,
                }) = self.graph.get_mut(node)
                else {
                    return Err(mismatch(record, "regexp"));
                };
                *target_source = source;
                *target_flags = flags;
                Ok(())
            }
            _ => Err(SyncError::InvalidRecord(format!(
                "record {} of type {} carries a mismatched payload",
                record.id, record.record_type
            ))),
        }
    }

    fn fill_fields(
        &mut self,
        node: NodeId,
        record: &ObjectRecord,
        fields: &BTreeMap<String, WireValue>,
    ) -> Result<(), SyncError> {
        let spec = match &record.record_type {
            RecordType::Class(name) => Some(
                self.registry
                    .get(name)
                    .ok_or_else(|| SyncError::UnknownType(name.clone()))?,
            ),
            _ => None,
        };

        // Decode first, assign after: assignment needs the node borrowed
        // mutably, and decoding children may grow the arena.
        let mut ops = Vec::with_capacity(fields.len());
        for (key, wire) in fields {
            if matches!(wire, WireValue::Marker(Marker::DeleteProp)) {
                ops.push((key.clone(), None));
            } else {
                let mut value = self.decode_value(wire)?;
                if let Some(spec) = spec {
                    value = spec.map_in(key, value);
                }
                ops.push((key.clone(), Some(value)));
            }
        }

        let Some(target) = self.graph.get_mut(node) else {
            return Err(SyncError::DanglingNode(node));
        };

        if let Node::Error { message, stack, .. } = target {
            // message and stack live on the node itself, not in the field map
            for (key, value) in &ops {
                match (key.as_str(), value) {
                    ("message", Some(Value::Text(text))) => *message = text.clone(),
                    ("stack", Some(Value::Text(text))) => *stack = text.clone(),
                    ("message" | "stack", Some(_)) => {
                        return Err(SyncError::InvalidRecord(format!(
                            "record {}: non-text error {key}",
                            record.id
                        )));
                    }
                    _ => {}
                }
            }
        }

        let Some(target_fields) = target.fields_mut() else {
            return Err(mismatch(record, "field-bearing node"));
        };
        for (key, value) in ops {
            if matches!(record.record_type, RecordType::Error)
                && (key == "message" || key == "stack")
            {
                continue;
            }
            match value {
                Some(value) => {
                    target_fields.insert(key, value);
                }
                None => {
                    target_fields.remove(&key);
                }
            }
        }
        Ok(())
    }
}

fn timestamp(record: &ObjectRecord) -> Result<i64, SyncError> {
    match record.value {
        #[allow(clippy::cast_possible_truncation)]
        Payload::Timestamp(millis) => Ok(millis as i64),
        _ => Err(SyncError::InvalidRecord(format!(
            "record {}: non-numeric date payload",
            record.id
        ))),
    }
}

fn regexp_parts(record: &ObjectRecord) -> Result<(String, String), SyncError> {
    let Payload::Fields(fields) = &record.value else {
        return Err(mismatch(record, "regexp"));
    };
    match (fields.get("source"), fields.get("flags")) {
        (Some(WireValue::Text(source)), Some(WireValue::Text(flags))) => {
            Ok((source.clone(), flags.clone()))
        }
        _ => Err(SyncError::InvalidRecord(format!(
            "record {}: regexp payload must carry text source and flags",
            record.id
        ))),
    }
}

fn mismatch(record: &ObjectRecord, expected: &str) -> SyncError {
    SyncError::InvalidRecord(format!(
        "record {} of type {} does not describe a {expected}",
        record.id, record.record_type
    ))
}
