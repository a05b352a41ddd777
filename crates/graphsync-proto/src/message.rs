//! Structured transport message exchanged between paired contexts.
//!
//! Shareable nodes are flattened into an id-keyed object table; anything
//! nested refers to other nodes through `{type: "ref"}` tokens, never by
//! inlining, so cycles are representable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One synchronization round's payload.
///
/// `objects` carries only the records created or refreshed during the round
/// that produced the message; the root may reference an object conveyed by an
/// earlier round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The serialized root value.
    pub root: WireValue,
    /// New or updated object records, keyed by id.
    pub objects: BTreeMap<String, ObjectRecord>,
}

impl Message {
    /// Create a message with an empty object table.
    #[must_use]
    pub const fn new(root: WireValue) -> Self {
        Self {
            root,
            objects: BTreeMap::new(),
        }
    }

    /// Look up a record carried by this message.
    #[must_use]
    pub fn record(&self, id: &str) -> Option<&ObjectRecord> {
        self.objects.get(id)
    }
}

/// A transport value: a leaf encoding or a typed marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireValue {
    /// The null leaf.
    Null,
    /// A boolean leaf.
    Bool(bool),
    /// A finite number leaf.
    Number(f64),
    /// A string leaf.
    Text(String),
    /// A sentinel, reference, or tombstone marker.
    Marker(Marker),
}

impl WireValue {
    /// A reference token pointing into the object table.
    #[must_use]
    pub fn reference<S: Into<String>>(id: S) -> Self {
        Self::Marker(Marker::Ref { value: id.into() })
    }

    /// The referenced id, if this value is a reference token.
    #[must_use]
    pub fn as_reference(&self) -> Option<&str> {
        match self {
            Self::Marker(Marker::Ref { value }) => Some(value),
            _ => None,
        }
    }
}

/// Markers carried as `{type: ...}` maps on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Marker {
    /// The undefined leaf.
    Undefined,
    /// Positive infinity.
    Infinity,
    /// Negative infinity.
    #[serde(rename = "-infinity")]
    NegInfinity,
    /// Not-a-number.
    Nan,
    /// A reference into the object table.
    Ref {
        /// Referenced object id.
        value: String,
    },
    /// Field-level tombstone: delete this field on the receiver.
    #[serde(rename = "delete-prop")]
    DeleteProp,
}

/// The flattened encoding of one shareable node's immediate shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Sender-assigned id, unique within a context's lifetime.
    pub id: String,
    /// Shape name: a built-in category or a registered class name.
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Type-specific payload.
    pub value: Payload,
}

/// Shape name carried on an object record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordType {
    /// Plain structure of named fields.
    Object,
    /// Ordered sequence.
    Array,
    /// Instant in time.
    Date,
    /// Regular expression.
    Regexp,
    /// Raised error.
    Error,
    /// Instance of the named registered class.
    Class(String),
}

impl From<String> for RecordType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "object" => Self::Object,
            "array" => Self::Array,
            "date" => Self::Date,
            "regexp" => Self::Regexp,
            "error" => Self::Error,
            _ => Self::Class(name),
        }
    }
}

impl From<RecordType> for String {
    fn from(record_type: RecordType) -> Self {
        match record_type {
            RecordType::Object => "object".to_string(),
            RecordType::Array => "array".to_string(),
            RecordType::Date => "date".to_string(),
            RecordType::Regexp => "regexp".to_string(),
            RecordType::Error => "error".to_string(),
            RecordType::Class(name) => name,
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Object => f.write_str("object"),
            Self::Array => f.write_str("array"),
            Self::Date => f.write_str("date"),
            Self::Regexp => f.write_str("regexp"),
            Self::Error => f.write_str("error"),
            Self::Class(name) => f.write_str(name),
        }
    }
}

/// Type-specific record payload.
///
/// The shape is only loosely constrained by the encoding itself; the engine
/// validates it against the record's declared type during decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    /// Epoch milliseconds, for dates.
    Timestamp(f64),
    /// Ordered element values, for arrays.
    Elements(Vec<WireValue>),
    /// Named field values, for objects, classes, errors, and regexps
    /// (`source`/`flags` as text fields).
    Fields(BTreeMap<String, WireValue>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_special_value_encodings() {
        let json = serde_json::to_string(&WireValue::Marker(Marker::NegInfinity)).unwrap();
        assert_eq!(json, r#"{"type":"-infinity"}"#);

        let json = serde_json::to_string(&WireValue::Marker(Marker::Nan)).unwrap();
        assert_eq!(json, r#"{"type":"nan"}"#);

        let json = serde_json::to_string(&WireValue::Marker(Marker::DeleteProp)).unwrap();
        assert_eq!(json, r#"{"type":"delete-prop"}"#);
    }

    #[test]
    fn test_leaves_encode_bare() {
        assert_eq!(serde_json::to_string(&WireValue::Null).unwrap(), "null");
        assert_eq!(serde_json::to_string(&WireValue::Bool(true)).unwrap(), "true");
        assert_eq!(
            serde_json::to_string(&WireValue::Text("hé".to_string())).unwrap(),
            r#""hé""#
        );
    }

    #[test]
    fn test_ref_roundtrip() {
        let reference = WireValue::reference("7");
        let json = serde_json::to_string(&reference).unwrap();
        assert_eq!(json, r#"{"type":"ref","value":"7"}"#);

        let parsed: WireValue = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.as_reference(), Some("7"));
    }

    #[test]
    fn test_record_type_open_set() {
        let parsed: RecordType = serde_json::from_str(r#""array""#).unwrap();
        assert_eq!(parsed, RecordType::Array);

        let parsed: RecordType = serde_json::from_str(r#""point""#).unwrap();
        assert_eq!(parsed, RecordType::Class("point".to_string()));

        let json = serde_json::to_string(&RecordType::Class("point".to_string())).unwrap();
        assert_eq!(json, r#""point""#);
    }

    #[test]
    fn test_payload_shapes() {
        let parsed: Payload = serde_json::from_str("1700000000000").unwrap();
        assert!(matches!(parsed, Payload::Timestamp(_)));

        let parsed: Payload = serde_json::from_str(r#"[1,null,{"type":"ref","value":"2"}]"#).unwrap();
        let Payload::Elements(elements) = parsed else {
            panic!("expected elements");
        };
        assert_eq!(elements.len(), 3);

        let parsed: Payload = serde_json::from_str(r#"{"a":{"type":"nan"}}"#).unwrap();
        assert!(matches!(parsed, Payload::Fields(_)));
    }

    #[test]
    fn test_message_roundtrip() {
        let mut message = Message::new(WireValue::reference("1"));
        message.objects.insert(
            "1".to_string(),
            ObjectRecord {
                id: "1".to_string(),
                record_type: RecordType::Object,
                value: Payload::Fields(BTreeMap::from([(
                    "x".to_string(),
                    WireValue::Number(1.0),
                )])),
            },
        );

        let json = serde_json::to_string(&message).unwrap();
        let parsed: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, message);
        assert!(parsed.record("1").is_some());
        assert!(parsed.record("2").is_none());
    }
}
