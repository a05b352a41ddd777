//! Leaf values and shareable nodes.

use std::collections::BTreeMap;

use crate::graph::NodeId;

/// A value reachable from a graph root.
///
/// Leaves (`Null`, `Undefined`, `Bool`, `Number`, `Text`) are immutable and
/// transmitted by value. Anything with identity lives in the arena and is
/// referenced through `Node`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The null value.
    Null,
    /// The undefined value (distinct from null).
    Undefined,
    /// A boolean.
    Bool(bool),
    /// A number, including NaN and the infinities.
    Number(f64),
    /// A string.
    Text(String),
    /// A reference to a shareable node in the owning graph.
    Node(NodeId),
}

impl Value {
    /// Whether this value is a leaf (has no identity).
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        !matches!(self, Self::Node(_))
    }

    /// The referenced node id, if this value is a reference.
    #[must_use]
    pub const fn as_node(&self) -> Option<NodeId> {
        match self {
            Self::Node(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<NodeId> for Value {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

/// A shareable node: a value with identity that may be referenced from
/// multiple places or participate in a cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A plain structure of named fields.
    Object(BTreeMap<String, Value>),
    /// An ordered sequence.
    Array(Vec<Value>),
    /// An instant in time, as epoch milliseconds.
    Date(i64),
    /// A regular expression.
    Regexp {
        /// Pattern source text.
        source: String,
        /// Flag characters.
        flags: String,
    },
    /// A raised error with its human-readable context.
    Error {
        /// Error message text.
        message: String,
        /// Captured stack text.
        stack: String,
        /// Additional enumerable fields attached to the error.
        fields: BTreeMap<String, Value>,
    },
    /// An instance of a registered class.
    Instance {
        /// Registered class name.
        class: String,
        /// Instance fields.
        fields: BTreeMap<String, Value>,
    },
    /// A raw binary buffer. Representable but deliberately not serializable;
    /// the engine rejects it rather than silently dropping data.
    Bytes(Vec<u8>),
}

impl Node {
    /// A short name for the node's category, for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Object(_) => "object",
            Self::Array(_) => "array",
            Self::Date(_) => "date",
            Self::Regexp { .. } => "regexp",
            Self::Error { .. } => "error",
            Self::Instance { .. } => "instance",
            Self::Bytes(_) => "bytes",
        }
    }

    /// The node's named fields, for field-bearing categories.
    #[must_use]
    pub const fn fields(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Object(fields)
            | Self::Error { fields, .. }
            | Self::Instance { fields, .. } => Some(fields),
            _ => None,
        }
    }

    /// Mutable access to the node's named fields.
    pub const fn fields_mut(&mut self) -> Option<&mut BTreeMap<String, Value>> {
        match self {
            Self::Object(fields)
            | Self::Error { fields, .. }
            | Self::Instance { fields, .. } => Some(fields),
            _ => None,
        }
    }

    /// The node's elements, if it is an array.
    #[must_use]
    pub const fn elements(&self) -> Option<&Vec<Value>> {
        match self {
            Self::Array(elements) => Some(elements),
            _ => None,
        }
    }

    /// Mutable access to the node's elements, if it is an array.
    pub const fn elements_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Self::Array(elements) => Some(elements),
            _ => None,
        }
    }
}
