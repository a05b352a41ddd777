//! Engine error kinds.

use graphsync_core::NodeId;
use thiserror::Error;

/// Failure raised synchronously by a serialize or deserialize call.
///
/// The engine is a pure transform: any failure indicates a malformed input
/// graph, a malformed message, or a registry misconfiguration. Identity-table
/// state committed for nodes processed before the failing one is kept
/// (best-effort, not transactional).
#[derive(Debug, Error)]
pub enum SyncError {
    /// A value category the engine deliberately does not serialize.
    #[error("Unsupported value: {0}")]
    Unsupported(String),
    /// A record's payload does not match its declared type.
    #[error("Invalid transport record: {0}")]
    InvalidRecord(String),
    /// A transport type name with no matching registry entry.
    #[error("Unknown transport type: {0}")]
    UnknownType(String),
    /// A reference id resolving to neither a live instance nor a carried record.
    #[error("Unknown reference: {0}")]
    UnknownReference(String),
    /// A registry entry without a construction strategy, hit at decode time.
    #[error("Class {0} is registered without a construction strategy")]
    MisconfiguredClass(String),
    /// A node handle that does not resolve in the caller's graph.
    #[error("Dangling node handle: {0}")]
    DanglingNode(NodeId),
}
