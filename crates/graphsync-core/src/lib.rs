//! Mutable value-graph arena for graph-aware synchronization.
//!
//! This crate provides the in-memory data model:
//! - `Value` - a leaf scalar or a reference to a shareable node
//! - `Node` - a shareable node (object, array, date, regexp, error, instance)
//! - `Graph` - the arena that owns nodes and hands out stable `NodeId` handles
//!
//! Cycles and shared sub-objects are expressed through `NodeId` references
//! into the arena rather than native pointer cycles, so a node can reference
//! itself (directly or transitively) without ownership gymnastics.

pub mod graph;
pub mod value;

pub use graph::{Graph, NodeId};
pub use value::{Node, Value};
