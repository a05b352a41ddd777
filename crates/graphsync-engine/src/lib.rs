//! Reference-tracking graph codec with incremental change detection.
//!
//! This crate is the engine behind graph synchronization:
//! - `leaf` - encoding of non-referenceable scalar values
//! - `registry` - construction/filtering/mapping table for user classes
//! - `state` - identity tables mapping live nodes to stable wire ids
//! - `change` - shallow-equality change detection between rounds
//! - `encode` / `decode` - the recursive graph traversal itself
//!
//! Every shareable node gets a permanent string id on first sight and is
//! referenced by id on the wire, never inlined, so cycles and shared
//! sub-objects survive the round-trip with identity intact. A node whose
//! immediate shape has not changed since the last round is not retransmitted.

pub mod change;
pub mod decode;
pub mod encode;
pub mod error;
pub mod leaf;
pub mod registry;
pub mod state;

pub use decode::decode_root;
pub use encode::encode_root;
pub use error::SyncError;
pub use registry::{ClassRegistry, ClassSpec};
pub use state::{ReceiverTable, SenderTable};
