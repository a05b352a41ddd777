//! Transport message format and wire codec.
//!
//! Provides:
//! - The structured transport message (`Message`, `WireValue`, `ObjectRecord`)
//! - The `WireCodec` trait for pluggable byte encodings
//! - `JsonCodec`, the default self-describing text encoding

pub mod codec;
pub mod message;

pub use codec::{CodecError, JsonCodec, WireCodec};
pub use message::{Marker, Message, ObjectRecord, Payload, RecordType, WireValue};
