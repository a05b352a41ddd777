//! Leaf codec: primitive, non-referenceable values.
//!
//! Leaves are immutable and transmitted by value; the non-finite numbers and
//! `undefined` travel as typed sentinel markers because the wire encoding has
//! no native spelling for them.

use graphsync_core::Value;
use graphsync_proto::{Marker, WireValue};

/// Encode a leaf value. Returns `None` for references, which belong to the
/// graph codec, not the leaf codec.
#[must_use]
pub fn encode(value: &Value) -> Option<WireValue> {
    match value {
        Value::Null => Some(WireValue::Null),
        Value::Undefined => Some(WireValue::Marker(Marker::Undefined)),
        Value::Bool(b) => Some(WireValue::Bool(*b)),
        Value::Number(n) => Some(encode_number(*n)),
        Value::Text(s) => Some(WireValue::Text(s.clone())),
        Value::Node(_) => None,
    }
}

fn encode_number(n: f64) -> WireValue {
    if n.is_nan() {
        WireValue::Marker(Marker::Nan)
    } else if n == f64::INFINITY {
        WireValue::Marker(Marker::Infinity)
    } else if n == f64::NEG_INFINITY {
        WireValue::Marker(Marker::NegInfinity)
    } else {
        WireValue::Number(n)
    }
}

/// Decode a leaf transport value. Returns `None` for reference and tombstone
/// markers, which belong to the graph codec.
#[must_use]
pub fn decode(wire: &WireValue) -> Option<Value> {
    match wire {
        WireValue::Null => Some(Value::Null),
        WireValue::Bool(b) => Some(Value::Bool(*b)),
        WireValue::Number(n) => Some(Value::Number(*n)),
        WireValue::Text(s) => Some(Value::Text(s.clone())),
        WireValue::Marker(Marker::Undefined) => Some(Value::Undefined),
        WireValue::Marker(Marker::Infinity) => Some(Value::Number(f64::INFINITY)),
        WireValue::Marker(Marker::NegInfinity) => Some(Value::Number(f64::NEG_INFINITY)),
        WireValue::Marker(Marker::Nan) => Some(Value::Number(f64::NAN)),
        WireValue::Marker(Marker::Ref { .. } | Marker::DeleteProp) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: Value) -> Value {
        decode(&encode(&value).unwrap()).unwrap()
    }

    #[test]
    fn test_plain_leaves_roundtrip() {
        assert_eq!(roundtrip(Value::Null), Value::Null);
        assert_eq!(roundtrip(Value::Undefined), Value::Undefined);
        assert_eq!(roundtrip(Value::Bool(false)), Value::Bool(false));
        assert_eq!(roundtrip(Value::Number(-1.5)), Value::Number(-1.5));
        assert_eq!(
            roundtrip(Value::Text("日本語".to_string())),
            Value::Text("日本語".to_string())
        );
    }

    #[test]
    fn test_nonfinite_numbers_use_sentinels() {
        assert_eq!(
            encode(&Value::Number(f64::INFINITY)).unwrap(),
            WireValue::Marker(Marker::Infinity)
        );
        assert_eq!(
            roundtrip(Value::Number(f64::NEG_INFINITY)),
            Value::Number(f64::NEG_INFINITY)
        );

        let Value::Number(n) = roundtrip(Value::Number(f64::NAN)) else {
            panic!("expected a number");
        };
        assert!(n.is_nan());
    }

    #[test]
    fn test_references_are_not_leaves() {
        assert!(encode(&Value::Node(graphsync_core::NodeId::from_index(0))).is_none());
        assert!(decode(&WireValue::reference("1")).is_none());
        assert!(decode(&WireValue::Marker(Marker::DeleteProp)).is_none());
    }
}
