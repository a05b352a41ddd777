//! Shallow-equality change detection.
//!
//! Snapshots are one level deep: children are held as `Value::Node` ids, so a
//! plain `Node::clone` already captures exactly the immediate shape and
//! nothing below it. Comparing the stored snapshot against the current shape
//! decides whether a node needs retransmission this round. Deep changes under
//! an unchanged container are not this module's problem: children are tracked
//! and re-evaluated independently during traversal.

use std::collections::BTreeMap;

use graphsync_core::{Node, Value};

/// Type-sensitive value equality with NaN equal to NaN.
#[must_use]
pub fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => (x.is_nan() && y.is_nan()) || x == y,
        _ => a == b,
    }
}

fn fields_eq(a: &BTreeMap<String, Value>, b: &BTreeMap<String, Value>) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(key, value)| b.get(key).is_some_and(|other| value_eq(value, other)))
}

/// One-level-deep equality between a stored snapshot and the current shape.
#[must_use]
pub fn shallow_eq(a: &Node, b: &Node) -> bool {
    match (a, b) {
        (Node::Object(x), Node::Object(y)) => fields_eq(x, y),
        (Node::Array(x), Node::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(v, w)| value_eq(v, w))
        }
        (Node::Date(x), Node::Date(y)) => x == y,
        (
            Node::Regexp {
                source: xs,
                flags: xf,
            },
            Node::Regexp {
                source: ys,
                flags: yf,
            },
        ) => xs == ys && xf == yf,
        (
            Node::Error {
                message: xm,
                stack: xk,
                fields: xf,
            },
            Node::Error {
                message: ym,
                stack: yk,
                fields: yf,
            },
        ) => xm == ym && xk == yk && fields_eq(xf, yf),
        (
            Node::Instance {
                class: xc,
                fields: xf,
            },
            Node::Instance {
                class: yc,
                fields: yf,
            },
        ) => xc == yc && fields_eq(xf, yf),
        (Node::Bytes(x), Node::Bytes(y)) => x == y,
        _ => false,
    }
}
