//! Tagged scalar codec.
//!
//! Converts a dynamically typed [`Value`] to and from the wire
//! `Generic` union. Encoding never fails; values outside the known
//! scalar set fall back to their display form and ride as strings,
//! which is lossy but total.

use crate::error::{CodecError, CodecResult};
use crate::message::Value;
use crate::proto::generic::Kind;
use crate::proto::Generic;

/// Encode a value into the tagged wire union.
///
/// First match wins, in a fixed order: bool, bytes, double, float,
/// int, long, short (widened to int), string. Anything else is stored
/// as its display string; callers must treat that path as lossy.
pub fn encode(value: &Value) -> Generic {
    let kind = match value {
        Value::Bool(b) => Kind::Bool(*b),
        Value::Bytes(b) => Kind::Bytes(b.clone()),
        Value::Double(d) => Kind::Double(*d),
        Value::Float(v) => Kind::Float(*v),
        Value::Int(i) => Kind::Int(*i),
        Value::Long(l) => Kind::Long(*l),
        Value::Short(s) => Kind::Int(i32::from(*s)),
        Value::Str(s) => Kind::String(s.clone()),
        other => Kind::String(other.to_string()),
    };
    Generic { kind: Some(kind) }
}

/// Decode the tagged union back into a value.
///
/// The variant tag is explicit on the wire, so decoding is the exact
/// inverse per variant. A `Generic` with no variant set fails with
/// [`CodecError::InvalidArgument`]; the peer produced an empty union.
pub fn decode(generic: &Generic) -> CodecResult<Value> {
    let kind = generic.kind.as_ref().ok_or_else(|| {
        CodecError::InvalidArgument("generic value has no variant set".to_string())
    })?;

    Ok(match kind {
        Kind::Bool(b) => Value::Bool(*b),
        Kind::Bytes(b) => Value::Bytes(b.clone()),
        Kind::Double(d) => Value::Double(*d),
        Kind::Float(v) => Value::Float(*v),
        Kind::Int(i) => Value::Int(*i),
        Kind::Long(l) => Value::Long(*l),
        Kind::String(s) => Value::Str(s.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn roundtrip(value: Value) -> Value {
        decode(&encode(&value)).unwrap()
    }

    #[test]
    fn scalar_roundtrips() {
        assert_eq!(roundtrip(Value::Bool(true)), Value::Bool(true));
        assert_eq!(
            roundtrip(Value::Bytes(vec![1, 2, 3])),
            Value::Bytes(vec![1, 2, 3])
        );
        assert_eq!(roundtrip(Value::Double(1.5)), Value::Double(1.5));
        assert_eq!(roundtrip(Value::Float(0.25)), Value::Float(0.25));
        assert_eq!(roundtrip(Value::Int(-7)), Value::Int(-7));
        assert_eq!(roundtrip(Value::Long(1 << 40)), Value::Long(1 << 40));
        assert_eq!(
            roundtrip(Value::Str("hello".into())),
            Value::Str("hello".into())
        );
    }

    #[test]
    fn short_widens_to_int() {
        assert_eq!(roundtrip(Value::Short(12)), Value::Int(12));
    }

    #[test]
    fn unknown_types_fall_back_to_string() {
        let id = Uuid::new_v4();
        assert_eq!(
            roundtrip(Value::Uuid(id)),
            Value::Str(id.to_string())
        );
        assert_eq!(
            roundtrip(Value::ContentType("text/plain".into())),
            Value::Str("text/plain".into())
        );
        assert_eq!(
            roundtrip(Value::List(vec![Value::Int(1), Value::Int(2)])),
            Value::Str("[1, 2]".into())
        );
    }

    #[test]
    fn empty_union_is_invalid() {
        let err = decode(&Generic { kind: None }).unwrap_err();
        assert!(matches!(err, CodecError::InvalidArgument(_)));
    }
}
