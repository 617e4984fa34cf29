//! Header map codec.
//!
//! Converts a whole header collection to and from wire header entries.
//! Encoding is governed by a [`ValuePolicy`]: either each value rides
//! as a tagged scalar union, or it is normalized to an ordered list of
//! strings for peers that cannot carry unions per header. Decoding is
//! driven by the tag on the wire, so one codec decodes the output of
//! either policy.
//!
//! A header the active policy cannot represent is dropped with a
//! warning; losing one header must never lose the whole message.

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::{CodecError, CodecResult};
use crate::generic;
use crate::message::{Headers, Value, HEADER_ID, HEADER_TIMESTAMP};
use crate::proto::{header_value, HeaderEntry, HeaderValue, StringList};

/// How header values ride on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValuePolicy {
    /// Tagged scalar union per value; type fidelity is preserved for
    /// the known scalar set.
    #[default]
    Structured,
    /// Ordered list of strings per value.
    StringList,
}

/// Encodes and decodes header collections under a fixed policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderCodec {
    policy: ValuePolicy,
}

impl HeaderCodec {
    pub fn new(policy: ValuePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ValuePolicy {
        self.policy
    }

    /// Encode a header collection into wire entries, in insertion
    /// order. Never fails: unrepresentable values are dropped with a
    /// warning and the rest of the collection is still produced.
    pub fn encode(&self, headers: &Headers) -> Vec<HeaderEntry> {
        headers
            .iter()
            .filter_map(|(key, value)| {
                let encoded = match self.policy {
                    ValuePolicy::Structured => {
                        Some(header_value::Value::Generic(generic::encode(value)))
                    }
                    ValuePolicy::StringList => encode_string_list(key, value)
                        .map(|values| header_value::Value::List(StringList { values })),
                };
                encoded.map(|value| HeaderEntry {
                    key: key.to_string(),
                    value: Some(HeaderValue { value: Some(value) }),
                })
            })
            .collect()
    }

    /// Decode wire entries back into a header collection.
    ///
    /// Reserved `id` and `timestamp` headers must parse as a UUID and
    /// a signed 64-bit integer respectively; anything else fails with
    /// [`CodecError::MalformedHeader`].
    pub fn decode(&self, entries: &[HeaderEntry]) -> CodecResult<Headers> {
        let mut headers = Headers::new();
        for entry in entries {
            let Some(value) = entry.value.as_ref().and_then(|v| v.value.as_ref()) else {
                return Err(CodecError::InvalidArgument(format!(
                    "header `{}` has no value set",
                    entry.key
                )));
            };
            match value {
                header_value::Value::Generic(wire) => {
                    headers.insert(&entry.key, decode_structured(&entry.key, wire)?);
                }
                header_value::Value::List(list) => {
                    if let Some(decoded) = decode_string_list(&entry.key, &list.values)? {
                        headers.insert(&entry.key, decoded);
                    }
                }
            }
        }
        Ok(headers)
    }
}

/// Structured-policy decode for one value. The reserved `id` header is
/// canonicalized to its string form on encode, so it is reinterpreted
/// as a UUID here.
fn decode_structured(key: &str, wire: &crate::proto::Generic) -> CodecResult<Value> {
    let decoded = generic::decode(wire)?;
    if key == HEADER_ID {
        let parsed = Uuid::parse_str(&decoded.to_string()).map_err(|e| {
            CodecError::MalformedHeader {
                key: HEADER_ID.to_string(),
                reason: e.to_string(),
            }
        })?;
        return Ok(Value::Uuid(parsed));
    }
    Ok(decoded)
}

/// String-list-policy encode for one value. `None` means the header
/// is dropped.
fn encode_string_list(key: &str, value: &Value) -> Option<Vec<String>> {
    if key == HEADER_ID || key == HEADER_TIMESTAMP {
        return Some(vec![value.to_string()]);
    }
    match value {
        Value::Str(s) => Some(vec![s.clone()]),
        Value::ContentType(ct) => Some(vec![ct.clone()]),
        Value::List(elements) => {
            let mut values = Vec::with_capacity(elements.len());
            for element in elements {
                match element.as_canonical_string() {
                    Some(s) => values.push(s),
                    None => {
                        warn!(
                            header = key,
                            element_type = element.type_name(),
                            "header not mapped to wire message: unsupported element type"
                        );
                        return None;
                    }
                }
            }
            Some(values)
        }
        other => {
            warn!(
                header = key,
                value_type = other.type_name(),
                "header not mapped to wire message: unsupported type"
            );
            None
        }
    }
}

/// String-list-policy decode for one value. An empty list means the
/// header was elided; `None` omits it from the decoded collection.
fn decode_string_list(key: &str, values: &[String]) -> CodecResult<Option<Value>> {
    if values.is_empty() {
        return Ok(None);
    }

    if key == HEADER_ID {
        let [single] = values else {
            return Err(malformed(HEADER_ID, "expected a single value"));
        };
        let parsed = Uuid::parse_str(single)
            .map_err(|e| malformed(HEADER_ID, &e.to_string()))?;
        return Ok(Some(Value::Uuid(parsed)));
    }

    if key == HEADER_TIMESTAMP {
        let [single] = values else {
            return Err(malformed(HEADER_TIMESTAMP, "expected a single value"));
        };
        let parsed: i64 = single
            .parse()
            .map_err(|_| malformed(HEADER_TIMESTAMP, "not a base-10 64-bit integer"))?;
        return Ok(Some(Value::Long(parsed)));
    }

    Ok(Some(match values {
        [single] => Value::Str(single.clone()),
        many => Value::List(many.iter().cloned().map(Value::Str).collect()),
    }))
}

fn malformed(key: &str, reason: &str) -> CodecError {
    CodecError::MalformedHeader {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reserved_headers() -> (Uuid, i64, Headers) {
        let id = Uuid::new_v4();
        let ts = 1_700_000_000_123i64;
        let mut headers = Headers::new();
        headers.insert(HEADER_ID, id);
        headers.insert(HEADER_TIMESTAMP, ts);
        (id, ts, headers)
    }

    #[test]
    fn structured_reserved_headers_roundtrip_exactly() {
        let (id, ts, mut headers) = reserved_headers();
        headers.insert("lang", "en");

        let codec = HeaderCodec::new(ValuePolicy::Structured);
        let decoded = codec.decode(&codec.encode(&headers)).unwrap();

        assert_eq!(decoded.get(HEADER_ID), Some(&Value::Uuid(id)));
        assert_eq!(decoded.get(HEADER_TIMESTAMP), Some(&Value::Long(ts)));
        assert_eq!(decoded.get("lang"), Some(&Value::Str("en".into())));
    }

    #[test]
    fn string_list_reserved_headers_roundtrip_exactly() {
        let (id, ts, headers) = reserved_headers();

        let codec = HeaderCodec::new(ValuePolicy::StringList);
        let decoded = codec.decode(&codec.encode(&headers)).unwrap();

        assert_eq!(decoded.get(HEADER_ID), Some(&Value::Uuid(id)));
        assert_eq!(decoded.get(HEADER_TIMESTAMP), Some(&Value::Long(ts)));
    }

    #[test]
    fn structured_keeps_native_types() {
        let mut headers = Headers::new();
        headers.insert("retries", 3i32);
        headers.insert("ratio", 0.5f64);
        headers.insert("enabled", true);

        let codec = HeaderCodec::new(ValuePolicy::Structured);
        let decoded = codec.decode(&codec.encode(&headers)).unwrap();

        assert_eq!(decoded.get("retries"), Some(&Value::Int(3)));
        assert_eq!(decoded.get("ratio"), Some(&Value::Double(0.5)));
        assert_eq!(decoded.get("enabled"), Some(&Value::Bool(true)));
    }

    #[test]
    fn string_list_preserves_three_element_order() {
        let mut headers = Headers::new();
        headers.insert(
            "tags",
            vec!["alpha".to_string(), "beta".to_string(), "gamma".to_string()],
        );

        let codec = HeaderCodec::new(ValuePolicy::StringList);
        let decoded = codec.decode(&codec.encode(&headers)).unwrap();

        assert_eq!(
            decoded.get("tags"),
            Some(&Value::List(vec![
                Value::Str("alpha".into()),
                Value::Str("beta".into()),
                Value::Str("gamma".into()),
            ]))
        );
    }

    #[test]
    fn single_element_list_decodes_to_bare_string() {
        let mut headers = Headers::new();
        headers.insert("tags", vec!["solo".to_string()]);

        let codec = HeaderCodec::new(ValuePolicy::StringList);
        let decoded = codec.decode(&codec.encode(&headers)).unwrap();

        assert_eq!(decoded.get("tags"), Some(&Value::Str("solo".into())));
    }

    #[test]
    fn mixed_scalar_list_uses_string_forms() {
        let mut headers = Headers::new();
        headers.insert(
            "mixed",
            Value::List(vec![Value::Str("a".into()), Value::Int(2)]),
        );

        let codec = HeaderCodec::new(ValuePolicy::StringList);
        let decoded = codec.decode(&codec.encode(&headers)).unwrap();

        assert_eq!(
            decoded.get("mixed"),
            Some(&Value::List(vec![
                Value::Str("a".into()),
                Value::Str("2".into()),
            ]))
        );
    }

    #[test]
    fn string_list_drops_unsupported_headers_but_keeps_the_rest() {
        let mut headers = Headers::new();
        headers.insert("keep", "yes");
        headers.insert("drop-me", Value::Opaque("some application type".into()));
        headers.insert("drop-me-too", 42i32);
        headers.insert(
            "nested",
            Value::List(vec![Value::List(vec![Value::Int(1)])]),
        );

        let codec = HeaderCodec::new(ValuePolicy::StringList);
        let entries = codec.encode(&headers);

        let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["keep"]);
    }

    #[test]
    fn content_type_rides_as_its_string_form() {
        let mut headers = Headers::new();
        headers.insert("contentType", Value::ContentType("application/json".into()));

        let codec = HeaderCodec::new(ValuePolicy::StringList);
        let decoded = codec.decode(&codec.encode(&headers)).unwrap();

        assert_eq!(
            decoded.get("contentType"),
            Some(&Value::Str("application/json".into()))
        );
    }

    #[test]
    fn empty_value_list_omits_the_header() {
        let entries = vec![HeaderEntry {
            key: "empty".into(),
            value: Some(HeaderValue {
                value: Some(header_value::Value::List(StringList { values: vec![] })),
            }),
        }];

        let decoded = HeaderCodec::default().decode(&entries).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn malformed_id_fails() {
        let entries = vec![HeaderEntry {
            key: HEADER_ID.into(),
            value: Some(HeaderValue {
                value: Some(header_value::Value::List(StringList {
                    values: vec!["not-a-uuid".into()],
                })),
            }),
        }];

        let err = HeaderCodec::default().decode(&entries).unwrap_err();
        assert!(matches!(err, CodecError::MalformedHeader { ref key, .. } if key == HEADER_ID));
    }

    #[test]
    fn malformed_timestamp_fails() {
        let entries = vec![HeaderEntry {
            key: HEADER_TIMESTAMP.into(),
            value: Some(HeaderValue {
                value: Some(header_value::Value::List(StringList {
                    values: vec!["soon".into()],
                })),
            }),
        }];

        let err = HeaderCodec::default().decode(&entries).unwrap_err();
        assert!(
            matches!(err, CodecError::MalformedHeader { ref key, .. } if key == HEADER_TIMESTAMP)
        );
    }

    #[test]
    fn structured_malformed_id_fails() {
        let mut headers = Headers::new();
        headers.insert(HEADER_ID, "definitely-not-a-uuid");

        let codec = HeaderCodec::new(ValuePolicy::Structured);
        let err = codec.decode(&codec.encode(&headers)).unwrap_err();
        assert!(matches!(err, CodecError::MalformedHeader { ref key, .. } if key == HEADER_ID));
    }

    #[test]
    fn missing_header_value_is_invalid() {
        let entries = vec![HeaderEntry {
            key: "broken".into(),
            value: None,
        }];

        let err = HeaderCodec::default().decode(&entries).unwrap_err();
        assert!(matches!(err, CodecError::InvalidArgument(_)));
    }

    #[test]
    fn encode_preserves_insertion_order() {
        let mut headers = Headers::new();
        headers.insert("z", "1");
        headers.insert("a", "2");
        headers.insert("m", "3");

        let codec = HeaderCodec::new(ValuePolicy::Structured);
        let keys: Vec<String> = codec.encode(&headers).into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }
}
