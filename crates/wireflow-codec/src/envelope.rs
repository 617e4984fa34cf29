//! Wire envelope assembly.
//!
//! [`EnvelopeBuilder`] accumulates a payload and optional headers and
//! produces the wire `Envelope`; [`decode_envelope`] is the inverse,
//! reconstructing an [`AppMessage`] from a received envelope.

use crate::error::{CodecError, CodecResult};
use crate::headers::{HeaderCodec, ValuePolicy};
use crate::message::{AppMessage, Headers};
use crate::proto::{Envelope, HeaderEntry};

/// Fluent builder for wire envelopes.
///
/// One builder instance is single-writer; it is not shared across
/// threads. `build` borrows rather than consumes, so repeated builds
/// without further mutation yield equal envelopes.
#[derive(Debug, Clone, Default)]
pub struct EnvelopeBuilder {
    codec: HeaderCodec,
    payload: Option<Vec<u8>>,
    headers: Option<Vec<HeaderEntry>>,
}

impl EnvelopeBuilder {
    /// A builder whose header encoding follows `policy`. The policy is
    /// fixed for the builder's lifetime; one envelope never mixes
    /// policies.
    pub fn new(policy: ValuePolicy) -> Self {
        Self {
            codec: HeaderCodec::new(policy),
            payload: None,
            headers: None,
        }
    }

    /// Set the payload. Required before `build`.
    pub fn payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Encode and attach an application header collection.
    pub fn headers(mut self, headers: &Headers) -> Self {
        self.headers = Some(self.codec.encode(headers));
        self
    }

    /// Attach already-encoded wire headers untouched. Used when
    /// replying to an envelope whose headers should pass through
    /// unchanged.
    pub fn wire_headers(mut self, headers: Vec<HeaderEntry>) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Take both payload and headers from an application message.
    pub fn from_message(self, message: &AppMessage) -> Self {
        self.headers(message.headers()).payload(message.payload())
    }

    /// Assemble the envelope.
    ///
    /// Fails with [`CodecError::MissingPayload`] when no payload was
    /// ever set. An envelope without headers is valid; the headers
    /// collection is simply empty on the wire.
    pub fn build(&self) -> CodecResult<Envelope> {
        let payload = self.payload.clone().ok_or(CodecError::MissingPayload)?;
        Ok(Envelope {
            payload,
            headers: self.headers.clone().unwrap_or_default(),
        })
    }
}

/// Decode a wire envelope into an application message.
///
/// Header decoding is tag-driven, so envelopes produced under either
/// value policy decode the same way. Reserved `id` and `timestamp`
/// headers are freshly populated when the wire carried none.
pub fn decode_envelope(envelope: Envelope) -> CodecResult<AppMessage> {
    let headers = HeaderCodec::default().decode(&envelope.headers)?;
    Ok(AppMessage::with_headers(envelope.payload, headers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Value;

    #[test]
    fn build_without_payload_fails() {
        let err = EnvelopeBuilder::new(ValuePolicy::Structured)
            .build()
            .unwrap_err();
        assert!(matches!(err, CodecError::MissingPayload));
    }

    #[test]
    fn build_without_headers_carries_none() {
        let envelope = EnvelopeBuilder::new(ValuePolicy::Structured)
            .payload("hello")
            .build()
            .unwrap();
        assert_eq!(envelope.payload, b"hello");
        assert!(envelope.headers.is_empty());
    }

    #[test]
    fn build_is_idempotent() {
        let builder = EnvelopeBuilder::new(ValuePolicy::Structured)
            .from_message(&AppMessage::new("hello"));

        let first = builder.build().unwrap();
        let second = builder.build().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn message_roundtrip_preserves_reserved_headers() {
        let message = AppMessage::new("hello").with_header("lang", "en");

        let envelope = EnvelopeBuilder::new(ValuePolicy::Structured)
            .from_message(&message)
            .build()
            .unwrap();
        let decoded = decode_envelope(envelope).unwrap();

        assert_eq!(decoded.payload(), b"hello");
        assert_eq!(decoded.id(), message.id());
        assert_eq!(decoded.timestamp(), message.timestamp());
        assert_eq!(decoded.headers().get("lang"), Some(&Value::Str("en".into())));
    }

    #[test]
    fn string_list_policy_roundtrip() {
        let message = AppMessage::new("hello").with_header(
            "tags",
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
        );

        let envelope = EnvelopeBuilder::new(ValuePolicy::StringList)
            .from_message(&message)
            .build()
            .unwrap();
        let decoded = decode_envelope(envelope).unwrap();

        assert_eq!(decoded.id(), message.id());
        assert_eq!(decoded.timestamp(), message.timestamp());
        assert_eq!(
            decoded.headers().get("tags"),
            Some(&Value::List(vec![
                Value::Str("a".into()),
                Value::Str("b".into()),
                Value::Str("c".into()),
            ]))
        );
    }

    #[test]
    fn unsupported_header_still_produces_an_envelope() {
        let message = AppMessage::new("hello")
            .with_header("weird", Value::Opaque("java.lang.Object@4aa298b7".into()))
            .with_header("keep", "yes");

        let envelope = EnvelopeBuilder::new(ValuePolicy::StringList)
            .from_message(&message)
            .build()
            .unwrap();

        let keys: Vec<&str> = envelope.headers.iter().map(|e| e.key.as_str()).collect();
        assert!(keys.contains(&"keep"));
        assert!(!keys.contains(&"weird"));
        assert_eq!(envelope.payload, b"hello");
    }

    #[test]
    fn headerless_envelope_decodes_with_fresh_reserved_headers() {
        let envelope = EnvelopeBuilder::new(ValuePolicy::Structured)
            .payload("hello")
            .build()
            .unwrap();

        let decoded = decode_envelope(envelope).unwrap();
        assert!(decoded.id().is_some());
        assert!(decoded.timestamp().is_some());
    }
}
