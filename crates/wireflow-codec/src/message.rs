//! Application-side message model.
//!
//! [`AppMessage`] mirrors the hosting framework's message abstraction:
//! a raw payload plus an open, dynamically typed header collection.
//! Messages are immutable once constructed; [`AppMessage::with_header`]
//! produces a new message rather than mutating in place.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

/// Reserved header key carrying the message UUID.
pub const HEADER_ID: &str = "id";

/// Reserved header key carrying the creation time in epoch millis.
pub const HEADER_TIMESTAMP: &str = "timestamp";

/// A dynamically typed header value.
///
/// Covers the scalar set the wire protocol preserves, plus the
/// application-side shapes the string-list policy knows how to
/// flatten. [`Value::Opaque`] stands in for application types outside
/// the known set; only a display form survives for those.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Bytes(Vec<u8>),
    Double(f64),
    Float(f32),
    Int(i32),
    Long(i64),
    Short(i16),
    Str(String),
    Uuid(Uuid),
    /// A MIME-type-like content type, e.g. `application/json`.
    ContentType(String),
    /// An ordered collection of values.
    List(Vec<Value>),
    /// A value outside the known set, reduced to its display form.
    Opaque(String),
}

impl Value {
    /// Short type tag for log messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Bytes(_) => "bytes",
            Value::Double(_) => "double",
            Value::Float(_) => "float",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Short(_) => "short",
            Value::Str(_) => "string",
            Value::Uuid(_) => "uuid",
            Value::ContentType(_) => "content-type",
            Value::List(_) => "list",
            Value::Opaque(_) => "opaque",
        }
    }

    /// Canonical single-string form used by the string-list policy,
    /// when the value has one. Nested lists and opaque values do not.
    pub(crate) fn as_canonical_string(&self) -> Option<String> {
        match self {
            Value::Bool(_)
            | Value::Double(_)
            | Value::Float(_)
            | Value::Int(_)
            | Value::Long(_)
            | Value::Short(_)
            | Value::Str(_)
            | Value::Uuid(_)
            | Value::ContentType(_) => Some(self.to_string()),
            Value::Bytes(_) | Value::List(_) | Value::Opaque(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            Value::Double(d) => write!(f, "{d}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Long(l) => write!(f, "{l}"),
            Value::Short(s) => write!(f, "{s}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Uuid(u) => write!(f, "{u}"),
            Value::ContentType(ct) => write!(f, "{ct}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Opaque(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::List(v.into_iter().map(Value::Str).collect())
    }
}

/// Insertion-ordered, key-unique header collection.
///
/// Backed by a small vector: header maps are a handful of entries and
/// iteration order must survive encode/decode round trips.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Headers {
    entries: Vec<(String, Value)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a header. Replacing keeps the key's original
    /// position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Value)> for Headers {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let mut headers = Headers::new();
        for (key, value) in iter {
            headers.insert(key, value);
        }
        headers
    }
}

/// The in-process message: raw payload plus open headers.
///
/// Construction auto-populates the reserved `id` and `timestamp`
/// headers when absent, so every message carries both.
#[derive(Debug, Clone, PartialEq)]
pub struct AppMessage {
    payload: Vec<u8>,
    headers: Headers,
}

impl AppMessage {
    /// Build a message with no caller-supplied headers.
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self::with_headers(payload, Headers::new())
    }

    /// Build a message with the given headers, filling in `id` and
    /// `timestamp` if the caller left them out.
    pub fn with_headers(payload: impl Into<Vec<u8>>, mut headers: Headers) -> Self {
        if !headers.contains_key(HEADER_ID) {
            headers.insert(HEADER_ID, Value::Uuid(Uuid::new_v4()));
        }
        if !headers.contains_key(HEADER_TIMESTAMP) {
            headers.insert(HEADER_TIMESTAMP, Value::Long(epoch_millis()));
        }
        Self {
            payload: payload.into(),
            headers,
        }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The reserved `id` header, if it holds a UUID.
    pub fn id(&self) -> Option<Uuid> {
        match self.headers.get(HEADER_ID) {
            Some(Value::Uuid(id)) => Some(*id),
            _ => None,
        }
    }

    /// The reserved `timestamp` header, if it holds an integer.
    pub fn timestamp(&self) -> Option<i64> {
        match self.headers.get(HEADER_TIMESTAMP) {
            Some(Value::Long(ts)) => Some(*ts),
            _ => None,
        }
    }

    /// Copy this message with one header added or replaced. The
    /// original is untouched.
    pub fn with_header(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut headers = self.headers.clone();
        headers.insert(key, value);
        Self {
            payload: self.payload.clone(),
            headers,
        }
    }
}

fn epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
