//! The wire envelope: one event name plus positional JSON arguments,
//! flattened into a transport-safe string.
//!
//! The envelope is a flat JSON object: a mandatory `"e"` field carrying
//! the event name and zero or more `"z1"`, `"z2"`, … fields carrying the
//! arguments in call order (1-indexed). Field order in the payload is not
//! significant — arguments are reassembled by ascending numeric suffix —
//! and unrecognized fields are ignored. Round-trip invariant: decoding
//! the output of [`encode`] reproduces the event name and arguments
//! unchanged.

use serde_json::{Map, Value};

/// Field carrying the event name.
pub const EVENT_FIELD: &str = "e";

/// Prefix of the positional argument fields (`z1`, `z2`, …).
pub const ARG_PREFIX: &str = "z";

/// A decoded envelope: event name plus positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub event: String,
    pub args: Vec<Value>,
}

impl Envelope {
    pub fn new(event: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            event: event.into(),
            args,
        }
    }

    /// Serialize to the wire string.
    pub fn encode(&self) -> String {
        encode(&self.event, &self.args)
    }

    /// Parse a wire string.
    pub fn decode(payload: &str) -> Result<Self, DecodeError> {
        decode(payload)
    }
}

/// Why a raw payload is not a usable envelope.
///
/// Decode failures are expected on a shared transport (foreign traffic is
/// normal) and are dropped silently at the session boundary; the taxonomy
/// exists for tests and for callers using the protocol directly.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("envelope has no event field")]
    MissingEvent,

    #[error("envelope event field is not a non-empty string")]
    InvalidEvent,
}

/// Build the wire string for `event` with `args` in call order.
pub fn encode(event: &str, args: &[Value]) -> String {
    let mut fields = Map::new();
    fields.insert(EVENT_FIELD.to_string(), Value::String(event.to_string()));
    for (index, arg) in args.iter().enumerate() {
        fields.insert(format!("{}{}", ARG_PREFIX, index + 1), arg.clone());
    }
    Value::Object(fields).to_string()
}

/// Parse a wire string into an [`Envelope`].
pub fn decode(payload: &str) -> Result<Envelope, DecodeError> {
    let parsed: Value = serde_json::from_str(payload)?;
    let Value::Object(mut fields) = parsed else {
        return Err(DecodeError::NotAnObject);
    };

    let event = match fields.remove(EVENT_FIELD) {
        None => return Err(DecodeError::MissingEvent),
        Some(Value::String(name)) if !name.is_empty() => name,
        Some(_) => return Err(DecodeError::InvalidEvent),
    };

    let mut indexed: Vec<(u64, Value)> = fields
        .into_iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(ARG_PREFIX)
                .and_then(|suffix| suffix.parse::<u64>().ok())
                .map(|index| (index, value))
        })
        .collect();
    indexed.sort_by_key(|(index, _)| *index);

    Ok(Envelope {
        event,
        args: indexed.into_iter().map(|(_, value)| value).collect(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn round_trip_no_args() {
        let env = decode(&encode("ready", &[])).unwrap();
        assert_eq!(env, Envelope::new("ready", vec![]));
    }

    #[test]
    fn round_trip_one_arg() {
        let args = vec![json!({"token": "abc"})];
        let env = decode(&encode("init", &args)).unwrap();
        assert_eq!(env, Envelope::new("init", args));
    }

    #[test]
    fn round_trip_five_args() {
        let args = vec![json!(1), json!("two"), json!(null), json!([3, 4]), json!(true)];
        let env = decode(&encode("batch", &args)).unwrap();
        assert_eq!(env, Envelope::new("batch", args));
    }

    #[test]
    fn encoded_shape_is_flat() {
        let wire: Value =
            serde_json::from_str(&encode("ready", &[json!(7), json!("x")])).unwrap();
        assert_eq!(wire, json!({"e": "ready", "z1": 7, "z2": "x"}));
    }

    #[test]
    fn field_order_is_insignificant() {
        let env = decode(r#"{"z2": "second", "e": "shuffle", "z1": "first"}"#).unwrap();
        assert_eq!(env.event, "shuffle");
        assert_eq!(env.args, vec![json!("first"), json!("second")]);
    }

    #[test]
    fn args_order_by_numeric_suffix_not_lexicographic() {
        // Lexicographically "z10" < "z2"; numerically it comes after.
        let env = decode(r#"{"e": "n", "z10": 10, "z2": 2, "z1": 1}"#).unwrap();
        assert_eq!(env.args, vec![json!(1), json!(2), json!(10)]);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let env = decode(r#"{"e": "x", "z1": 1, "junk": true, "zz": 9}"#).unwrap();
        assert_eq!(env.args, vec![json!(1)]);
    }

    #[test]
    fn malformed_payload_is_rejected() {
        assert!(matches!(decode("not json"), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn non_object_payload_is_rejected() {
        assert!(matches!(decode("[1, 2]"), Err(DecodeError::NotAnObject)));
        assert!(matches!(decode("\"e\""), Err(DecodeError::NotAnObject)));
    }

    #[test]
    fn missing_event_field_is_rejected() {
        assert!(matches!(decode(r#"{"z1": 1}"#), Err(DecodeError::MissingEvent)));
    }

    #[test]
    fn invalid_event_field_is_rejected() {
        assert!(matches!(decode(r#"{"e": 5}"#), Err(DecodeError::InvalidEvent)));
        assert!(matches!(decode(r#"{"e": ""}"#), Err(DecodeError::InvalidEvent)));
    }
}
