//! Descriptor-driven codec for JSON-RPC messages
//!
//! [`MessageCodec`] reads one JSON-RPC message at a time from any serde
//! [`Deserializer`] and writes it back through any [`Serializer`]. What sets
//! it apart from plain serde derives is payload typing: the Rust type of
//! `params` comes from the [`MethodDescriptor`] registered for `method`, and
//! the type of `result` comes from the method of the request the response
//! answers.
//!
//! # Resolution Order
//!
//! Field order in a JSON object is unconstrained, so the context needed to
//! type a payload may arrive after the payload itself. Decoding therefore
//! runs in two passes:
//!
//! 1. **Scan**: fields are read in wire order. `params` is typed on the spot
//!    if `method` has already been seen, and `result` if `id` has been seen
//!    and correlates to a registered method. Otherwise the payload is
//!    captured as an untyped `serde_json::Value` subtree.
//! 2. **Finish**: after the closing brace, captured payloads are typed with
//!    the final `method` and `id`. A result that still cannot be typed is
//!    kept untyped rather than dropped.
//!
//! A repeated field keeps its last value. If a later `method` or `id`
//! replaces the one a payload was typed under during the scan, the finish
//! pass types that payload again, so the decoded shape never depends on
//! field order.
//!
//! # Params Arity
//!
//! Given the declared parameter types of the method:
//!
//! - none (or unknown method): the wire value stays untyped
//! - exactly one: the whole wire value is decoded as that type, whatever its
//!   JSON shape
//! - several: a JSON array is decoded element by element; extra elements stay
//!   untyped and missing trailing ones become `None`. Any other JSON shape
//!   (a named-argument object, say) stays untyped; there is no name matching.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use typerpc_core::{Message, MessageCodec, MethodDescriptor, MethodTable, TypeHandle};
//!
//! let table = MethodTable::new().with_method(
//!     MethodDescriptor::request(
//!         "add",
//!         TypeHandle::of::<i64>(),
//!         vec![TypeHandle::of::<i64>(), TypeHandle::of::<i64>()],
//!     ).unwrap(),
//! );
//! let codec = MessageCodec::new(Arc::new(table));
//!
//! let json = r#"{"params":[1,2],"method":"add","id":"1","jsonrpc":"2.0"}"#;
//! let message = codec.decode_str(json).unwrap().unwrap();
//!
//! match &message {
//!     Message::Request(request) => {
//!         let params = request.params.as_ref().unwrap();
//!         assert_eq!(params.arg_as::<i64>(0), Some(&1));
//!         assert_eq!(params.arg_as::<i64>(1), Some(&2));
//!     }
//!     _ => panic!("expected a request"),
//! }
//!
//! let encoded = codec.encode_to_string(&message).unwrap();
//! assert_eq!(encoded, r#"{"jsonrpc":"2.0","id":"1","method":"add","params":[1,2]}"#);
//! ```

use crate::error::{Error, ResponseError, Result};
use crate::method::{MethodDescriptor, TypeHandle};
use crate::metrics::CodecMetrics;
use crate::registry::{CorrelationResolver, MethodRegistry};
use crate::types::{
    Message, NotificationMessage, Params, Payload, RequestMessage, ResponseMessage,
    JSONRPC_VERSION,
};
use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, Unexpected, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::io;
use std::sync::Arc;

const SHAPE_MISMATCH: &str = "message does not match Request/Response/Notification shape";

/// Codec for JSON-RPC 2.0 messages with descriptor-typed payloads
///
/// The codec only holds shared references to its collaborators, so it is
/// cheap to clone and can decode or encode on many threads at once.
#[derive(Clone)]
pub struct MessageCodec {
    registry: Arc<dyn MethodRegistry>,
    correlation: Option<Arc<dyn CorrelationResolver>>,
    metrics: Option<Arc<CodecMetrics>>,
}

impl MessageCodec {
    /// Create a codec typing payloads from `registry`
    ///
    /// Without a correlation resolver every response result stays untyped.
    pub fn new(registry: Arc<dyn MethodRegistry>) -> Self {
        Self {
            registry,
            correlation: None,
            metrics: None,
        }
    }

    /// Resolve response ids to the methods of their requests
    pub fn with_correlation(mut self, correlation: Arc<dyn CorrelationResolver>) -> Self {
        self.correlation = Some(correlation);
        self
    }

    /// Record codec activity on `metrics`
    pub fn with_metrics(mut self, metrics: Arc<CodecMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Decode one message from a deserializer positioned at a JSON object or
    /// `null`
    ///
    /// Returns `Ok(None)` for `null`.
    ///
    /// # Errors
    ///
    /// - `Error::Parse` if the input is not a JSON-RPC message object, a
    ///   field has the wrong shape, or neither `id` nor `method` is present
    /// - `Error::TypeMismatch` if a declared type rejects its payload
    pub fn decode<'de, D>(&self, deserializer: D) -> Result<Option<Message>>
    where
        D: Deserializer<'de>,
    {
        let outcome = MessageSeed { codec: self }
            .deserialize(deserializer)
            .map_err(|e| Error::Parse(e.to_string()))
            .and_then(|scan| scan.map(|scan| self.finish(scan)).transpose());

        match &outcome {
            Ok(Some(message)) => {
                tracing::trace!(
                    kind = message.kind(),
                    id = ?message.id(),
                    method = ?message.method(),
                    "Decoded JSON-RPC message"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_decoded(message.kind());
                }
            }
            Ok(None) => {}
            Err(error) => self.record_failure(error),
        }
        outcome
    }

    /// Decode one message from a JSON string
    ///
    /// Trailing non-whitespace after the message is a parse error.
    pub fn decode_str(&self, json: &str) -> Result<Option<Message>> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        let message = self.decode(&mut deserializer)?;
        self.finish_input(deserializer.end())?;
        Ok(message)
    }

    /// Decode one message from JSON bytes
    pub fn decode_slice(&self, json: &[u8]) -> Result<Option<Message>> {
        let mut deserializer = serde_json::Deserializer::from_slice(json);
        let message = self.decode(&mut deserializer)?;
        self.finish_input(deserializer.end())?;
        Ok(message)
    }

    /// Decode one message from an already parsed JSON value
    pub fn decode_value(&self, value: Value) -> Result<Option<Message>> {
        self.decode(value)
    }

    /// Encode `message` through any serde serializer
    ///
    /// `jsonrpc` comes first (defaulting to "2.0"), followed by `id`,
    /// `method`, `params` for requests; `id` and then `error` or `result` for
    /// responses; `method`, `params` for notifications. Absent payloads are
    /// written as explicit `null`.
    pub fn encode<S>(&self, message: &Message, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        WireMessage(message).serialize(serializer)
    }

    /// Encode `message` as JSON into `writer`
    ///
    /// # Errors
    ///
    /// `Error::Serialization` if a payload value has no JSON representation
    /// or the writer fails.
    pub fn encode_to_writer<W: io::Write>(&self, message: &Message, writer: W) -> Result<()> {
        let mut serializer = serde_json::Serializer::new(writer);
        let outcome = self
            .encode(message, &mut serializer)
            .map_err(|e| Error::Serialization(e.to_string()));
        self.observe_encode(message, &outcome);
        outcome
    }

    /// Encode `message` as JSON bytes
    pub fn encode_to_vec(&self, message: &Message) -> Result<Vec<u8>> {
        let mut buffer = Vec::with_capacity(128);
        self.encode_to_writer(message, &mut buffer)?;
        Ok(buffer)
    }

    /// Encode `message` as a JSON string
    pub fn encode_to_string(&self, message: &Message) -> Result<String> {
        let buffer = self.encode_to_vec(message)?;
        String::from_utf8(buffer).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Encode `message` as a `serde_json::Value`
    pub fn encode_to_value(&self, message: &Message) -> Result<Value> {
        let outcome = self
            .encode(message, serde_json::value::Serializer)
            .map_err(|e| Error::Serialization(e.to_string()));
        self.observe_encode(message, &outcome);
        outcome
    }

    fn observe_encode<T>(&self, message: &Message, outcome: &Result<T>) {
        match outcome {
            Ok(_) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_encoded(message.kind());
                }
            }
            Err(error) => self.record_failure(error),
        }
    }

    fn finish_input(&self, end: serde_json::Result<()>) -> Result<()> {
        end.map_err(|e| {
            let error = Error::Parse(e.to_string());
            self.record_failure(&error);
            error
        })
    }

    fn record_failure(&self, error: &Error) {
        tracing::debug!(error = %error, "JSON-RPC codec failure");
        if let Some(metrics) = &self.metrics {
            metrics.record_error(error.kind());
        }
    }

    fn record_untyped(&self, field: &'static str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_untyped(field);
        }
    }

    /// Return type of the method the request `id` was issued for
    fn return_type_for(&self, id: &str) -> Option<TypeHandle> {
        let method = self.correlation.as_ref()?.resolve_method(id)?;
        let descriptor = self.registry.lookup(&method)?;
        descriptor.return_type().cloned()
    }

    /// Apply the arity rules to a `params` value of a known method
    fn resolve_params(&self, method: &str, raw: &Value) -> Result<Option<Params>> {
        if raw.is_null() {
            return Ok(None);
        }
        let descriptor = self.registry.lookup(method);
        let declared = descriptor
            .as_deref()
            .map(MethodDescriptor::parameter_types)
            .unwrap_or_default();

        match (declared, raw) {
            ([], raw) => {
                if descriptor.is_none() {
                    tracing::debug!(method, "Unregistered method; keeping params untyped");
                }
                self.record_untyped("params");
                Ok(Some(Params::Untyped(raw.clone())))
            }
            ([single], raw) => single.decode(raw).map(|value| Some(Params::Single(value))),
            (declared, Value::Array(items)) => {
                decode_positional(declared, items).map(|args| Some(Params::Positional(args)))
            }
            (declared, raw) => {
                tracing::debug!(
                    method,
                    declared = declared.len(),
                    "Params are not a positional array; keeping them untyped"
                );
                self.record_untyped("params");
                Ok(Some(Params::Untyped(raw.clone())))
            }
        }
    }

    /// Type a `result` value by the request `id` it answers
    fn resolve_result(&self, id: &str, raw: &Value) -> Result<Option<Payload>> {
        if raw.is_null() {
            return Ok(None);
        }
        match self.return_type_for(id) {
            Some(return_type) => decode_result(&return_type, raw),
            None => {
                tracing::debug!(id, "No correlated return type; keeping result untyped");
                self.record_untyped("result");
                Ok(Some(Payload::Untyped(raw.clone())))
            }
        }
    }

    /// Second pass: type what the scan captured and classify the message
    fn finish(&self, scan: Scan) -> Result<Message> {
        let Scan {
            jsonrpc,
            id,
            method,
            params,
            result,
            error,
        } = scan;

        match (id, method) {
            (Some(id), Some(method)) => {
                let params = self.finish_params(&method, params)?;
                Ok(Message::Request(RequestMessage {
                    jsonrpc,
                    id,
                    method,
                    params,
                }))
            }
            (Some(id), None) => {
                let result = match error {
                    Some(_) => None,
                    None => self.finish_result(&id, result)?,
                };
                Ok(Message::Response(ResponseMessage {
                    jsonrpc,
                    id,
                    result,
                    error,
                }))
            }
            (None, Some(method)) => {
                let params = self.finish_params(&method, params)?;
                Ok(Message::Notification(NotificationMessage {
                    jsonrpc,
                    method,
                    params,
                }))
            }
            (None, None) => Err(Error::Parse(SHAPE_MISMATCH.to_string())),
        }
    }

    fn finish_params(&self, method: &str, slot: Slot<Params>) -> Result<Option<Params>> {
        match slot {
            Slot::Absent => Ok(None),
            Slot::Scanned { context, outcome, .. } if context == method => outcome,
            Slot::Scanned { raw, context, .. } => {
                tracing::debug!(
                    scanned = %context,
                    method,
                    "Method changed after params were typed; typing them again"
                );
                self.resolve_params(method, &raw)
            }
            Slot::Captured(raw) => self.resolve_params(method, &raw),
        }
    }

    fn finish_result(&self, id: &str, slot: Slot<Payload>) -> Result<Option<Payload>> {
        match slot {
            Slot::Absent => Ok(None),
            Slot::Scanned { context, outcome, .. } if context == id => outcome,
            Slot::Scanned { raw, .. } | Slot::Captured(raw) => self.resolve_result(id, &raw),
        }
    }
}

impl fmt::Debug for MessageCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageCodec")
            .field("correlation", &self.correlation.is_some())
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}

fn decode_result(return_type: &TypeHandle, raw: &Value) -> Result<Option<Payload>> {
    if raw.is_null() {
        return Ok(None);
    }
    return_type.decode(raw).map(|value| Some(Payload::Typed(value)))
}

fn decode_positional(declared: &[TypeHandle], items: &[Value]) -> Result<Vec<Option<Payload>>> {
    let mut args = Vec::with_capacity(items.len().max(declared.len()));
    for (index, item) in items.iter().enumerate() {
        let arg = match (item, declared.get(index)) {
            (Value::Null, _) => None,
            (item, Some(declared)) => Some(Payload::Typed(declared.decode(item)?)),
            (item, None) => Some(Payload::Untyped(item.clone())),
        };
        args.push(arg);
    }
    if args.len() < declared.len() {
        args.resize(declared.len(), None);
    }
    Ok(args)
}

/// A payload as the scan left it
enum Slot<T> {
    /// The field did not appear
    Absent,
    /// Seen before its typing context; to be typed by the second pass
    Captured(Value),
    /// Typed during the scan under `context`, the method for params or the id
    /// for a result. The raw value is kept in case a later field changes the
    /// context.
    Scanned {
        raw: Value,
        context: String,
        outcome: Result<Option<T>>,
    },
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Slot::Absent
    }
}

/// Fields gathered by the scan
#[derive(Default)]
struct Scan {
    jsonrpc: Option<String>,
    id: Option<String>,
    method: Option<String>,
    params: Slot<Params>,
    result: Slot<Payload>,
    error: Option<ResponseError>,
}

#[derive(Deserialize)]
#[serde(field_identifier, rename_all = "lowercase")]
enum Field {
    Jsonrpc,
    Id,
    Method,
    Params,
    Result,
    Error,
    #[serde(other)]
    Unknown,
}

/// Entry point of the scan: a message object or `null`
struct MessageSeed<'c> {
    codec: &'c MessageCodec,
}

impl<'de> DeserializeSeed<'de> for MessageSeed<'_> {
    type Value = Option<Scan>;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_option(self)
    }
}

impl<'de> Visitor<'de> for MessageSeed<'_> {
    type Value = Option<Scan>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON-RPC message object or null")
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer
            .deserialize_map(ScanVisitor { codec: self.codec })
            .map(Some)
    }
}

struct ScanVisitor<'c> {
    codec: &'c MessageCodec,
}

impl<'de> Visitor<'de> for ScanVisitor<'_> {
    type Value = Scan;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON-RPC message object")
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Scan, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut scan = Scan::default();

        // A repeated field overwrites the earlier value
        while let Some(field) = map.next_key::<Field>()? {
            match field {
                Field::Jsonrpc => scan.jsonrpc = Some(map.next_value()?),
                Field::Id => scan.id = map.next_value::<Option<WireId>>()?.map(|id| id.0),
                Field::Method => scan.method = Some(map.next_value()?),
                Field::Params => {
                    let raw: Value = map.next_value()?;
                    scan.params = match &scan.method {
                        Some(method) => Slot::Scanned {
                            outcome: self.codec.resolve_params(method, &raw),
                            context: method.clone(),
                            raw,
                        },
                        None => Slot::Captured(raw),
                    };
                }
                Field::Result => {
                    let raw: Value = map.next_value()?;
                    let typed = scan.id.as_ref().and_then(|id| {
                        self.codec
                            .return_type_for(id)
                            .map(|return_type| (id.clone(), return_type))
                    });
                    scan.result = match typed {
                        Some((context, return_type)) => Slot::Scanned {
                            outcome: decode_result(&return_type, &raw),
                            context,
                            raw,
                        },
                        None => Slot::Captured(raw),
                    };
                }
                Field::Error => scan.error = map.next_value()?,
                Field::Unknown => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        Ok(scan)
    }
}

/// Request id as it appears on the wire: a string, or a number kept in its
/// literal text
struct WireId(String);

impl<'de> Deserialize<'de> for WireId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // With `arbitrary_precision` a number carries its source digits
        match Value::deserialize(deserializer)? {
            Value::String(id) => Ok(WireId(id)),
            Value::Number(id) => Ok(WireId(id.to_string())),
            other => Err(de::Error::invalid_type(
                unexpected(&other),
                &"a string or numeric request id",
            )),
        }
    }
}

fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Array(_) => Unexpected::Seq,
        Value::Object(_) => Unexpected::Map,
        Value::String(_) | Value::Number(_) => Unexpected::Other("request id"),
    }
}

/// Serialize view of a message in wire field order
struct WireMessage<'a>(&'a Message);

impl Serialize for WireMessage<'_> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("jsonrpc", self.0.jsonrpc().unwrap_or(JSONRPC_VERSION))?;

        match self.0 {
            Message::Request(request) => {
                map.serialize_entry("id", &request.id)?;
                map.serialize_entry("method", &request.method)?;
                map.serialize_entry("params", &request.params)?;
            }
            Message::Response(response) => {
                map.serialize_entry("id", &response.id)?;
                match &response.error {
                    Some(error) => map.serialize_entry("error", error)?,
                    None => map.serialize_entry("result", &response.result)?,
                }
            }
            Message::Notification(notification) => {
                map.serialize_entry("method", &notification.method)?;
                map.serialize_entry("params", &notification.params)?;
            }
        }

        map.end()
    }
}
