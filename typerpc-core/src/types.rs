//! JSON-RPC 2.0 message types
//!
//! A message is one of three shapes, told apart on the wire by which of
//! `id` and `method` are present:
//!
//! 1. **Request** (`id` and `method`): a call that expects a response
//! 2. **Notification** (`method` only): a call with no response
//! 3. **Response** (`id` only): the result or error of an earlier request
//!
//! # Payloads
//!
//! `params` and `result` carry values whose Rust type is decided at decode
//! time by a [`MethodDescriptor`](crate::MethodDescriptor). A decoded value
//! is held type-erased in an [`AnyValue`] and recovered with
//! [`AnyValue::downcast_ref`]. When no declared type applies, the payload is
//! kept as an untyped `serde_json::Value` subtree instead of being dropped.
//!
//! # Request IDs
//!
//! Ids are opaque strings. A numeric id on the wire is captured in its
//! literal text (`1.0` stays "1.0"), and every id is written back as a JSON
//! string.

use crate::error::ResponseError;
use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Protocol version written when a message does not carry its own
pub const JSONRPC_VERSION: &str = "2.0";

/// A value that can travel as a typed `params` or `result` payload
///
/// Implemented for every `Serialize + PartialEq + Debug + Send + Sync`
/// type, so decoded values can be compared, printed, downcast and written
/// back out without the codec knowing their concrete type.
pub trait RpcValue: Any + fmt::Debug + Send + Sync {
    /// JSON form of the value, or the serializer's reason it has none
    fn to_json(&self) -> Result<Value, serde_json::Error>;

    /// Returns self as Any for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Equality against another erased value; false when the types differ
    fn eq_dyn(&self, other: &dyn RpcValue) -> bool;

    /// Name of the concrete type
    fn type_name(&self) -> &'static str;
}

impl<T> RpcValue for T
where
    T: Serialize + PartialEq + fmt::Debug + Send + Sync + 'static,
{
    fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_dyn(&self, other: &dyn RpcValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Type-erased decoded value
///
/// Cloning is cheap: the value is shared behind an `Arc`.
///
/// # Examples
///
/// ```rust
/// use typerpc_core::AnyValue;
///
/// let value = AnyValue::new(42i32);
/// assert_eq!(value.downcast_ref::<i32>(), Some(&42));
/// assert!(value.downcast_ref::<String>().is_none());
/// ```
#[derive(Clone)]
pub struct AnyValue(Arc<dyn RpcValue>);

impl AnyValue {
    /// Wrap a concrete value
    pub fn new<T: RpcValue>(value: T) -> Self {
        Self(Arc::new(value))
    }

    fn inner(&self) -> &dyn RpcValue {
        &*self.0
    }

    /// Borrow the value as `T`, if that is its concrete type
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner().as_any().downcast_ref::<T>()
    }

    /// Whether the concrete type is `T`
    pub fn is<T: 'static>(&self) -> bool {
        self.inner().as_any().is::<T>()
    }

    /// Name of the concrete type
    pub fn type_name(&self) -> &'static str {
        self.inner().type_name()
    }

    /// JSON form of the value
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        self.inner().to_json()
    }
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.inner(), f)
    }
}

impl PartialEq for AnyValue {
    fn eq(&self, other: &Self) -> bool {
        self.inner().eq_dyn(other.inner())
    }
}

impl Serialize for AnyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json()
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

/// One decoded slot: a response result or a single positional argument
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// Decoded as a declared type
    Typed(AnyValue),
    /// No declared type applied; the JSON subtree as received
    Untyped(Value),
}

impl Payload {
    /// Wrap a concrete value as a typed payload
    pub fn typed<T: RpcValue>(value: T) -> Self {
        Payload::Typed(AnyValue::new(value))
    }

    /// Borrow a typed payload as `T`
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            Payload::Typed(value) => value.downcast_ref(),
            Payload::Untyped(_) => None,
        }
    }

    /// The raw subtree, if no declared type was applied
    pub fn as_untyped(&self) -> Option<&Value> {
        match self {
            Payload::Untyped(value) => Some(value),
            Payload::Typed(_) => None,
        }
    }

    /// Whether a declared type was applied
    pub fn is_typed(&self) -> bool {
        matches!(self, Payload::Typed(_))
    }
}

/// Decoded `params` of a request or notification
///
/// Which variant a message carries follows from the number of parameter
/// types its method declares:
///
/// - one declared type: the whole wire value as that type ([`Params::Single`])
/// - several declared types and a JSON array: one slot per element, padded
///   with `None` up to the declared count ([`Params::Positional`])
/// - anything else: the wire value untouched ([`Params::Untyped`])
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Params {
    /// The single declared parameter
    Single(AnyValue),
    /// Positional arguments; `None` stands for a JSON null or a missing
    /// trailing argument
    Positional(Vec<Option<Payload>>),
    /// No declared shape applied
    Untyped(Value),
}

impl Params {
    /// Wrap a concrete value as the single parameter
    pub fn single<T: RpcValue>(value: T) -> Self {
        Params::Single(AnyValue::new(value))
    }

    /// Borrow the single parameter as `T`
    pub fn single_as<T: 'static>(&self) -> Option<&T> {
        match self {
            Params::Single(value) => value.downcast_ref(),
            _ => None,
        }
    }

    /// Borrow positional argument `index` as `T`
    pub fn arg_as<T: 'static>(&self, index: usize) -> Option<&T> {
        match self {
            Params::Positional(args) => args.get(index)?.as_ref()?.downcast_ref(),
            _ => None,
        }
    }

    /// The raw subtree, if no declared shape was applied
    pub fn as_untyped(&self) -> Option<&Value> {
        match self {
            Params::Untyped(value) => Some(value),
            _ => None,
        }
    }
}

/// JSON-RPC 2.0 request message
///
/// # Examples
///
/// ```rust
/// use typerpc_core::{Params, RequestMessage};
///
/// let request = RequestMessage::new("1", "add", Some(Params::single(5i32)));
/// assert_eq!(request.jsonrpc.as_deref(), Some("2.0"));
/// assert_eq!(request.method, "add");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RequestMessage {
    /// Protocol version as received; `None` is written as "2.0"
    pub jsonrpc: Option<String>,
    /// Identifier correlating the response with this request
    pub id: String,
    /// Name of the remote method
    pub method: String,
    /// Decoded parameters; `None` for absent or null
    pub params: Option<Params>,
}

impl RequestMessage {
    /// Create a request with the protocol version set
    pub fn new(id: impl Into<String>, method: impl Into<String>, params: Option<Params>) -> Self {
        Self {
            jsonrpc: Some(JSONRPC_VERSION.to_string()),
            id: id.into(),
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC 2.0 notification message
///
/// A notification has no id and gets no response.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationMessage {
    /// Protocol version as received; `None` is written as "2.0"
    pub jsonrpc: Option<String>,
    /// Name of the method or event
    pub method: String,
    /// Decoded parameters; `None` for absent or null
    pub params: Option<Params>,
}

impl NotificationMessage {
    /// Create a notification with the protocol version set
    pub fn new(method: impl Into<String>, params: Option<Params>) -> Self {
        Self {
            jsonrpc: Some(JSONRPC_VERSION.to_string()),
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC 2.0 response message
///
/// At most one of `result` and `error` is meaningful. When both are set,
/// `error` wins on encode; on decode only `error` is kept.
///
/// # Examples
///
/// ```rust
/// use typerpc_core::{Payload, ResponseError, ResponseMessage};
///
/// let ok = ResponseMessage::success("1", Some(Payload::typed(3i64)));
/// assert!(ok.is_success());
///
/// let failed = ResponseMessage::failure("2", ResponseError::method_not_found("nope"));
/// assert!(failed.is_error());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseMessage {
    /// Protocol version as received; `None` is written as "2.0"
    pub jsonrpc: Option<String>,
    /// Id of the request this answers
    pub id: String,
    /// Result payload; `None` for absent or null
    pub result: Option<Payload>,
    /// Error object, present on failure
    pub error: Option<ResponseError>,
}

impl ResponseMessage {
    /// Create a successful response
    pub fn success(id: impl Into<String>, result: Option<Payload>) -> Self {
        Self {
            jsonrpc: Some(JSONRPC_VERSION.to_string()),
            id: id.into(),
            result,
            error: None,
        }
    }

    /// Create an error response
    pub fn failure(id: impl Into<String>, error: ResponseError) -> Self {
        Self {
            jsonrpc: Some(JSONRPC_VERSION.to_string()),
            id: id.into(),
            result: None,
            error: Some(error),
        }
    }

    /// True when no error is set
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// True when an error is set
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Any JSON-RPC 2.0 message
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A request message (expects a response)
    Request(RequestMessage),
    /// A response message (result of processing a request)
    Response(ResponseMessage),
    /// A notification message (no response expected)
    Notification(NotificationMessage),
}

impl Message {
    /// Check if this message is a request
    pub fn is_request(&self) -> bool {
        matches!(self, Message::Request(_))
    }

    /// Check if this message is a response
    pub fn is_response(&self) -> bool {
        matches!(self, Message::Response(_))
    }

    /// Check if this message is a notification
    pub fn is_notification(&self) -> bool {
        matches!(self, Message::Notification(_))
    }

    /// Protocol version carried by the message, if set
    pub fn jsonrpc(&self) -> Option<&str> {
        match self {
            Message::Request(m) => m.jsonrpc.as_deref(),
            Message::Response(m) => m.jsonrpc.as_deref(),
            Message::Notification(m) => m.jsonrpc.as_deref(),
        }
    }

    /// Id of a request or response
    pub fn id(&self) -> Option<&str> {
        match self {
            Message::Request(m) => Some(&m.id),
            Message::Response(m) => Some(&m.id),
            Message::Notification(_) => None,
        }
    }

    /// Method of a request or notification
    pub fn method(&self) -> Option<&str> {
        match self {
            Message::Request(m) => Some(&m.method),
            Message::Notification(m) => Some(&m.method),
            Message::Response(_) => None,
        }
    }

    /// Short label for the message kind ("request", "response", "notification")
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Request(_) => "request",
            Message::Response(_) => "response",
            Message::Notification(_) => "notification",
        }
    }
}

impl From<RequestMessage> for Message {
    fn from(message: RequestMessage) -> Self {
        Message::Request(message)
    }
}

impl From<ResponseMessage> for Message {
    fn from(message: ResponseMessage) -> Self {
        Message::Response(message)
    }
}

impl From<NotificationMessage> for Message {
    fn from(message: NotificationMessage) -> Self {
        Message::Notification(message)
    }
}
