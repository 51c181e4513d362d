//! Descriptor-driven JSON-RPC 2.0 codec
//!
//! JSON-RPC leaves the shape of `params` and `result` open. This crate types
//! them anyway: every method is described by a [`MethodDescriptor`] listing
//! its parameter types and return type, and the [`MessageCodec`] uses those
//! descriptors while decoding.
//!
//! - **Types**: [`Message`] and its three shapes, with type-erased payloads
//! - **Method**: [`MethodDescriptor`] and [`TypeHandle`]
//! - **Registry**: [`MethodRegistry`] and [`CorrelationResolver`] lookups,
//!   with [`MethodTable`] and [`PendingRequests`] as ready-made stores
//! - **Codec**: [`MessageCodec`], field-order independent decode and ordered
//!   encode over serde
//! - **Metrics / Observability**: OpenTelemetry counters and OTLP setup
//!
//! The codec is transport-agnostic: it turns one JSON value into one
//! [`Message`] and back. Framing, dispatch and batching belong to the
//! endpoint around it.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use typerpc_core::{Message, MessageCodec, MethodDescriptor, MethodTable,
//!     PendingRequests, TypeHandle};
//!
//! let table = MethodTable::new().with_method(
//!     MethodDescriptor::request("version", TypeHandle::of::<String>(), vec![]).unwrap(),
//! );
//! let pending = Arc::new(PendingRequests::new());
//! let codec = MessageCodec::new(Arc::new(table)).with_correlation(pending.clone());
//!
//! pending.track("1", "version");
//! let message = codec.decode_str(r#"{"jsonrpc":"2.0","result":"1.4.2","id":1}"#).unwrap();
//!
//! if let Some(Message::Response(response)) = message {
//!     let version = response.result.as_ref().and_then(|r| r.downcast_ref::<String>());
//!     assert_eq!(version.map(String::as_str), Some("1.4.2"));
//! }
//! ```

pub mod codec;
pub mod error;
pub mod method;
pub mod metrics;
pub mod observability;
pub mod registry;
pub mod types;

pub use codec::MessageCodec;
pub use error::{error_codes, Error, ResponseError, Result};
pub use method::{MethodDescriptor, TypeAdapter, TypeHandle};
pub use metrics::CodecMetrics;
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use registry::{CorrelationResolver, MethodRegistry, MethodTable, PendingRequests};
pub use types::{
    AnyValue, Message, NotificationMessage, Params, Payload, RequestMessage, ResponseMessage,
    RpcValue, JSONRPC_VERSION,
};
