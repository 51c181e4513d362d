//! Method descriptors
//!
//! A [`MethodDescriptor`] says how to type the payloads of one RPC method:
//! the ordered parameter types, the return type, and whether the method is
//! a request or a notification. Types are carried as [`TypeHandle`]s, which
//! are small decode capabilities rather than reflective type metadata.
//!
//! # Examples
//!
//! ```rust
//! use typerpc_core::{MethodDescriptor, TypeHandle};
//!
//! let add = MethodDescriptor::request(
//!     "add",
//!     TypeHandle::of::<i64>(),
//!     vec![TypeHandle::of::<i64>(), TypeHandle::of::<i64>()],
//! ).unwrap();
//! assert_eq!(add.parameter_types().len(), 2);
//! assert!(!add.is_notification());
//!
//! let exit = MethodDescriptor::notification("exit", vec![]).unwrap();
//! assert!(exit.return_type().is_none());
//! ```

use crate::error::{Error, Result};
use crate::types::{AnyValue, RpcValue};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Decode capability for one declared type
///
/// Implementations turn an untyped JSON subtree into a typed [`AnyValue`],
/// or report a [`Error::TypeMismatch`].
pub trait TypeAdapter: Send + Sync {
    /// Name shown in diagnostics and mismatch errors
    fn type_name(&self) -> &'static str;

    /// Decode `value` as the declared type
    fn decode(&self, value: &Value) -> Result<AnyValue>;
}

/// serde-backed adapter for `T`
struct SerdeAdapter<T>(PhantomData<fn() -> T>);

impl<T> TypeAdapter for SerdeAdapter<T>
where
    T: DeserializeOwned + RpcValue,
{
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn decode(&self, value: &Value) -> Result<AnyValue> {
        T::deserialize(value)
            .map(AnyValue::new)
            .map_err(|e| Error::TypeMismatch {
                expected: self.type_name(),
                reason: e.to_string(),
            })
    }
}

/// Shared handle to a declared parameter or return type
#[derive(Clone)]
pub struct TypeHandle(Arc<dyn TypeAdapter>);

impl TypeHandle {
    /// Handle for any serde-deserializable type
    ///
    /// ```rust
    /// use typerpc_core::TypeHandle;
    ///
    /// let handle = TypeHandle::of::<u8>();
    /// let value = handle.decode(&serde_json::json!(7)).unwrap();
    /// assert_eq!(value.downcast_ref::<u8>(), Some(&7));
    /// assert!(handle.decode(&serde_json::json!("seven")).is_err());
    /// ```
    pub fn of<T>() -> Self
    where
        T: DeserializeOwned + RpcValue,
    {
        Self(Arc::new(SerdeAdapter::<T>(PhantomData)))
    }

    /// Handle for a hand-written adapter
    pub fn custom(adapter: impl TypeAdapter + 'static) -> Self {
        Self(Arc::new(adapter))
    }

    /// Name of the declared type
    pub fn name(&self) -> &'static str {
        self.0.type_name()
    }

    /// Decode `value` as the declared type
    pub fn decode(&self, value: &Value) -> Result<AnyValue> {
        self.0.decode(value)
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Description of one JSON-RPC method
///
/// Immutable once built. Descriptors are normally created at startup and
/// stored in a [`MethodRegistry`](crate::MethodRegistry).
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    name: String,
    parameter_types: Vec<TypeHandle>,
    return_type: Option<TypeHandle>,
    notification: bool,
}

impl MethodDescriptor {
    fn build(
        name: String,
        parameter_types: Vec<TypeHandle>,
        return_type: Option<TypeHandle>,
        notification: bool,
    ) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::InvalidDescriptor(
                "method name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            name,
            parameter_types,
            return_type,
            notification,
        })
    }

    /// Describe a notification: no return type, no response expected
    ///
    /// # Errors
    ///
    /// `Error::InvalidDescriptor` if `name` is empty.
    pub fn notification(
        name: impl Into<String>,
        parameter_types: Vec<TypeHandle>,
    ) -> Result<Self> {
        Self::build(name.into(), parameter_types, None, true)
    }

    /// Describe a request returning `return_type`
    ///
    /// # Errors
    ///
    /// `Error::InvalidDescriptor` if `name` is empty.
    pub fn request(
        name: impl Into<String>,
        return_type: TypeHandle,
        parameter_types: Vec<TypeHandle>,
    ) -> Result<Self> {
        Self::build(name.into(), parameter_types, Some(return_type), false)
    }

    /// Method name as it appears on the wire
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter types, in positional order
    pub fn parameter_types(&self) -> &[TypeHandle] {
        &self.parameter_types
    }

    /// Declared return type; `None` for notifications
    pub fn return_type(&self) -> Option<&TypeHandle> {
        self.return_type.as_ref()
    }

    /// Whether this method is a notification
    pub fn is_notification(&self) -> bool {
        self.notification
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.notification {
            "notification"
        } else {
            "request"
        };
        writeln!(f, "MethodDescriptor ({}) {{", kind)?;
        writeln!(f, "    name: {}", self.name)?;
        writeln!(f, "    parameterTypes: {:?}", self.parameter_types)?;
        if let Some(return_type) = &self.return_type {
            writeln!(f, "    returnType: {}", return_type.name())?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Range {
        start: u32,
        end: u32,
    }

    #[test]
    fn test_request_descriptor() {
        let descriptor = MethodDescriptor::request(
            "add",
            TypeHandle::of::<i32>(),
            vec![TypeHandle::of::<i32>(), TypeHandle::of::<i32>()],
        )
        .unwrap();

        assert_eq!(descriptor.name(), "add");
        assert_eq!(descriptor.parameter_types().len(), 2);
        assert_eq!(descriptor.return_type().map(TypeHandle::name), Some("i32"));
        assert!(!descriptor.is_notification());
    }

    #[test]
    fn test_notification_descriptor() {
        let descriptor =
            MethodDescriptor::notification("textDocument/didOpen", vec![TypeHandle::of::<Range>()])
                .unwrap();

        assert!(descriptor.is_notification());
        assert!(descriptor.return_type().is_none());
        assert_eq!(descriptor.parameter_types().len(), 1);
    }

    #[test]
    fn test_empty_name_rejected() {
        let result = MethodDescriptor::notification("", vec![]);
        assert!(matches!(result, Err(Error::InvalidDescriptor(_))));

        let result = MethodDescriptor::request("", TypeHandle::of::<()>(), vec![]);
        assert!(matches!(result, Err(Error::InvalidDescriptor(_))));
    }

    #[test]
    fn test_type_handle_decode() {
        let handle = TypeHandle::of::<Range>();
        let value = handle.decode(&json!({"start": 1, "end": 5})).unwrap();
        assert_eq!(value.downcast_ref::<Range>(), Some(&Range { start: 1, end: 5 }));
    }

    #[test]
    fn test_type_handle_mismatch() {
        let handle = TypeHandle::of::<u32>();
        match handle.decode(&json!("not a number")) {
            Err(Error::TypeMismatch { expected, reason }) => {
                assert_eq!(expected, "u32");
                assert!(!reason.is_empty());
            }
            other => panic!("Expected TypeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_custom_adapter() {
        struct Upper;

        impl TypeAdapter for Upper {
            fn type_name(&self) -> &'static str {
                "Upper"
            }

            fn decode(&self, value: &Value) -> Result<AnyValue> {
                match value {
                    Value::String(s) => Ok(AnyValue::new(s.to_uppercase())),
                    other => Err(Error::TypeMismatch {
                        expected: "Upper",
                        reason: format!("expected a string, got {}", other),
                    }),
                }
            }
        }

        let handle = TypeHandle::custom(Upper);
        assert_eq!(handle.name(), "Upper");
        let value = handle.decode(&json!("shout")).unwrap();
        assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("SHOUT"));
        assert!(handle.decode(&json!(1)).is_err());
    }

    #[test]
    fn test_display() {
        let descriptor = MethodDescriptor::request(
            "sum",
            TypeHandle::of::<i64>(),
            vec![TypeHandle::of::<i64>(), TypeHandle::of::<i64>()],
        )
        .unwrap();
        let display = descriptor.to_string();

        assert!(display.starts_with("MethodDescriptor (request) {"));
        assert!(display.contains("name: sum"));
        assert!(display.contains("parameterTypes: [i64, i64]"));
        assert!(display.contains("returnType: i64"));

        let notification = MethodDescriptor::notification("exit", vec![]).unwrap();
        let display = notification.to_string();
        assert!(display.starts_with("MethodDescriptor (notification) {"));
        assert!(!display.contains("returnType"));
    }
}
