//! Error types for typerpc
//!
//! Two error types live here:
//!
//! - **Error**: what codec and descriptor operations return (uses thiserror)
//! - **ResponseError**: the `error` member of a JSON-RPC 2.0 response, as it
//!   appears on the wire
//!
//! A decode failure can be turned into a `ResponseError` with `From<&Error>`,
//! which is what a dispatcher sends back when an incoming message cannot be
//! understood.
//!
//! # Examples
//!
//! ```rust
//! use typerpc_core::{Error, ResponseError};
//!
//! let error = Error::Parse("unexpected end of input".into());
//! let wire: ResponseError = (&error).into();
//! assert_eq!(wire.code, typerpc_core::error_codes::PARSE_ERROR);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for typerpc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Reserved JSON-RPC 2.0 error codes
pub mod error_codes {
    /// Invalid JSON was received.
    pub const PARSE_ERROR: i32 = -32700;
    /// The JSON sent is not a valid request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// The method does not exist or is not available.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid method parameter(s).
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Lower bound of the implementation-defined server error range.
    pub const SERVER_ERROR_START: i32 = -32099;
    /// Upper bound of the implementation-defined server error range.
    pub const SERVER_ERROR_END: i32 = -32000;
}

/// Error type for codec and descriptor operations
///
/// # Error Categories
///
/// - **Parse**: the input is not a JSON-RPC message (bad JSON, wrong field
///   shapes, or neither `id` nor `method`)
/// - **TypeMismatch**: a declared parameter or return type rejected the
///   wire value
/// - **Serialization**: an outgoing value has no JSON representation
/// - **InvalidDescriptor**: a method descriptor was built without a name
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The input could not be read as a JSON-RPC message.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A resolved declared type rejected the wire value.
    ///
    /// Propagated rather than downgraded: continuing would hand the caller a
    /// payload of the wrong type.
    #[error("Type mismatch: expected {expected}: {reason}")]
    TypeMismatch {
        /// Name of the declared type
        expected: &'static str,
        /// What the decoder reported
        reason: String,
    },

    /// An outgoing value could not be written as JSON.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A method descriptor was constructed with an empty name.
    #[error("Invalid method descriptor: {0}")]
    InvalidDescriptor(String),
}

impl Error {
    /// Short, stable label for this error, used as a metric attribute
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Parse(_) => "parse",
            Error::TypeMismatch { .. } => "type_mismatch",
            Error::Serialization(_) => "serialization",
            Error::InvalidDescriptor(_) => "invalid_descriptor",
        }
    }
}

/// JSON-RPC 2.0 error object
///
/// Appears in the `error` member of a response. `code` and `message` are
/// required; `data` is optional and may hold any JSON value.
///
/// # Examples
///
/// ```rust
/// use typerpc_core::ResponseError;
/// use serde_json::json;
///
/// let error = ResponseError::method_not_found("calculate");
/// assert_eq!(error.code, -32601);
///
/// let custom = ResponseError::with_data(
///     1001,
///     "Insufficient funds",
///     json!({"balance": 50, "required": 100})
/// );
/// assert!(custom.data.is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    /// Numeric error code
    ///
    /// Codes from -32768 to -32000 are reserved by JSON-RPC 2.0.
    pub code: i32,

    /// Short description of the error
    pub message: String,

    /// Additional information, kept as an untyped JSON value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ResponseError {
    /// Create an error with a code and message
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create an error carrying additional data
    pub fn with_data(code: i32, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Parse error (-32700)
    pub fn parse_error() -> Self {
        Self::new(error_codes::PARSE_ERROR, "Parse error")
    }

    /// Invalid request error (-32600)
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(error_codes::INVALID_REQUEST, msg)
    }

    /// Method not found error (-32601)
    ///
    /// ```rust
    /// use typerpc_core::ResponseError;
    ///
    /// let error = ResponseError::method_not_found("calculateFoo");
    /// assert_eq!(error.message, "Method not found: calculateFoo");
    /// ```
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::new(
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", method.into()),
        )
    }

    /// Invalid params error (-32602)
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::new(error_codes::INVALID_PARAMS, msg)
    }

    /// Internal error (-32603)
    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::new(error_codes::INTERNAL_ERROR, msg)
    }

    /// Whether the code falls in the implementation-defined server range
    pub fn is_server_error(&self) -> bool {
        (error_codes::SERVER_ERROR_START..=error_codes::SERVER_ERROR_END).contains(&self.code)
    }
}

impl std::fmt::Display for ResponseError {
    /// Formats as "[code] message", e.g. "[-32601] Method not found: foo"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ResponseError {}

impl From<&Error> for ResponseError {
    fn from(error: &Error) -> Self {
        match error {
            Error::Parse(msg) => Self::new(error_codes::PARSE_ERROR, msg.clone()),
            Error::TypeMismatch { .. } => Self::invalid_params(error.to_string()),
            Error::Serialization(_) | Error::InvalidDescriptor(_) => {
                Self::internal_error(error.to_string())
            }
        }
    }
}
