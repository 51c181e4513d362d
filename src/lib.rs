//! typerpc - descriptor-driven JSON-RPC 2.0 codec
//!
//! This is the convenience crate re-exporting the typerpc sub-crates:
//!
//! - **typerpc-core**: message types, method descriptors, registries, the
//!   codec, metrics and observability setup
//! - **typerpc-macros**: `#[method]` for deriving descriptors from functions
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use typerpc::{method, Message, MessageCodec, MethodTable};
//!
//! #[method]
//! fn add(a: i64, b: i64) -> i64 {
//!     a + b
//! }
//!
//! # fn main() -> typerpc::Result<()> {
//! let table = MethodTable::try_from_iter([add_descriptor()])?;
//! let codec = MessageCodec::new(Arc::new(table));
//!
//! let request = codec
//!     .decode_str(r#"{"jsonrpc":"2.0","id":"1","method":"add","params":[2,3]}"#)?;
//! if let Some(Message::Request(request)) = request {
//!     let params = request.params.as_ref().expect("params");
//!     let sum = add(*params.arg_as::<i64>(0).unwrap(), *params.arg_as::<i64>(1).unwrap());
//!     assert_eq!(sum, 5);
//! }
//! # Ok(())
//! # }
//! ```

pub use typerpc_core as core;
pub use typerpc_macros as macros;

pub use typerpc_core::*;
pub use typerpc_macros::method;
