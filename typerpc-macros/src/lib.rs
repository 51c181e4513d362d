//! Procedural macros for typerpc
//!
//! ## `#[method]`
//!
//! Derives a [`MethodDescriptor`] from a function signature, so the wire
//! types of a method are written once, on the function that implements it.
//!
//! ```ignore
//! use typerpc::method;
//!
//! #[method]
//! fn add(a: i64, b: i64) -> i64 {
//!     a + b
//! }
//!
//! #[method(name = "textDocument/didOpen", notification)]
//! fn did_open(params: DidOpenParams) {}
//!
//! let table = typerpc::MethodTable::try_from_iter([
//!     add_descriptor(),
//!     did_open_descriptor(),
//! ])?;
//! ```
//!
//! [`MethodDescriptor`]: https://docs.rs/typerpc-core/latest/typerpc_core/struct.MethodDescriptor.html

mod method;

use proc_macro::TokenStream;

/// Generate a `<fn>_descriptor()` constructor next to the function
///
/// # Arguments
///
/// - `name = "..."`: wire name of the method; defaults to the function name
/// - `notification`: describe a notification instead of a request
///
/// # Types
///
/// - **Parameters**: each argument type, in order, becomes a declared
///   parameter type. It must be `DeserializeOwned + Serialize + PartialEq +
///   Debug + Send + Sync + 'static`.
/// - **Return**: `T` from `Result<T, E>` (any type whose last path segment is
///   `Result`), otherwise the written type; no return type means `()`.
///
/// # Errors
///
/// Compile errors for methods taking `self`, an empty `name`, unknown
/// arguments, and notifications that declare a return type.
///
/// The generated code names `::typerpc`, so the calling crate depends on the
/// `typerpc` facade.
#[proc_macro_attribute]
pub fn method(attr: TokenStream, item: TokenStream) -> TokenStream {
    method::method_impl(attr, item)
}
