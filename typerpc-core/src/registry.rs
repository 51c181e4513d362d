//! Method lookup and request/response correlation
//!
//! The codec depends on two collaborators to type payloads:
//!
//! - [`MethodRegistry`]: method name → [`MethodDescriptor`]
//! - [`CorrelationResolver`]: id of an outstanding request → method name
//!
//! Both are traits so the surrounding endpoint can supply its own. The
//! defaults here cover the common case:
//!
//! - [`MethodTable`]: a `HashMap` built at startup and read-mostly afterwards
//! - [`PendingRequests`]: a `DashMap` updated as calls are issued and
//!   completed, safe to query while other threads mutate it
//!
//! # Examples
//!
//! ```rust
//! use typerpc_core::{CorrelationResolver, MethodDescriptor, MethodRegistry, MethodTable,
//!     PendingRequests, TypeHandle};
//!
//! let table = MethodTable::new()
//!     .with_method(MethodDescriptor::request("ping", TypeHandle::of::<String>(), vec![]).unwrap());
//! assert!(table.lookup("ping").is_some());
//!
//! let pending = PendingRequests::new();
//! pending.track("7", "ping");
//! assert_eq!(pending.resolve_method("7").as_deref(), Some("ping"));
//! assert_eq!(pending.complete("7").as_deref(), Some("ping"));
//! assert!(pending.resolve_method("7").is_none());
//! ```

use crate::error::Result;
use crate::method::MethodDescriptor;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Name → descriptor lookup
pub trait MethodRegistry: Send + Sync {
    /// Descriptor for `method`, or `None` if it is not registered
    fn lookup(&self, method: &str) -> Option<Arc<MethodDescriptor>>;
}

/// Outstanding request id → originating method name
///
/// Only consulted while a response for that id is outstanding. A missing
/// entry is not an error: the result payload stays untyped.
pub trait CorrelationResolver: Send + Sync {
    /// Method name the request with `id` was issued for
    fn resolve_method(&self, id: &str) -> Option<String>;
}

impl<F> CorrelationResolver for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn resolve_method(&self, id: &str) -> Option<String> {
        self(id)
    }
}

/// Table of method descriptors keyed by name
///
/// Registering a name twice replaces the earlier descriptor.
#[derive(Debug, Clone, Default)]
pub struct MethodTable {
    methods: HashMap<String, Arc<MethodDescriptor>>,
}

impl MethodTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor under its own name
    pub fn register(&mut self, descriptor: MethodDescriptor) {
        let name = descriptor.name().to_string();
        if self
            .methods
            .insert(name.clone(), Arc::new(descriptor))
            .is_some()
        {
            tracing::warn!(method = %name, "Replaced previously registered method descriptor");
        }
    }

    /// Builder-style [`register`](Self::register)
    pub fn with_method(mut self, descriptor: MethodDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    /// Build a table from fallible descriptor constructors, stopping at the
    /// first error
    ///
    /// ```rust
    /// use typerpc_core::{MethodDescriptor, MethodTable, TypeHandle};
    ///
    /// let table = MethodTable::try_from_iter([
    ///     MethodDescriptor::request("add", TypeHandle::of::<i32>(), vec![]),
    ///     MethodDescriptor::notification("exit", vec![]),
    /// ]).unwrap();
    /// assert_eq!(table.len(), 2);
    /// ```
    pub fn try_from_iter<I>(descriptors: I) -> Result<Self>
    where
        I: IntoIterator<Item = Result<MethodDescriptor>>,
    {
        let mut table = Self::new();
        for descriptor in descriptors {
            table.register(descriptor?);
        }
        Ok(table)
    }

    /// Get the descriptor for a method
    pub fn get(&self, method: &str) -> Option<&Arc<MethodDescriptor>> {
        self.methods.get(method)
    }

    /// Check if a method is registered
    pub fn contains(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    /// All registered method names
    pub fn methods(&self) -> Vec<String> {
        self.methods.keys().cloned().collect()
    }

    /// Number of registered methods
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl MethodRegistry for MethodTable {
    fn lookup(&self, method: &str) -> Option<Arc<MethodDescriptor>> {
        self.methods.get(method).cloned()
    }
}

impl FromIterator<MethodDescriptor> for MethodTable {
    fn from_iter<I: IntoIterator<Item = MethodDescriptor>>(iter: I) -> Self {
        let mut table = Self::new();
        for descriptor in iter {
            table.register(descriptor);
        }
        table
    }
}

/// Requests awaiting a response, keyed by id
///
/// Entries are added when a request goes out and removed when its response
/// has been handled. Lookups never block writers on other shards.
#[derive(Debug, Default)]
pub struct PendingRequests {
    pending: DashMap<String, String>,
}

impl PendingRequests {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that request `id` was issued for `method`
    ///
    /// Returns the method previously tracked under the same id, if any.
    pub fn track(&self, id: impl Into<String>, method: impl Into<String>) -> Option<String> {
        self.pending.insert(id.into(), method.into())
    }

    /// Stop tracking `id`, returning the method it was issued for
    pub fn complete(&self, id: &str) -> Option<String> {
        self.pending.remove(id).map(|(_, method)| method)
    }

    /// Number of outstanding requests
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is outstanding
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Forget every outstanding request
    pub fn clear(&self) {
        self.pending.clear();
    }
}

impl CorrelationResolver for PendingRequests {
    fn resolve_method(&self, id: &str) -> Option<String> {
        self.pending.get(id).map(|entry| entry.value().clone())
    }
}
