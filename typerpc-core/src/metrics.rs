//! Codec metrics definitions
//!
//! OpenTelemetry instruments recording what the codec sees. They are
//! exported through whatever meter provider
//! [`init_observability`](crate::init_observability) (or the host
//! application) installed; without one they are no-ops.
//!
//! # Metrics Collected
//!
//! - **typerpc.codec.messages.decoded**: messages decoded, by `kind` (counter)
//! - **typerpc.codec.messages.encoded**: messages encoded, by `kind` (counter)
//! - **typerpc.codec.untyped.fallbacks**: payloads left as untyped subtrees,
//!   by `field` (counter)
//! - **typerpc.codec.errors**: decode/encode failures, by `error_type` (counter)
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use typerpc_core::{CodecMetrics, MessageCodec, MethodTable};
//!
//! let codec = MessageCodec::new(Arc::new(MethodTable::new()))
//!     .with_metrics(Arc::new(CodecMetrics::new()));
//! ```

use opentelemetry::{
    global,
    metrics::{Counter, Meter},
    KeyValue,
};

/// Name of the meter the codec instruments are created on
pub const METER_NAME: &str = "typerpc";

/// Codec metrics for monitoring
pub struct CodecMetrics {
    /// Total number of messages decoded
    pub messages_decoded: Counter<u64>,
    /// Total number of messages encoded
    pub messages_encoded: Counter<u64>,
    /// Payloads that stayed untyped because no declared type applied
    pub untyped_fallbacks: Counter<u64>,
    /// Total number of errors
    pub errors_total: Counter<u64>,
}

impl CodecMetrics {
    /// Create instruments on the global meter provider
    pub fn new() -> Self {
        let meter = global::meter(METER_NAME);
        Self::new_with_meter(&meter)
    }

    /// Create instruments on a specific meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            messages_decoded: meter
                .u64_counter("typerpc.codec.messages.decoded")
                .with_description("Total number of JSON-RPC messages decoded")
                .build(),
            messages_encoded: meter
                .u64_counter("typerpc.codec.messages.encoded")
                .with_description("Total number of JSON-RPC messages encoded")
                .build(),
            untyped_fallbacks: meter
                .u64_counter("typerpc.codec.untyped.fallbacks")
                .with_description("Payloads kept as untyped JSON because no declared type applied")
                .build(),
            errors_total: meter
                .u64_counter("typerpc.codec.errors")
                .with_description("Total number of codec errors")
                .build(),
        }
    }

    /// Record a decoded message
    pub fn record_decoded(&self, kind: &'static str) {
        self.messages_decoded.add(1, &[KeyValue::new("kind", kind)]);
    }

    /// Record an encoded message
    pub fn record_encoded(&self, kind: &'static str) {
        self.messages_encoded.add(1, &[KeyValue::new("kind", kind)]);
    }

    /// Record a payload left untyped ("params" or "result")
    pub fn record_untyped(&self, field: &'static str) {
        self.untyped_fallbacks.add(1, &[KeyValue::new("field", field)]);
    }

    /// Record an error
    pub fn record_error(&self, error_type: &'static str) {
        self.errors_total
            .add(1, &[KeyValue::new("error_type", error_type)]);
    }
}

impl Default for CodecMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CodecMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecMetrics").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = CodecMetrics::new();

        // Without a provider installed these are no-ops; they must not panic
        metrics.record_decoded("request");
        metrics.record_encoded("response");
        metrics.record_untyped("params");
        metrics.record_untyped("result");
        metrics.record_error("parse");
    }

    #[test]
    fn test_metrics_with_custom_meter() {
        let meter = global::meter("typerpc-test");
        let metrics = CodecMetrics::new_with_meter(&meter);

        for kind in ["request", "response", "notification"] {
            metrics.record_decoded(kind);
            metrics.record_encoded(kind);
        }
    }
}
