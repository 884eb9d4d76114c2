//! Connection metrics
//!
//! OpenTelemetry instruments for monitoring connection health. Recording goes
//! through `opentelemetry::global`, so without a meter provider installed by
//! the embedding application every call is a no-op; the library never
//! initializes a pipeline itself.
//!
//! # Metrics Collected
//!
//! - **connection_state**: current state code (gauge, 0=idle .. 4=connected)
//! - **reconnect_attempts**: reconnection attempts (counter)
//! - **reconnect_success**: successful reconnections (counter)
//! - **messages_sent** / **messages_received**: payload traffic (counters)
//! - **errors_total**: errors by kind (counter)

use opentelemetry::{
    global,
    metrics::{Counter, Gauge, Meter},
    KeyValue,
};

/// Client metrics for monitoring
pub struct SluiceMetrics {
    /// Connection state code (0=idle, 1=errored, 2=connecting, 3=closing, 4=connected)
    pub connection_state: Gauge<i64>,
    /// Total number of reconnection attempts
    pub reconnect_attempts: Counter<u64>,
    /// Total number of successful reconnections
    pub reconnect_success: Counter<u64>,
    /// Total number of payloads transmitted
    pub messages_sent: Counter<u64>,
    /// Total number of payloads received
    pub messages_received: Counter<u64>,
    /// Total number of errors
    pub errors_total: Counter<u64>,
}

impl SluiceMetrics {
    /// Create metrics on the global meter for the given service name
    pub fn new(service_name: impl Into<String>) -> Self {
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    /// Create metrics on a custom meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            connection_state: meter
                .i64_gauge("sluice.connection.state")
                .with_description(
                    "Connection state code (0=idle, 1=errored, 2=connecting, 3=closing, 4=connected)",
                )
                .build(),
            reconnect_attempts: meter
                .u64_counter("sluice.reconnect.attempts")
                .with_description("Total number of reconnection attempts")
                .build(),
            reconnect_success: meter
                .u64_counter("sluice.reconnect.success")
                .with_description("Total number of successful reconnections")
                .build(),
            messages_sent: meter
                .u64_counter("sluice.messages.sent")
                .with_description("Total number of payloads transmitted")
                .build(),
            messages_received: meter
                .u64_counter("sluice.messages.received")
                .with_description("Total number of payloads received")
                .build(),
            errors_total: meter
                .u64_counter("sluice.errors.total")
                .with_description("Total number of errors encountered")
                .build(),
        }
    }

    /// Record the current connection state code
    pub fn record_state(&self, code: u8) {
        self.connection_state.record(code as i64, &[]);
    }

    /// Record a reconnection attempt
    pub fn record_reconnect_attempt(&self) {
        self.reconnect_attempts.add(1, &[]);
    }

    /// Record a successful reconnection
    pub fn record_reconnect_success(&self) {
        self.reconnect_success.add(1, &[]);
    }

    /// Record a transmitted payload
    pub fn record_message_sent(&self) {
        self.messages_sent.add(1, &[]);
    }

    /// Record a received payload
    pub fn record_message_received(&self) {
        self.messages_received.add(1, &[]);
    }

    /// Record an error by kind
    pub fn record_error(&self, kind: &str) {
        let attributes = &[KeyValue::new("kind", kind.to_string())];
        self.errors_total.add(1, attributes);
    }
}
