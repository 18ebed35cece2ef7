//! OpenTelemetry metrics for index provisioning.
//!
//! Instruments are registered against the global meter provider. Without an
//! installed provider they are no-ops.

use once_cell::sync::Lazy;
use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram, Meter};
use opentelemetry::KeyValue;
use ta_index_spec::Collection;

pub static PROVISIONER_METRICS: Lazy<ProvisionerMetrics> = Lazy::new(ProvisionerMetrics::register);

pub struct ProvisionerMetrics {
    /// Indexes built by a run
    pub indexes_created: Counter<u64>,

    /// Indexes found already converged
    pub indexes_already_present: Counter<u64>,

    /// Runs aborted, by the collection they stopped at
    pub provisioning_failures: Counter<u64>,

    /// Latency of individual store calls (seconds)
    pub store_call_duration: Histogram<f64>,
}

impl ProvisionerMetrics {
    pub fn register() -> Self {
        let meter = global::meter("ta.index_provisioner");
        Self::register_with_meter(&meter)
    }

    /// Register metrics with a specific meter (useful for testing).
    pub fn register_with_meter(meter: &Meter) -> Self {
        Self {
            indexes_created: meter
                .u64_counter("ta_indexes_created")
                .with_description("Indexes created by provisioning runs")
                .with_unit("indexes")
                .build(),
            indexes_already_present: meter
                .u64_counter("ta_indexes_already_present")
                .with_description("Indexes found already present with an identical specification")
                .with_unit("indexes")
                .build(),
            provisioning_failures: meter
                .u64_counter("ta_provisioning_failures")
                .with_description("Provisioning runs aborted by an error")
                .with_unit("runs")
                .build(),
            store_call_duration: meter
                .f64_histogram("ta_store_call_duration_seconds")
                .with_description("Latency of index catalog calls")
                .with_unit("s")
                .build(),
        }
    }

    pub(crate) fn record_created(&self, collection: Collection) {
        self.indexes_created.add(1, &[collection_attribute(collection)]);
    }

    pub(crate) fn record_already_present(&self, collection: Collection) {
        self.indexes_already_present.add(1, &[collection_attribute(collection)]);
    }

    pub(crate) fn record_failure(&self, collection: Option<Collection>) {
        let collection = collection.map(|c| c.as_str()).unwrap_or("-");
        self.provisioning_failures.add(1, &[KeyValue::new("collection", collection)]);
    }

    pub(crate) fn record_store_call(&self, operation: &'static str, collection: Collection, seconds: f64) {
        self.store_call_duration
            .record(seconds, &[KeyValue::new("operation", operation), collection_attribute(collection)]);
    }
}

fn collection_attribute(collection: Collection) -> KeyValue {
    KeyValue::new("collection", collection.as_str())
}
