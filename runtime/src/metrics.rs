//! Metrics for the store runtime.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! application installs a recorder.
//!
//! - Reducer execution
//! - Effect handling
//! - Subscriber registrations

use metrics::{describe_counter, describe_gauge, describe_histogram};
use std::sync::Once;
use std::time::Duration;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, gauge, histogram};

static DESCRIBE: Once = Once::new();

/// Register all metric descriptions.
///
/// Safe to call repeatedly; descriptions are only sent once per process.
pub fn register_metrics() {
    DESCRIBE.call_once(|| {
        // Reducer Metrics
        describe_counter!(
            "store_actions_processed_total",
            "Total number of actions processed by the store"
        );
        describe_histogram!(
            "store_reducer_duration_seconds",
            "Time taken to run the reducer and notify subscribers"
        );

        // Effect Metrics
        describe_counter!(
            "store_effects_executed_total",
            "Total number of effects executed, by type"
        );
        describe_counter!(
            "store_effects_dropped_total",
            "Effects dropped because no async runtime was available"
        );

        // Subscriber Metrics
        describe_gauge!(
            "store_subscribers",
            "Number of subscribers currently registered"
        );
    });
}

/// Reducer metrics recorder.
pub struct ReducerMetrics;

impl ReducerMetrics {
    /// Record an action processed.
    pub fn record_action(duration: Duration) {
        counter!("store_actions_processed_total").increment(1);
        histogram!("store_reducer_duration_seconds").record(duration.as_secs_f64());
    }
}

/// Effect metrics recorder.
pub struct EffectMetrics;

impl EffectMetrics {
    /// Record an effect execution.
    pub fn record_execution(kind: &'static str) {
        counter!("store_effects_executed_total", "type" => kind).increment(1);
    }

    /// Record an effect that could not be spawned.
    pub fn record_dropped() {
        counter!("store_effects_dropped_total").increment(1);
    }
}

/// Subscriber metrics recorder.
pub struct SubscriberMetrics;

impl SubscriberMetrics {
    /// Record the current number of subscribers.
    #[allow(clippy::cast_precision_loss)] // Subscriber counts stay far below 2^52
    pub fn record_count(count: usize) {
        gauge!("store_subscribers").set(count as f64);
    }
}
