use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use thiserror::Error;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::{SubscriberInitExt, TryInitError},
};

use crate::config::{LogFormat, LoggingSettings};

static METRIC_DESCRIPTIONS: Once = Once::new();

#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Another global subscriber was installed first.
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), TelemetryError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()?;
    Ok(())
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "postwire_coalesce_hit_total",
            Unit::Count,
            "Requests that attached to an identical in-flight request."
        );
        describe_counter!(
            "postwire_coalesce_miss_total",
            Unit::Count,
            "Requests that started a new underlying call."
        );
        describe_counter!(
            "postwire_fetch_timeout_total",
            Unit::Count,
            "Calls cancelled because they exceeded the timeout budget."
        );
        describe_counter!(
            "postwire_fetch_fallback_total",
            Unit::Count,
            "Failed reads answered with a fallback payload."
        );
        describe_histogram!(
            "postwire_fetch_ms",
            Unit::Milliseconds,
            "Latency of timeout-bounded calls in milliseconds."
        );
        describe_counter!(
            "postwire_entity_cache_hit_total",
            Unit::Count,
            "Entity cache lookups that found a value."
        );
        describe_counter!(
            "postwire_entity_cache_miss_total",
            Unit::Count,
            "Entity cache lookups that found nothing."
        );
    });
}
