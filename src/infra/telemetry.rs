use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::cache::{METRIC_CACHE_EVICT, METRIC_CACHE_FLUSH, METRIC_CACHE_HIT, METRIC_CACHE_MISS};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;
use super::http::METRIC_HTTP_REQUESTS;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
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
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(register_metric_descriptions);
}

fn register_metric_descriptions() {
    describe_counter!(
        METRIC_CACHE_HIT,
        Unit::Count,
        "Total number of resource cache hits."
    );
    describe_counter!(
        METRIC_CACHE_MISS,
        Unit::Count,
        "Total number of resource cache misses."
    );
    describe_counter!(
        METRIC_CACHE_EVICT,
        Unit::Count,
        "Total number of cache evictions due to capacity."
    );
    describe_counter!(
        METRIC_CACHE_FLUSH,
        Unit::Count,
        "Total number of cache clears, labelled by resource and scope."
    );
    describe_counter!(
        METRIC_HTTP_REQUESTS,
        Unit::Count,
        "Total number of API responses, labelled by status class."
    );
}
