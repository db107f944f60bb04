use lazy_static::lazy_static;
use prometheus::exponential_buckets;
use prometheus::Encoder;
use prometheus::Histogram;
use prometheus::HistogramOpts;
use prometheus::IntCounterVec;
use prometheus::Opts;
use prometheus::Registry;
use prometheus::TextEncoder;
use tracing::error;


lazy_static! {
    pub static ref OPERATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("operations_total", "Store calls dispatched, by operation"),
        &["operation"]
    )
    .expect("metric can not be created");

    pub static ref ITEM_ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("item_errors_total", "Per-item failures attached to messages, by kind"),
        &["kind"]
    )
    .expect("metric can not be created");

    pub static ref BATCH_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("batch_failures_total", "Batches failed as a whole, by reason"),
        &["reason"]
    )
    .expect("metric can not be created");

    pub static ref BATCH_SIZE: Histogram = Histogram::with_opts(
        HistogramOpts::new("batch_size", "Messages per processed batch")
            .buckets(exponential_buckets(1.0, 2.0, 12).unwrap())
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

pub fn register_custom_metrics(registry: &Registry) -> prometheus::Result<()> {
    registry.register(Box::new(OPERATIONS_TOTAL.clone()))?;
    registry.register(Box::new(ITEM_ERRORS_TOTAL.clone()))?;
    registry.register(Box::new(BATCH_FAILURES_TOTAL.clone()))?;
    registry.register(Box::new(BATCH_SIZE.clone()))?;
    Ok(())
}

/// Renders `registry` in the Prometheus text format
pub fn encode_metrics(registry: &Registry) -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        error!("could not encode custom metrics: {}", e);
        return String::default();
    }
    String::from_utf8(buffer).unwrap_or_else(|e| {
        error!("custom metrics could not be from_utf8'd: {}", e);
        String::default()
    })
}
