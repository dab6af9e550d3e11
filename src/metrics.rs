use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram, register_int_counter, register_int_counter_vec,
    Encoder, Histogram, IntCounter, IntCounterVec, TextEncoder,
};

pub static MESSAGES_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "courier_messages_created_total",
        "Total number of messages stored"
    ))
    .expect("Failed to register courier_messages_created_total metric")
});

pub static MESSAGES_PROCESSED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "courier_messages_processed_total",
        "Total number of messages moved to processed"
    ))
    .expect("Failed to register courier_messages_processed_total metric")
});

/// Inbound records by outcome: processed, duplicate, unmatched, skipped, failed
pub static INBOUND_RECORDS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "courier_inbound_records_total",
            "Inbound stream records handled, by outcome"
        ),
        &["outcome"]
    )
    .expect("Failed to register courier_inbound_records_total metric")
});

/// Publish attempts by result: acked, timeout, rejected
pub static PUBLISH_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "courier_publish_total",
            "Records handed to the broker, by result"
        ),
        &["result"]
    )
    .expect("Failed to register courier_publish_total metric")
});

/// Time from send to broker acknowledgement
pub static PUBLISH_LATENCY_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(histogram_opts!(
        "courier_publish_latency_seconds",
        "Time from send to broker acknowledgement in seconds",
        vec![0.001, 0.005, 0.025, 0.1, 0.5, 1.0, 5.0]
    ))
    .expect("Failed to register courier_publish_latency_seconds metric")
});

/// Subscriber-side stream events: received, read_error, commit_error
pub static STREAM_EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "courier_stream_events_total",
            "Inbound stream reads and commits, by event"
        ),
        &["event"]
    )
    .expect("Failed to register courier_stream_events_total metric")
});

pub fn gather_metrics() -> Result<String> {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode(&metric_families, &mut buffer)?;

    Ok(String::from_utf8(buffer)?)
}
