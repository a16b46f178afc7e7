use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, Histogram, register_counter, register_counter_vec, register_gauge,
    register_histogram,
};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("stylist_requests_total", "Total number of generate requests").unwrap();
    pub static ref RATE_LIMITED_TOTAL: Counter = register_counter!(
        "stylist_rate_limited_total",
        "Generate requests rejected by the rate limiter"
    )
    .unwrap();
    pub static ref RATE_LIMIT_CLIENTS: Gauge = register_gauge!(
        "stylist_rate_limit_clients",
        "Clients currently tracked by the rate limiter"
    )
    .unwrap();
    pub static ref COLLAGE_TOTAL: CounterVec = register_counter_vec!(
        "stylist_collages_total",
        "Hair collages returned, by how they were produced",
        &["source"]
    )
    .unwrap();
    pub static ref GENERATION_LATENCY: Histogram = register_histogram!(
        "stylist_generation_latency_seconds",
        "Time spent producing a style report and collage"
    )
    .unwrap();
}
