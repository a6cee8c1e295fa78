use lazy_static::lazy_static;
use prometheus::{
    Histogram, IntCounter, IntCounterVec, IntGauge, register_histogram, register_int_counter,
    register_int_counter_vec, register_int_gauge,
};

lazy_static! {
    pub static ref RELAY_REQUESTS: IntCounter = register_int_counter!(
        "relay_requests_total",
        "Total number of relayed generate requests"
    )
    .expect("metric can be registered");
    pub static ref UPSTREAM_FAILURES: IntCounterVec = register_int_counter_vec!(
        "relay_upstream_failures_total",
        "Relay requests that never got an upstream response, by kind",
        &["kind"]
    )
    .expect("metric can be registered");
    pub static ref RELAY_FIRST_BYTE_LATENCY: Histogram = register_histogram!(
        "relay_first_byte_latency_seconds",
        "Time until the upstream started responding"
    )
    .expect("metric can be registered");
    pub static ref RELAY_IN_FLIGHT: IntGauge = register_int_gauge!(
        "relay_in_flight_streams",
        "Upstream streams currently being forwarded"
    )
    .expect("metric can be registered");
    pub static ref CACHE_HITS: IntCounter = register_int_counter!(
        "guide_cache_hits_total",
        "Total cache hits"
    )
    .expect("metric can be registered");
    pub static ref CACHE_MISSES: IntCounter = register_int_counter!(
        "guide_cache_misses_total",
        "Total cache misses"
    )
    .expect("metric can be registered");
    pub static ref CACHE_WRITES: IntCounter = register_int_counter!(
        "guide_cache_writes_total",
        "Total cache saves"
    )
    .expect("metric can be registered");
    pub static ref CACHE_DELETES: IntCounter = register_int_counter!(
        "guide_cache_deletes_total",
        "Total cache deletes"
    )
    .expect("metric can be registered");
    pub static ref SUBSCRIBERS: IntGauge = register_int_gauge!(
        "broadcast_subscribers",
        "Currently connected event stream subscribers"
    )
    .expect("metric can be registered");
    pub static ref BROADCAST_MESSAGES: IntCounter = register_int_counter!(
        "broadcast_messages_total",
        "Messages published to subscribers"
    )
    .expect("metric can be registered");
}

// Touch every metric so /metrics lists them before first use
pub fn register() {
    lazy_static::initialize(&RELAY_REQUESTS);
    lazy_static::initialize(&UPSTREAM_FAILURES);
    lazy_static::initialize(&RELAY_FIRST_BYTE_LATENCY);
    lazy_static::initialize(&RELAY_IN_FLIGHT);
    lazy_static::initialize(&CACHE_HITS);
    lazy_static::initialize(&CACHE_MISSES);
    lazy_static::initialize(&CACHE_WRITES);
    lazy_static::initialize(&CACHE_DELETES);
    lazy_static::initialize(&SUBSCRIBERS);
    lazy_static::initialize(&BROADCAST_MESSAGES);
}
