use std::sync::Arc;
use std::time::Duration;
use crate::broadcast::Broadcaster;
use crate::cache::CacheStore;
use crate::relay::Relay;
// app's shared state

pub struct AppState {
    pub relay: Relay,
    pub cache: CacheStore,
    pub broadcaster: Arc<Broadcaster>, // also held by the shutdown hook
    pub keepalive_interval: Duration,  // idle time before an event stream gets a keepalive comment
}
