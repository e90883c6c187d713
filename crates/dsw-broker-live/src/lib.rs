//! Live broker HTTP adapter.
//!
//! The broker HTTP/API adapter implementation is explicitly out of scope
//! (§1 — an external collaborator reached through the narrow
//! [`dsw_broker::BrokerAdapter`] contract). This crate exists so the
//! workspace has a concrete place to add one broker-specific HTTP client
//! without touching `dsw-broker` or the execution layer; it carries no
//! implementation today.

pub struct LiveBroker {
    #[allow(dead_code)]
    base_url: String,
}

impl LiveBroker {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }
}
