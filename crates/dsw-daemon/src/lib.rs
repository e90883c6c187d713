//! Webhook postback HTTP handler (§6). Deliberately much smaller than the
//! teacher's `mqk-daemon` — no integrity control plane, no SSE heartbeat
//! bus, no armed/disarmed run state. Just the one thing §6 actually asks
//! for: an HTTP endpoint that turns a broker postback into a call to
//! `OrderCoordinator::handle_postback`, plus a health check.

pub mod routes;
pub mod state;

pub use state::AppState;
