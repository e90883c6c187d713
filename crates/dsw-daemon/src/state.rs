use std::sync::Arc;

use dsw_execution::OrderCoordinator;

/// Everything a route handler needs. Deliberately just the one collaborator
/// the webhook path touches — unlike the teacher's `AppState` (integrity
/// bus, heartbeat broadcast, deadman state), this daemon has exactly one
/// job: take a broker postback and hand it to the coordinator (§6).
pub struct AppState {
    pub coordinator: Arc<OrderCoordinator>,
}
