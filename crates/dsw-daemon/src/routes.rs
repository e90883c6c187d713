use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use dsw_schemas::WebhookPayload;

use crate::state::AppState;

/// Builds the router. `webhook_path` comes from `webhook.path` (§6) rather
/// than being hardcoded, since the broker-side callback URL is configured
/// per deployment.
pub fn build_router(state: Arc<AppState>, webhook_path: &str) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(webhook_path, post(webhook))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// §6 webhook payload (Dhan-compatible shape). Delegates straight to
/// `OrderCoordinator::handle_postback` — the coordinator, not this route,
/// owns idempotency against a racing poll (§4.7).
async fn webhook(State(state): State<Arc<AppState>>, Json(payload): Json<WebhookPayload>) -> StatusCode {
    match state.coordinator.handle_postback(&payload).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::error!(error = %e, order_id = %payload.order_id, "postback handling failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use dsw_broker_paper::PaperBroker;
    use dsw_circuit::CircuitBreaker;
    use dsw_db::DurableStore;
    use dsw_position::PositionStore;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    struct NullStore;
    #[async_trait::async_trait]
    impl DurableStore for NullStore {
        async fn save_trade(&self, _record: &dsw_schemas::TradeRecord) -> dsw_db::Result<()> { Ok(()) }
        async fn update_entry_fill(&self, _id: uuid::Uuid, _entry_fill_price: f64, _position_state: dsw_schemas::PositionState) -> dsw_db::Result<()> { Ok(()) }
        async fn update_sl_order_id(&self, _id: uuid::Uuid, _sl_order_id: &str) -> dsw_db::Result<()> { Ok(()) }
        async fn update_stop_loss(&self, _id: uuid::Uuid, _new_stop_loss: f64) -> dsw_db::Result<()> { Ok(()) }
        async fn close_trade(&self, _id: uuid::Uuid, _exit_fill_price: f64, _reason: &str) -> dsw_db::Result<()> { Ok(()) }
        async fn get_open_trades(&self) -> dsw_db::Result<Vec<dsw_schemas::TradeRecord>> { Ok(Vec::new()) }
        async fn get_all_closed_trades(&self) -> dsw_db::Result<Vec<dsw_schemas::TradeRecord>> { Ok(Vec::new()) }
        async fn get_daily_pnl(&self, date: chrono::NaiveDate) -> dsw_db::Result<dsw_schemas::DailyPnl> {
            Ok(dsw_schemas::DailyPnl { date, realized_pnl: 0.0, unrealized_pnl: 0.0 })
        }
        async fn save_trade_log(&self, _level: &str, _message: &str) -> dsw_db::Result<()> { Ok(()) }
    }

    fn test_state() -> Arc<AppState> {
        let broker = Arc::new(PaperBroker::new(100_000.0));
        let store = Arc::new(PositionStore::new());
        let db: Arc<dyn DurableStore> = Arc::new(NullStore);
        let circuit = Arc::new(CircuitBreaker::new(3, chrono::Duration::minutes(5)));
        let coordinator = Arc::new(dsw_execution::OrderCoordinator::new(
            broker, store, db, circuit, Duration::from_millis(1), Duration::from_millis(10),
        ));
        Arc::new(AppState { coordinator })
    }

    #[tokio::test]
    async fn health_endpoint_reports_ok() {
        let router = build_router(test_state(), "/webhook");
        let request = axum::http::Request::builder().uri("/health").body(axum::body::Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn webhook_for_unknown_order_id_still_returns_ok() {
        let router = build_router(test_state(), "/webhook");
        let payload = serde_json::json!({
            "order_id": "does-not-exist",
            "symbol": "STK1",
            "side": "buy",
            "status": "TRADED",
            "filled_qty": 10,
            "quantity": 10,
            "average_price": 101.5,
            "correlation_id": "corr-1"
        });
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(serde_json::to_vec(&payload).unwrap()))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
