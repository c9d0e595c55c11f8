//! Webhook listener routes.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use banksync_core::providers::{MonobankWebhook, MONOBANK_STATEMENT_ITEM};
use banksync_core::{BankNotification, IntakeHandle, TransactionRecord};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, ApiResult};

pub const TRANSACTION_RECEIVED: &str = "Transaction received";
pub const NOTIFICATION_IGNORED: &str = "Notification ignored";

pub struct AppState {
    pub intake: IntakeHandle,
}

/// Only the discriminator, so unknown notification shapes can be acknowledged.
#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type", default)]
    event_type: String,
}

/// Routes for the webhook listener. `webhook_path` must start with `/`.
pub fn app_router(state: Arc<AppState>, webhook_path: &str) -> Router {
    Router::new()
        .route(
            webhook_path,
            get(verify_webhook).post(receive_notification),
        )
        .route("/healthz", get(healthz))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Monobank probes the URL with a GET before accepting it.
async fn verify_webhook() -> StatusCode {
    StatusCode::OK
}

async fn receive_notification(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<&'static str> {
    let envelope: Envelope = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Failed to parse notification: {}", e)))?;

    if envelope.event_type != MONOBANK_STATEMENT_ITEM {
        tracing::debug!("Ignoring notification of type '{}'", envelope.event_type);
        return Ok(NOTIFICATION_IGNORED);
    }

    let webhook: MonobankWebhook = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Failed to parse statement item: {}", e)))?;
    let notification = BankNotification::Monobank(webhook);
    tracing::info!(provider = notification.provider(), "Notification received");

    let record = TransactionRecord::from(notification);
    if record.account_id.is_empty() {
        return Err(ApiError::BadRequest(
            "Notification has no source account".to_string(),
        ));
    }

    state.intake.send(record).await.map_err(|closed| {
        tracing::warn!(
            "Rejected transaction {}: {}",
            closed.0.external_transaction_id,
            closed
        );
        ApiError::Unavailable(closed.to_string())
    })?;

    Ok(TRANSACTION_RECEIVED)
}

async fn healthz(State(state): State<Arc<AppState>>) -> ApiResult<Json<serde_json::Value>> {
    if state.intake.is_closed() {
        return Err(ApiError::Unavailable("Intake queue is closed".to_string()));
    }
    Ok(Json(json!({ "status": "ok" })))
}
