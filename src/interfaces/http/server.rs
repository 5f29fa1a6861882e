use super::client::CREATE_INTENT_PATH;
use crate::application::intents::{CreateIntentBody, IntentService, IntentServiceError};
use crate::error::Result;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Routes for the checkout backend.
pub fn router(service: Arc<IntentService>) -> Router {
    Router::new()
        .route(
            CREATE_INTENT_PATH,
            post(create_payment_intent).fallback(method_not_allowed),
        )
        .with_state(service)
}

/// Serves [`router`] until Ctrl-C.
pub async fn serve(addr: SocketAddr, service: Arc<IntentService>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "checkout backend listening");
    axum::serve(listener, router(service))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

async fn create_payment_intent(
    State(service): State<Arc<IntentService>>,
    body: Bytes,
) -> Response {
    let body = CreateIntentBody::from_slice(&body);
    match service.create(&body).await {
        Ok(intent) => (StatusCode::OK, Json(intent)).into_response(),
        Err(e @ IntentServiceError::InvalidAmount) => error_response(StatusCode::BAD_REQUEST, &e),
        Err(e @ IntentServiceError::Provider(_)) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e)
        }
    }
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({"error": "Method not allowed"})),
    )
        .into_response()
}

fn error_response(status: StatusCode, error: &IntentServiceError) -> Response {
    (status, Json(json!({"error": error.to_string()}))).into_response()
}
