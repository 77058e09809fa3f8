//! Payment webhook handlers.
//!
//! A "finished" payment activates the payer's subscription and creates a
//! blank monitoring job; the user configures URLs afterwards. Everything else
//! is acknowledged without action.

use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::server::AppState;

/// Plan recorded on webhook-driven activation.
pub const ACTIVATION_PLAN: &str = "premium_50";

/// Provider payment state. Only `finished` triggers activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Finished,
    #[serde(other)]
    Other,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Other
    }
}

/// Payment-provider event, validated at the boundary. Unknown fields are
/// dropped at ingestion.
#[derive(Debug, Deserialize)]
pub struct PaymentEvent {
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
}

impl PaymentEvent {
    /// Resolve the payer's address. `customer_email` is authoritative;
    /// `order_id` is accepted only when the invoice was created with the
    /// payer's address as the order id, so it must at least look like one.
    pub fn payer_email(&self) -> Option<&str> {
        if let Some(email) = self.customer_email.as_deref() {
            if !email.trim().is_empty() {
                return Some(email);
            }
        }
        self.order_id
            .as_deref()
            .filter(|candidate| candidate.contains('@'))
    }
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl WebhookResponse {
    fn received() -> Self {
        Self {
            status: "received",
            message: None,
        }
    }

    fn success(message: &str) -> Self {
        Self {
            status: "success",
            message: Some(message.to_string()),
        }
    }

    fn error(message: &str) -> Self {
        Self {
            status: "error",
            message: Some(message.to_string()),
        }
    }
}

/// `POST /nowpayments_webhook`
pub async fn nowpayments_webhook(
    State(state): State<AppState>,
    Json(event): Json<PaymentEvent>,
) -> (StatusCode, Json<WebhookResponse>) {
    if event.payment_status != PaymentStatus::Finished {
        debug!("Ignoring non-final payment event");
        return (StatusCode::OK, Json(WebhookResponse::received()));
    }

    let Some(email) = event.payer_email() else {
        warn!("Payment event carried no payer email");
        return (
            StatusCode::BAD_REQUEST,
            Json(WebhookResponse::error("no email found in webhook data")),
        );
    };

    info!(email = %email, "Payment finished, activating account");

    let activation = async {
        state
            .storage
            .activate_subscription(email, ACTIVATION_PLAN)
            .await?;
        state.storage.ensure_job(email).await
    };

    match activation.await {
        Ok(()) => {
            info!(email = %email, "Subscription and monitoring job activated");
            (
                StatusCode::OK,
                Json(WebhookResponse::success("account activated")),
            )
        }
        Err(e) => {
            error!(email = %email, error = %e, "Account activation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(WebhookResponse::error(&e.to_string())),
            )
        }
    }
}

/// Diagnostic catch-all: logs whatever arrived and acknowledges it.
pub async fn debug_echo(method: Method, uri: Uri, body: String) -> (StatusCode, &'static str) {
    info!(method = %method, path = %uri.path(), bytes = body.len(), "Received unrouted request");
    (StatusCode::OK, "received")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{build_router, AppState};
    use crate::testing::MemoryStorage;
    use crate::types::SubscriptionStatus;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/nowpayments_webhook")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn finished_payment_activates_subscription_and_job() {
        let storage = Arc::new(MemoryStorage::default());
        let app = build_router(AppState {
            storage: storage.clone(),
        });

        let response = app
            .oneshot(request(serde_json::json!({
                "payment_status": "finished",
                "customer_email": "a@b.com",
                "price_amount": 50,
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let subscriptions = storage.subscriptions.lock().unwrap();
        assert_eq!(subscriptions.len(), 1);
        assert_eq!(subscriptions[0].user_email, "a@b.com");
        assert_eq!(subscriptions[0].status, SubscriptionStatus::Active);
        assert_eq!(subscriptions[0].plan, ACTIVATION_PLAN);

        let jobs = storage.jobs.lock().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].user_email, "a@b.com");
        assert!(jobs[0].is_active);
    }

    #[tokio::test]
    async fn missing_email_is_rejected_without_writes() {
        let storage = Arc::new(MemoryStorage::default());
        let app = build_router(AppState {
            storage: storage.clone(),
        });

        let response = app
            .oneshot(request(serde_json::json!({
                "payment_status": "finished",
                "order_id": "AGENT_001",
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        assert!(storage.subscriptions.lock().unwrap().is_empty());
        assert!(storage.jobs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn order_id_that_is_an_email_is_accepted_as_fallback() {
        let storage = Arc::new(MemoryStorage::default());
        let app = build_router(AppState {
            storage: storage.clone(),
        });

        let response = app
            .oneshot(request(serde_json::json!({
                "payment_status": "finished",
                "order_id": "payer@example.com",
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            storage.subscriptions.lock().unwrap()[0].user_email,
            "payer@example.com"
        );
    }

    #[tokio::test]
    async fn non_final_statuses_are_acknowledged_without_action() {
        let storage = Arc::new(MemoryStorage::default());
        let app = build_router(AppState {
            storage: storage.clone(),
        });

        let response = app
            .oneshot(request(serde_json::json!({
                "payment_status": "waiting",
                "customer_email": "a@b.com",
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(storage.subscriptions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn storage_failure_maps_to_server_error() {
        let app = build_router(AppState {
            storage: Arc::new(MemoryStorage::refusing_writes()),
        });

        let response = app
            .oneshot(request(serde_json::json!({
                "payment_status": "finished",
                "customer_email": "a@b.com",
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn unrouted_requests_are_echoed() {
        let app = build_router(AppState {
            storage: Arc::new(MemoryStorage::default()),
        });

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/anything/at/all")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
