//! Payment webhook surface.

use std::sync::Arc;

use axum::routing::post;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::storage::Storage;

pub mod webhook;

pub use webhook::{nowpayments_webhook, PaymentEvent, PaymentStatus};

/// Shared webhook application state.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
}

/// Build the webhook router.
///
/// Anything outside the payment route falls through to a diagnostic echo
/// handler that logs receipt and acknowledges.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/nowpayments_webhook", post(nowpayments_webhook))
        .fallback(webhook::debug_echo)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
