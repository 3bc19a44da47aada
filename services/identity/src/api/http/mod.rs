//! HTTP API

mod auth_routes;
mod extract;
mod health;
mod wallet_routes;

pub use extract::{AuthUser, ValidJson};

use std::sync::Arc;

use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use bhada_auth_core::TokenService;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::application::handlers::{AccountQueryHandler, AuthCommandHandler, WalletQueryHandler};
use crate::infrastructure::persistence::StorageProbe;

/// Every request body is a small JSON document
const MAX_BODY_BYTES: usize = 16 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub commands: Arc<AuthCommandHandler>,
    pub accounts: Arc<AccountQueryHandler>,
    pub wallet: Arc<WalletQueryHandler>,
    pub tokens: Arc<TokenService>,
    pub storage: Arc<dyn StorageProbe>,
    pub metrics: Option<PrometheusHandle>,
}

pub fn router(state: AppState, cors_allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/api/auth/check-email", post(auth_routes::check_email))
        .route("/api/auth/send-otp", post(auth_routes::send_otp))
        .route("/api/auth/resend-otp", post(auth_routes::resend_otp))
        .route("/api/auth/verify-otp", post(auth_routes::verify_otp))
        .route("/api/auth/register", post(auth_routes::register))
        .route("/api/auth/login", post(auth_routes::login))
        .route("/api/auth/refresh", post(auth_routes::refresh))
        .route("/api/auth/set-password", post(auth_routes::set_password))
        .route("/api/auth/forgot-password", post(auth_routes::forgot_password))
        .route("/api/auth/reset-password", post(auth_routes::reset_password))
        .route("/api/auth/phone/send-otp", post(auth_routes::send_phone_otp))
        .route("/api/auth/phone/verify", post(auth_routes::verify_phone))
        .route("/api/auth/me", get(auth_routes::me))
        .route("/api/wallet", get(wallet_routes::summary))
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/metrics", get(health::metrics))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_allowed_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}
