use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::{InvitationLifecycle, InvitationStore};
use shared::jwt::{JwtConfig, JwtError};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, options_ok, trace_id};
use crate::routes::{checkout, health, invitations};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn InvitationStore>,
    pub lifecycle: InvitationLifecycle,
    pub jwt: Arc<JwtConfig>,
}

impl AppState {
    /// Builds the shared state. Fails if the configured JWT keys are unusable.
    pub fn new(config: Config, store: Arc<dyn InvitationStore>) -> Result<Self, JwtError> {
        let jwt = JwtConfig::from_rsa_pem(
            &config.jwt.private_key,
            &config.jwt.public_key,
            config.jwt.access_token_expiry_secs,
            config.jwt.leeway_secs,
        )?;

        let lifecycle = InvitationLifecycle::new(store.clone(), config.invitations.ttl());

        Ok(Self {
            config: Arc::new(config),
            store,
            lifecycle,
            jwt: Arc::new(jwt),
        })
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() {
        // Development default
        layer.allow_origin(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    let invitation_routes = Router::new()
        .route(
            "/api/v1/invitations/:token",
            get(invitations::get_invitation).delete(invitations::cancel_invitation),
        )
        .route(
            "/api/v1/companies/:company_id/invitations/:token/accept",
            post(invitations::accept_invitation),
        );

    let checkout_routes = Router::new().route("/api/v1/checkout", post(checkout::create_checkout));

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(invitation_routes)
        .merge(checkout_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn(options_ok))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config.security.cors_origins))
        .with_state(state)
}
