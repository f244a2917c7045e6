//! Subscription checkout preparation.

use axum::extract::{rejection::JsonRejection, State};
use axum::Json;
use domain::models::{CheckoutConfig, CheckoutCustomer, CheckoutRequest};
use domain::services::prepare_checkout;
use serde::Serialize;
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::routes::ApiResponse;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
    pub checkout_config: CheckoutConfig,
}

/// POST /api/v1/checkout
///
/// Derives the provider checkout configuration for the caller's company.
pub async fn create_checkout(
    State(state): State<AppState>,
    auth: UserAuth,
    request: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<ApiResponse<CheckoutPayload>, ApiError> {
    let Json(request) = request?;
    let company_id = auth.require_company()?;

    let customer = CheckoutCustomer {
        company_id,
        user_id: auth.user_id,
        email: auth.email.clone(),
    };

    let config = prepare_checkout(
        &state.config.checkout.plans,
        state.config.checkout.environment(),
        &request,
        &customer,
    )?;

    info!(
        company_id = %company_id,
        user_id = %auth.user_id,
        subscription_tier = %config.subscription_tier,
        "Checkout configuration prepared"
    );

    Ok(ApiResponse::ok(
        "Checkout configuration prepared",
        CheckoutPayload {
            checkout_config: config,
        },
    ))
}
