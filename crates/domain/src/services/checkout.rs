//! Checkout configuration derivation.
//!
//! Turns a validated checkout request and the caller's identity into the
//! payload the client hands to the checkout provider. Nothing here performs
//! I/O: the same request, customer and plan table always give the same config.

use thiserror::Error;
use validator::Validate;

use crate::error::ErrorKind;
use crate::models::{
    CheckoutConfig, CheckoutCustomData, CheckoutCustomer, CheckoutEnvironment, CheckoutRequest,
    PlanTable, SubscriptionTier,
};

/// Fields reported first when a request fails validation on several fields.
const FIELD_PRECEDENCE: [&str; 2] = ["subscription_tier", "company_name"];

/// Errors returned while preparing a checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("No plan configured for tier {0}")]
    PlanNotConfigured(SubscriptionTier),
}

impl CheckoutError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckoutError::InvalidRequest(_) => ErrorKind::Validation,
            CheckoutError::PlanNotConfigured(_) => ErrorKind::Internal,
        }
    }
}

/// Derive the checkout configuration for `request` on behalf of `customer`.
pub fn prepare_checkout(
    plans: &PlanTable,
    environment: CheckoutEnvironment,
    request: &CheckoutRequest,
    customer: &CheckoutCustomer,
) -> Result<CheckoutConfig, CheckoutError> {
    request.validate().map_err(first_message)?;

    let tier = request
        .tier()
        .ok_or_else(|| CheckoutError::InvalidRequest("Valid subscription tier is required".into()))?;

    let plan = plans.plan(tier);
    if plan.price_id.trim().is_empty() {
        return Err(CheckoutError::PlanNotConfigured(tier));
    }

    Ok(CheckoutConfig {
        price_id: plan.price_id.clone(),
        environment,
        customer_email: customer.email.clone(),
        custom_data: CheckoutCustomData {
            company_id: customer.company_id,
            company_name: request.company_name.trim().to_string(),
            user_id: customer.user_id,
            subscription_tier: tier,
        },
        subscription_tier: tier,
        plan_name: plan.name.clone(),
        price: plan.price,
        trial_days: plan.trial_days,
    })
}

fn first_message(errors: validator::ValidationErrors) -> CheckoutError {
    let field_errors = errors.field_errors();
    let message = FIELD_PRECEDENCE
        .iter()
        .filter_map(|field| field_errors.get(field))
        .chain(field_errors.values())
        .flat_map(|errs| errs.iter())
        .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid checkout request".to_string());

    CheckoutError::InvalidRequest(message)
}
