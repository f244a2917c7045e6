//! Subscription plan and checkout domain models.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Subscription tiers a company can check out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    Starter,
    Professional,
    Enterprise,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Starter => "starter",
            SubscriptionTier::Professional => "professional",
            SubscriptionTier::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "starter" => Ok(SubscriptionTier::Starter),
            "professional" => Ok(SubscriptionTier::Professional),
            "enterprise" => Ok(SubscriptionTier::Enterprise),
            other => Err(format!("Unknown subscription tier: {}", other)),
        }
    }
}

/// Checkout provider environment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutEnvironment {
    Sandbox,
    Production,
}

/// A purchasable plan.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Plan {
    /// Display name.
    pub name: String,
    /// Price identifier at the checkout provider.
    pub price_id: String,
    /// Price in minor currency units per billing period.
    pub price: u64,
    pub trial_days: u32,
}

/// Plan table covering every tier.
///
/// Loaded once at startup and shared read-only afterwards.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PlanTable {
    pub starter: Plan,
    pub professional: Plan,
    pub enterprise: Plan,
}

impl PlanTable {
    pub fn plan(&self, tier: SubscriptionTier) -> &Plan {
        match tier {
            SubscriptionTier::Starter => &self.starter,
            SubscriptionTier::Professional => &self.professional,
            SubscriptionTier::Enterprise => &self.enterprise,
        }
    }

    /// Tiers whose plan has no price identifier configured.
    pub fn incomplete_tiers(&self) -> Vec<SubscriptionTier> {
        [
            SubscriptionTier::Starter,
            SubscriptionTier::Professional,
            SubscriptionTier::Enterprise,
        ]
        .into_iter()
        .filter(|tier| self.plan(*tier).price_id.trim().is_empty())
        .collect()
    }
}

/// Request to prepare a subscription checkout.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default, deserialize_with = "string_or_blank")]
    #[validate(custom(function = "validate_company_name"))]
    #[validate(length(max = 200, message = "Company name must be at most 200 characters"))]
    pub company_name: String,

    #[serde(default, deserialize_with = "string_or_blank")]
    #[validate(custom(function = "validate_subscription_tier"))]
    pub subscription_tier: String,
}

impl CheckoutRequest {
    /// Parsed tier. `None` when the request did not pass validation.
    pub fn tier(&self) -> Option<SubscriptionTier> {
        self.subscription_tier.trim().parse().ok()
    }
}

/// Caller-specific values that end up in the checkout payload.
#[derive(Debug, Clone)]
pub struct CheckoutCustomer {
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
}

/// Opaque data passed through the checkout provider back to our webhooks.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutCustomData {
    pub company_id: Uuid,
    pub company_name: String,
    pub user_id: Uuid,
    pub subscription_tier: SubscriptionTier,
}

/// Configuration the client needs to open the provider checkout.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutConfig {
    pub price_id: String,
    pub environment: CheckoutEnvironment,
    pub customer_email: String,
    pub custom_data: CheckoutCustomData,
    pub subscription_tier: SubscriptionTier,
    pub plan_name: String,
    pub price: u64,
    pub trial_days: u32,
}

/// Accepts any JSON value for a text field. Non-strings read as blank so they
/// fail field validation with its message instead of a deserialization error.
fn string_or_blank<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(value) => value,
        _ => String::new(),
    })
}

fn validate_company_name(name: &str) -> Result<(), validator::ValidationError> {
    shared::validation::validate_not_blank(name).map_err(|mut err| {
        err.message = Some("Company name is required".into());
        err
    })
}

fn validate_subscription_tier(tier: &str) -> Result<(), validator::ValidationError> {
    match tier.trim().parse::<SubscriptionTier>() {
        Ok(_) => Ok(()),
        Err(_) => {
            let mut err = validator::ValidationError::new("invalid_tier");
            err.message = Some("Valid subscription tier is required".into());
            Err(err)
        }
    }
}
