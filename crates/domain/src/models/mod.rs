//! Domain models for the company accounts service.

pub mod invitation;
pub mod subscription;

pub use invitation::{
    Actor, Invitation, InvitationResponse, InvitationStatus, Transition, UserRole,
    DEFAULT_TTL_DAYS, MAX_TTL_DAYS, SYSTEM_ACTOR_ID,
};
pub use subscription::{
    CheckoutConfig, CheckoutCustomData, CheckoutCustomer, CheckoutEnvironment, CheckoutRequest,
    Plan, PlanTable, SubscriptionTier,
};
