//! Domain services for company accounts.
//!
//! Services contain business logic that operates on domain models.

pub mod checkout;
pub mod invitation_lifecycle;
pub mod invitation_store;

pub use checkout::{prepare_checkout, CheckoutError};
pub use invitation_lifecycle::{InvitationLifecycle, LifecycleError, SweepOutcome};
pub use invitation_store::{
    ConditionalUpdate, InMemoryInvitationStore, InvitationStore, StoreError,
};
