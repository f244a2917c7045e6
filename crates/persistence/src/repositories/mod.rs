//! Repository implementations.

pub mod invitation;

pub use invitation::PgInvitationStore;
