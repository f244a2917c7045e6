//! Database entity definitions.

pub mod invitation;

pub use invitation::InvitationEntity;
