//! Invitation lifecycle engine.
//!
//! Decides whether a transition is legal, applies it through a conditional
//! store update and stamps actor/time metadata. Guards always run against the
//! effective status, so an invitation whose TTL lapsed behaves as `EXPIRED`
//! before any sweep has persisted that.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ErrorKind;
use crate::models::{Actor, Invitation, InvitationStatus, Transition};
use crate::services::invitation_store::{ConditionalUpdate, InvitationStore, StoreError};

/// Errors returned by lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Admin privileges required")]
    AdminRequired,

    #[error("Invitation was issued to a different email address")]
    EmailMismatch,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Invitation not found")]
    NotFound,

    #[error("Invitation already accepted")]
    AlreadyAccepted,

    #[error("Invitation already cancelled")]
    AlreadyCancelled,

    #[error("Invitation already expired")]
    AlreadyExpired,

    /// Another transition was committed between our read and our write.
    #[error("Invitation is no longer pending")]
    TransitionConflict,

    #[error("Invitation store unavailable")]
    Unavailable(#[source] StoreError),

    #[error("Invitation store failure")]
    Store(#[source] StoreError),
}

impl LifecycleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LifecycleError::AdminRequired | LifecycleError::EmailMismatch => {
                ErrorKind::Authorization
            }
            LifecycleError::InvalidInput(_) => ErrorKind::Validation,
            LifecycleError::NotFound => ErrorKind::NotFound,
            LifecycleError::AlreadyAccepted
            | LifecycleError::AlreadyCancelled
            | LifecycleError::AlreadyExpired
            | LifecycleError::TransitionConflict => ErrorKind::InvalidState,
            LifecycleError::Unavailable(_) => ErrorKind::Transient,
            LifecycleError::Store(_) => ErrorKind::Internal,
        }
    }

    fn terminal(status: InvitationStatus) -> Option<Self> {
        match status {
            InvitationStatus::Pending => None,
            InvitationStatus::Accepted => Some(LifecycleError::AlreadyAccepted),
            InvitationStatus::Cancelled => Some(LifecycleError::AlreadyCancelled),
            InvitationStatus::Expired => Some(LifecycleError::AlreadyExpired),
        }
    }
}

impl From<StoreError> for LifecycleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(_) => LifecycleError::Unavailable(err),
            _ => LifecycleError::Store(err),
        }
    }
}

/// Result of one expiry sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Records moved to `EXPIRED`.
    pub expired: usize,
    /// Records another transition won before the sweep could write.
    pub skipped: usize,
}

/// Invitation lifecycle engine.
#[derive(Clone)]
pub struct InvitationLifecycle {
    store: Arc<dyn InvitationStore>,
    ttl: Duration,
}

impl InvitationLifecycle {
    pub fn new(store: Arc<dyn InvitationStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fetch an invitation with its effective status applied. Admin only.
    pub async fn get(
        &self,
        company_id: Uuid,
        invitation_token: &str,
        actor: &Actor,
    ) -> Result<Invitation, LifecycleError> {
        require_admin(actor)?;
        let token = validate_token(invitation_token)?;

        let invitation = self
            .store
            .get(company_id, token)
            .await?
            .ok_or(LifecycleError::NotFound)?;

        Ok(invitation.observed_at(Utc::now(), self.ttl))
    }

    /// Cancel a pending invitation. Admin only.
    ///
    /// Authorization is checked before the store is touched.
    pub async fn cancel(
        &self,
        company_id: Uuid,
        invitation_token: &str,
        actor: &Actor,
    ) -> Result<Invitation, LifecycleError> {
        require_admin(actor)?;
        let token = validate_token(invitation_token)?;
        let now = Utc::now();

        self.load_pending(company_id, token, now).await?;

        let invitation = self
            .commit(
                company_id,
                token,
                Transition::Cancel {
                    by: actor.user_id,
                    at: now,
                },
            )
            .await?;

        info!(
            company_id = %company_id,
            invitation_token = %token,
            actor = %actor.user_id,
            "Invitation cancelled"
        );

        Ok(invitation)
    }

    /// Accept a pending invitation on behalf of the invited user.
    pub async fn accept(
        &self,
        company_id: Uuid,
        invitation_token: &str,
        actor: &Actor,
    ) -> Result<Invitation, LifecycleError> {
        let token = validate_token(invitation_token)?;
        let now = Utc::now();

        let invitation = self.load(company_id, token).await?;

        // Non-invitees get the same error whatever the status.
        if !invitation.can_be_used_by(&actor.email) {
            debug!(
                company_id = %company_id,
                invitation_token = %token,
                actor = %actor.user_id,
                "Invitation accept attempted by a different email"
            );
            return Err(LifecycleError::EmailMismatch);
        }
        self.ensure_pending(&invitation, now)?;

        let invitation = self
            .commit(
                company_id,
                token,
                Transition::Accept {
                    by: actor.user_id,
                    at: now,
                },
            )
            .await?;

        info!(
            company_id = %company_id,
            invitation_token = %token,
            actor = %actor.user_id,
            role = %invitation.role,
            "Invitation accepted"
        );

        Ok(invitation)
    }

    /// Persist `EXPIRED` for up to `batch_size` stored-pending invitations
    /// whose TTL lapsed before `now`.
    pub async fn expire_lapsed(
        &self,
        now: DateTime<Utc>,
        batch_size: i64,
    ) -> Result<SweepOutcome, LifecycleError> {
        // An out-of-range TTL leaves nothing to sweep.
        let Some(cutoff) = now.checked_sub_signed(self.ttl) else {
            return Ok(SweepOutcome::default());
        };

        let lapsed = self
            .store
            .list_lapsed_pending(cutoff, batch_size)
            .await?;

        let mut outcome = SweepOutcome::default();
        for invitation in lapsed {
            let update = self
                .store
                .conditional_update(
                    invitation.company_id,
                    &invitation.invitation_token,
                    InvitationStatus::Pending,
                    Transition::Expire { at: now },
                )
                .await?;

            match update {
                ConditionalUpdate::Applied(_) => outcome.expired += 1,
                ConditionalUpdate::PreconditionFailed => {
                    debug!(
                        company_id = %invitation.company_id,
                        invitation_token = %invitation.invitation_token,
                        "Invitation transitioned before expiry sweep"
                    );
                    outcome.skipped += 1;
                }
            }
        }

        Ok(outcome)
    }

    async fn load(&self, company_id: Uuid, token: &str) -> Result<Invitation, LifecycleError> {
        self.store
            .get(company_id, token)
            .await?
            .ok_or(LifecycleError::NotFound)
    }

    fn ensure_pending(
        &self,
        invitation: &Invitation,
        now: DateTime<Utc>,
    ) -> Result<(), LifecycleError> {
        match LifecycleError::terminal(invitation.effective_status(now, self.ttl)) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Fetch the invitation and require its effective status to be `PENDING`.
    async fn load_pending(
        &self,
        company_id: Uuid,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Invitation, LifecycleError> {
        let invitation = self.load(company_id, token).await?;
        self.ensure_pending(&invitation, now)?;
        Ok(invitation)
    }

    /// Write a transition conditioned on the record still being `PENDING`.
    async fn commit(
        &self,
        company_id: Uuid,
        token: &str,
        transition: Transition,
    ) -> Result<Invitation, LifecycleError> {
        match self
            .store
            .conditional_update(company_id, token, InvitationStatus::Pending, transition)
            .await?
        {
            ConditionalUpdate::Applied(invitation) => Ok(invitation),
            ConditionalUpdate::PreconditionFailed => {
                warn!(
                    company_id = %company_id,
                    invitation_token = %token,
                    to_status = %transition.target(),
                    "Invitation transitioned concurrently"
                );
                Err(LifecycleError::TransitionConflict)
            }
        }
    }
}

fn require_admin(actor: &Actor) -> Result<(), LifecycleError> {
    if actor.role.is_admin() {
        Ok(())
    } else {
        Err(LifecycleError::AdminRequired)
    }
}

fn validate_token(token: &str) -> Result<&str, LifecycleError> {
    shared::validation::validate_invitation_token(token).map_err(|err| {
        LifecycleError::InvalidInput(
            err.message
                .map(|m| m.to_string())
                .unwrap_or_else(|| "Invalid invitation token".to_string()),
        )
    })?;
    Ok(token.trim())
}
