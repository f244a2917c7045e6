//! Company invitation domain models.
//!
//! An invitation grants a named email address the right to join a company
//! with a given role. It starts out `PENDING` and moves exactly once to one
//! of the terminal states `ACCEPTED`, `CANCELLED` or `EXPIRED`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Default number of days an invitation stays valid.
pub const DEFAULT_TTL_DAYS: i64 = 7;

/// Longest configurable invitation TTL, in days.
pub const MAX_TTL_DAYS: i64 = 3650;

/// Actor recorded on transitions performed by the service itself
/// (expiry sweep, lazily derived expiry).
pub const SYSTEM_ACTOR_ID: Uuid = Uuid::nil();

/// Lifecycle status of an invitation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Cancelled,
    Expired,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "PENDING",
            InvitationStatus::Accepted => "ACCEPTED",
            InvitationStatus::Cancelled => "CANCELLED",
            InvitationStatus::Expired => "EXPIRED",
        }
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, InvitationStatus::Pending)
    }
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvitationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(InvitationStatus::Pending),
            "ACCEPTED" => Ok(InvitationStatus::Accepted),
            "CANCELLED" => Ok(InvitationStatus::Cancelled),
            "EXPIRED" => Ok(InvitationStatus::Expired),
            other => Err(format!("Unknown invitation status: {}", other)),
        }
    }
}

/// Role of a user within a company.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Member,
    Viewer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Member => "member",
            UserRole::Viewer => "viewer",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "member" => Ok(UserRole::Member),
            "viewer" => Ok(UserRole::Viewer),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// The authenticated user on whose behalf a transition is attempted.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: UserRole,
    pub email: String,
}

/// A state change requested against a stored invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Accept { by: Uuid, at: DateTime<Utc> },
    Cancel { by: Uuid, at: DateTime<Utc> },
    Expire { at: DateTime<Utc> },
}

impl Transition {
    /// Status the invitation ends up in once the transition is applied.
    pub fn target(&self) -> InvitationStatus {
        match self {
            Transition::Accept { .. } => InvitationStatus::Accepted,
            Transition::Cancel { .. } => InvitationStatus::Cancelled,
            Transition::Expire { .. } => InvitationStatus::Expired,
        }
    }

    pub fn actor(&self) -> Uuid {
        match self {
            Transition::Accept { by, .. } | Transition::Cancel { by, .. } => *by,
            Transition::Expire { .. } => SYSTEM_ACTOR_ID,
        }
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Transition::Accept { at, .. }
            | Transition::Cancel { at, .. }
            | Transition::Expire { at } => *at,
        }
    }
}

/// A stored invitation, keyed by `(company_id, invitation_token)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invitation {
    pub company_id: Uuid,
    pub invitation_token: String,
    pub email: String,
    pub role: UserRole,
    pub status: InvitationStatus,
    pub invited_by: Uuid,
    pub invited_at: DateTime<Utc>,
    pub accepted_by: Option<Uuid>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<Uuid>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub expired_by: Option<Uuid>,
    pub expired_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Invitation {
    /// Creates a pending invitation as the invite operation would store it.
    pub fn pending(
        company_id: Uuid,
        invitation_token: impl Into<String>,
        email: impl Into<String>,
        role: UserRole,
        invited_by: Uuid,
        invited_at: DateTime<Utc>,
    ) -> Self {
        Self {
            company_id,
            invitation_token: invitation_token.into(),
            email: email.into(),
            role,
            status: InvitationStatus::Pending,
            invited_by,
            invited_at,
            accepted_by: None,
            accepted_at: None,
            cancelled_by: None,
            cancelled_at: None,
            expired_by: None,
            expired_at: None,
            updated_at: invited_at,
        }
    }

    /// Moment after which a pending invitation counts as expired.
    ///
    /// Saturates at the latest representable instant, so an out-of-range TTL
    /// means the invitation never lapses.
    pub fn expires_at(&self, ttl: Duration) -> DateTime<Utc> {
        self.invited_at
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Status as observed at `now`.
    ///
    /// A stored `PENDING` invitation whose TTL has lapsed is `EXPIRED` even if
    /// no sweep has persisted that yet.
    pub fn effective_status(&self, now: DateTime<Utc>, ttl: Duration) -> InvitationStatus {
        match self.status {
            InvitationStatus::Pending if self.expires_at(ttl) < now => InvitationStatus::Expired,
            status => status,
        }
    }

    /// Returns the invitation as observed at `now`, with lazily derived expiry
    /// filled in. `updated_at` is left alone since nothing was written.
    pub fn observed_at(mut self, now: DateTime<Utc>, ttl: Duration) -> Self {
        if self.status == InvitationStatus::Pending
            && self.effective_status(now, ttl) == InvitationStatus::Expired
        {
            self.status = InvitationStatus::Expired;
            self.expired_by = Some(SYSTEM_ACTOR_ID);
            self.expired_at = Some(self.expires_at(ttl));
        }
        self
    }

    /// Applies a transition in place, stamping actor and time metadata.
    pub fn apply(&mut self, transition: &Transition) {
        let at = transition.at();
        match transition {
            Transition::Accept { by, .. } => {
                self.accepted_by = Some(*by);
                self.accepted_at = Some(at);
            }
            Transition::Cancel { by, .. } => {
                self.cancelled_by = Some(*by);
                self.cancelled_at = Some(at);
            }
            Transition::Expire { .. } => {
                self.expired_by = Some(SYSTEM_ACTOR_ID);
                self.expired_at = Some(at);
            }
        }
        self.status = transition.target();
        self.updated_at = at;
    }

    /// Check if this invitation can be used by the given email.
    pub fn can_be_used_by(&self, email: &str) -> bool {
        self.email.trim().eq_ignore_ascii_case(email.trim())
    }
}

/// Invitation as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationResponse {
    pub invitation_token: String,
    pub company_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub status: InvitationStatus,
    pub invited_by: Uuid,
    pub invited_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expired_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<Invitation> for InvitationResponse {
    fn from(invitation: Invitation) -> Self {
        Self {
            invitation_token: invitation.invitation_token,
            company_id: invitation.company_id,
            email: invitation.email,
            role: invitation.role,
            status: invitation.status,
            invited_by: invitation.invited_by,
            invited_at: invitation.invited_at,
            accepted_by: invitation.accepted_by,
            accepted_at: invitation.accepted_at,
            cancelled_by: invitation.cancelled_by,
            cancelled_at: invitation.cancelled_at,
            expired_at: invitation.expired_at,
            updated_at: invitation.updated_at,
        }
    }
}
