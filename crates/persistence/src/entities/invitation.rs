//! Invitation entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Invitation, InvitationStatus, UserRole};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the invitations table.
#[derive(Debug, Clone, FromRow)]
pub struct InvitationEntity {
    pub company_id: Uuid,
    pub invitation_token: String,
    pub email: String,
    pub role: String,
    pub status: String,
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

/// A row whose text columns hold values the domain does not know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRow {
    pub key: String,
    pub reason: String,
}

impl InvitationEntity {
    /// `company_id/invitation_token`, used in logs and error reports.
    pub fn key(&self) -> String {
        format!("{}/{}", self.company_id, self.invitation_token)
    }
}

impl TryFrom<InvitationEntity> for Invitation {
    type Error = InvalidRow;

    fn try_from(entity: InvitationEntity) -> Result<Self, Self::Error> {
        let invalid = |reason: String| InvalidRow {
            key: entity.key(),
            reason,
        };

        let status: InvitationStatus = entity.status.parse().map_err(invalid)?;
        let role: UserRole = entity.role.parse().map_err(invalid)?;

        Ok(Invitation {
            company_id: entity.company_id,
            invitation_token: entity.invitation_token,
            email: entity.email,
            role,
            status,
            invited_by: entity.invited_by,
            invited_at: entity.invited_at,
            accepted_by: entity.accepted_by,
            accepted_at: entity.accepted_at,
            cancelled_by: entity.cancelled_by,
            cancelled_at: entity.cancelled_at,
            expired_by: entity.expired_by,
            expired_at: entity.expired_at,
            updated_at: entity.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::internet::en::SafeEmail;
    use fake::Fake;

    fn create_test_entity(status: &str, role: &str) -> InvitationEntity {
        let now = Utc::now();
        InvitationEntity {
            company_id: Uuid::new_v4(),
            invitation_token: "test_token_abc123".to_string(),
            email: SafeEmail().fake(),
            role: role.to_string(),
            status: status.to_string(),
            invited_by: Uuid::new_v4(),
            invited_at: now,
            accepted_by: None,
            accepted_at: None,
            cancelled_by: None,
            cancelled_at: None,
            expired_by: None,
            expired_at: None,
            updated_at: now,
        }
    }

    #[test]
    fn test_entity_maps_to_invitation() {
        let entity = create_test_entity("CANCELLED", "viewer");
        let email = entity.email.clone();

        let invitation = Invitation::try_from(entity).unwrap();

        assert_eq!(invitation.status, InvitationStatus::Cancelled);
        assert_eq!(invitation.role, UserRole::Viewer);
        assert_eq!(invitation.email, email);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let entity = create_test_entity("REVOKED", "member");
        let key = entity.key();

        let err = Invitation::try_from(entity).unwrap_err();

        assert_eq!(err.key, key);
        assert!(err.reason.contains("REVOKED"));
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let err = Invitation::try_from(create_test_entity("PENDING", "owner")).unwrap_err();
        assert!(err.reason.contains("owner"));
    }
}
