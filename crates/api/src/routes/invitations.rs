//! Company invitation routes.
//!
//! Admins read and cancel invitations of their own company; the invited user
//! accepts an invitation addressed to their email.

use axum::extract::{rejection::PathRejection, Path, State};
use domain::models::InvitationResponse;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::record_invitation_transition;
use crate::routes::ApiResponse;

/// Payload carried by every invitation response.
#[derive(Debug, Serialize)]
pub struct InvitationPayload {
    pub invitation: InvitationResponse,
}

/// GET /api/v1/invitations/:token
///
/// Returns the invitation with its effective status. Admin only.
pub async fn get_invitation(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(token): Path<String>,
) -> Result<ApiResponse<InvitationPayload>, ApiError> {
    let company_id = auth.require_company()?;

    let invitation = state
        .lifecycle
        .get(company_id, &token, &auth.actor())
        .await?;

    Ok(ApiResponse::ok(
        "Invitation retrieved successfully",
        InvitationPayload {
            invitation: invitation.into(),
        },
    ))
}

/// DELETE /api/v1/invitations/:token
///
/// Cancels a pending invitation of the caller's company. Admin only.
pub async fn cancel_invitation(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(token): Path<String>,
) -> Result<ApiResponse<InvitationPayload>, ApiError> {
    let company_id = auth.require_company()?;

    let invitation = state
        .lifecycle
        .cancel(company_id, &token, &auth.actor())
        .await?;

    record_invitation_transition(invitation.status);
    info!(
        company_id = %company_id,
        invitation_token = %invitation.invitation_token,
        actor = %auth.user_id,
        "Invitation cancelled via API"
    );

    Ok(ApiResponse::ok(
        "Invitation cancelled successfully",
        InvitationPayload {
            invitation: invitation.into(),
        },
    ))
}

/// POST /api/v1/companies/:company_id/invitations/:token/accept
///
/// Accepts a pending invitation on behalf of the authenticated user, whose
/// email must match the invitation.
pub async fn accept_invitation(
    State(state): State<AppState>,
    auth: UserAuth,
    path: Result<Path<(Uuid, String)>, PathRejection>,
) -> Result<ApiResponse<InvitationPayload>, ApiError> {
    let Path((company_id, token)) = path?;

    let invitation = state
        .lifecycle
        .accept(company_id, &token, &auth.actor())
        .await?;

    record_invitation_transition(invitation.status);
    info!(
        company_id = %company_id,
        invitation_token = %invitation.invitation_token,
        actor = %auth.user_id,
        role = %invitation.role,
        "Invitation accepted via API"
    );

    Ok(ApiResponse::ok(
        "Invitation accepted successfully",
        InvitationPayload {
            invitation: invitation.into(),
        },
    ))
}
