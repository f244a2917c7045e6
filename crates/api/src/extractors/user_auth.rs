//! Authenticated user extractor.
//!
//! Validates the Bearer JWT in the Authorization header and exposes the
//! caller's identity to handlers.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::models::{Actor, UserRole};
use shared::jwt::JwtError;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// Identity of the authenticated caller.
#[derive(Debug, Clone)]
pub struct UserAuth {
    /// User ID from the JWT subject claim.
    pub user_id: Uuid,
    /// Company the caller acts for, if the token is scoped to one.
    pub company_id: Option<Uuid>,
    pub role: UserRole,
    pub email: String,
}

impl UserAuth {
    /// Company the caller acts for. Tokens without a company cannot address
    /// company-scoped routes.
    pub fn require_company(&self) -> Result<Uuid, ApiError> {
        self.company_id
            .ok_or_else(|| ApiError::Unauthorized("Token is not scoped to a company".to_string()))
    }

    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.user_id,
            role: self.role,
            email: self.email.clone(),
        }
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let auth_header = parts
        .headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header format".to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for UserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(auth) = parts.extensions.get::<UserAuth>() {
            return Ok(auth.clone());
        }

        let token = bearer_token(parts)?;

        let claims = state.jwt.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected access token");
            match e {
                JwtError::Expired => ApiError::Unauthorized("Token has expired".to_string()),
                _ => ApiError::Unauthorized("Invalid or expired token".to_string()),
            }
        })?;

        let user_id = claims
            .user_id()
            .map_err(|_| ApiError::Unauthorized("Invalid token subject".to_string()))?;

        let role: UserRole = claims
            .role
            .parse()
            .map_err(|_| ApiError::Unauthorized("Invalid role claim".to_string()))?;

        let auth = UserAuth {
            user_id,
            company_id: claims.company_id,
            role,
            email: claims.email,
        };

        parts.extensions.insert(auth.clone());
        Ok(auth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/v1/invitations/abc");
        if let Some(value) = header {
            builder = builder.header("Authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn auth(company_id: Option<Uuid>) -> UserAuth {
        UserAuth {
            user_id: Uuid::new_v4(),
            company_id,
            role: UserRole::Admin,
            email: "admin@example.com".to_string(),
        }
    }

    #[test]
    fn test_bearer_token_extracted() {
        let parts = parts_with(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_bearer_token_missing_header() {
        let parts = parts_with(None);
        assert!(matches!(bearer_token(&parts), Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_bearer_token_wrong_scheme() {
        let parts = parts_with(Some("Basic dXNlcjpwYXNz"));
        assert!(matches!(bearer_token(&parts), Err(ApiError::Unauthorized(_))));

        let empty = parts_with(Some("Bearer "));
        assert!(bearer_token(&empty).is_err());
    }

    #[test]
    fn test_require_company() {
        let company_id = Uuid::new_v4();
        assert_eq!(auth(Some(company_id)).require_company().unwrap(), company_id);
        assert!(matches!(
            auth(None).require_company(),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_actor_carries_identity() {
        let user = auth(None);
        let actor = user.actor();
        assert_eq!(actor.user_id, user.user_id);
        assert_eq!(actor.role, UserRole::Admin);
        assert_eq!(actor.email, "admin@example.com");
    }
}
