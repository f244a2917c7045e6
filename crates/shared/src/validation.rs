//! Common validation utilities.

use validator::ValidationError;

/// Maximum length of an invitation token.
pub const MAX_INVITATION_TOKEN_LENGTH: usize = 128;

/// Validates that a string has at least one non-whitespace character.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Validates the shape of an invitation token taken from a path parameter.
///
/// Tokens are opaque, but they are always URL-safe and bounded in length.
pub fn validate_invitation_token(token: &str) -> Result<(), ValidationError> {
    let token = token.trim();

    if token.is_empty() {
        let mut err = ValidationError::new("token_required");
        err.message = Some("Invitation token is required".into());
        return Err(err);
    }

    if token.len() > MAX_INVITATION_TOKEN_LENGTH {
        let mut err = ValidationError::new("token_length");
        err.message = Some("Invitation token is too long".into());
        return Err(err);
    }

    if !token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        let mut err = ValidationError::new("token_format");
        err.message = Some("Invitation token contains invalid characters".into());
        return Err(err);
    }

    Ok(())
}
