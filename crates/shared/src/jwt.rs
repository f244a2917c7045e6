//! Access token signing and verification.
//!
//! An access token tells the company accounts API who is calling: the user
//! (`sub`, `email`), the company the token is scoped to and the user's role
//! there. Users who have not joined a company yet get a token without
//! `company_id`.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Leeway applied when none is configured.
pub const DEFAULT_LEEWAY_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Failed to sign token: {0}")]
    Signing(String),

    #[error("Token has expired")]
    Expired,

    #[error("Token signature does not verify")]
    BadSignature,

    #[error("Malformed token: {0}")]
    Malformed(String),
}

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    /// Unique token identifier.
    pub jti: String,
    pub email: String,
    /// Role within `company_id`.
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<Uuid>,
}

impl Claims {
    /// The subject parsed as a user ID.
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| JwtError::Malformed(format!("subject is not a UUID: {}", self.sub)))
    }
}

/// The identity a token is issued for.
#[derive(Debug, Clone, Copy)]
pub struct TokenSubject<'a> {
    pub user_id: Uuid,
    pub company_id: Option<Uuid>,
    pub role: &'a str,
    pub email: &'a str,
}

/// A freshly signed access token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub jti: String,
    pub expires_at: DateTime<Utc>,
}

/// Keys and policy for issuing and verifying access tokens.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    access_token_ttl: Duration,
    leeway_secs: u64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("algorithm", &self.algorithm)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("leeway_secs", &self.leeway_secs)
            .field("keys", &"[REDACTED]")
            .finish()
    }
}

impl JwtConfig {
    /// RS256 keys from a PEM encoded RSA key pair.
    pub fn from_rsa_pem(
        private_key_pem: &str,
        public_key_pem: &str,
        access_token_expiry_secs: i64,
        leeway_secs: u64,
    ) -> Result<Self, JwtError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("private key: {}", e)))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("public key: {}", e)))?;

        Ok(Self {
            encoding_key,
            decoding_key,
            algorithm: Algorithm::RS256,
            access_token_ttl: Duration::seconds(access_token_expiry_secs),
            leeway_secs,
        })
    }

    /// HS256 keys from a shared secret. Only for local tooling and tests.
    pub fn from_secret(secret: &str, access_token_expiry_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm: Algorithm::HS256,
            access_token_ttl: Duration::seconds(access_token_expiry_secs),
            leeway_secs: 0,
        }
    }

    /// Sign an access token for `subject`.
    pub fn issue(&self, subject: TokenSubject<'_>) -> Result<IssuedToken, JwtError> {
        let now = Utc::now();
        let expires_at = now + self.access_token_ttl;
        let jti = Uuid::new_v4().to_string();

        let claims = Claims {
            sub: subject.user_id.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: jti.clone(),
            email: subject.email.to_string(),
            role: subject.role.to_string(),
            company_id: subject.company_id,
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            token,
            jti,
            expires_at,
        })
    }

    /// Verify signature and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = self.leeway_secs;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                JwtErrorKind::ExpiredSignature => JwtError::Expired,
                JwtErrorKind::InvalidSignature => JwtError::BadSignature,
                _ => JwtError::Malformed(e.to_string()),
            })
    }
}
