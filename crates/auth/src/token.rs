//! Signed session tokens.
//!
//! A token is an HS256 JWT whose `sid` names a row in the sessions table. The
//! signature and `exp` are checked here; revocation is checked against the row.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::AuthError;

pub const TOKEN_ISSUER: &str = "launchpad";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Account id.
    pub sub: String,
    /// Session row id.
    pub sid: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

impl SessionClaims {
    pub fn new(
        account_id: &str,
        session_id: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sub: account_id.to_string(),
            sid: session_id.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            iss: TOKEN_ISSUER.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct SessionSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    // Same checks minus `exp`, for finding the row behind a stale token.
    expired_validation: Validation,
}

impl SessionSigner {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.leeway = 0;

        let mut expired_validation = validation.clone();
        expired_validation.validate_exp = false;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expired_validation,
        }
    }

    pub fn sign(&self, claims: &SessionClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|error| AuthError::TokenSigning(error.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|error| match error.kind() {
                ErrorKind::ExpiredSignature => AuthError::SessionExpired,
                _ => AuthError::InvalidSession,
            })
    }

    /// Checks the signature and issuer but accepts tokens past `exp`.
    pub fn verify_ignoring_expiry(&self, token: &str) -> Result<SessionClaims, AuthError> {
        decode::<SessionClaims>(token, &self.decoding, &self.expired_validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidSession)
    }
}

impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigner").finish_non_exhaustive()
    }
}
