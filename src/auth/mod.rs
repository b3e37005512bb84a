//! Bearer-token verification for protected routes.
//!
//! Tokens are HS256-signed claim blobs verified against a single shared
//! secret. `jsonwebtoken` performs the signature comparison in constant
//! time and expiry validation is explicit; there is no key rotation and no
//! revocation list.

use axum::http::header::HeaderValue;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Decoded payload of a verified credential.
///
/// Attached to the request context once the gate passes. Issuers put
/// arbitrary extra fields in their tokens; those survive in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user identifier), if the issuer set one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Expiration time as a Unix timestamp. Required; stale tokens are
    /// rejected.
    pub exp: i64,

    /// Remaining issuer-defined claims.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Verifies bearer tokens against the shared signing secret.
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Create a verifier for the given signing secret.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Apply the authentication gate to an `Authorization` header.
    ///
    /// - Missing header: `Unauthenticated` (401).
    /// - Present but malformed, expired, or signed with a different
    ///   secret: `InvalidCredential` (403).
    /// - Valid: the decoded claims.
    pub fn verify_header(&self, header: Option<&HeaderValue>) -> Result<Claims, GatewayError> {
        let header = header.ok_or(GatewayError::Unauthenticated)?;

        let raw = header.to_str().map_err(|_| GatewayError::InvalidCredential {
            reason: "authorization header is not valid UTF-8".to_string(),
        })?;

        // "Bearer <token>" — anything after the scheme is the token.
        let token = raw
            .split_whitespace()
            .nth(1)
            .ok_or_else(|| GatewayError::InvalidCredential {
                reason: "authorization header carries no token".to_string(),
            })?;

        self.verify(token)
    }

    /// Verify a raw token string.
    pub fn verify(&self, token: &str) -> Result<Claims, GatewayError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| GatewayError::InvalidCredential {
                reason: e.to_string(),
            })
    }
}
