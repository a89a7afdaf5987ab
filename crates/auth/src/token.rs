//! Token signing and verification (HS256).

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid")]
    NotYetValid,

    #[error("invalid token: {0}")]
    Invalid(String),
}

impl From<TokenValidationError> for TokenError {
    fn from(e: TokenValidationError) -> Self {
        match e {
            TokenValidationError::Expired => TokenError::Expired,
            TokenValidationError::NotYetValid => TokenError::NotYetValid,
            TokenValidationError::InvalidTimeWindow => {
                TokenError::Invalid("expires_at <= issued_at".to_string())
            }
        }
    }
}

/// Token codec seam: the API layer depends on this trait, not on a concrete
/// signing scheme.
pub trait TokenCodec: Send + Sync {
    /// Sign claims into a compact token string.
    fn encode(&self, claims: &JwtClaims) -> Result<String, TokenError>;

    /// Verify the signature, then validate the claim time window against
    /// `now`. `now` is a parameter so expiry is testable at exact boundaries.
    fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError>;
}

/// HMAC-SHA256 codec over a shared secret.
pub struct Hs256TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Hs256TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    fn validation() -> Validation {
        // Expiry is checked by `validate_claims` with no leeway; the library's
        // built-in exp handling (60s default leeway) is disabled so the
        // boundary stays exact.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        validation
    }
}

impl TokenCodec for Hs256TokenCodec {
    fn encode(&self, claims: &JwtClaims) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Invalid(e.to_string()))
    }

    fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &Self::validation())
            .map_err(|e| TokenError::Invalid(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use captable_core::UserId;

    use super::*;
    use crate::Role;

    fn codec() -> Hs256TokenCodec {
        Hs256TokenCodec::new(b"test-secret")
    }

    fn claims(ttl_secs: i64) -> JwtClaims {
        let now = Utc::now();
        JwtClaims {
            sub: UserId::new(),
            role: Role::Admin,
            issued_at: now,
            expires_at: now + Duration::seconds(ttl_secs),
        }
    }

    #[test]
    fn encode_decode_round_trip() {
        let codec = codec();
        let claims = claims(1800);
        let token = codec.encode(&claims).unwrap();
        let decoded = codec.decode(&token, claims.issued_at).unwrap();
        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.role, Role::Admin);
    }

    #[test]
    fn expired_token_rejected_exactly_at_boundary() {
        let codec = codec();
        let claims = claims(1800);
        let token = codec.encode(&claims).unwrap();

        assert!(
            codec
                .decode(&token, claims.expires_at - Duration::seconds(1))
                .is_ok()
        );
        assert!(matches!(
            codec.decode(&token, claims.expires_at),
            Err(TokenError::Expired)
        ));
        assert!(matches!(
            codec.decode(&token, claims.expires_at + Duration::seconds(1)),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn token_signed_with_other_secret_rejected() {
        let claims = claims(1800);
        let token = Hs256TokenCodec::new(b"other-secret").encode(&claims).unwrap();
        assert!(matches!(
            codec().decode(&token, claims.issued_at),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn garbage_token_rejected() {
        assert!(matches!(
            codec().decode("not.a.jwt", Utc::now()),
            Err(TokenError::Invalid(_))
        ));
    }
}
