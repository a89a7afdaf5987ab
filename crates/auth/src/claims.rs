use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use captable_core::UserId;

use crate::Role;

/// JWT claims model (transport-agnostic).
///
/// `iat`/`exp` are serialized as whole seconds per RFC 7519. Signature
/// verification lives in [`crate::token`]; this module owns only the
/// deterministic time-window check so expiry behavior is testable without
/// signing keys or a wall clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject: the authenticated user id.
    pub sub: UserId,

    /// Role granted for the lifetime of the token.
    pub role: Role,

    /// Issued-at timestamp.
    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate the claim time window.
///
/// The boundary is exact: a token with `exp = t` is valid at `t - 1s` and
/// rejected at `t`. No leeway is applied anywhere.
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn claims(issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> JwtClaims {
        JwtClaims {
            sub: UserId::new(),
            role: Role::Shareholder,
            issued_at,
            expires_at,
        }
    }

    #[test]
    fn token_valid_inside_window() {
        let now = Utc::now();
        let c = claims(now, now + Duration::seconds(1800));
        assert!(validate_claims(&c, now + Duration::seconds(1799)).is_ok());
    }

    #[test]
    fn token_expired_at_and_after_boundary() {
        let now = Utc::now();
        let c = claims(now, now + Duration::seconds(1800));
        assert_eq!(
            validate_claims(&c, now + Duration::seconds(1800)),
            Err(TokenValidationError::Expired)
        );
        assert_eq!(
            validate_claims(&c, now + Duration::seconds(1801)),
            Err(TokenValidationError::Expired)
        );
    }

    #[test]
    fn token_rejected_before_issuance() {
        let now = Utc::now();
        let c = claims(now, now + Duration::seconds(60));
        assert_eq!(
            validate_claims(&c, now - Duration::seconds(1)),
            Err(TokenValidationError::NotYetValid)
        );
    }

    #[test]
    fn inverted_window_rejected() {
        let now = Utc::now();
        let c = claims(now, now - Duration::seconds(1));
        assert_eq!(
            validate_claims(&c, now),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }
}
