//! Session tokens.
//!
//! The economy only needs `encode`/`decode`; the wire format is private to
//! the issuer. `KeyedTokenIssuer` signs hex-encoded JSON claims with a
//! BLAKE3 keyed hash.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::PlayerId;

const KEY_CONTEXT: &str = "tapkeeper 2024-06 session token v1";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("token signature mismatch")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("token issued by {0}")]
    WrongIssuer(String),
    #[error("token revoked")]
    Revoked,
    #[error("failed to encode claims: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: PlayerId,
    #[serde(default)]
    pub nickname: Option<String>,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

impl Claims {
    pub fn new(
        sub: PlayerId,
        nickname: Option<String>,
        issuer: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Claims {
            sub,
            nickname,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            iss: issuer.to_string(),
        }
    }
}

pub trait TokenIssuer: Send + Sync + fmt::Debug {
    fn issuer(&self) -> &str;

    fn encode(&self, claims: &Claims) -> Result<String, TokenError>;

    /// Verify and decode. Expiry is checked against `now`.
    fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError>;
}

pub struct KeyedTokenIssuer {
    key: [u8; 32],
    issuer: String,
}

impl fmt::Debug for KeyedTokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedTokenIssuer")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl KeyedTokenIssuer {
    pub fn new(secret: &[u8], issuer: impl Into<String>) -> Self {
        Self {
            key: blake3::derive_key(KEY_CONTEXT, secret),
            issuer: issuer.into(),
        }
    }

    fn sign(&self, payload: &[u8]) -> blake3::Hash {
        blake3::keyed_hash(&self.key, payload)
    }
}

impl TokenIssuer for KeyedTokenIssuer {
    fn issuer(&self) -> &str {
        &self.issuer
    }

    fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        let payload = serde_json::to_vec(claims)?;
        let signature = self.sign(&payload);
        Ok(format!("{}.{}", hex::encode(&payload), signature.to_hex()))
    }

    fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let (payload_hex, signature_hex) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let payload = hex::decode(payload_hex).map_err(|_| TokenError::Malformed)?;
        let signature =
            blake3::Hash::from_hex(signature_hex).map_err(|_| TokenError::Malformed)?;

        // blake3::Hash equality is constant-time
        if self.sign(&payload) != signature {
            return Err(TokenError::BadSignature);
        }

        let claims: Claims = serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;
        if claims.iss != self.issuer {
            return Err(TokenError::WrongIssuer(claims.iss));
        }
        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn issuer() -> KeyedTokenIssuer {
        KeyedTokenIssuer::new(b"0123456789abcdef0123", "tapkeeper")
    }

    #[test]
    fn test_encode_decode() {
        let issuer = issuer();
        let claims = Claims::new(
            PlayerId::new(5),
            Some("amy".to_string()),
            "tapkeeper",
            now(),
            Duration::hours(1),
        );
        let token = issuer.encode(&claims).unwrap();
        assert_eq!(issuer.decode(&token, now()).unwrap(), claims);
    }

    #[test]
    fn test_expired() {
        let issuer = issuer();
        let claims = Claims::new(PlayerId::new(5), None, "tapkeeper", now(), Duration::hours(1));
        let token = issuer.encode(&claims).unwrap();
        assert!(matches!(
            issuer.decode(&token, now() + Duration::hours(1)),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let issuer = issuer();
        let claims = Claims::new(PlayerId::new(5), None, "tapkeeper", now(), Duration::hours(1));
        let token = issuer.encode(&claims).unwrap();

        let mut forged = claims.clone();
        forged.sub = PlayerId::new(6);
        let forged_payload = hex::encode(serde_json::to_vec(&forged).unwrap());
        let signature = token.split_once('.').unwrap().1;
        let forged_token = format!("{forged_payload}.{signature}");

        assert!(matches!(
            issuer.decode(&forged_token, now()),
            Err(TokenError::BadSignature)
        ));
    }

    #[test]
    fn test_other_secret_and_issuer_rejected() {
        let claims = Claims::new(PlayerId::new(5), None, "tapkeeper", now(), Duration::hours(1));
        let token = issuer().encode(&claims).unwrap();

        let other_secret = KeyedTokenIssuer::new(b"another-secret-value", "tapkeeper");
        assert!(matches!(
            other_secret.decode(&token, now()),
            Err(TokenError::BadSignature)
        ));

        let other_issuer = KeyedTokenIssuer::new(b"0123456789abcdef0123", "elsewhere");
        assert!(matches!(
            other_issuer.decode(&token, now()),
            Err(TokenError::WrongIssuer(_))
        ));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let issuer = issuer();
        for token in ["", "abc", "zz.zz", "00.00"] {
            assert!(matches!(
                issuer.decode(token, now()),
                Err(TokenError::Malformed)
            ));
        }
    }
}
