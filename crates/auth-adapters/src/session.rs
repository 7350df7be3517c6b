//! HS256 session tokens.
//!
//! The token carries the whole [`Session`] so `/api/auth/me` never touches
//! storage. Any decode failure (bad signature, expired, malformed) yields
//! `None`.

use chrono::{Duration, Utc};
use domains::{DomainError, DomainResult, Session, SessionCodec, UserId};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    username: String,
    email: String,
    iat: i64,
    exp: i64,
}

pub struct JwtSessionCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtSessionCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }
}

impl SessionCodec for JwtSessionCodec {
    fn issue(&self, session: &Session) -> DomainResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: session.user_id.to_string(),
            username: session.username.clone(),
            email: session.email.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            tracing::error!(error = %e, "failed to sign session token");
            DomainError::internal(e)
        })
    }

    fn decode(&self, token: &str) -> Option<Session> {
        let data = match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(error = %e, "rejected session token");
                return None;
            }
        };

        let user_id = data.claims.sub.parse::<i64>().ok()?;
        Some(Session {
            user_id: UserId(user_id),
            username: data.claims.username,
            email: data.claims.email,
        })
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn session() -> Session {
        Session { user_id: UserId(42), username: "alice".into(), email: "a@x.io".into() }
    }

    #[test]
    fn issued_token_decodes_to_the_same_session() {
        let codec = JwtSessionCodec::new(SECRET, Duration::hours(1));
        let token = codec.issue(&session()).unwrap();
        assert_eq!(codec.decode(&token), Some(session()));
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let other = JwtSessionCodec::new(b"another-secret-another-secret-xx", Duration::hours(1));
        let token = other.issue(&session()).unwrap();

        let codec = JwtSessionCodec::new(SECRET, Duration::hours(1));
        assert_eq!(codec.decode(&token), None);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let codec = JwtSessionCodec::new(SECRET, Duration::hours(1));
        let mut token = codec.issue(&session()).unwrap();
        token.push('x');
        assert_eq!(codec.decode(&token), None);
        assert_eq!(codec.decode("not.a.token"), None);
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = JwtSessionCodec::new(SECRET, Duration::seconds(-10));
        let token = codec.issue(&session()).unwrap();
        assert_eq!(codec.decode(&token), None);
    }
}
