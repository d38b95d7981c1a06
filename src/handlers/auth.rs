use crate::errors::ApiError;
use crate::models::all_models::{Member, PlanType, Role};
use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use futures_util::future::{ready, Ready};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity carried by a session token and attached to the request once the
/// token has been verified.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub matricula: String,
    pub email: String,
    pub username: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_type: Option<PlanType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl From<&Member> for Claims {
    fn from(member: &Member) -> Self {
        Claims {
            matricula: member.matricula.clone(),
            email: member.email.clone(),
            username: member.username.clone(),
            role: member.role,
            phone_number: member.phone_number.clone(),
            plan_type: Some(member.plan_type),
            start_date: Some(member.start_date),
            end_date: Some(member.end_date),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenPayload {
    #[serde(flatten)]
    claims: Claims,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token")]
    Invalid,
    #[error("token expired")]
    Expired,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// HS256 codec for session tokens. The signature covers every claim, so any
/// change to the payload invalidates the token.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        TokenCodec {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, claims: &Claims) -> Result<String, TokenError> {
        self.issue_at(claims, Utc::now())
    }

    pub fn issue_at(&self, claims: &Claims, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Signing("token expiry out of range".to_string()))?;
        let payload = TokenPayload {
            claims: claims.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &payload, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Signature is checked before expiry: a tampered token is `Invalid`
    /// even when it is also past its expiry.
    pub fn parse(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        decode::<TokenPayload>(token, &self.decoding, &validation)
            .map(|data| data.claims.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

// Handlers behind a role gate take `Claims` directly; guest-tolerant handlers
// take `Option<Claims>`.
impl FromRequest for Claims {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Claims>()
                .cloned()
                .ok_or_else(|| ApiError::unauthorized("Authorization token required")),
        )
    }
}
