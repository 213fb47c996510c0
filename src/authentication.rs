use actix_web::http::header::AUTHORIZATION;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::principal::Principal;
use crate::routes::{error_chain_fmt, ErrorBody};

/// Verifies bearer tokens. Returns `None` for anything that is not a valid,
/// unexpired token.
pub trait Authenticator: Send + Sync {
    fn verify(&self, token: &str) -> Option<Principal>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 tokens signed with a shared secret by the login service.
pub struct JwtAuthenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtAuthenticator {
    pub fn new(secret: &Secret<String>) -> JwtAuthenticator {
        let secret = secret.expose_secret().as_bytes();

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::default(),
        }
    }

    /// Signs a token for `principal` the way the login service does.
    pub fn issue(
        &self,
        principal: &Principal,
        expires_in: Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: principal.id,
            kind: principal.kind.clone(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }
}

impl Authenticator for JwtAuthenticator {
    fn verify(&self, token: &str) -> Option<Principal> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Some(Principal {
                id: data.claims.sub,
                kind: data.claims.kind,
            }),
            Err(err) => {
                tracing::debug!("Rejected bearer token: {}", err);
                None
            }
        }
    }
}

#[derive(thiserror::Error)]
pub enum AuthError {
    #[error("No authentication token provided")]
    MissingToken,
    #[error("Invalid or expired authentication token")]
    InvalidToken,
    #[error("Unauthorized. Admin access required.")]
    Forbidden,
}

impl std::fmt::Debug for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody::new(self))
    }
}

fn bearer_token(request: &HttpRequest) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolves the principal behind the `Authorization: Bearer` header.
pub fn authenticate(
    request: &HttpRequest,
    authenticator: &dyn Authenticator,
) -> Result<Principal, AuthError> {
    let token = bearer_token(request).ok_or(AuthError::MissingToken)?;

    authenticator.verify(token).ok_or(AuthError::InvalidToken)
}

/// Fails closed unless the principal is an administrator.
pub fn require_admin(principal: &Principal) -> Result<(), AuthError> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}
