// JWT token generation and validation service

use crate::auth::{error::AuthError, models::Role};
use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Issuer stamped into and required from every token
pub const ISSUER: &str = "cultural-spa";

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,        // user_id
    pub username: String,
    pub role: Role,
    pub iss: String,
    pub exp: i64,        // expiration timestamp
    pub iat: i64,        // issued at timestamp
}

/// The identity a token is minted for
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSubject {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
}

impl From<&Claims> for TokenSubject {
    fn from(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username.clone(),
            role: claims.role,
        }
    }
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Token service for JWT operations
///
/// Access and refresh tokens are signed with independent secrets, so a token
/// of one class never verifies as the other.
pub struct TokenService {
    access_keys: SigningKeys,
    refresh_keys: SigningKeys,
    access_token_duration: i64,  // in seconds
    refresh_token_duration: i64, // in seconds
    validation: Validation,
}

impl TokenService {
    /// Create a TokenService with the default lifetimes
    /// Access tokens expire in 15 minutes (900 seconds)
    /// Refresh tokens expire in 7 days (604800 seconds)
    pub fn new(access_secret: &str, refresh_secret: &str) -> Result<Self, AuthError> {
        if access_secret.is_empty() {
            return Err(AuthError::ConfigError("access token secret is not configured".to_string()));
        }
        if refresh_secret.is_empty() {
            return Err(AuthError::ConfigError("refresh token secret is not configured".to_string()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.leeway = 0;

        Ok(Self {
            access_keys: SigningKeys::from_secret(access_secret),
            refresh_keys: SigningKeys::from_secret(refresh_secret),
            access_token_duration: 900,
            refresh_token_duration: 604_800,
            validation,
        })
    }

    /// Override token lifetimes (in seconds)
    pub fn with_ttls(mut self, access_ttl: i64, refresh_ttl: i64) -> Self {
        self.access_token_duration = access_ttl;
        self.refresh_token_duration = refresh_ttl;
        self
    }

    pub fn access_ttl(&self) -> i64 {
        self.access_token_duration
    }

    pub fn refresh_ttl(&self) -> i64 {
        self.refresh_token_duration
    }

    /// Sign a short-lived access token
    pub fn sign_access_token(&self, subject: &TokenSubject) -> Result<String, AuthError> {
        self.sign(subject, self.access_token_duration, &self.access_keys)
    }

    /// Sign a long-lived refresh token
    pub fn sign_refresh_token(&self, subject: &TokenSubject) -> Result<String, AuthError> {
        self.sign(subject, self.refresh_token_duration, &self.refresh_keys)
    }

    /// Sign both tokens, returning (access, refresh)
    pub fn sign_token_pair(&self, subject: &TokenSubject) -> Result<(String, String), AuthError> {
        let access_token = self.sign_access_token(subject)?;
        let refresh_token = self.sign_refresh_token(subject)?;
        Ok((access_token, refresh_token))
    }

    /// Validate an access token
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(token, &self.access_keys)
    }

    /// Validate a refresh token
    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(token, &self.refresh_keys)
    }

    fn sign(&self, subject: &TokenSubject, duration: i64, keys: &SigningKeys) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let exp = now
            .checked_add(duration)
            .ok_or_else(|| AuthError::TokenGenerationError("token lifetime out of range".to_string()))?;

        let claims = Claims {
            sub: subject.user_id,
            username: subject.username.clone(),
            role: subject.role,
            iss: ISSUER.to_string(),
            iat: now,
            exp,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
    }

    fn verify(&self, token: &str, keys: &SigningKeys) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &keys.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => tracing::debug!("Rejected expired token"),
                    ErrorKind::InvalidIssuer => tracing::debug!("Rejected token with foreign issuer"),
                    kind => tracing::debug!("Rejected token: {:?}", kind),
                }
                AuthError::InvalidToken
            })
    }
}
