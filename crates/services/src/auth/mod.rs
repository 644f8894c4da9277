use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use huddle_config::JwtSettings;
use huddle_db::models::User;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Bad or missing credential. Rejected outright at the request or
    /// handshake boundary; no session or connection is established.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(&'static str),
    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims carried by both token kinds. The kind claim keeps a refresh token
/// from being replayed where an access token is expected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub kind: TokenKind,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Credential issuance collaborator: argon2 password hashing and the
/// access/refresh JWT pair, with issuer and kind validation on the way back
/// in.
pub struct AuthService {
    settings: JwtSettings,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthService {
    pub fn new(settings: JwtSettings) -> Self {
        let encoding_key = EncodingKey::from_secret(settings.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(settings.secret.as_bytes());
        Self {
            settings,
            encoding_key,
            decoding_key,
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Checks a password against its stored hash. A mismatch surfaces the
    /// same way as an unknown user, so the API never leaks which was wrong.
    pub fn check_password(&self, password: &str, hash: &str) -> Result<(), AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|e| AuthError::Internal(e.to_string()))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AuthError::Unauthenticated("invalid credentials"))
    }

    /// Issues a fresh access/refresh pair for the user.
    pub fn issue_tokens(&self, user: &User) -> Result<TokenPair, AuthError> {
        let access = self.issue(user, TokenKind::Access, self.settings.access_token_ttl_secs)?;
        let refresh = self.issue(user, TokenKind::Refresh, self.settings.refresh_token_ttl_secs)?;
        Ok(TokenPair {
            access,
            refresh,
            expires_in: self.settings.access_token_ttl_secs,
        })
    }

    fn issue(&self, user: &User, kind: TokenKind, ttl_secs: u64) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ttl_secs as i64)).timestamp(),
            iss: self.settings.issuer.clone(),
            kind,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Decodes and validates a token, requiring the expected kind.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.settings.issuer]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AuthError::Unauthenticated("token expired")
                }
                _ => AuthError::Unauthenticated("invalid token"),
            })?;

        if claims.kind != expected {
            return Err(AuthError::Unauthenticated("wrong token kind"));
        }
        Ok(claims)
    }
}
