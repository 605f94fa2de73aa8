use thiserror::Error;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Algorithm, Validation};
use std::env;
use tracing::{debug, error, info};
use chrono::{Duration, Utc};
use crate::auth::Claims;
use crate::auth::token_blacklist;
use crate::entities::user::Role;

/// Security errors for authentication and token operations
#[derive(Debug, Error)]
pub enum SecurityError {
    /// JWT validation error
    #[error("Token validation error: {0}")]
    TokenValidation(String),

    /// Expired token
    #[error("Token has expired")]
    TokenExpired,

    /// Invalid token structure
    #[error("Invalid token format")]
    InvalidToken,

    /// Configuration error
    #[error("Security configuration error: {0}")]
    ConfigError(String),

    /// Token has been revoked
    #[error("Token has been revoked")]
    TokenRevoked,

    /// Password hashing error
    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    /// Invalid issuer
    #[error("Invalid token issuer")]
    InvalidIssuer,
}

/// Token types for authentication
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenType {
    /// Short-lived access token
    Access,
    /// Long-lived refresh token
    Refresh,
}

impl TokenType {
    /// Get the expiration duration for this token type
    fn expiration(&self) -> Duration {
        match self {
            TokenType::Access => {
                // Access tokens expire in 15 minutes
                let expiration_minutes = env::var("ACCESS_TOKEN_EXPIRATION_MINUTES")
                    .unwrap_or_else(|_| "15".to_string())
                    .parse::<i64>()
                    .unwrap_or(15);

                Duration::minutes(expiration_minutes)
            },
            TokenType::Refresh => {
                // Refresh tokens expire in 7 days
                let expiration_days = env::var("REFRESH_TOKEN_EXPIRATION_DAYS")
                    .unwrap_or_else(|_| "7".to_string())
                    .parse::<i64>()
                    .unwrap_or(7);

                Duration::days(expiration_days)
            }
        }
    }
}

/// Generate a new JWT token carrying the user's role
pub fn generate_token(
    user_id: &str,
    role: Role,
    token_type: TokenType,
) -> Result<String, SecurityError> {
    // Load JWT secret from environment
    let jwt_secret = env::var("JWT_SECRET").map_err(|e| {
        error!("JWT_SECRET environment variable not found: {}", e);
        SecurityError::ConfigError("JWT_SECRET environment variable not found".to_string())
    })?;

    // Get issuer from environment variables
    let issuer = std::env::var("JWT_ISSUER")
        .unwrap_or_else(|_| "userhub-api".to_string());

    // Current time and expiration
    let now = Utc::now();
    let expiration = now + token_type.expiration();

    // Create claims
    let claims = Claims {
        sub: user_id.to_string(),
        iss: issuer,
        role: role.as_str().to_string(),
        iat: now.timestamp(),
        exp: expiration.timestamp(),
    };

    // Encode the token
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    ).map_err(|e| {
        error!("Failed to encode JWT token: {}", e);
        SecurityError::TokenValidation(e.to_string())
    })?;

    // Log token generation (but not the token itself)
    info!("Generated {:?} token for user {}", token_type, user_id);
    debug!("Token expiration: {}", expiration);

    Ok(token)
}

/// Validate a JWT token and return the decoded claims
pub fn validate_token(token: &str) -> Result<Claims, SecurityError> {
    // Load JWT secret from environment
    let jwt_secret = env::var("JWT_SECRET").map_err(|e| {
        error!("JWT_SECRET environment variable not found: {}", e);
        SecurityError::ConfigError("JWT_SECRET environment variable not found".to_string())
    })?;

    // Get issuer from environment variables
    let issuer = std::env::var("JWT_ISSUER")
        .unwrap_or_else(|_| "userhub-api".to_string());

    // Set up validation
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.set_issuer(&[issuer]);

    // Decode the token
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &validation,
    ).map_err(|e| {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => SecurityError::TokenExpired,
            jsonwebtoken::errors::ErrorKind::InvalidToken => SecurityError::InvalidToken,
            jsonwebtoken::errors::ErrorKind::InvalidIssuer => SecurityError::InvalidIssuer,
            jsonwebtoken::errors::ErrorKind::InvalidSignature => SecurityError::TokenValidation("Invalid signature".to_string()),
            _ => SecurityError::TokenValidation(e.to_string()),
        }
    })?;

    // Check if token has been revoked
    if is_token_revoked(&token_data.claims.sub)? {
        return Err(SecurityError::TokenRevoked);
    }

    Ok(token_data.claims)
}

/// Check if a token has been revoked
fn is_token_revoked(user_id: &str) -> Result<bool, SecurityError> {
    // Check the token blacklist
    let is_revoked = token_blacklist::blacklist().is_revoked(user_id);
    debug!("Checking if token for user {} is revoked: {}", user_id, is_revoked);
    Ok(is_revoked)
}

/// Revoke a user's tokens
pub fn revoke_token(user_id: &str) -> Result<(), SecurityError> {
    info!("Revoking tokens for user {}", user_id);

    // Blacklist until the longest-lived token issued before now has expired
    let expiration = std::time::SystemTime::now() + std::time::Duration::from_secs(86400); // 24 hours
    token_blacklist::blacklist().revoke_token(user_id, expiration);

    Ok(())
}
