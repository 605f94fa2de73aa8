//! Authentication module for the UserHub API
//!
//! Provides JWT authentication middleware, password hashing, token
//! issuance/revocation and role-based authorization for API endpoints.

#[cfg(feature = "with-axum")]
use axum::{
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
    body::Body,
};
use std::env;
use serde::{Deserialize, Serialize};
#[cfg(feature = "with-axum")]
use tracing::{debug, warn};
use crate::auth::logging::{log_auth_event, AuthEvent, AuthEventType};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

// Token module for JWT handling
pub mod token;

// Token blacklist for revocation
pub mod token_blacklist;

// Argon2 password hashing
pub mod password;

// Authorization module for RBAC
#[cfg(feature = "with-axum")]
pub mod authorize;

// Auth event logging
pub mod logging;

/// Authentication claims for JSON Web Tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Role held by the user when the token was issued
    pub role: String,
    /// Issued at (as timestamp)
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// User information extracted from authenticated requests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct UserInfo {
    /// User ID
    pub user_id: String,
    /// User roles
    pub roles: Vec<String>,
    /// User email (if known)
    pub email: Option<String>,
    /// Authentication source (e.g., "jwt")
    pub auth_source: String,
}

/// Authentication middleware for protected routes
#[cfg(feature = "with-axum")]
pub async fn auth_middleware<S>(
    _state: State<S>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    // For development mode, bypass authentication if configured
    if cfg!(debug_assertions) && env::var("BYPASS_AUTH").is_ok() {
        debug!("Auth bypass enabled in development mode");
        return next.run(req).await;
    }

    // Get the request path for logging
    let request_path = req.uri().path().to_string();

    // Start timing the authentication process
    let start_time = std::time::Instant::now();

    // Extract the token from the Authorization header
    let auth_header = match req.headers().get(header::AUTHORIZATION) {
        Some(value) => match value.to_str() {
            Ok(auth_str) => auth_str,
            Err(_) => {
                warn!("Invalid Authorization header format");

                // Log auth failure
                let event = AuthEvent::new(AuthEventType::TokenValidation, None, false)
                    .with_details("Invalid Authorization header format")
                    .with_resource(request_path)
                    .with_duration(start_time.elapsed().as_millis() as u64)
                    .with_auth_method("jwt");

                log_auth_event(event);

                return unauthorized_response();
            }
        },
        None => {
            debug!("Missing Authorization header");

            // Log missing auth header
            let event = AuthEvent::new(AuthEventType::TokenValidation, None, false)
                .with_details("Missing Authorization header")
                .with_resource(request_path)
                .with_duration(start_time.elapsed().as_millis() as u64)
                .with_auth_method("jwt");

            log_auth_event(event);

            return unauthorized_response();
        }
    };

    // Check if it's a Bearer token
    if !auth_header.starts_with("Bearer ") {
        warn!("Authorization header does not contain Bearer token");

        // Log invalid token format
        let event = AuthEvent::new(AuthEventType::TokenValidation, None, false)
            .with_details("Authorization header does not contain Bearer token")
            .with_resource(request_path)
            .with_duration(start_time.elapsed().as_millis() as u64)
            .with_auth_method("jwt");

        log_auth_event(event);

        return unauthorized_response();
    }

    let bearer_token = &auth_header[7..]; // Skip "Bearer " prefix

    match token::validate_token(bearer_token) {
        Ok(claims) => {
            debug!("Token validated successfully for user: {}", claims.sub);

            // Log successful authentication
            let duration = start_time.elapsed().as_millis() as u64;
            let event = AuthEvent::new(AuthEventType::TokenValidation, Some(&claims.sub), true)
                .with_details("JWT validation successful")
                .with_resource(request_path)
                .with_duration(duration)
                .with_auth_method("jwt");

            log_auth_event(event);

            // Add user info to request extensions
            let user_info = UserInfo {
                user_id: claims.sub.clone(),
                roles: vec![claims.role.clone()],
                email: None,
                auth_source: "jwt".to_string(),
            };

            req.extensions_mut().insert(user_info);
            req.extensions_mut().insert(claims);

            // Continue with the request
            next.run(req).await
        },
        Err(e) => {
            let details = match e {
                token::SecurityError::TokenExpired => "JWT token has expired",
                token::SecurityError::TokenRevoked => "Token has been revoked",
                _ => "JWT validation failed",
            };
            warn!("{}: {}", details, e);

            // Log token validation failure
            let event = AuthEvent::new(AuthEventType::TokenValidation, None, false)
                .with_details(details)
                .with_resource(request_path)
                .with_duration(start_time.elapsed().as_millis() as u64)
                .with_auth_method("jwt");

            log_auth_event(event);

            unauthorized_response()
        }
    }
}

#[cfg(feature = "with-axum")]
fn unauthorized_response() -> Response {
    Response::builder()
        .status(StatusCode::UNAUTHORIZED)
        .body(Body::empty())
        .unwrap_or_default()
}

/// Configure security layers (CORS and security headers) for the application
#[cfg(all(feature = "with-axum", feature = "with-web"))]
pub fn configure_auth(app: axum::Router) -> axum::Router {
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::set_header::SetResponseHeaderLayer;
    use axum::http::header;

    // Create CORS layer for authentication endpoints
    let auth_cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(std::time::Duration::from_secs(3600));

    // Add security headers
    let security_headers = tower::ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            header::STRICT_TRANSPORT_SECURITY,
            header::HeaderValue::from_static("max-age=63072000; includeSubDomains; preload")
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            header::HeaderValue::from_static("nosniff")
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            header::HeaderValue::from_static("DENY")
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_SECURITY_POLICY,
            header::HeaderValue::from_static(
                "default-src 'self'; script-src 'self'; connect-src 'self'; img-src 'self' data:; style-src 'self' 'unsafe-inline'; font-src 'self'; frame-ancestors 'none'; form-action 'self'; base-uri 'self'"
            )
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            axum::http::HeaderName::from_static("referrer-policy"),
            header::HeaderValue::from_static("strict-origin-when-cross-origin")
        ));

    // Apply the security headers and CORS to the entire application
    app.layer(auth_cors).layer(security_headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_round_trip() {
        let claims = Claims {
            sub: "user-1".to_string(),
            iss: "userhub-api".to_string(),
            role: "ADMIN".to_string(),
            iat: 1_700_000_000,
            exp: 1_700_000_900,
        };

        let json = serde_json::to_string(&claims).unwrap();
        let parsed: Claims = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.sub, "user-1");
        assert_eq!(parsed.role, "ADMIN");
    }
}
