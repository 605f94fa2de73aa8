use axum::{
    extract::{Json, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use std::str::FromStr;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use user_hub_domain::auth::logging::{log_auth_event, log_token_refresh, AuthEvent, AuthEventType};
use user_hub_domain::auth::{token, UserInfo};
use user_hub_domain::entities::user::{RegisterUserRequest, Role};

use crate::api::handlers::users::{
    convert_to_public_user, service_error_response, ErrorResponse, UserService,
};
use crate::entities::auth::{PublicLoginRequest, PublicLoginResponse, PublicTokenRefreshResponse};
use crate::entities::user::{PublicRegistrationRequest, PublicUserResponse};

/// Access token lifetime in seconds, as advertised to clients
fn access_token_lifetime_secs() -> i64 {
    std::env::var("ACCESS_TOKEN_EXPIRATION_MINUTES")
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(15)
        * 60
}

/// Register a new user account
#[utoipa::path(
    post,
    path = "/register",
    request_body = PublicRegistrationRequest,
    responses(
        (status = 201, description = "Account created; a verification email is sent unless this is the first account", body = PublicUserResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Email or nickname already in use", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "Authentication"
)]
#[instrument(skip(service, request))]
pub async fn register(
    State(service): State<UserService>,
    Json(request): Json<PublicRegistrationRequest>,
) -> Result<impl IntoResponse, Response> {
    info!("Registering new user");

    let domain_request = RegisterUserRequest {
        nickname: request.nickname,
        email: request.email,
        password: request.password,
        first_name: request.first_name,
        last_name: request.last_name,
        bio: request.bio,
        profile_picture_url: request.profile_picture_url,
        linkedin_profile_url: request.linkedin_profile_url,
        github_profile_url: request.github_profile_url,
    };

    match service.register(domain_request).await {
        Ok(user) => {
            info!("User registered with ID: {}", user.id);
            Ok((StatusCode::CREATED, Json(convert_to_public_user(user))))
        }
        Err(e) => Err(service_error_response(e)),
    }
}

/// Confirm an email address via the link from the verification email
#[utoipa::path(
    get,
    path = "/verify-email/{user_id}/{token}",
    params(
        ("user_id" = Uuid, Path, description = "User ID"),
        ("token" = String, Path, description = "Verification token from the email"),
    ),
    responses(
        (status = 200, description = "Email verified", body = PublicUserResponse),
        (status = 400, description = "Invalid verification token", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    ),
    tag = "Authentication"
)]
#[instrument(skip(service, token))]
pub async fn verify_email(
    State(service): State<UserService>,
    Path((user_id, token)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, Response> {
    info!("Verifying email for user: {}", user_id);

    match service.verify_email(&user_id.to_string(), &token).await {
        Ok(user) => Ok((StatusCode::OK, Json(convert_to_public_user(user)))),
        Err(e) => Err(service_error_response(e)),
    }
}

/// Login endpoint - authenticate user with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = PublicLoginRequest,
    responses(
        (status = 200, description = "Login successful. Use the returned access_token in the Authorization header as 'Bearer {token}' for authenticated requests.", body = PublicLoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Account locked or email not verified", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    operation_id = "login"
)]
#[instrument(skip(service, request))]
pub async fn login(
    State(service): State<UserService>,
    Json(request): Json<PublicLoginRequest>,
) -> Result<impl IntoResponse, Response> {
    let user = match service.authenticate(&request.email, &request.password).await {
        Ok(user) => user,
        Err(e) => return Err(service_error_response(e)),
    };

    // Mint both tokens for the authenticated user
    let access_token = token::generate_token(&user.id, user.role, token::TokenType::Access)
        .map_err(|e| {
            error!("Failed to generate access token: {}", e);
            ErrorResponse::internal_error().into_response()
        })?;

    let refresh_token = token::generate_token(&user.id, user.role, token::TokenType::Refresh)
        .map_err(|e| {
            error!("Failed to generate refresh token: {}", e);
            ErrorResponse::internal_error().into_response()
        })?;

    let response = PublicLoginResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: access_token_lifetime_secs(),
        user: convert_to_public_user(user),
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Refresh token endpoint.
/// Send the refresh token in the Authorization header as a Bearer token.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "Token refreshed successfully", body = PublicTokenRefreshResponse),
        (status = 401, description = "Invalid refresh token", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(headers))]
pub async fn refresh_token(
    headers: HeaderMap,
) -> Result<impl IntoResponse, Response> {
    // Start timing the refresh operation
    let start_time = std::time::Instant::now();

    // Extract refresh token from header
    let auth_header = match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(auth_str) => auth_str,
        None => {
            let event = AuthEvent::new(AuthEventType::TokenRefresh, None, false)
                .with_details("Missing or invalid Authorization header")
                .with_duration(start_time.elapsed().as_millis() as u64)
                .with_auth_method("refresh_token");

            log_auth_event(event);

            return Err(
                ErrorResponse::unauthorized("Missing or invalid Authorization header")
                    .into_response(),
            );
        }
    };

    // Check if it's a Bearer token
    if !auth_header.starts_with("Bearer ") {
        let event = AuthEvent::new(AuthEventType::TokenRefresh, None, false)
            .with_details("Authorization header must start with Bearer")
            .with_duration(start_time.elapsed().as_millis() as u64)
            .with_auth_method("refresh_token");

        log_auth_event(event);

        return Err(
            ErrorResponse::unauthorized("Authorization header must start with Bearer")
                .into_response(),
        );
    }

    let refresh_token = &auth_header[7..]; // Skip "Bearer " prefix

    // Validate refresh token
    match token::validate_token(refresh_token) {
        Ok(claims) => {
            info!("Refresh token valid for user: {}", claims.sub);

            // The role travels inside the token; reject tokens carrying
            // a role this build does not know
            let role = Role::from_str(&claims.role).map_err(|_| {
                warn!("Refresh token carries unknown role: {}", claims.role);
                ErrorResponse::unauthorized("Invalid refresh token").into_response()
            })?;

            match token::generate_token(&claims.sub, role, token::TokenType::Access) {
                Ok(new_token) => {
                    log_token_refresh(&claims.sub, true, None);

                    Ok(Json(PublicTokenRefreshResponse {
                        access_token: new_token,
                        token_type: "Bearer".to_string(),
                        expires_in: access_token_lifetime_secs(),
                        user_id: claims.sub,
                    }))
                }
                Err(e) => {
                    error!("Failed to generate new access token: {}", e);
                    log_token_refresh(
                        &claims.sub,
                        false,
                        Some(&format!("Failed to generate new token: {}", e)),
                    );

                    Err(ErrorResponse::internal_error().into_response())
                }
            }
        }
        Err(e) => {
            warn!("Invalid refresh token: {}", e);

            let duration = start_time.elapsed().as_millis() as u64;
            let event = AuthEvent::new(AuthEventType::TokenRefresh, None, false)
                .with_details(format!("Invalid or expired refresh token: {}", e))
                .with_duration(duration)
                .with_auth_method("refresh_token");

            log_auth_event(event);

            Err(ErrorResponse::unauthorized("Invalid or expired refresh token").into_response())
        }
    }
}

/// Auth info endpoint
#[utoipa::path(
    get,
    path = "/auth/info",
    responses(
        (status = 200, description = "Authentication information", body = serde_json::Value)
    ),
    tag = "Authentication",
    security(
        ("bearer" = [])
    )
)]
pub async fn auth_info(
    Extension(user_info): Extension<UserInfo>
) -> Json<serde_json::Value> {
    use serde_json::json;
    Json(json!({
        "message": "Authentication info",
        "user_id": user_info.user_id,
        "roles": user_info.roles,
        "status": "authenticated"
    }))
}

/// Logout endpoint
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logged out successfully", body = serde_json::Value),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Authentication",
    security(
        ("bearer" = [])
    )
)]
pub async fn logout(
    Extension(user_info): Extension<UserInfo>
) -> Json<serde_json::Value> {
    use serde_json::json;
    use user_hub_domain::auth::logging::log_logout;

    // Revoke the user's tokens
    if let Err(e) = token::revoke_token(&user_info.user_id) {
        error!("Failed to revoke token: {}", e);
    }

    // Log logout event
    log_logout(&user_info.user_id);

    Json(json!({
        "message": "Logged out successfully",
        "status": "success"
    }))
}
