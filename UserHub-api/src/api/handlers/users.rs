use std::sync::Arc;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use utoipa::{IntoParams, ToSchema};

// Import domain entities and services
use user_hub_domain::auth::logging::log_access_denied;
use user_hub_domain::auth::UserInfo;
use user_hub_domain::entities::user::{
    CreateUserRequest, Role, UpdateUserRequest, User as DomainUser,
};
use user_hub_domain::services::{create_default_user_service, UserServiceError, UserServiceTrait};

// Import our entities
use crate::entities::user::{
    PublicCreateUserRequest, PublicLink, PublicUpdateUserRequest, PublicUserResponse,
};

/// Query parameters for listing users
#[derive(Debug, Deserialize, Clone, IntoParams, ToSchema)]
pub struct ListUsersQueryParams {
    /// Maximum number of results (default: 20, max: 100)
    pub limit: Option<usize>,

    /// Pagination offset (default: 0)
    pub offset: Option<usize>,

    /// Sort direction by creation time (asc/desc, default: desc)
    pub sort: Option<String>,
}

/// Paginated response for user data
#[derive(Serialize, ToSchema)]
#[aliases(UserListResponse = PaginatedResponse<PublicUserResponse>)]
pub struct PaginatedResponse<T> {
    /// Total count of items available
    pub total_count: usize,

    /// Current offset
    pub offset: usize,

    /// Current limit
    pub limit: usize,

    /// URL for the next page (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,

    /// URL for the previous page (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,

    /// Actual data items
    pub data: Vec<T>,
}

/// Error response format for API
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error type/code - machine-readable identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// Create a not found error response
    pub fn not_found(resource: &str) -> Self {
        Self {
            error: "not_found".to_string(),
            message: format!("The requested {} could not be found", resource),
            details: None,
        }
    }

    /// Create a validation error response
    pub fn validation_error(message: &str, details: Option<serde_json::Value>) -> Self {
        Self {
            error: "validation_error".to_string(),
            message: message.to_string(),
            details,
        }
    }

    /// Create a bad request error response
    pub fn bad_request(message: &str) -> Self {
        Self {
            error: "bad_request".to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    /// Create a conflict error response
    pub fn conflict(message: &str) -> Self {
        Self {
            error: "conflict".to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    /// Create an unauthorized error response
    pub fn unauthorized(message: &str) -> Self {
        Self {
            error: "unauthorized".to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    /// Create a forbidden error response
    pub fn forbidden(message: &str) -> Self {
        Self {
            error: "forbidden".to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    /// Create an internal error response
    pub fn internal_error() -> Self {
        Self {
            error: "internal_error".to_string(),
            message: "An unexpected error occurred".to_string(),
            details: None,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = match self.error.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "validation_error" => StatusCode::BAD_REQUEST,
            "bad_request" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "forbidden" => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

/// Service type for dependency injection
pub type UserService = Arc<dyn UserServiceTrait + Send + Sync>;

/// Create a default service for the handlers to use
pub fn create_service() -> UserService {
    Arc::new(create_default_user_service())
}

/// Map a domain service error to the matching API response
pub fn service_error_response(err: UserServiceError) -> Response {
    match err {
        UserServiceError::ValidationError(msg) => {
            warn!("Validation failed: {}", msg);
            ErrorResponse::validation_error(&msg, None).into_response()
        }
        UserServiceError::NotFound(_) => ErrorResponse::not_found("user").into_response(),
        UserServiceError::Conflict(msg) => {
            info!("Uniqueness conflict: {}", msg);
            ErrorResponse::conflict(&msg).into_response()
        }
        UserServiceError::InvalidCredentials => {
            ErrorResponse::unauthorized("Invalid email or password").into_response()
        }
        UserServiceError::AccountLocked => {
            ErrorResponse::forbidden("Account is locked").into_response()
        }
        UserServiceError::EmailNotVerified => {
            ErrorResponse::forbidden("Email address has not been verified").into_response()
        }
        UserServiceError::InvalidVerificationToken => {
            ErrorResponse::bad_request("Invalid verification token").into_response()
        }
        UserServiceError::RepositoryError(msg) | UserServiceError::SecurityError(msg) => {
            error!("Internal error: {}", msg);
            ErrorResponse::internal_error().into_response()
        }
    }
}

/// Convert a domain user to the public API representation
pub fn convert_to_public_user(user: DomainUser) -> PublicUserResponse {
    let id = Uuid::parse_str(&user.id).unwrap_or_default();

    let parse_ts = |ts: &str| match chrono::DateTime::parse_from_rfc3339(ts) {
        Ok(dt) => dt.with_timezone(&chrono::Utc),
        Err(_) => chrono::Utc::now(), // Fallback to current time if parsing fails
    };

    let links = vec![
        PublicLink {
            rel: "self".to_string(),
            href: format!("/api/v1/users/{}", user.id),
        },
        PublicLink {
            rel: "collection".to_string(),
            href: "/api/v1/users".to_string(),
        },
    ];

    PublicUserResponse {
        id,
        nickname: user.nickname,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        bio: user.bio,
        profile_picture_url: user.profile_picture_url,
        linkedin_profile_url: user.linkedin_profile_url,
        github_profile_url: user.github_profile_url,
        role: user.role,
        email_verified: user.email_verified,
        is_locked: user.is_locked,
        created_at: parse_ts(&user.created_at),
        updated_at: parse_ts(&user.updated_at),
        last_login_at: user.last_login_at.as_deref().map(parse_ts),
        links,
    }
}

/// Admin-only operations re-check the role from the request extensions.
/// The surrounding route group already requires ADMIN or MANAGER.
fn ensure_admin(user_info: Option<&UserInfo>) -> Result<(), Response> {
    match user_info {
        // Auth bypass in development leaves no user context behind
        None => Ok(()),
        Some(info) if info.roles.iter().any(|r| r == Role::Admin.as_str()) => Ok(()),
        Some(info) => {
            log_access_denied(&info.user_id, "admin operation", &[Role::Admin.as_str().to_string()]);
            Err(ErrorResponse::forbidden(
                "This operation requires the ADMIN role",
            )
            .into_response())
        }
    }
}

/// Generate pagination links from the current request
fn generate_pagination_links(
    total_count: usize,
    limit: usize,
    offset: usize,
    base_url: &str,
    query_params: &ListUsersQueryParams,
) -> (Option<String>, Option<String>) {
    let has_next = offset + limit < total_count;
    let has_prev = offset > 0;

    let build_query = |limit: usize, offset: usize| {
        let mut query_parts = vec![format!("limit={}", limit), format!("offset={}", offset)];

        if let Some(sort) = &query_params.sort {
            query_parts.push(format!("sort={}", sort));
        }

        format!("{}?{}", base_url, query_parts.join("&"))
    };

    let next = if has_next {
        Some(build_query(limit, offset + limit))
    } else {
        None
    };

    let previous = if has_prev {
        Some(build_query(limit, offset.saturating_sub(limit)))
    } else {
        None
    };

    (next, previous)
}

/// Get a paginated list of users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(
        ListUsersQueryParams
    ),
    responses(
        (status = 200, description = "User list retrieved", body = UserListResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Caller lacks the required role", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "users"
)]
#[instrument(skip(service))]
pub async fn list_users(
    State(service): State<UserService>,
    Query(params): Query<ListUsersQueryParams>,
) -> Result<impl IntoResponse, Response> {
    // Process query parameters
    let limit = params.limit.unwrap_or(20).min(100); // Cap at 100
    let offset = params.offset.unwrap_or(0);

    // Default to sorting by most recently created if not specified
    let sort_desc = !matches!(params.sort.as_deref(), Some("asc"));

    match service.list_users(Some(limit), Some(offset), Some(sort_desc)).await {
        Ok((users, total_count)) => {
            let base_url = "/api/v1/users";

            let (next, previous) =
                generate_pagination_links(total_count, limit, offset, base_url, &params);

            let public_users = users.into_iter().map(convert_to_public_user).collect();

            let response = PaginatedResponse {
                total_count,
                offset,
                limit,
                next,
                previous,
                data: public_users,
            };

            Ok((StatusCode::OK, Json(response)))
        }
        Err(e) => {
            error!("Failed to list users: {}", e);
            Err(service_error_response(e))
        }
    }
}

/// Get a single user by ID
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = PublicUserResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "users"
)]
#[instrument(skip(service))]
pub async fn get_user(
    State(service): State<UserService>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, Response> {
    info!("Fetching user with ID: {}", id);

    match service.get_user_by_id(&id.to_string()).await {
        Ok(user) => Ok((StatusCode::OK, Json(convert_to_public_user(user)))),
        Err(e) => Err(service_error_response(e)),
    }
}

/// Create a new user with an explicit role (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = PublicCreateUserRequest,
    responses(
        (status = 201, description = "User created", body = PublicUserResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Caller lacks the ADMIN role", body = ErrorResponse),
        (status = 409, description = "Email or nickname already in use", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "users"
)]
#[instrument(skip(service, request, user_info))]
pub async fn create_user(
    State(service): State<UserService>,
    user_info: Option<Extension<UserInfo>>,
    Json(request): Json<PublicCreateUserRequest>,
) -> Result<impl IntoResponse, Response> {
    ensure_admin(user_info.as_deref())?;

    info!("Creating new user with role {:?}", request.role);

    let domain_request = CreateUserRequest {
        nickname: request.nickname,
        email: request.email,
        password: request.password,
        role: request.role,
        first_name: request.first_name,
        last_name: request.last_name,
        bio: request.bio,
        profile_picture_url: request.profile_picture_url,
        linkedin_profile_url: request.linkedin_profile_url,
        github_profile_url: request.github_profile_url,
    };

    match service.create_user(domain_request).await {
        Ok(user) => {
            info!("User created with ID: {}", user.id);
            Ok((StatusCode::CREATED, Json(convert_to_public_user(user))))
        }
        Err(e) => Err(service_error_response(e)),
    }
}

/// Update an existing user's profile
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = PublicUpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = PublicUserResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Email or nickname already in use", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "users"
)]
#[instrument(skip(service, request))]
pub async fn update_user(
    State(service): State<UserService>,
    Path(id): Path<Uuid>,
    Json(request): Json<PublicUpdateUserRequest>,
) -> Result<impl IntoResponse, Response> {
    info!("Updating user with ID: {}", id);

    let domain_request = UpdateUserRequest {
        nickname: request.nickname,
        email: request.email,
        first_name: request.first_name,
        last_name: request.last_name,
        bio: request.bio,
        profile_picture_url: request.profile_picture_url,
        linkedin_profile_url: request.linkedin_profile_url,
        github_profile_url: request.github_profile_url,
        role: request.role,
    };

    match service.update_user(&id.to_string(), domain_request).await {
        Ok(user) => Ok((StatusCode::OK, Json(convert_to_public_user(user)))),
        Err(e) => Err(service_error_response(e)),
    }
}

/// Delete a user (admin only)
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Caller lacks the ADMIN role", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "users"
)]
#[instrument(skip(service, user_info))]
pub async fn delete_user(
    State(service): State<UserService>,
    user_info: Option<Extension<UserInfo>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, Response> {
    ensure_admin(user_info.as_deref())?;

    info!("Deleting user with ID: {}", id);

    match service.delete_user(&id.to_string()).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(service_error_response(e)),
    }
}

/// Clear a lockout so the user can log in again (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/unlock",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User unlocked", body = PublicUserResponse),
        (status = 403, description = "Caller lacks the ADMIN role", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "users"
)]
#[instrument(skip(service, user_info))]
pub async fn unlock_user(
    State(service): State<UserService>,
    user_info: Option<Extension<UserInfo>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, Response> {
    ensure_admin(user_info.as_deref())?;

    info!("Unlocking user with ID: {}", id);

    match service.unlock_user(&id.to_string()).await {
        Ok(user) => Ok((StatusCode::OK, Json(convert_to_public_user(user)))),
        Err(e) => Err(service_error_response(e)),
    }
}
