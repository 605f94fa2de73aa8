use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::entities::user::PublicUserResponse;

/// Login request payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PublicLoginRequest {
    /// Email address
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Login response payload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublicLoginResponse {
    /// JWT access token
    pub access_token: String,

    /// JWT refresh token
    pub refresh_token: String,

    /// Token type (Bearer)
    pub token_type: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    /// The authenticated user's profile
    pub user: PublicUserResponse,
}

/// Token refresh response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublicTokenRefreshResponse {
    /// New access token
    pub access_token: String,

    /// Token type (Bearer)
    pub token_type: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    /// ID of the user the token was issued for
    pub user_id: String,
}
