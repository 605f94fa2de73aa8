use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use user_hub_domain::entities::user::Role;

/// Hypermedia link attached to API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicLink {
    /// Relation of the link to the current resource (e.g. "self")
    pub rel: String,

    /// Target URL
    pub href: String,
}

/// Public representation of a user account.
/// Credential material (password hash, verification token) never
/// appears here.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicUserResponse {
    /// User ID
    pub id: Uuid,

    /// Unique short handle
    pub nickname: String,

    /// Email address
    pub email: String,

    /// Optional given name
    pub first_name: Option<String>,

    /// Optional family name
    pub last_name: Option<String>,

    /// Optional free-form biography
    pub bio: Option<String>,

    /// Optional profile picture URL
    pub profile_picture_url: Option<String>,

    /// Optional LinkedIn profile URL
    pub linkedin_profile_url: Option<String>,

    /// Optional GitHub profile URL
    pub github_profile_url: Option<String>,

    /// Access role
    pub role: Role,

    /// Whether the email address has been verified
    pub email_verified: bool,

    /// Whether the account is locked out of login
    pub is_locked: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last modified
    pub updated_at: DateTime<Utc>,

    /// When the user last logged in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,

    /// Hypermedia links for this resource
    pub links: Vec<PublicLink>,
}

/// Registration request payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PublicRegistrationRequest {
    /// Desired nickname (3-50 chars, letters/digits/underscore/hyphen)
    #[validate(length(min = 3, max = 50, message = "Nickname must be between 3 and 50 characters"))]
    pub nickname: String,

    /// Email address (must be valid format)
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,

    /// Password (must be at least 8 characters)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Optional given name
    pub first_name: Option<String>,

    /// Optional family name
    pub last_name: Option<String>,

    /// Optional free-form biography
    pub bio: Option<String>,

    /// Optional profile picture URL (http or https)
    pub profile_picture_url: Option<String>,

    /// Optional LinkedIn profile URL (http or https)
    pub linkedin_profile_url: Option<String>,

    /// Optional GitHub profile URL (http or https)
    pub github_profile_url: Option<String>,
}

/// Administrative user creation payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PublicCreateUserRequest {
    /// Desired nickname (3-50 chars, letters/digits/underscore/hyphen)
    #[validate(length(min = 3, max = 50, message = "Nickname must be between 3 and 50 characters"))]
    pub nickname: String,

    /// Email address (must be valid format)
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,

    /// Password (must be at least 8 characters)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Role assigned to the new account
    pub role: Role,

    /// Optional given name
    pub first_name: Option<String>,

    /// Optional family name
    pub last_name: Option<String>,

    /// Optional free-form biography
    pub bio: Option<String>,

    /// Optional profile picture URL (http or https)
    pub profile_picture_url: Option<String>,

    /// Optional LinkedIn profile URL (http or https)
    pub linkedin_profile_url: Option<String>,

    /// Optional GitHub profile URL (http or https)
    pub github_profile_url: Option<String>,
}

/// Partial profile update payload; at least one field must be set
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct PublicUpdateUserRequest {
    /// New nickname
    pub nickname: Option<String>,

    /// New email address
    pub email: Option<String>,

    /// New given name
    pub first_name: Option<String>,

    /// New family name
    pub last_name: Option<String>,

    /// New biography
    pub bio: Option<String>,

    /// New profile picture URL (http or https)
    pub profile_picture_url: Option<String>,

    /// New LinkedIn profile URL (http or https)
    pub linkedin_profile_url: Option<String>,

    /// New GitHub profile URL (http or https)
    pub github_profile_url: Option<String>,

    /// New role
    pub role: Option<Role>,
}
