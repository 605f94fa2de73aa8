use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::{Validate, ValidationError};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

/// Access role of a user account
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub enum Role {
    /// Registered but not yet email-verified
    Anonymous,

    /// Verified regular user
    Authenticated,

    /// Can view and edit other users
    Manager,

    /// Full control, including create/delete/unlock
    Admin,
}

impl Role {
    /// Storage representation of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Anonymous => "ANONYMOUS",
            Role::Authenticated => "AUTHENTICATED",
            Role::Manager => "MANAGER",
            Role::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ANONYMOUS" => Ok(Role::Anonymous),
            "AUTHENTICATED" => Ok(Role::Authenticated),
            "MANAGER" => Ok(Role::Manager),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Domain model for a user account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct User {
    /// Unique identifier for the user
    pub id: String,

    /// Unique short handle
    pub nickname: String,

    /// Unique email address
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

    /// Argon2 PHC-format password hash; never exposed through the API
    #[serde(skip_serializing, default)]
    pub hashed_password: String,

    /// Whether the email address has been verified
    pub email_verified: bool,

    /// Outstanding email verification token, if any; never exposed
    #[serde(skip_serializing, default)]
    pub verification_token: Option<String>,

    /// Whether the account is locked out of login
    pub is_locked: bool,

    /// Consecutive failed login attempts since the last success
    pub failed_login_attempts: u32,

    /// When the account was created (RFC 3339)
    pub created_at: String,

    /// When the account was last modified (RFC 3339)
    pub updated_at: String,

    /// When the user last logged in (RFC 3339)
    pub last_login_at: Option<String>,
}

/// Request payload for self-service registration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct RegisterUserRequest {
    /// Desired nickname (3-50 chars, letters/digits/underscore/hyphen)
    #[validate(
        length(min = 3, max = 50, message = "Nickname must be between 3 and 50 characters"),
        custom = "validate_nickname_charset"
    )]
    pub nickname: String,

    /// Email address
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,

    /// Password (at least 8 characters)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Optional given name
    pub first_name: Option<String>,

    /// Optional family name
    pub last_name: Option<String>,

    /// Optional free-form biography
    #[validate(length(max = 500, message = "Bio cannot exceed 500 characters"))]
    pub bio: Option<String>,

    /// Optional profile picture URL (http or https)
    #[validate(custom = "validate_web_url")]
    pub profile_picture_url: Option<String>,

    /// Optional LinkedIn profile URL (http or https)
    #[validate(custom = "validate_web_url")]
    pub linkedin_profile_url: Option<String>,

    /// Optional GitHub profile URL (http or https)
    #[validate(custom = "validate_web_url")]
    pub github_profile_url: Option<String>,
}

/// Request payload for administrative user creation.
/// Unlike registration, the caller chooses the role and the account
/// starts out verified.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CreateUserRequest {
    /// Desired nickname (3-50 chars, letters/digits/underscore/hyphen)
    #[validate(
        length(min = 3, max = 50, message = "Nickname must be between 3 and 50 characters"),
        custom = "validate_nickname_charset"
    )]
    pub nickname: String,

    /// Email address
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,

    /// Password (at least 8 characters)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Role assigned to the new account
    pub role: Role,

    /// Optional given name
    pub first_name: Option<String>,

    /// Optional family name
    pub last_name: Option<String>,

    /// Optional free-form biography
    #[validate(length(max = 500, message = "Bio cannot exceed 500 characters"))]
    pub bio: Option<String>,

    /// Optional profile picture URL (http or https)
    #[validate(custom = "validate_web_url")]
    pub profile_picture_url: Option<String>,

    /// Optional LinkedIn profile URL (http or https)
    #[validate(custom = "validate_web_url")]
    pub linkedin_profile_url: Option<String>,

    /// Optional GitHub profile URL (http or https)
    #[validate(custom = "validate_web_url")]
    pub github_profile_url: Option<String>,
}

/// Request payload for a partial profile update.
/// Every field is optional, but at least one must be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct UpdateUserRequest {
    /// New nickname
    #[validate(
        length(min = 3, max = 50, message = "Nickname must be between 3 and 50 characters"),
        custom = "validate_nickname_charset"
    )]
    pub nickname: Option<String>,

    /// New email address
    #[validate(email(message = "Must be a valid email address"))]
    pub email: Option<String>,

    /// New given name
    pub first_name: Option<String>,

    /// New family name
    pub last_name: Option<String>,

    /// New biography
    #[validate(length(max = 500, message = "Bio cannot exceed 500 characters"))]
    pub bio: Option<String>,

    /// New profile picture URL (http or https)
    #[validate(custom = "validate_web_url")]
    pub profile_picture_url: Option<String>,

    /// New LinkedIn profile URL (http or https)
    #[validate(custom = "validate_web_url")]
    pub linkedin_profile_url: Option<String>,

    /// New GitHub profile URL (http or https)
    #[validate(custom = "validate_web_url")]
    pub github_profile_url: Option<String>,

    /// New role
    pub role: Option<Role>,
}

impl UpdateUserRequest {
    /// True when no field is set at all
    pub fn is_empty(&self) -> bool {
        self.nickname.is_none()
            && self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.bio.is_none()
            && self.profile_picture_url.is_none()
            && self.linkedin_profile_url.is_none()
            && self.github_profile_url.is_none()
            && self.role.is_none()
    }
}

/// Nicknames are restricted to ASCII letters, digits, underscore and hyphen
fn validate_nickname_charset(nickname: &str) -> Result<(), ValidationError> {
    if nickname
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        Ok(())
    } else {
        let mut error = ValidationError::new("nickname_charset");
        error.message =
            Some("Nickname may only contain letters, digits, underscores and hyphens".into());
        Err(error)
    }
}

/// Profile URLs must parse and use the http or https scheme
fn validate_web_url(value: &str) -> Result<(), ValidationError> {
    match url::Url::parse(value) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => Ok(()),
        _ => {
            let mut error = ValidationError::new("web_url");
            error.message = Some("Must be a valid http or https URL".into());
            Err(error)
        }
    }
}
