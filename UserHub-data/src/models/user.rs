use serde::{Deserialize, Serialize};

/// Storage model for a user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for the user
    pub id: String,

    /// Unique short handle chosen by (or generated for) the user
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

    /// Role name (ANONYMOUS, AUTHENTICATED, MANAGER, ADMIN)
    pub role: String,

    /// Argon2 PHC-format password hash
    pub hashed_password: String,

    /// Whether the email address has been verified
    pub email_verified: bool,

    /// Outstanding email verification token, if any
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

/// Input data for inserting a new user record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
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

    /// Role name
    pub role: String,

    /// Argon2 PHC-format password hash
    pub hashed_password: String,

    /// Whether the email starts out verified
    pub email_verified: bool,

    /// Verification token to store, if any
    pub verification_token: Option<String>,
}

/// Partial update applied to an existing user record.
/// `None` fields are left untouched; `Some(None)` inside the nested
/// options clears a nullable column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserChanges {
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<Option<String>>,
    pub last_name: Option<Option<String>>,
    pub bio: Option<Option<String>>,
    pub profile_picture_url: Option<Option<String>>,
    pub linkedin_profile_url: Option<Option<String>>,
    pub github_profile_url: Option<Option<String>>,
    pub role: Option<String>,
    pub hashed_password: Option<String>,
    pub email_verified: Option<bool>,
    pub verification_token: Option<Option<String>>,
    pub is_locked: Option<bool>,
    pub failed_login_attempts: Option<u32>,
    pub last_login_at: Option<Option<String>>,
}

impl UserChanges {
    /// True when the update carries no changes at all
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
            && self.hashed_password.is_none()
            && self.email_verified.is_none()
            && self.verification_token.is_none()
            && self.is_locked.is_none()
            && self.failed_login_attempts.is_none()
            && self.last_login_at.is_none()
    }

    /// Apply the changes to a user record, bumping `updated_at`
    pub fn apply(self, user: &mut User, now: String) {
        if let Some(nickname) = self.nickname {
            user.nickname = nickname;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(first_name) = self.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name;
        }
        if let Some(bio) = self.bio {
            user.bio = bio;
        }
        if let Some(url) = self.profile_picture_url {
            user.profile_picture_url = url;
        }
        if let Some(url) = self.linkedin_profile_url {
            user.linkedin_profile_url = url;
        }
        if let Some(url) = self.github_profile_url {
            user.github_profile_url = url;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(hash) = self.hashed_password {
            user.hashed_password = hash;
        }
        if let Some(verified) = self.email_verified {
            user.email_verified = verified;
        }
        if let Some(token) = self.verification_token {
            user.verification_token = token;
        }
        if let Some(locked) = self.is_locked {
            user.is_locked = locked;
        }
        if let Some(attempts) = self.failed_login_attempts {
            user.failed_login_attempts = attempts;
        }
        if let Some(ts) = self.last_login_at {
            user.last_login_at = ts;
        }
        user.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: "8d7f9c1a-0000-0000-0000-000000000001".to_string(),
            nickname: "john_doe_123".to_string(),
            email: "john.doe@example.com".to_string(),
            first_name: Some("John".to_string()),
            last_name: Some("Doe".to_string()),
            bio: None,
            profile_picture_url: None,
            linkedin_profile_url: None,
            github_profile_url: None,
            role: "AUTHENTICATED".to_string(),
            hashed_password: "$argon2id$v=19$...".to_string(),
            email_verified: true,
            verification_token: None,
            is_locked: false,
            failed_login_attempts: 0,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_empty_changes() {
        assert!(UserChanges::default().is_empty());

        let changes = UserChanges {
            nickname: Some("j_doe".to_string()),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }

    #[test]
    fn test_apply_changes() {
        let mut user = sample_user();
        let changes = UserChanges {
            email: Some("john.doe.new@example.com".to_string()),
            bio: Some(Some("Backend developer".to_string())),
            last_login_at: Some(Some("2024-02-01T10:00:00Z".to_string())),
            ..Default::default()
        };

        changes.apply(&mut user, "2024-02-01T10:00:00Z".to_string());

        assert_eq!(user.email, "john.doe.new@example.com");
        assert_eq!(user.bio.as_deref(), Some("Backend developer"));
        assert_eq!(user.last_login_at.as_deref(), Some("2024-02-01T10:00:00Z"));
        assert_eq!(user.updated_at, "2024-02-01T10:00:00Z");
        // Untouched fields keep their values
        assert_eq!(user.nickname, "john_doe_123");
    }

    #[test]
    fn test_apply_clears_nullable_field() {
        let mut user = sample_user();
        user.verification_token = Some("tok".to_string());

        let changes = UserChanges {
            verification_token: Some(None),
            ..Default::default()
        };
        changes.apply(&mut user, "2024-02-01T10:00:00Z".to_string());

        assert!(user.verification_token.is_none());
    }
}
