use crate::entities::user::{Role, User};
use std::str::FromStr;
use uuid::Uuid;

/// Conversion functions between domain entities and data models
/// These functions follow the pattern convert_to_[target_layer]_[model_name]

/// Helper function to safely parse a string ID to UUID
///
/// This centralizes UUID parsing logic to ensure consistent handling across the application.
/// When an invalid UUID is provided, it returns a descriptive error message.
pub fn parse_string_to_uuid(id: &str) -> Result<Uuid, String> {
    Uuid::parse_str(id).map_err(|_| format!("Invalid UUID format: {}", id))
}

/// Convert from data model to domain entity for a user account.
/// Unknown role strings are an error; the storage layer only ever
/// writes values produced by `Role::as_str`.
pub fn convert_to_domain_user(data_user: user_hub_data::models::user::User) -> Result<User, String> {
    let role = Role::from_str(&data_user.role)?;

    Ok(User {
        id: data_user.id,
        nickname: data_user.nickname,
        email: data_user.email,
        first_name: data_user.first_name,
        last_name: data_user.last_name,
        bio: data_user.bio,
        profile_picture_url: data_user.profile_picture_url,
        linkedin_profile_url: data_user.linkedin_profile_url,
        github_profile_url: data_user.github_profile_url,
        role,
        hashed_password: data_user.hashed_password,
        email_verified: data_user.email_verified,
        verification_token: data_user.verification_token,
        is_locked: data_user.is_locked,
        failed_login_attempts: data_user.failed_login_attempts,
        created_at: data_user.created_at,
        updated_at: data_user.updated_at,
        last_login_at: data_user.last_login_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data_user(role: &str) -> user_hub_data::models::user::User {
        user_hub_data::models::user::User {
            id: "123e4567-e89b-12d3-a456-426614174000".to_string(),
            nickname: "john_doe_123".to_string(),
            email: "john.doe@example.com".to_string(),
            first_name: Some("John".to_string()),
            last_name: Some("Doe".to_string()),
            bio: None,
            profile_picture_url: None,
            linkedin_profile_url: None,
            github_profile_url: None,
            role: role.to_string(),
            hashed_password: "$argon2id$hash".to_string(),
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
    fn test_convert_to_domain_user() {
        let data_user = sample_data_user("AUTHENTICATED");
        let domain_user = convert_to_domain_user(data_user.clone()).unwrap();

        assert_eq!(domain_user.id, data_user.id);
        assert_eq!(domain_user.nickname, data_user.nickname);
        assert_eq!(domain_user.email, data_user.email);
        assert_eq!(domain_user.role, Role::Authenticated);
        assert_eq!(domain_user.hashed_password, data_user.hashed_password);
        assert_eq!(domain_user.created_at, data_user.created_at);
    }

    #[test]
    fn test_convert_rejects_unknown_role() {
        let data_user = sample_data_user("SUPERUSER");
        assert!(convert_to_domain_user(data_user).is_err());
    }

    #[test]
    fn test_parse_string_to_uuid() {
        assert!(parse_string_to_uuid("123e4567-e89b-12d3-a456-426614174000").is_ok());

        let err = parse_string_to_uuid("not-a-uuid").unwrap_err();
        assert!(err.contains("Invalid UUID format"));
    }
}
