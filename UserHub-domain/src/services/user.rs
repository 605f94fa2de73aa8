use std::env;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use validator::Validate;
use async_trait::async_trait;

use crate::auth::logging::{
    log_account_locked, log_email_verification, log_failed_login, log_registration,
    log_successful_login,
};
use crate::auth::password;
use crate::entities::conversions;
use crate::entities::user::{
    CreateUserRequest, RegisterUserRequest, Role, UpdateUserRequest, User,
};
use crate::services::email::{create_email_service_from_env, EmailServiceTrait};
use user_hub_data::models::user::{NewUser, UserChanges};
use user_hub_data::repository::{RepositoryError, UserRepositoryTrait};

/// Length of generated email verification tokens
const VERIFICATION_TOKEN_LEN: usize = 32;

/// User service errors
#[derive(Debug, Error)]
pub enum UserServiceError {
    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Not found error
    #[error("User not found: {0}")]
    NotFound(String),

    /// Uniqueness conflict (duplicate email or nickname)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Wrong email or password
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Account is locked after repeated failed logins
    #[error("Account is locked")]
    AccountLocked,

    /// Login attempted before the email address was verified
    #[error("Email address has not been verified")]
    EmailNotVerified,

    /// Verification token does not match
    #[error("Invalid verification token")]
    InvalidVerificationToken,

    /// Repository error
    #[error("Repository error: {0}")]
    RepositoryError(String),

    /// Security subsystem error (hashing, tokens)
    #[error("Security error: {0}")]
    SecurityError(String),
}

/// Tunable policy knobs for the user service
#[derive(Debug, Clone)]
pub struct UserServicePolicy {
    /// Failed logins before the account is locked
    pub max_login_attempts: u32,

    /// Base URL used when building verification links
    pub public_base_url: String,
}

impl Default for UserServicePolicy {
    fn default() -> Self {
        Self {
            max_login_attempts: 5,
            public_base_url: "http://localhost:3000".to_string(),
        }
    }
}

impl UserServicePolicy {
    /// Build the policy from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_login_attempts = env::var("MAX_LOGIN_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(defaults.max_login_attempts);

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or(defaults.public_base_url)
            .trim_end_matches('/')
            .to_string();

        Self {
            max_login_attempts,
            public_base_url,
        }
    }
}

/// Trait for user service operations
#[async_trait]
pub trait UserServiceTrait {
    /// Self-service registration. The first account ever registered
    /// becomes an admin; later accounts receive a verification email.
    async fn register(&self, request: RegisterUserRequest) -> Result<User, UserServiceError>;

    /// Confirm an email address with the token from the verification link
    async fn verify_email(&self, user_id: &str, token: &str) -> Result<User, UserServiceError>;

    /// Check credentials and record the login. Repeated failures lock
    /// the account.
    async fn authenticate(&self, email: &str, plain_password: &str) -> Result<User, UserServiceError>;

    /// Administrative user creation with an explicit role; the account
    /// starts out verified and no email is sent.
    async fn create_user(&self, request: CreateUserRequest) -> Result<User, UserServiceError>;

    /// Get a user by ID
    async fn get_user_by_id(&self, id: &str) -> Result<User, UserServiceError>;

    /// Get a page of users plus the total count
    async fn list_users(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
        sort_desc: Option<bool>,
    ) -> Result<(Vec<User>, usize), UserServiceError>;

    /// Apply a partial profile update
    async fn update_user(&self, id: &str, request: UpdateUserRequest) -> Result<User, UserServiceError>;

    /// Delete a user by ID
    async fn delete_user(&self, id: &str) -> Result<(), UserServiceError>;

    /// Clear a lockout so the user can log in again
    async fn unlock_user(&self, id: &str) -> Result<User, UserServiceError>;
}

/// User service for domain logic
pub struct UserService<R: UserRepositoryTrait> {
    repository: R,
    email_service: Arc<dyn EmailServiceTrait>,
    policy: UserServicePolicy,
}

impl<R: UserRepositoryTrait> UserService<R> {
    /// Create a new user service
    pub fn new(
        repository: R,
        email_service: Arc<dyn EmailServiceTrait>,
        policy: UserServicePolicy,
    ) -> Self {
        Self {
            repository,
            email_service,
            policy,
        }
    }

    /// Map repository errors to service errors
    fn map_repo_error(&self, err: RepositoryError) -> UserServiceError {
        match err {
            RepositoryError::NotFound(msg) => UserServiceError::NotFound(msg),
            RepositoryError::Validation(msg) => UserServiceError::ValidationError(msg),
            RepositoryError::Conflict(msg) => UserServiceError::Conflict(msg),
            _ => UserServiceError::RepositoryError(err.to_string()),
        }
    }

    /// Fetch and convert a user, mapping a missing row to NotFound
    async fn fetch_domain_user(&self, id: &str) -> Result<User, UserServiceError> {
        let id_uuid = conversions::parse_string_to_uuid(id)
            .map_err(UserServiceError::ValidationError)?;

        let data_user = self
            .repository
            .get_by_id(id_uuid)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .ok_or_else(|| UserServiceError::NotFound(format!("User with ID {} not found", id)))?;

        conversions::convert_to_domain_user(data_user).map_err(UserServiceError::RepositoryError)
    }

    /// Build the verification link for a freshly generated token
    fn verification_url(&self, user_id: &str, token: &str) -> String {
        format!(
            "{}/verify-email/{}/{}",
            self.policy.public_base_url, user_id, token
        )
    }
}

/// Collapse validator errors into one readable message
fn format_validation_errors(validation_errors: &validator::ValidationErrors) -> String {
    validation_errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let error_msgs: Vec<String> = errors
                .iter()
                .map(|err| {
                    if let Some(msg) = &err.message {
                        msg.to_string()
                    } else {
                        format!("Invalid {}", field)
                    }
                })
                .collect();
            format!("{}: {}", field, error_msgs.join(", "))
        })
        .collect::<Vec<String>>()
        .join("; ")
}

/// Generate a random URL-safe verification token
fn generate_verification_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(VERIFICATION_TOKEN_LEN)
        .map(char::from)
        .collect()
}

#[async_trait]
impl<R: UserRepositoryTrait + Send + Sync> UserServiceTrait for UserService<R> {
    /// Self-service registration
    async fn register(&self, request: RegisterUserRequest) -> Result<User, UserServiceError> {
        if let Err(validation_errors) = request.validate() {
            return Err(UserServiceError::ValidationError(format_validation_errors(
                &validation_errors,
            )));
        }

        let hashed_password = password::hash_password(&request.password)
            .map_err(|e| UserServiceError::SecurityError(e.to_string()))?;

        // The very first account becomes the admin and skips verification
        let is_first_user = self
            .repository
            .count()
            .await
            .map_err(|e| self.map_repo_error(e))?
            == 0;

        let (role, email_verified, verification_token) = if is_first_user {
            (Role::Admin, true, None)
        } else {
            (Role::Anonymous, false, Some(generate_verification_token()))
        };

        let new_user = NewUser {
            nickname: request.nickname,
            email: request.email,
            first_name: request.first_name,
            last_name: request.last_name,
            bio: request.bio,
            profile_picture_url: request.profile_picture_url,
            linkedin_profile_url: request.linkedin_profile_url,
            github_profile_url: request.github_profile_url,
            role: role.as_str().to_string(),
            hashed_password,
            email_verified,
            verification_token: verification_token.clone(),
        };

        let data_user = self
            .repository
            .create(new_user)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        if is_first_user {
            info!("First registered user {} granted the admin role", data_user.id);
        }

        // Delivery failures are logged, not fatal: the token stays stored
        // and verification can be re-triggered by support
        if let Some(token) = verification_token {
            let url = self.verification_url(&data_user.id, &token);
            if let Err(e) = self
                .email_service
                .send_verification_email(&data_user.email, &data_user.nickname, &url)
                .await
            {
                error!(
                    "Failed to send verification email to {}: {}",
                    data_user.email, e
                );
            }
        }

        log_registration(&data_user.id, true, None);

        conversions::convert_to_domain_user(data_user).map_err(UserServiceError::RepositoryError)
    }

    /// Confirm an email address with the token from the verification link
    async fn verify_email(&self, user_id: &str, token: &str) -> Result<User, UserServiceError> {
        let user = self.fetch_domain_user(user_id).await?;

        // Verifying twice is harmless
        if user.email_verified {
            return Ok(user);
        }

        if user.verification_token.as_deref() != Some(token) {
            log_email_verification(user_id, false);
            return Err(UserServiceError::InvalidVerificationToken);
        }

        // Promote freshly verified accounts from ANONYMOUS to AUTHENTICATED
        let new_role = if user.role == Role::Anonymous {
            Some(Role::Authenticated.as_str().to_string())
        } else {
            None
        };

        let changes = UserChanges {
            email_verified: Some(true),
            verification_token: Some(None),
            role: new_role,
            ..Default::default()
        };

        let id_uuid = conversions::parse_string_to_uuid(user_id)
            .map_err(UserServiceError::ValidationError)?;

        let updated = self
            .repository
            .update(id_uuid, changes)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        log_email_verification(user_id, true);

        conversions::convert_to_domain_user(updated).map_err(UserServiceError::RepositoryError)
    }

    /// Check credentials and record the login
    async fn authenticate(&self, email: &str, plain_password: &str) -> Result<User, UserServiceError> {
        let data_user = self
            .repository
            .get_by_email(email)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        // Unknown email and wrong password produce the same error
        let data_user = match data_user {
            Some(user) => user,
            None => {
                log_failed_login(email, "Unknown email");
                return Err(UserServiceError::InvalidCredentials);
            }
        };

        if data_user.is_locked {
            log_failed_login(email, "Account is locked");
            return Err(UserServiceError::AccountLocked);
        }

        let id_uuid = conversions::parse_string_to_uuid(&data_user.id)
            .map_err(UserServiceError::ValidationError)?;

        let password_ok = password::verify_password(plain_password, &data_user.hashed_password)
            .map_err(|e| UserServiceError::SecurityError(e.to_string()))?;

        if !password_ok {
            let attempts = data_user.failed_login_attempts + 1;
            let lock_now = attempts >= self.policy.max_login_attempts;

            let changes = UserChanges {
                failed_login_attempts: Some(attempts),
                is_locked: Some(lock_now),
                ..Default::default()
            };

            if let Err(e) = self.repository.update(id_uuid, changes).await {
                error!("Failed to record failed login attempt: {}", e);
            }

            if lock_now {
                warn!("Locking account {} after {} failed attempts", data_user.id, attempts);
                log_account_locked(&data_user.id, attempts);
                return Err(UserServiceError::AccountLocked);
            }

            log_failed_login(email, "Wrong password");
            return Err(UserServiceError::InvalidCredentials);
        }

        if !data_user.email_verified {
            log_failed_login(email, "Email not verified");
            return Err(UserServiceError::EmailNotVerified);
        }

        // Successful login resets the failure counter
        let changes = UserChanges {
            failed_login_attempts: Some(0),
            last_login_at: Some(Some(Utc::now().to_rfc3339())),
            ..Default::default()
        };

        let updated = self
            .repository
            .update(id_uuid, changes)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        log_successful_login(&updated.id);

        conversions::convert_to_domain_user(updated).map_err(UserServiceError::RepositoryError)
    }

    /// Administrative user creation with an explicit role
    async fn create_user(&self, request: CreateUserRequest) -> Result<User, UserServiceError> {
        if let Err(validation_errors) = request.validate() {
            return Err(UserServiceError::ValidationError(format_validation_errors(
                &validation_errors,
            )));
        }

        let hashed_password = password::hash_password(&request.password)
            .map_err(|e| UserServiceError::SecurityError(e.to_string()))?;

        let new_user = NewUser {
            nickname: request.nickname,
            email: request.email,
            first_name: request.first_name,
            last_name: request.last_name,
            bio: request.bio,
            profile_picture_url: request.profile_picture_url,
            linkedin_profile_url: request.linkedin_profile_url,
            github_profile_url: request.github_profile_url,
            role: request.role.as_str().to_string(),
            hashed_password,
            email_verified: true,
            verification_token: None,
        };

        let data_user = self
            .repository
            .create(new_user)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        info!("User {} created with role {}", data_user.id, data_user.role);

        conversions::convert_to_domain_user(data_user).map_err(UserServiceError::RepositoryError)
    }

    /// Get a user by ID
    async fn get_user_by_id(&self, id: &str) -> Result<User, UserServiceError> {
        self.fetch_domain_user(id).await
    }

    /// Get a page of users plus the total count
    async fn list_users(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
        sort_desc: Option<bool>,
    ) -> Result<(Vec<User>, usize), UserServiceError> {
        let (data_users, total) = self
            .repository
            .list(limit, offset, sort_desc)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        let mut users = Vec::with_capacity(data_users.len());
        for data_user in data_users {
            users.push(
                conversions::convert_to_domain_user(data_user)
                    .map_err(UserServiceError::RepositoryError)?,
            );
        }

        Ok((users, total))
    }

    /// Apply a partial profile update
    async fn update_user(&self, id: &str, request: UpdateUserRequest) -> Result<User, UserServiceError> {
        if request.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Update request must contain at least one field".to_string(),
            ));
        }

        if let Err(validation_errors) = request.validate() {
            return Err(UserServiceError::ValidationError(format_validation_errors(
                &validation_errors,
            )));
        }

        let id_uuid = conversions::parse_string_to_uuid(id)
            .map_err(UserServiceError::ValidationError)?;

        let changes = UserChanges {
            nickname: request.nickname,
            email: request.email,
            first_name: request.first_name.map(Some),
            last_name: request.last_name.map(Some),
            bio: request.bio.map(Some),
            profile_picture_url: request.profile_picture_url.map(Some),
            linkedin_profile_url: request.linkedin_profile_url.map(Some),
            github_profile_url: request.github_profile_url.map(Some),
            role: request.role.map(|r| r.as_str().to_string()),
            ..Default::default()
        };

        let updated = self
            .repository
            .update(id_uuid, changes)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        conversions::convert_to_domain_user(updated).map_err(UserServiceError::RepositoryError)
    }

    /// Delete a user by ID
    async fn delete_user(&self, id: &str) -> Result<(), UserServiceError> {
        let id_uuid = conversions::parse_string_to_uuid(id)
            .map_err(UserServiceError::ValidationError)?;

        self.repository
            .delete(id_uuid)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        info!("User {} deleted", id);
        Ok(())
    }

    /// Clear a lockout so the user can log in again
    async fn unlock_user(&self, id: &str) -> Result<User, UserServiceError> {
        let id_uuid = conversions::parse_string_to_uuid(id)
            .map_err(UserServiceError::ValidationError)?;

        let changes = UserChanges {
            is_locked: Some(false),
            failed_login_attempts: Some(0),
            ..Default::default()
        };

        let updated = self
            .repository
            .update(id_uuid, changes)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        info!("User {} unlocked", id);

        conversions::convert_to_domain_user(updated).map_err(UserServiceError::RepositoryError)
    }
}

/// Create a default user service using the repository from the data layer
pub fn create_default_user_service() -> impl UserServiceTrait + Send + Sync {
    let repository = user_hub_data::repository::UserRepository::new();
    UserService::new(
        repository,
        create_email_service_from_env(),
        UserServicePolicy::from_env(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::email::EmailError;
    use std::sync::Mutex;
    use user_hub_data::repository::tests::MockUserRepository;

    /// Email double that records every message instead of sending it
    #[derive(Default)]
    struct RecordingEmailService {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl EmailServiceTrait for RecordingEmailService {
        async fn send_verification_email(
            &self,
            recipient: &str,
            _nickname: &str,
            verification_url: &str,
        ) -> Result<(), EmailError> {
            self.sent
                .lock()
                .unwrap()
                .push((recipient.to_string(), verification_url.to_string()));
            Ok(())
        }
    }

    fn test_service() -> (
        UserService<MockUserRepository>,
        Arc<RecordingEmailService>,
    ) {
        let email = Arc::new(RecordingEmailService::default());
        let service = UserService::new(
            MockUserRepository::new(),
            email.clone(),
            UserServicePolicy {
                max_login_attempts: 3,
                public_base_url: "http://localhost:3000".to_string(),
            },
        );
        (service, email)
    }

    fn register_request(nickname: &str, email: &str) -> RegisterUserRequest {
        RegisterUserRequest {
            nickname: nickname.to_string(),
            email: email.to_string(),
            password: "SecurePassword123!".to_string(),
            first_name: Some("John".to_string()),
            last_name: Some("Doe".to_string()),
            bio: None,
            profile_picture_url: None,
            linkedin_profile_url: None,
            github_profile_url: None,
        }
    }

    #[tokio::test]
    async fn test_first_registered_user_becomes_admin() {
        let (service, email) = test_service();

        let admin = service
            .register(register_request("first_user", "first@example.com"))
            .await
            .unwrap();

        assert_eq!(admin.role, Role::Admin);
        assert!(admin.email_verified);
        // No verification email for the bootstrap admin
        assert!(email.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_user_gets_verification_email() {
        let (service, email) = test_service();

        service
            .register(register_request("first_user", "first@example.com"))
            .await
            .unwrap();
        let user = service
            .register(register_request("second_user", "second@example.com"))
            .await
            .unwrap();

        assert_eq!(user.role, Role::Anonymous);
        assert!(!user.email_verified);

        let sent = email.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "second@example.com");
        assert!(sent[0].1.contains(&format!("/verify-email/{}/", user.id)));
    }

    #[tokio::test]
    async fn test_password_is_hashed_on_registration() {
        let (service, _) = test_service();

        let user = service
            .register(register_request("first_user", "first@example.com"))
            .await
            .unwrap();

        assert_ne!(user.hashed_password, "SecurePassword123!");
        assert!(user.hashed_password.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let (service, _) = test_service();

        service
            .register(register_request("first_user", "dup@example.com"))
            .await
            .unwrap();
        let result = service
            .register(register_request("other_user", "dup@example.com"))
            .await;

        assert!(matches!(result, Err(UserServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_nickname() {
        let (service, _) = test_service();

        let result = service
            .register(register_request("bad nickname", "user@example.com"))
            .await;

        match result {
            Err(UserServiceError::ValidationError(msg)) => {
                assert!(msg.to_lowercase().contains("nickname"), "got message: {}", msg)
            }
            other => panic!("Expected validation error, got {:?}", other.map(|u| u.id)),
        }
    }

    #[tokio::test]
    async fn test_verify_email_promotes_role() {
        let (service, email) = test_service();

        service
            .register(register_request("first_user", "first@example.com"))
            .await
            .unwrap();
        let user = service
            .register(register_request("second_user", "second@example.com"))
            .await
            .unwrap();

        // Pull the token out of the recorded verification link
        let sent = email.sent.lock().unwrap();
        let token = sent[0].1.rsplit('/').next().unwrap().to_string();
        drop(sent);

        let verified = service.verify_email(&user.id, &token).await.unwrap();
        assert!(verified.email_verified);
        assert_eq!(verified.role, Role::Authenticated);
        assert!(verified.verification_token.is_none());
    }

    #[tokio::test]
    async fn test_verify_email_rejects_wrong_token() {
        let (service, _) = test_service();

        service
            .register(register_request("first_user", "first@example.com"))
            .await
            .unwrap();
        let user = service
            .register(register_request("second_user", "second@example.com"))
            .await
            .unwrap();

        let result = service.verify_email(&user.id, "wrong-token").await;
        assert!(matches!(result, Err(UserServiceError::InvalidVerificationToken)));
    }

    #[tokio::test]
    async fn test_authenticate_success_records_login() {
        let (service, _) = test_service();

        service
            .register(register_request("first_user", "first@example.com"))
            .await
            .unwrap();

        let user = service
            .authenticate("first@example.com", "SecurePassword123!")
            .await
            .unwrap();

        assert!(user.last_login_at.is_some());
        assert_eq!(user.failed_login_attempts, 0);
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let (service, _) = test_service();

        service
            .register(register_request("first_user", "first@example.com"))
            .await
            .unwrap();

        let result = service.authenticate("first@example.com", "WrongPassword1").await;
        assert!(matches!(result, Err(UserServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_email() {
        let (service, _) = test_service();

        let result = service.authenticate("ghost@example.com", "whatever123").await;
        assert!(matches!(result, Err(UserServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_account_locks_after_max_attempts() {
        let (service, _) = test_service();

        let user = service
            .register(register_request("first_user", "first@example.com"))
            .await
            .unwrap();

        // Policy allows 3 attempts; the third failure trips the lock
        for _ in 0..2 {
            let result = service.authenticate("first@example.com", "WrongPassword1").await;
            assert!(matches!(result, Err(UserServiceError::InvalidCredentials)));
        }

        let result = service.authenticate("first@example.com", "WrongPassword1").await;
        assert!(matches!(result, Err(UserServiceError::AccountLocked)));

        // Even the correct password is refused while locked
        let result = service
            .authenticate("first@example.com", "SecurePassword123!")
            .await;
        assert!(matches!(result, Err(UserServiceError::AccountLocked)));

        // Unlock clears the counter and restores access
        service.unlock_user(&user.id).await.unwrap();
        let user = service
            .authenticate("first@example.com", "SecurePassword123!")
            .await
            .unwrap();
        assert_eq!(user.failed_login_attempts, 0);
    }

    #[tokio::test]
    async fn test_authenticate_rejects_unverified_email() {
        let (service, _) = test_service();

        service
            .register(register_request("first_user", "first@example.com"))
            .await
            .unwrap();
        service
            .register(register_request("second_user", "second@example.com"))
            .await
            .unwrap();

        let result = service
            .authenticate("second@example.com", "SecurePassword123!")
            .await;
        assert!(matches!(result, Err(UserServiceError::EmailNotVerified)));
    }

    #[tokio::test]
    async fn test_create_user_with_role() {
        let (service, email) = test_service();

        let request = CreateUserRequest {
            nickname: "manager_1".to_string(),
            email: "manager@example.com".to_string(),
            password: "SecurePassword123!".to_string(),
            role: Role::Manager,
            first_name: None,
            last_name: None,
            bio: None,
            profile_picture_url: None,
            linkedin_profile_url: None,
            github_profile_url: None,
        };

        let user = service.create_user(request).await.unwrap();
        assert_eq!(user.role, Role::Manager);
        assert!(user.email_verified);
        // Administrative creation sends no verification email
        assert!(email.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_user_rejects_empty_request() {
        let (service, _) = test_service();

        let user = service
            .register(register_request("first_user", "first@example.com"))
            .await
            .unwrap();

        let result = service
            .update_user(&user.id, UpdateUserRequest::default())
            .await;
        assert!(matches!(result, Err(UserServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_update_user_changes_fields() {
        let (service, _) = test_service();

        let user = service
            .register(register_request("first_user", "first@example.com"))
            .await
            .unwrap();

        let update = UpdateUserRequest {
            email: Some("john.doe.new@example.com".to_string()),
            nickname: Some("j_doe".to_string()),
            bio: Some("I specialize in backend development.".to_string()),
            ..Default::default()
        };

        let updated = service.update_user(&user.id, update).await.unwrap();
        assert_eq!(updated.email, "john.doe.new@example.com");
        assert_eq!(updated.nickname, "j_doe");
        assert_eq!(updated.bio.as_deref(), Some("I specialize in backend development."));
    }

    #[tokio::test]
    async fn test_delete_user() {
        let (service, _) = test_service();

        let user = service
            .register(register_request("first_user", "first@example.com"))
            .await
            .unwrap();

        service.delete_user(&user.id).await.unwrap();

        let result = service.get_user_by_id(&user.id).await;
        assert!(matches!(result, Err(UserServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_users_pagination() {
        let (service, _) = test_service();

        for i in 0..5 {
            service
                .register(register_request(
                    &format!("user_{}", i),
                    &format!("user{}@example.com", i),
                ))
                .await
                .unwrap();
        }

        let (page, total) = service.list_users(Some(2), Some(0), None).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(total, 5);

        let (rest, total) = service.list_users(Some(10), Some(4), None).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(total, 5);
    }

    #[tokio::test]
    async fn test_get_user_invalid_uuid() {
        let (service, _) = test_service();

        let result = service.get_user_by_id("not-a-uuid").await;
        match result {
            Err(UserServiceError::ValidationError(msg)) => {
                assert!(msg.contains("Invalid UUID format"))
            }
            other => panic!("Expected validation error, got {:?}", other.map(|u| u.id)),
        }
    }
}
