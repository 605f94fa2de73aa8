//! Testing utilities, only available with the `mock` feature.
//!
//! These helpers give API-layer tests a fully working user service that
//! never touches the database pool or a real mail provider.

use std::sync::{Arc, Mutex};
use async_trait::async_trait;

use crate::services::email::{EmailError, EmailServiceTrait};
use crate::services::user::{UserService, UserServicePolicy, UserServiceTrait};
use user_hub_data::repository::tests::MockUserRepository;

/// A captured outbound email
#[derive(Debug, Clone)]
pub struct SentEmail {
    /// Recipient address
    pub recipient: String,
    /// Verification link contained in the message
    pub verification_url: String,
}

/// Email service double that records messages instead of sending them
#[derive(Default)]
pub struct MockEmailService {
    sent: Mutex<Vec<SentEmail>>,
}

impl MockEmailService {
    /// Create a new mock email service
    pub fn new() -> Self {
        Self::default()
    }

    /// All emails captured so far
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailServiceTrait for MockEmailService {
    async fn send_verification_email(
        &self,
        recipient: &str,
        _nickname: &str,
        verification_url: &str,
    ) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push(SentEmail {
            recipient: recipient.to_string(),
            verification_url: verification_url.to_string(),
        });
        Ok(())
    }
}

/// Create a user service over the in-memory mock repository.
/// Runs the real business rules; only storage and email are doubled.
pub fn create_mock_user_service() -> impl UserServiceTrait + Send + Sync {
    UserService::new(
        MockUserRepository::new(),
        Arc::new(MockEmailService::new()),
        UserServicePolicy::default(),
    )
}

/// Create a user service plus a handle to the captured emails
pub fn create_mock_user_service_with_email(
) -> (impl UserServiceTrait + Send + Sync, Arc<MockEmailService>) {
    let email = Arc::new(MockEmailService::new());
    let service = UserService::new(
        MockUserRepository::new(),
        email.clone(),
        UserServicePolicy::default(),
    );
    (service, email)
}
