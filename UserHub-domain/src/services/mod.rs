pub mod email;
pub mod user;

// Domain services
// This module contains business logic implementations.

// Re-export service traits and factory functions
pub use email::{create_email_service_from_env, EmailServiceTrait};
pub use user::{create_default_user_service, UserService, UserServiceError, UserServicePolicy, UserServiceTrait};

// Re-export mock service factory functions when the mock feature is enabled
#[cfg(feature = "mock")]
pub use crate::testing::create_mock_user_service;
