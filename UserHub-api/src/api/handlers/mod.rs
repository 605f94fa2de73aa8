pub mod health;
pub mod users;
pub mod auth;

// Re-export handlers for easier imports
pub use users::{create_user, delete_user, get_user, list_users, unlock_user, update_user};
pub use auth::{auth_info, login, logout, refresh_token, register, verify_email};
pub use health::health_check;
