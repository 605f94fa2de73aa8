// Public entities for the UserHub API
// This module contains data structures that are shared across the application boundary

// Re-export data structures for users
pub mod user;

// Common entities for error handling, pagination, etc.
pub mod common;

// Auth entities
pub mod auth;
