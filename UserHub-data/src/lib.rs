// UserHub Data
// This crate handles data access and external service interactions

// Database connection management
pub mod database;

// Repository implementations for data access
pub mod repository;

// Data storage models
pub mod models;
