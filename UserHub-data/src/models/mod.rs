// Data storage models
pub mod user;

pub use user::{NewUser, User, UserChanges};
