use std::sync::{Arc, Mutex};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::user::User;
use super::errors::RepositoryError;

/// In-memory storage implementation for user accounts
#[derive(Debug, Clone)]
pub struct InMemoryStorage {
    /// Storage for users, keyed by user ID
    users: Arc<Mutex<HashMap<String, User>>>,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    /// Create a new in-memory storage
    pub fn new() -> Self {
        Self {
            users: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Store a user in memory
    pub async fn store_user(&self, user: &User) -> Result<User, RepositoryError> {
        let mut store = self.users.lock().map_err(|e| RepositoryError::MutexLock(e.to_string()))?;
        store.insert(user.id.clone(), user.clone());
        Ok(user.clone())
    }

    /// Get a user by ID from memory
    pub async fn get_by_id(&self, id: &Uuid) -> Result<Option<User>, RepositoryError> {
        let store = self.users.lock().map_err(|e| RepositoryError::MutexLock(e.to_string()))?;
        Ok(store.get(&id.to_string()).cloned())
    }

    /// Get a user by email from memory
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let store = self.users.lock().map_err(|e| RepositoryError::MutexLock(e.to_string()))?;
        Ok(store.values().find(|u| u.email == email).cloned())
    }

    /// Get a user by nickname from memory
    pub async fn get_by_nickname(&self, nickname: &str) -> Result<Option<User>, RepositoryError> {
        let store = self.users.lock().map_err(|e| RepositoryError::MutexLock(e.to_string()))?;
        Ok(store.values().find(|u| u.nickname == nickname).cloned())
    }

    /// Get a page of users from memory
    pub async fn list(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
        sort_desc: Option<bool>,
    ) -> Result<(Vec<User>, usize), RepositoryError> {
        let store = self.users.lock().map_err(|e| RepositoryError::MutexLock(e.to_string()))?;
        let sort_desc = sort_desc.unwrap_or(true);

        let mut users: Vec<User> = store.values().cloned().collect();

        // Sort by creation time
        users.sort_by(|a, b| {
            let cmp = a.created_at.cmp(&b.created_at);
            if sort_desc {
                cmp.reverse()
            } else {
                cmp
            }
        });

        // Apply pagination
        let total = users.len();
        let offset = offset.unwrap_or(0);
        let limit = limit.unwrap_or(total);

        let page = users
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect();

        Ok((page, total))
    }

    /// Replace a stored user record
    pub async fn update_user(&self, user: &User) -> Result<User, RepositoryError> {
        let mut store = self.users.lock().map_err(|e| RepositoryError::MutexLock(e.to_string()))?;

        if !store.contains_key(&user.id) {
            return Err(RepositoryError::NotFound(user.id.clone()));
        }

        store.insert(user.id.clone(), user.clone());
        Ok(user.clone())
    }

    /// Delete a user by ID; returns whether a record was removed
    pub async fn delete(&self, id: &Uuid) -> Result<bool, RepositoryError> {
        let mut store = self.users.lock().map_err(|e| RepositoryError::MutexLock(e.to_string()))?;
        Ok(store.remove(&id.to_string()).is_some())
    }

    /// Count users in memory
    pub async fn count(&self) -> Result<usize, RepositoryError> {
        let store = self.users.lock().map_err(|e| RepositoryError::MutexLock(e.to_string()))?;
        Ok(store.len())
    }
}
