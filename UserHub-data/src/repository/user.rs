use chrono::Utc;
use tracing::{debug, error};
use uuid::Uuid;
use async_trait::async_trait;

use crate::models::user::{NewUser, User, UserChanges};
use crate::database::get_db_pool;
use super::errors::RepositoryError;
use super::in_memory::InMemoryStorage;
use super::storage::DatabaseStorage;

/// Repository trait for user accounts
#[async_trait]
pub trait UserRepositoryTrait {
    /// Insert a new user record
    async fn create(&self, new_user: NewUser) -> Result<User, RepositoryError>;

    /// Get a user by ID
    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;

    /// Get a user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    /// Get a user by nickname
    async fn get_by_nickname(&self, nickname: &str) -> Result<Option<User>, RepositoryError>;

    /// Get a page of users plus the total count
    async fn list(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
        sort_desc: Option<bool>,
    ) -> Result<(Vec<User>, usize), RepositoryError>;

    /// Apply a partial update to an existing user
    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User, RepositoryError>;

    /// Delete a user by ID
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;

    /// Count all users
    async fn count(&self) -> Result<usize, RepositoryError>;
}

/// Repository for user accounts.
/// This implementation can use different database backends with SQLite as the default.
#[derive(Debug, Clone, Default)]
pub struct UserRepository {
    /// In-memory storage for when database is not available
    storage: InMemoryStorage,
}

impl UserRepository {
    /// Create a new repository
    pub fn new() -> Self {
        Self {
            storage: InMemoryStorage::new(),
        }
    }

    /// Enforce email/nickname uniqueness before an insert or update.
    /// The database unique indexes back this check.
    async fn check_uniqueness(
        &self,
        email: Option<&str>,
        nickname: Option<&str>,
        exclude_id: Option<&str>,
    ) -> Result<(), RepositoryError> {
        if let Some(email) = email {
            if let Some(existing) = self.get_by_email(email).await? {
                if exclude_id != Some(existing.id.as_str()) {
                    return Err(RepositoryError::Conflict(
                        format!("Email {} is already registered", email),
                    ));
                }
            }
        }

        if let Some(nickname) = nickname {
            if let Some(existing) = self.get_by_nickname(nickname).await? {
                if exclude_id != Some(existing.id.as_str()) {
                    return Err(RepositoryError::Conflict(
                        format!("Nickname {} is already taken", nickname),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Fetch the current record for an update, trying the database first
    async fn fetch_for_update(&self, id: Uuid) -> Result<User, RepositoryError> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    /// Insert a new user record
    async fn create(&self, new_user: NewUser) -> Result<User, RepositoryError> {
        self.check_uniqueness(Some(&new_user.email), Some(&new_user.nickname), None)
            .await?;

        // Generate a unique ID and creation timestamps
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();

        let user = User {
            id: id.to_string(),
            nickname: new_user.nickname,
            email: new_user.email,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            bio: new_user.bio,
            profile_picture_url: new_user.profile_picture_url,
            linkedin_profile_url: new_user.linkedin_profile_url,
            github_profile_url: new_user.github_profile_url,
            role: new_user.role,
            hashed_password: new_user.hashed_password,
            email_verified: new_user.email_verified,
            verification_token: new_user.verification_token,
            is_locked: false,
            failed_login_attempts: 0,
            created_at: now.clone(),
            updated_at: now,
            last_login_at: None,
        };

        // Try to store in database first
        match get_db_pool() {
            Ok(pool) => {
                debug!("Storing user in database: {}", user.id);
                match DatabaseStorage::store_user(&pool, &user).await {
                    Ok(_) => Ok(user),
                    Err(e) => {
                        error!("Failed to store user in database: {}", e);
                        // Fall back to in-memory storage
                        self.storage.store_user(&user).await
                    }
                }
            },
            Err(e) => {
                // Database not available, use in-memory storage
                debug!("Database not available ({}), using in-memory storage", e);
                self.storage.store_user(&user).await
            }
        }
    }

    /// Get a user by ID
    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        match get_db_pool() {
            Ok(pool) => {
                debug!("Getting user by ID from database: {}", id);
                match DatabaseStorage::get_by_id(&pool, &id).await {
                    Ok(user) => Ok(user),
                    Err(e) => {
                        error!("Failed to get user by ID from database: {}", e);
                        self.storage.get_by_id(&id).await
                    }
                }
            },
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for get_by_id", e);
                self.storage.get_by_id(&id).await
            }
        }
    }

    /// Get a user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        match get_db_pool() {
            Ok(pool) => {
                debug!("Getting user by email from database");
                match DatabaseStorage::get_by_email(&pool, email).await {
                    Ok(user) => Ok(user),
                    Err(e) => {
                        error!("Failed to get user by email from database: {}", e);
                        self.storage.get_by_email(email).await
                    }
                }
            },
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for get_by_email", e);
                self.storage.get_by_email(email).await
            }
        }
    }

    /// Get a user by nickname
    async fn get_by_nickname(&self, nickname: &str) -> Result<Option<User>, RepositoryError> {
        match get_db_pool() {
            Ok(pool) => {
                debug!("Getting user by nickname from database: {}", nickname);
                match DatabaseStorage::get_by_nickname(&pool, nickname).await {
                    Ok(user) => Ok(user),
                    Err(e) => {
                        error!("Failed to get user by nickname from database: {}", e);
                        self.storage.get_by_nickname(nickname).await
                    }
                }
            },
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for get_by_nickname", e);
                self.storage.get_by_nickname(nickname).await
            }
        }
    }

    /// Get a page of users plus the total count
    async fn list(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
        sort_desc: Option<bool>,
    ) -> Result<(Vec<User>, usize), RepositoryError> {
        match get_db_pool() {
            Ok(pool) => {
                debug!("Listing users from database");
                match DatabaseStorage::list(&pool, limit, offset, sort_desc).await {
                    Ok(result) => Ok(result),
                    Err(e) => {
                        error!("Failed to list users from database: {}", e);
                        self.storage.list(limit, offset, sort_desc).await
                    }
                }
            },
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for list", e);
                self.storage.list(limit, offset, sort_desc).await
            }
        }
    }

    /// Apply a partial update to an existing user
    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User, RepositoryError> {
        if changes.is_empty() {
            return Err(RepositoryError::Validation(
                "Update request contains no changes".to_string(),
            ));
        }

        self.check_uniqueness(
            changes.email.as_deref(),
            changes.nickname.as_deref(),
            Some(&id.to_string()),
        )
        .await?;

        let mut user = self.fetch_for_update(id).await?;
        changes.apply(&mut user, Utc::now().to_rfc3339());

        match get_db_pool() {
            Ok(pool) => {
                debug!("Updating user in database: {}", user.id);
                match DatabaseStorage::update_user(&pool, &user).await {
                    Ok(_) => Ok(user),
                    Err(RepositoryError::NotFound(id)) => Err(RepositoryError::NotFound(id)),
                    Err(e) => {
                        error!("Failed to update user in database: {}", e);
                        self.storage.update_user(&user).await
                    }
                }
            },
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for update", e);
                self.storage.update_user(&user).await
            }
        }
    }

    /// Delete a user by ID
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let removed = match get_db_pool() {
            Ok(pool) => {
                debug!("Deleting user from database: {}", id);
                match DatabaseStorage::delete(&pool, &id).await {
                    Ok(removed) => removed,
                    Err(e) => {
                        error!("Failed to delete user from database: {}", e);
                        self.storage.delete(&id).await?
                    }
                }
            },
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for delete", e);
                self.storage.delete(&id).await?
            }
        };

        if removed {
            Ok(())
        } else {
            Err(RepositoryError::NotFound(id.to_string()))
        }
    }

    /// Count all users
    async fn count(&self) -> Result<usize, RepositoryError> {
        match get_db_pool() {
            Ok(pool) => {
                match DatabaseStorage::count(&pool).await {
                    Ok(count) => Ok(count),
                    Err(e) => {
                        error!("Failed to count users in database: {}", e);
                        self.storage.count().await
                    }
                }
            },
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for count", e);
                self.storage.count().await
            }
        }
    }
}

/// Mock user repository for testing
#[cfg(any(test, feature = "mock"))]
pub mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Mock implementation of UserRepository for testing.
    /// Unlike the real repository it never touches the database pool.
    #[derive(Clone, Default)]
    pub struct MockUserRepository {
        users: Arc<Mutex<HashMap<String, User>>>,
    }

    impl MockUserRepository {
        /// Create a new empty mock repository
        pub fn new() -> Self {
            Self {
                users: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        /// Create a mock repository with predefined users
        pub fn with_users(users: Vec<User>) -> Self {
            let map = users.into_iter().map(|u| (u.id.clone(), u)).collect();
            Self {
                users: Arc::new(Mutex::new(map)),
            }
        }
    }

    #[async_trait]
    impl UserRepositoryTrait for MockUserRepository {
        async fn create(&self, new_user: NewUser) -> Result<User, RepositoryError> {
            let mut store = self.users.lock().unwrap();

            if store.values().any(|u| u.email == new_user.email) {
                return Err(RepositoryError::Conflict(
                    format!("Email {} is already registered", new_user.email),
                ));
            }
            if store.values().any(|u| u.nickname == new_user.nickname) {
                return Err(RepositoryError::Conflict(
                    format!("Nickname {} is already taken", new_user.nickname),
                ));
            }

            let now = Utc::now().to_rfc3339();
            let user = User {
                id: Uuid::new_v4().to_string(),
                nickname: new_user.nickname,
                email: new_user.email,
                first_name: new_user.first_name,
                last_name: new_user.last_name,
                bio: new_user.bio,
                profile_picture_url: new_user.profile_picture_url,
                linkedin_profile_url: new_user.linkedin_profile_url,
                github_profile_url: new_user.github_profile_url,
                role: new_user.role,
                hashed_password: new_user.hashed_password,
                email_verified: new_user.email_verified,
                verification_token: new_user.verification_token,
                is_locked: false,
                failed_login_attempts: 0,
                created_at: now.clone(),
                updated_at: now,
                last_login_at: None,
            };

            store.insert(user.id.clone(), user.clone());
            Ok(user)
        }

        async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
            let store = self.users.lock().unwrap();
            Ok(store.get(&id.to_string()).cloned())
        }

        async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
            let store = self.users.lock().unwrap();
            Ok(store.values().find(|u| u.email == email).cloned())
        }

        async fn get_by_nickname(&self, nickname: &str) -> Result<Option<User>, RepositoryError> {
            let store = self.users.lock().unwrap();
            Ok(store.values().find(|u| u.nickname == nickname).cloned())
        }

        async fn list(
            &self,
            limit: Option<usize>,
            offset: Option<usize>,
            sort_desc: Option<bool>,
        ) -> Result<(Vec<User>, usize), RepositoryError> {
            let store = self.users.lock().unwrap();
            let sort_desc = sort_desc.unwrap_or(true);

            let mut users: Vec<User> = store.values().cloned().collect();
            users.sort_by(|a, b| {
                let cmp = a.created_at.cmp(&b.created_at);
                if sort_desc { cmp.reverse() } else { cmp }
            });

            let total = users.len();
            let paged = users
                .into_iter()
                .skip(offset.unwrap_or(0))
                .take(limit.unwrap_or(usize::MAX))
                .collect();

            Ok((paged, total))
        }

        async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User, RepositoryError> {
            if changes.is_empty() {
                return Err(RepositoryError::Validation(
                    "Update request contains no changes".to_string(),
                ));
            }

            let mut store = self.users.lock().unwrap();

            if let Some(ref email) = changes.email {
                if store.values().any(|u| u.email == *email && u.id != id.to_string()) {
                    return Err(RepositoryError::Conflict(
                        format!("Email {} is already registered", email),
                    ));
                }
            }
            if let Some(ref nickname) = changes.nickname {
                if store.values().any(|u| u.nickname == *nickname && u.id != id.to_string()) {
                    return Err(RepositoryError::Conflict(
                        format!("Nickname {} is already taken", nickname),
                    ));
                }
            }

            let user = store
                .get_mut(&id.to_string())
                .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;

            changes.apply(user, Utc::now().to_rfc3339());
            Ok(user.clone())
        }

        async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
            let mut store = self.users.lock().unwrap();
            store
                .remove(&id.to_string())
                .map(|_| ())
                .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
        }

        async fn count(&self) -> Result<usize, RepositoryError> {
            let store = self.users.lock().unwrap();
            Ok(store.len())
        }
    }

    /// Build a NewUser with the given identity fields
    pub fn sample_new_user(nickname: &str, email: &str) -> NewUser {
        NewUser {
            nickname: nickname.to_string(),
            email: email.to_string(),
            first_name: Some("John".to_string()),
            last_name: Some("Doe".to_string()),
            bio: None,
            profile_picture_url: None,
            linkedin_profile_url: None,
            github_profile_url: None,
            role: "AUTHENTICATED".to_string(),
            hashed_password: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$hash".to_string(),
            email_verified: false,
            verification_token: Some("token".to_string()),
        }
    }

}
