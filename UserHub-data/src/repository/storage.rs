use tracing::debug;
use uuid::Uuid;

use crate::models::user::User;
use crate::database::DatabasePool;
use super::errors::RepositoryError;

const USER_COLUMNS: &str =
    "id, nickname, email, first_name, last_name, bio, profile_picture_url, \
     linkedin_profile_url, github_profile_url, role, hashed_password, \
     email_verified, verification_token, is_locked, failed_login_attempts, \
     created_at, updated_at, last_login_at";

/// Map a SQLite row (selected with USER_COLUMNS) to a User
#[cfg(feature = "sqlite")]
fn user_from_sqlite_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        nickname: row.get(1)?,
        email: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        bio: row.get(5)?,
        profile_picture_url: row.get(6)?,
        linkedin_profile_url: row.get(7)?,
        github_profile_url: row.get(8)?,
        role: row.get(9)?,
        hashed_password: row.get(10)?,
        email_verified: row.get(11)?,
        verification_token: row.get(12)?,
        is_locked: row.get(13)?,
        failed_login_attempts: row.get::<_, i64>(14)? as u32,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
        last_login_at: row.get(17)?,
    })
}

/// Map a PostgreSQL row (selected with USER_COLUMNS) to a User
#[cfg(feature = "postgres")]
fn user_from_postgres_row(row: &tokio_postgres::Row) -> User {
    User {
        id: row.get(0),
        nickname: row.get(1),
        email: row.get(2),
        first_name: row.get(3),
        last_name: row.get(4),
        bio: row.get(5),
        profile_picture_url: row.get(6),
        linkedin_profile_url: row.get(7),
        github_profile_url: row.get(8),
        role: row.get(9),
        hashed_password: row.get(10),
        email_verified: row.get(11),
        verification_token: row.get(12),
        is_locked: row.get(13),
        failed_login_attempts: row.get::<_, i32>(14) as u32,
        created_at: row.get(15),
        updated_at: row.get(16),
        last_login_at: row.get(17),
    }
}

/// Database storage operations for user accounts
pub struct DatabaseStorage;

impl DatabaseStorage {
    /// Store a user in the database
    pub async fn store_user(pool: &DatabasePool, user: &User) -> Result<(), RepositoryError> {
        debug!("Storing user in database: id={}", user.id);

        match pool {
            #[cfg(feature = "sqlite")]
            DatabasePool::SQLite(pool) => {
                let conn = pool.get().map_err(RepositoryError::Pool)?;

                conn.execute(
                    "INSERT INTO users
                     (id, nickname, email, first_name, last_name, bio, profile_picture_url,
                      linkedin_profile_url, github_profile_url, role, hashed_password,
                      email_verified, verification_token, is_locked, failed_login_attempts,
                      created_at, updated_at, last_login_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
                    rusqlite::params![
                        &user.id,
                        &user.nickname,
                        &user.email,
                        &user.first_name,
                        &user.last_name,
                        &user.bio,
                        &user.profile_picture_url,
                        &user.linkedin_profile_url,
                        &user.github_profile_url,
                        &user.role,
                        &user.hashed_password,
                        user.email_verified,
                        &user.verification_token,
                        user.is_locked,
                        user.failed_login_attempts,
                        &user.created_at,
                        &user.updated_at,
                        &user.last_login_at,
                    ],
                ).map_err(RepositoryError::Sqlite)?;

                Ok(())
            },

            #[cfg(feature = "postgres")]
            DatabasePool::PostgreSQL(pool) => {
                let client = pool.get().await
                    .map_err(|e| RepositoryError::Database(e.to_string().into()))?;

                client.execute(
                    "INSERT INTO users
                     (id, nickname, email, first_name, last_name, bio, profile_picture_url,
                      linkedin_profile_url, github_profile_url, role, hashed_password,
                      email_verified, verification_token, is_locked, failed_login_attempts,
                      created_at, updated_at, last_login_at)
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)",
                    &[
                        &user.id,
                        &user.nickname,
                        &user.email,
                        &user.first_name,
                        &user.last_name,
                        &user.bio,
                        &user.profile_picture_url,
                        &user.linkedin_profile_url,
                        &user.github_profile_url,
                        &user.role,
                        &user.hashed_password,
                        &user.email_verified,
                        &user.verification_token,
                        &user.is_locked,
                        &(user.failed_login_attempts as i32),
                        &user.created_at,
                        &user.updated_at,
                        &user.last_login_at,
                    ],
                ).await.map_err(|e| RepositoryError::Database(e.to_string().into()))?;

                Ok(())
            },

            #[allow(unreachable_patterns)]
            _ => Err(RepositoryError::Database("Unsupported database type or not implemented".to_string().into())),
        }
    }

    /// Get a user by ID from the database
    pub async fn get_by_id(pool: &DatabasePool, id: &Uuid) -> Result<Option<User>, RepositoryError> {
        debug!("Getting user by ID from database: id={}", id);
        Self::get_by_column(pool, "id", &id.to_string()).await
    }

    /// Get a user by email from the database
    pub async fn get_by_email(pool: &DatabasePool, email: &str) -> Result<Option<User>, RepositoryError> {
        debug!("Getting user by email from database");
        Self::get_by_column(pool, "email", email).await
    }

    /// Get a user by nickname from the database
    pub async fn get_by_nickname(pool: &DatabasePool, nickname: &str) -> Result<Option<User>, RepositoryError> {
        debug!("Getting user by nickname from database: nickname={}", nickname);
        Self::get_by_column(pool, "nickname", nickname).await
    }

    /// Get a single user matching an exact value of one column.
    /// `column` is always one of the fixed identifiers above, never user input.
    async fn get_by_column(pool: &DatabasePool, column: &str, value: &str) -> Result<Option<User>, RepositoryError> {
        match pool {
            #[cfg(feature = "sqlite")]
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;

                let query = format!("SELECT {} FROM users WHERE {} = ?", USER_COLUMNS, column);
                let mut stmt = conn.prepare(&query)?;

                let user = stmt.query_row([value], user_from_sqlite_row);

                match user {
                    Ok(user) => Ok(Some(user)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(RepositoryError::Sqlite(e)),
                }
            },

            #[cfg(feature = "postgres")]
            DatabasePool::PostgreSQL(pool) => {
                let client = pool.get().await
                    .map_err(|e| RepositoryError::Database(e.to_string().into()))?;

                let query = format!("SELECT {} FROM users WHERE {} = $1", USER_COLUMNS, column);
                let rows = client.query(&query, &[&value])
                    .await.map_err(|e| RepositoryError::Database(e.to_string().into()))?;

                if rows.is_empty() {
                    return Ok(None);
                }

                Ok(Some(user_from_postgres_row(&rows[0])))
            },

            #[allow(unreachable_patterns)]
            _ => Err(RepositoryError::Database("Unsupported database type or not implemented".to_string().into())),
        }
    }

    /// Get a page of users from the database, newest first by default
    pub async fn list(
        pool: &DatabasePool,
        limit: Option<usize>,
        offset: Option<usize>,
        sort_desc: Option<bool>,
    ) -> Result<(Vec<User>, usize), RepositoryError> {
        debug!("Listing users from database");

        let sort_direction = if sort_desc.unwrap_or(true) { "DESC" } else { "ASC" };
        let limit_val = limit.unwrap_or(100);
        let offset_val = offset.unwrap_or(0);

        match pool {
            #[cfg(feature = "sqlite")]
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;

                let query = format!(
                    "SELECT {} FROM users ORDER BY created_at {} LIMIT {} OFFSET {}",
                    USER_COLUMNS, sort_direction, limit_val, offset_val
                );

                let mut stmt = conn.prepare(&query)?;
                let users = stmt.query_map([], user_from_sqlite_row)?;

                let mut result = Vec::new();
                for user in users {
                    result.push(user?);
                }

                // Get total count for pagination
                let mut count_stmt = conn.prepare("SELECT COUNT(*) FROM users")?;
                let total: i64 = count_stmt.query_row([], |row| row.get(0))?;

                Ok((result, total as usize))
            },

            #[cfg(feature = "postgres")]
            DatabasePool::PostgreSQL(pool) => {
                let client = pool.get().await
                    .map_err(|e| RepositoryError::Database(e.to_string().into()))?;

                let query = format!(
                    "SELECT {} FROM users ORDER BY created_at {} LIMIT {} OFFSET {}",
                    USER_COLUMNS, sort_direction, limit_val, offset_val
                );

                let rows = client.query(&query, &[])
                    .await.map_err(|e| RepositoryError::Database(e.to_string().into()))?;

                let result: Vec<User> = rows.iter().map(user_from_postgres_row).collect();

                let count_row = client.query_one("SELECT COUNT(*) FROM users", &[])
                    .await.map_err(|e| RepositoryError::Database(e.to_string().into()))?;
                let total: i64 = count_row.get(0);

                Ok((result, total as usize))
            },

            #[allow(unreachable_patterns)]
            _ => Err(RepositoryError::Database("Unsupported database type or not implemented".to_string().into())),
        }
    }

    /// Write back a full user record
    pub async fn update_user(pool: &DatabasePool, user: &User) -> Result<(), RepositoryError> {
        debug!("Updating user in database: id={}", user.id);

        match pool {
            #[cfg(feature = "sqlite")]
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;

                let affected = conn.execute(
                    "UPDATE users SET
                        nickname = ?2, email = ?3, first_name = ?4, last_name = ?5,
                        bio = ?6, profile_picture_url = ?7, linkedin_profile_url = ?8,
                        github_profile_url = ?9, role = ?10, hashed_password = ?11,
                        email_verified = ?12, verification_token = ?13, is_locked = ?14,
                        failed_login_attempts = ?15, created_at = ?16, updated_at = ?17,
                        last_login_at = ?18
                     WHERE id = ?1",
                    rusqlite::params![
                        &user.id,
                        &user.nickname,
                        &user.email,
                        &user.first_name,
                        &user.last_name,
                        &user.bio,
                        &user.profile_picture_url,
                        &user.linkedin_profile_url,
                        &user.github_profile_url,
                        &user.role,
                        &user.hashed_password,
                        user.email_verified,
                        &user.verification_token,
                        user.is_locked,
                        user.failed_login_attempts,
                        &user.created_at,
                        &user.updated_at,
                        &user.last_login_at,
                    ],
                )?;

                if affected == 0 {
                    return Err(RepositoryError::NotFound(user.id.clone()));
                }

                Ok(())
            },

            #[cfg(feature = "postgres")]
            DatabasePool::PostgreSQL(pool) => {
                let client = pool.get().await
                    .map_err(|e| RepositoryError::Database(e.to_string().into()))?;

                let affected = client.execute(
                    "UPDATE users SET
                        nickname = $2, email = $3, first_name = $4, last_name = $5,
                        bio = $6, profile_picture_url = $7, linkedin_profile_url = $8,
                        github_profile_url = $9, role = $10, hashed_password = $11,
                        email_verified = $12, verification_token = $13, is_locked = $14,
                        failed_login_attempts = $15, created_at = $16, updated_at = $17,
                        last_login_at = $18
                     WHERE id = $1",
                    &[
                        &user.id,
                        &user.nickname,
                        &user.email,
                        &user.first_name,
                        &user.last_name,
                        &user.bio,
                        &user.profile_picture_url,
                        &user.linkedin_profile_url,
                        &user.github_profile_url,
                        &user.role,
                        &user.hashed_password,
                        &user.email_verified,
                        &user.verification_token,
                        &user.is_locked,
                        &(user.failed_login_attempts as i32),
                        &user.created_at,
                        &user.updated_at,
                        &user.last_login_at,
                    ],
                ).await.map_err(|e| RepositoryError::Database(e.to_string().into()))?;

                if affected == 0 {
                    return Err(RepositoryError::NotFound(user.id.clone()));
                }

                Ok(())
            },

            #[allow(unreachable_patterns)]
            _ => Err(RepositoryError::Database("Unsupported database type or not implemented".to_string().into())),
        }
    }

    /// Delete a user by ID; returns whether a row was removed
    pub async fn delete(pool: &DatabasePool, id: &Uuid) -> Result<bool, RepositoryError> {
        debug!("Deleting user from database: id={}", id);

        match pool {
            #[cfg(feature = "sqlite")]
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;

                let affected = conn.execute(
                    "DELETE FROM users WHERE id = ?",
                    [&id.to_string()],
                )?;

                Ok(affected > 0)
            },

            #[cfg(feature = "postgres")]
            DatabasePool::PostgreSQL(pool) => {
                let client = pool.get().await
                    .map_err(|e| RepositoryError::Database(e.to_string().into()))?;

                let affected = client.execute(
                    "DELETE FROM users WHERE id = $1",
                    &[&id.to_string()],
                ).await.map_err(|e| RepositoryError::Database(e.to_string().into()))?;

                Ok(affected > 0)
            },

            #[allow(unreachable_patterns)]
            _ => Err(RepositoryError::Database("Unsupported database type or not implemented".to_string().into())),
        }
    }

    /// Count all users in the database
    pub async fn count(pool: &DatabasePool) -> Result<usize, RepositoryError> {
        match pool {
            #[cfg(feature = "sqlite")]
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;

                let mut stmt = conn.prepare("SELECT COUNT(*) FROM users")?;
                let total: i64 = stmt.query_row([], |row| row.get(0))?;

                Ok(total as usize)
            },

            #[cfg(feature = "postgres")]
            DatabasePool::PostgreSQL(pool) => {
                let client = pool.get().await
                    .map_err(|e| RepositoryError::Database(e.to_string().into()))?;

                let row = client.query_one("SELECT COUNT(*) FROM users", &[])
                    .await.map_err(|e| RepositoryError::Database(e.to_string().into()))?;
                let total: i64 = row.get(0);

                Ok(total as usize)
            },

            #[allow(unreachable_patterns)]
            _ => Err(RepositoryError::Database("Unsupported database type or not implemented".to_string().into())),
        }
    }
}
