use rusqlite::Connection;
use tracing::info;

/// Run SQLite migrations
pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    info!("Running SQLite migrations");

    create_users_table(conn)?;
    create_users_indexes(conn)?;

    info!("SQLite migrations completed successfully");
    Ok(())
}

/// Create the users table
fn create_users_table(conn: &Connection) -> Result<(), String> {
    info!("Creating users table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            nickname TEXT NOT NULL,
            email TEXT NOT NULL,
            first_name TEXT,
            last_name TEXT,
            bio TEXT,
            profile_picture_url TEXT,
            linkedin_profile_url TEXT,
            github_profile_url TEXT,
            role TEXT NOT NULL,
            hashed_password TEXT NOT NULL,
            email_verified INTEGER NOT NULL DEFAULT 0,
            verification_token TEXT,
            is_locked INTEGER NOT NULL DEFAULT 0,
            failed_login_attempts INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            last_login_at TEXT
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Create unique indexes on email and nickname, plus a listing index
fn create_users_indexes(conn: &Connection) -> Result<(), String> {
    info!("Creating users indexes");

    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users (email)",
        [],
    ).map_err(|e| format!("Failed to create email index: {}", e))?;

    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_nickname ON users (nickname)",
        [],
    ).map_err(|e| format!("Failed to create nickname index: {}", e))?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_users_created_at ON users (created_at DESC)",
        [],
    ).map_err(|e| format!("Failed to create created_at index: {}", e))?;

    Ok(())
}
