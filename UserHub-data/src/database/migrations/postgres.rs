use tokio_postgres::Client;
use tracing::info;

/// Run PostgreSQL database migrations
pub async fn run_migrations(client: &Client) -> Result<(), String> {
    info!("Running PostgreSQL migrations");

    create_users_table(client).await?;
    create_users_indexes(client).await?;

    info!("PostgreSQL migrations completed successfully");
    Ok(())
}

/// Create the users table
async fn create_users_table(client: &Client) -> Result<(), String> {
    info!("Creating users table if not exists");

    client.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id VARCHAR(36) PRIMARY KEY,
            nickname VARCHAR(50) NOT NULL,
            email VARCHAR(255) NOT NULL,
            first_name VARCHAR(100),
            last_name VARCHAR(100),
            bio TEXT,
            profile_picture_url TEXT,
            linkedin_profile_url TEXT,
            github_profile_url TEXT,
            role VARCHAR(20) NOT NULL,
            hashed_password TEXT NOT NULL,
            email_verified BOOLEAN NOT NULL DEFAULT FALSE,
            verification_token VARCHAR(64),
            is_locked BOOLEAN NOT NULL DEFAULT FALSE,
            failed_login_attempts INTEGER NOT NULL DEFAULT 0,
            created_at VARCHAR(30) NOT NULL,
            updated_at VARCHAR(30) NOT NULL,
            last_login_at VARCHAR(30)
        )",
        &[],
    ).await.map_err(|e| e.to_string())?;

    Ok(())
}

/// Create unique indexes on email and nickname, plus a listing index
async fn create_users_indexes(client: &Client) -> Result<(), String> {
    info!("Creating users indexes");

    client.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users (email)",
        &[],
    ).await.map_err(|e| format!("Failed to create email index: {}", e))?;

    client.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_nickname ON users (nickname)",
        &[],
    ).await.map_err(|e| format!("Failed to create nickname index: {}", e))?;

    client.execute(
        "CREATE INDEX IF NOT EXISTS idx_users_created_at ON users (created_at DESC)",
        &[],
    ).await.map_err(|e| format!("Failed to create created_at index: {}", e))?;

    Ok(())
}
