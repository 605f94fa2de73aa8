use user_hub_data::models::user::{NewUser, UserChanges};
use user_hub_data::repository::{RepositoryError, UserRepository, UserRepositoryTrait};
use uuid::Uuid;

// These tests never initialize the database pool, so the repository
// runs on its in-memory fallback and each repository is isolated.

fn new_user(nickname: &str, email: &str) -> NewUser {
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
        hashed_password: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$hash".to_string(),
        email_verified: true,
        verification_token: None,
    }
}

#[tokio::test]
async fn test_repository_create_and_lookup() {
    let repo = UserRepository::new();

    // Should start empty
    assert_eq!(repo.count().await.unwrap(), 0);

    let user = repo.create(new_user("john_doe_123", "john.doe@example.com")).await.unwrap();
    assert_eq!(user.nickname, "john_doe_123");
    assert_eq!(user.failed_login_attempts, 0);
    assert!(!user.is_locked);
    assert!(!user.created_at.is_empty());
    assert_eq!(user.created_at, user.updated_at);

    // All three lookups find the same record
    let id = Uuid::parse_str(&user.id).unwrap();
    assert!(repo.get_by_id(id).await.unwrap().is_some());
    assert!(repo.get_by_email("john.doe@example.com").await.unwrap().is_some());
    assert!(repo.get_by_nickname("john_doe_123").await.unwrap().is_some());

    // Unknown identifiers find nothing
    assert!(repo.get_by_id(Uuid::new_v4()).await.unwrap().is_none());
    assert!(repo.get_by_email("ghost@example.com").await.unwrap().is_none());

    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_repository_shares_storage_across_clones() {
    let repo = UserRepository::new();
    let repo2 = repo.clone();

    repo.create(new_user("john_doe_123", "john.doe@example.com")).await.unwrap();

    // The clone sees the record
    assert_eq!(repo2.count().await.unwrap(), 1);

    repo2.create(new_user("jane_doe", "jane.doe@example.com")).await.unwrap();

    // And the original sees changes from the clone
    assert_eq!(repo.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_repository_rejects_duplicates() {
    let repo = UserRepository::new();

    repo.create(new_user("john_doe_123", "john.doe@example.com")).await.unwrap();

    let result = repo.create(new_user("other_nickname", "john.doe@example.com")).await;
    assert!(matches!(result, Err(RepositoryError::Conflict(_))));

    let result = repo.create(new_user("john_doe_123", "other@example.com")).await;
    assert!(matches!(result, Err(RepositoryError::Conflict(_))));

    // Only the original row exists
    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_repository_update() {
    let repo = UserRepository::new();

    let user = repo.create(new_user("john_doe_123", "john.doe@example.com")).await.unwrap();
    let id = Uuid::parse_str(&user.id).unwrap();

    let changes = UserChanges {
        bio: Some(Some("Backend developer".to_string())),
        failed_login_attempts: Some(2),
        last_login_at: Some(Some("2024-02-01T10:00:00Z".to_string())),
        ..Default::default()
    };

    let updated = repo.update(id, changes).await.unwrap();
    assert_eq!(updated.bio.as_deref(), Some("Backend developer"));
    assert_eq!(updated.failed_login_attempts, 2);
    assert_eq!(updated.last_login_at.as_deref(), Some("2024-02-01T10:00:00Z"));
    assert!(updated.updated_at >= updated.created_at);

    // Empty change sets are refused
    let result = repo.update(id, UserChanges::default()).await;
    assert!(matches!(result, Err(RepositoryError::Validation(_))));

    // Updating a missing user reports not found
    let result = repo
        .update(
            Uuid::new_v4(),
            UserChanges {
                bio: Some(None),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(RepositoryError::NotFound(_))));
}

#[tokio::test]
async fn test_repository_update_uniqueness() {
    let repo = UserRepository::new();

    repo.create(new_user("john_doe_123", "john.doe@example.com")).await.unwrap();
    let jane = repo.create(new_user("jane_doe", "jane.doe@example.com")).await.unwrap();
    let jane_id = Uuid::parse_str(&jane.id).unwrap();

    // Taking another user's email is a conflict
    let result = repo
        .update(
            jane_id,
            UserChanges {
                email: Some("john.doe@example.com".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(RepositoryError::Conflict(_))));

    // Re-asserting your own email is fine
    let result = repo
        .update(
            jane_id,
            UserChanges {
                email: Some("jane.doe@example.com".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_repository_delete() {
    let repo = UserRepository::new();

    let user = repo.create(new_user("john_doe_123", "john.doe@example.com")).await.unwrap();
    let id = Uuid::parse_str(&user.id).unwrap();

    repo.delete(id).await.unwrap();
    assert!(repo.get_by_id(id).await.unwrap().is_none());

    // Deleting again reports not found
    assert!(matches!(repo.delete(id).await, Err(RepositoryError::NotFound(_))));
}

#[tokio::test]
async fn test_repository_list_pagination_and_sort() {
    let repo = UserRepository::new();

    for i in 0..5 {
        repo.create(new_user(&format!("user_{}", i), &format!("user{}@example.com", i)))
            .await
            .unwrap();
        // Creation timestamps must differ for a deterministic sort
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let (page, total) = repo.list(Some(2), Some(0), Some(false)).await.unwrap();
    assert_eq!(total, 5);
    assert_eq!(page.len(), 2);
    // Ascending by creation time starts with the first user
    assert_eq!(page[0].nickname, "user_0");

    let (page, _) = repo.list(Some(2), Some(0), Some(true)).await.unwrap();
    // Descending starts with the newest
    assert_eq!(page[0].nickname, "user_4");

    let (page, total) = repo.list(Some(10), Some(4), Some(false)).await.unwrap();
    assert_eq!(total, 5);
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].nickname, "user_4");
}

#[tokio::test]
async fn test_repository_concurrent_creates() {
    let repo = UserRepository::new();

    let mut handles = Vec::new();
    for i in 0..10 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            repo.create(new_user(
                &format!("concurrent_{}", i),
                &format!("concurrent{}@example.com", i),
            ))
            .await
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    // No creations were lost
    let (users, total) = repo.list(None, None, None).await.unwrap();
    assert_eq!(total, 10);

    let unique: std::collections::HashSet<String> =
        users.iter().map(|u| u.email.clone()).collect();
    assert_eq!(unique.len(), 10);
}
