//! Service-level tests over the real in-memory stores.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

use user_registry::config::Config;
use user_registry::domain::{Password, RegisterUser, UpdateUser, User, UserRole, UserStatus};
use user_registry::errors::{AppError, AppResult};
use user_registry::infra::{
    EmailQueue, InMemoryResetTokenStore, InMemoryUserStore, UserChange, UserRepository,
};
use user_registry::jobs::EmailJob;
use user_registry::services::{
    AuthService, Authenticator, PasswordManager, PasswordService, ServiceContainer, Services,
    TemplatedEmailer,
};
use user_registry::types::PaginationParams;

fn services() -> (Arc<Services>, mpsc::Receiver<EmailJob>) {
    let config = Config::with_secret("test-secret-key-for-testing-only-32chars").unwrap();
    let (queue, mail) = EmailQueue::bounded(128);
    (Arc::new(Services::in_memory(&config, queue)), mail)
}

fn registration(username: &str, email: &str) -> RegisterUser {
    RegisterUser {
        username: username.to_string(),
        email: email.to_string(),
        password: "SecurePass123!".to_string(),
    }
}

#[tokio::test]
async fn test_concurrent_registration_same_email_has_one_winner() {
    let (services, _mail) = services();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let services = services.clone();
            tokio::spawn(async move {
                services
                    .registration()
                    .register(registration(&format!("user{}", i), "race@example.com"))
                    .await
            })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(AppError::Conflict(_)) => {}
            Err(e) => panic!("unexpected error: {:?}", e),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(services.users().count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn test_registration_survives_stopped_email_worker() {
    let (services, mail) = services();
    drop(mail);

    let user = assert_ok!(
        services
            .registration()
            .register(registration("jdoe", "jdoe@example.com"))
            .await
    );
    assert_eq!(user.status, UserStatus::Active);
}

#[tokio::test]
async fn test_update_and_lookup_follow_email_change() {
    let (services, _mail) = services();
    let user = services
        .registration()
        .register(registration("jdoe", "jdoe@example.com"))
        .await
        .unwrap();

    let changes = UpdateUser {
        email: Some("new@example.com".to_string()),
        ..Default::default()
    };
    assert_ok!(services.users().update_user(user.id, changes).await);

    assert_err!(services.users().get_user_by_email("jdoe@example.com").await);
    let found = assert_ok!(services.users().get_user_by_email("NEW@example.com").await);
    assert_eq!(found.id, user.id);

    // The old address can be registered again.
    assert_ok!(
        services
            .registration()
            .register(registration("other", "jdoe@example.com"))
            .await
    );
}

#[tokio::test]
async fn test_list_users_pages_in_creation_order() {
    let (services, _mail) = services();
    for i in 0..5 {
        services
            .registration()
            .register(registration(&format!("user{}", i), &format!("user{}@example.com", i)))
            .await
            .unwrap();
    }

    let first = services
        .users()
        .list_users(&PaginationParams::new(1, 2))
        .await
        .unwrap();
    let last = services
        .users()
        .list_users(&PaginationParams::new(3, 2))
        .await
        .unwrap();

    assert_eq!(first.meta.total, 5);
    assert_eq!(first.meta.total_pages, 3);
    assert_eq!(first.data[0].username, "user0");
    assert_eq!(last.data.len(), 1);
    assert_eq!(last.data[0].username, "user4");
}

#[tokio::test]
async fn test_reset_token_unusable_after_user_deleted() {
    let (services, mut mail) = services();
    let user = services
        .registration()
        .register(registration("jdoe", "jdoe@example.com"))
        .await
        .unwrap();
    mail.recv().await.unwrap();

    services.passwords().request_reset("jdoe@example.com").await.unwrap();
    let reset = mail.recv().await.unwrap();
    let token = reset
        .body
        .lines()
        .find_map(|line| line.trim().strip_prefix("Reset token: "))
        .unwrap()
        .to_string();

    services.users().delete_user(user.id).await.unwrap();

    let result = services.passwords().reset_password(&token, "NewPass123!").await;
    assert!(matches!(result, Err(AppError::InvalidResetToken)));
}

#[tokio::test]
async fn test_reset_for_suspended_account_sends_nothing() {
    let (services, mut mail) = services();
    let user = services
        .registration()
        .register(registration("jdoe", "jdoe@example.com"))
        .await
        .unwrap();
    mail.recv().await.unwrap();

    services
        .users()
        .set_status(user.id, UserStatus::Suspended)
        .await
        .unwrap();
    mail.recv().await.unwrap();

    assert_ok!(services.passwords().request_reset("jdoe@example.com").await);
    assert!(mail.try_recv().is_err());
    assert_eq!(services.passwords().purge_expired_tokens().await.unwrap(), 0);
}

#[tokio::test]
async fn test_seed_admin_is_idempotent() {
    let (services, _mail) = services();

    let first = services
        .registration()
        .seed_admin("admin@example.com", "AdminPass123!")
        .await
        .unwrap();
    let second = services
        .registration()
        .seed_admin("admin@example.com", "AdminPass123!")
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.role, UserRole::Admin);
    assert_eq!(services.users().count_users().await.unwrap(), 1);
}

/// Store wrapper that edits the record behind the caller's back right after
/// every lookup, the way a concurrent request would.
struct EditAfterLookup {
    inner: Arc<InMemoryUserStore>,
    edit: fn(&mut User),
}

impl EditAfterLookup {
    async fn interfere(&self, found: &Option<User>) -> AppResult<()> {
        if let Some(user) = found {
            let edit = self.edit;
            self.inner
                .modify(
                    user.id,
                    Box::new(move |user: &mut User| {
                        edit(user);
                        Ok(())
                    }),
                )
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for EditAfterLookup {
    async fn insert(&self, user: User) -> AppResult<User> {
        self.inner.insert(user).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let found = self.inner.find_by_id(id).await?;
        self.interfere(&found).await?;
        Ok(found)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let found = self.inner.find_by_email(email).await?;
        self.interfere(&found).await?;
        Ok(found)
    }

    async fn modify(&self, id: Uuid, change: UserChange) -> AppResult<(User, User)> {
        self.inner.modify(id, change).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.inner.delete(id).await
    }

    async fn list(&self, offset: u64, limit: u64) -> AppResult<(Vec<User>, u64)> {
        self.inner.list(offset, limit).await
    }

    async fn count(&self) -> AppResult<u64> {
        self.inner.count().await
    }
}

async fn stored_user(store: &InMemoryUserStore, password: &str) -> User {
    let hash = Password::new(password).unwrap().into_string();
    store
        .insert(User::new("jdoe".into(), "jdoe@example.com", hash))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_login_does_not_undo_concurrent_suspension() {
    let store = Arc::new(InMemoryUserStore::new());
    let user = stored_user(&store, "SecurePass123!").await;
    let racing = EditAfterLookup {
        inner: store.clone(),
        edit: |user| user.set_status(UserStatus::Suspended),
    };
    let config = Config::with_secret("test-secret-key-for-testing-only-32chars").unwrap();
    let auth = Authenticator::new(Arc::new(racing), config);

    let result = auth.login("jdoe@example.com", "SecurePass123!").await;

    assert!(matches!(result, Err(AppError::AccountDisabled(_))));
    let stored = store.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.status, UserStatus::Suspended);
    assert!(stored.last_login_at.is_none());
}

#[tokio::test]
async fn test_password_change_keeps_concurrent_email_change() {
    let store = Arc::new(InMemoryUserStore::new());
    let user = stored_user(&store, "OldPass123!").await;
    let racing = EditAfterLookup {
        inner: store.clone(),
        edit: |user| user.set_email("moved@example.com"),
    };
    let config = Config::with_secret("test-secret-key-for-testing-only-32chars").unwrap();
    let (queue, _mail) = EmailQueue::bounded(8);
    let passwords = PasswordManager::new(
        Arc::new(racing),
        Arc::new(InMemoryResetTokenStore::new()),
        Arc::new(TemplatedEmailer::new(queue, &config)),
        chrono::Duration::minutes(30),
    );

    assert_ok!(
        passwords
            .change_password(user.id, "OldPass123!", "NewPass123!")
            .await
    );

    let stored = store.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.email, "moved@example.com");
    assert!(Password::from_hash(stored.password_hash.clone()).verify("NewPass123!"));
    assert!(store.find_by_email("jdoe@example.com").await.unwrap().is_none());
}
