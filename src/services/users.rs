use std::sync::Arc;

use crate::auth::{PasswordService, create_sha256};
use crate::models::{CreateUser, NewUser, User};
use crate::repository::UserRepository;
use crate::services::{ServiceError, ServiceResult};
use crate::validation::Validate;

#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    pub async fn find_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        Ok(self.repository.find_by_email(email.trim()).await?)
    }

    pub async fn find_by_id(&self, id: i32) -> ServiceResult<Option<User>> {
        Ok(self.repository.find_by_id(id).await?)
    }

    /// Validate, hash the password with `salt`, and store a new user.
    pub async fn create(&self, dto: CreateUser, salt: &str) -> ServiceResult<User> {
        dto.validate()?;

        let user = self
            .repository
            .insert(NewUser {
                name: dto.name.trim().to_string(),
                email: dto.email.trim().to_lowercase(),
                avatar: dto.avatar,
                user_type: dto.user_type,
                password_hash: create_sha256(&dto.password, salt),
            })
            .await?;

        log::info!("new user created: {}", user.email);
        Ok(user)
    }

    /// Register a user, refusing emails that are already taken.
    pub async fn register(&self, dto: CreateUser, salt: &str) -> ServiceResult<User> {
        if self.find_by_email(&dto.email).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "user with email '{}' already exists",
                dto.email.trim()
            )));
        }
        self.create(dto, salt).await
    }

    /// Return the user keyed by `dto.email`, creating it when absent.
    pub async fn find_or_create(&self, dto: CreateUser, salt: &str) -> ServiceResult<User> {
        if let Some(existing) = self.find_by_email(&dto.email).await? {
            return Ok(existing);
        }
        self.create(dto, salt).await
    }

    /// Check a login attempt against the stored hash.
    pub async fn verify(
        &self,
        email: &str,
        password: &str,
        passwords: &PasswordService,
    ) -> ServiceResult<Option<User>> {
        let Some(user) = self.find_by_email(email).await? else {
            return Ok(None);
        };
        let matches = passwords.verify_password(password, &user.password_hash);
        Ok(matches.then_some(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserType;
    use crate::test_support::MemoryStore;

    fn dto(email: &str) -> CreateUser {
        CreateUser {
            name: "Keks".into(),
            email: email.into(),
            avatar: Some("avatar.jpg".into()),
            user_type: UserType::Pro,
            password: "123456".into(),
        }
    }

    #[tokio::test]
    async fn find_or_create_is_idempotent() {
        let store = MemoryStore::new();
        let service = UserService::new(store.users());

        let first = service.find_or_create(dto("keks@example.com"), "s1").await.expect("first");
        let second = service.find_or_create(dto("keks@example.com"), "s1").await.expect("second");

        assert_eq!(first.id, second.id);
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn find_or_create_hashes_deterministically() {
        let first_store = MemoryStore::new();
        let second_store = MemoryStore::new();

        let a = UserService::new(first_store.users())
            .find_or_create(dto("a@example.com"), "s1")
            .await
            .expect("create a");
        let b = UserService::new(second_store.users())
            .find_or_create(dto("a@example.com"), "s1")
            .await
            .expect("create b");

        assert_eq!(a.password_hash, b.password_hash);
        assert_eq!(a.password_hash, create_sha256("123456", "s1"));
    }

    #[tokio::test]
    async fn create_rejects_invalid_payload_without_writing() {
        let store = MemoryStore::new();
        let service = UserService::new(store.users());

        let err = service.create(dto("broken"), "s1").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref errors) if errors.has("email")));
        assert_eq!(store.user_count(), 0);
    }

    #[tokio::test]
    async fn register_refuses_duplicate_email() {
        let store = MemoryStore::new();
        let service = UserService::new(store.users());

        service.register(dto("keks@example.com"), "s1").await.expect("register");
        let err = service
            .register(dto("KEKS@example.com"), "s1")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn verify_checks_password_hash() {
        let store = MemoryStore::new();
        let service = UserService::new(store.users());
        let passwords = PasswordService::new("s1");
        service.create(dto("keks@example.com"), passwords.salt()).await.expect("create");

        let ok = service.verify("keks@example.com", "123456", &passwords).await.expect("verify");
        assert!(ok.is_some());
        let wrong = service.verify("keks@example.com", "654321", &passwords).await.expect("verify");
        assert!(wrong.is_none());
        let missing = service
            .verify("nobody@example.com", "123456", &passwords)
            .await
            .expect("verify");
        assert!(missing.is_none());
    }
}
