//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::auth::{Operation, PrivilegeGate, Requester};
use crate::config::SeedUser;
use crate::db::{Store, is_duplicate_key, now};
use crate::domain::{Role, new_id};
use crate::models::user::{NewUser, User, UserFilter, UserPatch};
use crate::services::password::Hasher;
use crate::services::user_service::{
    AccountUpdate, EMAIL_TAKEN, NewAccount, UserError, UserService,
};

pub struct SeaOrmUserService {
    store: Store,
    hasher: Arc<dyn Hasher>,
    gate: PrivilegeGate,
}

impl SeaOrmUserService {
    #[must_use]
    pub fn new(store: Store, hasher: Arc<dyn Hasher>) -> Self {
        Self {
            store,
            hasher,
            gate: PrivilegeGate,
        }
    }

    async fn insert_account(&self, account: NewAccount, role: Role) -> Result<User, UserError> {
        let password_hash = self.hasher.hash(&account.password).await?;

        let result = self
            .store
            .insert_user(NewUser {
                name: account.name,
                email: account.email,
                password_hash,
                number: account.number,
                role,
                status: true,
            })
            .await;

        match result {
            Ok(user) => Ok(user),
            Err(e) if is_duplicate_key(&e) => Err(UserError::Conflict(EMAIL_TAKEN.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn ensure_email_free(&self, email: &str) -> Result<(), UserError> {
        if self.store.get_user_by_email(email).await?.is_some() {
            return Err(UserError::Conflict(EMAIL_TAKEN.to_string()));
        }
        Ok(())
    }

    async fn existing(&self, id: &str) -> Result<User, UserError> {
        self.store.get_user(id).await?.ok_or(UserError::NotFound)
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn list(&self, requester: &Requester, filter: UserFilter) -> Result<Vec<User>, UserError> {
        let grant = self.gate.decide(requester, Operation::List, "user");
        let filter = if grant.is_full() {
            filter
        } else {
            UserFilter {
                role: Some(Role::Customer),
                ..filter
            }
        };

        Ok(self.store.list_users(filter).await?)
    }

    async fn get(&self, id: &str) -> Result<User, UserError> {
        self.existing(id).await
    }

    async fn register(&self, account: NewAccount) -> Result<User, UserError> {
        self.ensure_email_free(&account.email).await?;
        let user = self.insert_account(account, Role::Customer).await?;
        info!(user_id = %user.id, "Registered user");
        Ok(user)
    }

    async fn create(&self, requester: &Requester, account: NewAccount) -> Result<User, UserError> {
        if self
            .gate
            .decide(requester, Operation::Create, "user")
            .is_full()
        {
            return self.register(account).await;
        }

        self.ensure_email_free(&account.email).await?;

        let timestamp = now();
        Ok(User {
            id: new_id(),
            name: account.name,
            email: account.email,
            number: account.number,
            status: true,
            role: Role::Customer,
            last_login_at: None,
            created_at: timestamp.clone(),
            updated_at: timestamp,
        })
    }

    async fn update(
        &self,
        requester: &Requester,
        id: &str,
        update: AccountUpdate,
    ) -> Result<User, UserError> {
        let mut user = self.existing(id).await?;

        if !self
            .gate
            .decide(requester, Operation::Update, "user")
            .is_full()
        {
            if let Some(name) = update.name {
                user.name = name;
            }
            if let Some(number) = update.number {
                user.number = Some(number);
            }
            if let Some(status) = update.status {
                user.status = status;
            }
            user.updated_at = now();
            return Ok(user);
        }

        let password_hash = match update.password {
            Some(password) => Some(self.hasher.hash(&password).await?),
            None => None,
        };

        self.store
            .update_user(
                id,
                UserPatch {
                    name: update.name,
                    password_hash,
                    number: update.number,
                    status: update.status,
                },
            )
            .await?
            .ok_or(UserError::NotFound)
    }

    async fn delete(&self, requester: &Requester, id: &str) -> Result<User, UserError> {
        let user = self.existing(id).await?;

        if self
            .gate
            .decide(requester, Operation::Delete, "user")
            .is_full()
        {
            if !self.store.delete_user(id).await? {
                return Err(UserError::NotFound);
            }
            info!(user_id = %id, "Deleted user");
        }

        Ok(user)
    }

    async fn ensure_seeded(&self, seed: &SeedUser, role: Role) -> Result<User, UserError> {
        if let Some(user) = self.store.get_user_by_email(&seed.email).await? {
            return Ok(user);
        }

        match self.insert_account(NewAccount::from(seed), role).await {
            Ok(user) => {
                info!(email = %user.email, role = %role, "Seeded user");
                Ok(user)
            }
            // Another instance seeded it concurrently.
            Err(UserError::Conflict(_)) => self
                .store
                .get_user_by_email(&seed.email)
                .await?
                .ok_or(UserError::NotFound),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::RequesterClaims;
    use crate::services::password::Argon2Hasher;

    async fn service() -> SeaOrmUserService {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let hasher = Arc::new(Argon2Hasher::new(crate::config::SecurityConfig {
            argon2_memory_cost_kib: 64,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
        }));
        SeaOrmUserService::new(store, hasher)
    }

    fn account(email: &str) -> NewAccount {
        NewAccount {
            name: "Ada".to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
            number: None,
        }
    }

    fn admin() -> Requester {
        Requester::authenticated(RequesterClaims {
            id: "admin".to_string(),
            name: "Root".to_string(),
            email: "root@example.com".to_string(),
            role: Role::SuperAdmin,
        })
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let service = service().await;
        service.register(account("ada@example.com")).await.unwrap();

        let err = service.register(account("ada@example.com")).await.unwrap_err();
        assert!(matches!(err, UserError::Conflict(_)));

        let users = service
            .list(&admin(), UserFilter::default())
            .await
            .unwrap();
        assert_eq!(users.len(), 1);
    }

    #[tokio::test]
    async fn test_simulated_create_is_not_persisted() {
        let service = service().await;
        let user = service
            .create(&Requester::anonymous(), account("ghost@example.com"))
            .await
            .unwrap();

        assert_eq!(user.email, "ghost@example.com");
        assert!(service.store.get_user(&user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_listing_scope_for_customers() {
        let service = service().await;
        let seed = SeedUser {
            name: "Root".to_string(),
            email: "root@example.com".to_string(),
            password: "password123".to_string(),
            number: None,
        };
        service.ensure_seeded(&seed, Role::SuperAdmin).await.unwrap();
        service.register(account("ada@example.com")).await.unwrap();

        let visible = service
            .list(&Requester::anonymous(), UserFilter::default())
            .await
            .unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].role, Role::Customer);

        let all = service.list(&admin(), UserFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_ensure_seeded_is_idempotent() {
        let service = service().await;
        let seed = SeedUser {
            name: "Anonymous User".to_string(),
            email: "anonymous@gmail.com".to_string(),
            password: "simple_password".to_string(),
            number: None,
        };

        let first = service.ensure_seeded(&seed, Role::Customer).await.unwrap();
        let second = service.ensure_seeded(&seed, Role::Customer).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_simulated_delete_keeps_user() {
        let service = service().await;
        let user = service.register(account("ada@example.com")).await.unwrap();

        service
            .delete(&Requester::anonymous(), &user.id)
            .await
            .unwrap();
        assert!(service.store.get_user(&user.id).await.unwrap().is_some());

        service.delete(&admin(), &user.id).await.unwrap();
        assert!(service.store.get_user(&user.id).await.unwrap().is_none());

        let err = service.delete(&admin(), &user.id).await.unwrap_err();
        assert!(matches!(err, UserError::NotFound));
    }

    #[tokio::test]
    async fn test_simulated_update_keeps_stored_user() {
        let service = service().await;
        let user = service.register(account("ada@example.com")).await.unwrap();

        let preview = service
            .update(
                &Requester::anonymous(),
                &user.id,
                AccountUpdate {
                    name: Some("Mallory".to_string()),
                    password: Some("taken-over".to_string()),
                    status: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(preview.name, "Mallory");
        assert!(!preview.status);

        let stored = service.store.get_user(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Ada");
        assert!(stored.status);
        let (_, digest) = service
            .store
            .get_user_credentials("ada@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(service.hasher.verify("password123", &digest).await.unwrap());
    }
}
