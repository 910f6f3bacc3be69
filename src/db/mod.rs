use crate::domain::{PageRequest, TokenKind};
use crate::models::cart::{Cart, CartLine};
use crate::models::catalog::{
    Category, CategoryPatch, NewCategory, NewProduct, Product, ProductPatch,
};
use crate::models::token::TokenRecord;
use crate::models::user::{NewUser, User, UserFilter, UserPatch};
use anyhow::Result;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr, Statement,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

/// Attempts for compare-and-swap updates of JSON array columns.
pub(crate) const MAX_CAS_ATTEMPTS: usize = 8;

/// A unique index rejected a write.
#[derive(Debug, thiserror::Error)]
#[error("Duplicate key: {0}")]
pub struct DuplicateKey(pub String);

/// Whether `err` was caused by a unique index violation.
#[must_use]
pub fn is_duplicate_key(err: &anyhow::Error) -> bool {
    err.downcast_ref::<DuplicateKey>().is_some()
}

pub(crate) fn write_error(err: DbErr, context: &'static str) -> anyhow::Error {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => DuplicateKey(detail).into(),
        _ => anyhow::Error::new(err).context(context),
    }
}

pub(crate) fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");
        if !in_memory {
            let path_str = db_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        // In-memory databases live and die with a single connection.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
            (max_connections, min_connections)
        };
        opt.max_connections(max_connections)
            .min_connections(min_connections);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn token_repo(&self) -> repositories::token::TokenRepository {
        repositories::token::TokenRepository::new(self.conn.clone())
    }

    fn category_repo(&self) -> repositories::category::CategoryRepository {
        repositories::category::CategoryRepository::new(self.conn.clone())
    }

    fn product_repo(&self) -> repositories::product::ProductRepository {
        repositories::product::ProductRepository::new(self.conn.clone())
    }

    fn cart_repo(&self) -> repositories::cart::CartRepository {
        repositories::cart::CartRepository::new(self.conn.clone())
    }

    // Users

    pub async fn insert_user(&self, user: NewUser) -> Result<User> {
        self.user_repo().insert(user).await
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.user_repo().get(id).await
    }

    pub async fn get_users_by_ids(&self, ids: &[String]) -> Result<Vec<User>> {
        self.user_repo().get_by_ids(ids).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    /// Returns the user together with the stored password digest.
    pub async fn get_user_credentials(&self, email: &str) -> Result<Option<(User, String)>> {
        self.user_repo().get_by_email_with_password(email).await
    }

    pub async fn list_users(&self, filter: UserFilter) -> Result<Vec<User>> {
        self.user_repo().list(filter).await
    }

    pub async fn update_user(&self, id: &str, patch: UserPatch) -> Result<Option<User>> {
        self.user_repo().update(id, patch).await
    }

    pub async fn delete_user(&self, id: &str) -> Result<bool> {
        self.user_repo().delete(id).await
    }

    pub async fn record_login(&self, id: &str) -> Result<()> {
        self.user_repo().record_login(id).await
    }

    // Tokens

    pub async fn insert_token(
        &self,
        user_id: &str,
        token: &str,
        kind: TokenKind,
    ) -> Result<TokenRecord> {
        self.token_repo().insert(user_id, token, kind).await
    }

    pub async fn delete_token(&self, token: &str) -> Result<bool> {
        self.token_repo().delete(token).await
    }

    // Categories

    pub async fn insert_category(&self, category: NewCategory) -> Result<Category> {
        self.category_repo().insert(category).await
    }

    pub async fn get_category(&self, id: &str) -> Result<Option<Category>> {
        self.category_repo().get(id).await
    }

    pub async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        self.category_repo().get_by_slug(slug).await
    }

    pub async fn get_categories_by_ids(&self, ids: &[String]) -> Result<Vec<Category>> {
        self.category_repo().get_by_ids(ids).await
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.category_repo().list().await
    }

    pub async fn category_slug_exists(&self, slug: &str) -> Result<bool> {
        self.category_repo().slug_exists(slug).await
    }

    pub async fn update_category(
        &self,
        id: &str,
        patch: CategoryPatch,
    ) -> Result<Option<Category>> {
        self.category_repo().update(id, patch).await
    }

    pub async fn delete_category_by_slug(&self, slug: &str) -> Result<bool> {
        self.category_repo().delete_by_slug(slug).await
    }

    /// Adds `product_id` to the category's product set. Returns `false` if already present.
    pub async fn push_category_product(&self, category_id: &str, product_id: &str) -> Result<bool> {
        self.category_repo()
            .modify_products(category_id, |ids| {
                if ids.iter().any(|id| id == product_id) {
                    false
                } else {
                    ids.push(product_id.to_string());
                    true
                }
            })
            .await
    }

    /// Removes `product_id` from the category's product set. Returns `false` if absent.
    pub async fn pull_category_product(&self, category_id: &str, product_id: &str) -> Result<bool> {
        self.category_repo()
            .modify_products(category_id, |ids| {
                let before = ids.len();
                ids.retain(|id| id != product_id);
                ids.len() != before
            })
            .await
    }

    pub async fn set_category_products(&self, category_id: &str, ids: Vec<String>) -> Result<bool> {
        self.category_repo()
            .modify_products(category_id, move |current| {
                if *current == ids {
                    false
                } else {
                    current.clone_from(&ids);
                    true
                }
            })
            .await
    }

    // Products

    pub async fn insert_product(&self, product: NewProduct) -> Result<Product> {
        self.product_repo().insert(product).await
    }

    pub async fn get_product_by_slug(&self, slug: &str) -> Result<Option<Product>> {
        self.product_repo().get_by_slug(slug).await
    }

    pub async fn product_slug_exists(&self, slug: &str) -> Result<bool> {
        self.product_repo().slug_exists(slug).await
    }

    /// Returns one page of products and the total count.
    pub async fn list_products(&self, page: PageRequest) -> Result<(Vec<Product>, u64)> {
        self.product_repo().list_page(page).await
    }

    pub async fn product_ids_in_category(&self, category_id: &str) -> Result<Vec<String>> {
        self.product_repo().ids_in_category(category_id).await
    }

    pub async fn update_product(&self, id: &str, patch: ProductPatch) -> Result<Option<Product>> {
        self.product_repo().update(id, patch).await
    }

    /// Deletes by slug and returns the removed record.
    pub async fn delete_product_by_slug(&self, slug: &str) -> Result<Option<Product>> {
        self.product_repo().delete_by_slug(slug).await
    }

    // Carts

    pub async fn get_cart(&self, user_id: &str) -> Result<Option<Cart>> {
        self.cart_repo().get_by_user(user_id).await
    }

    pub async fn list_carts(&self) -> Result<Vec<Cart>> {
        self.cart_repo().list().await
    }

    /// Creates the user's cart if needed and applies `apply` to its lines atomically.
    pub async fn modify_cart<F>(&self, user_id: &str, apply: F) -> Result<Cart>
    where
        F: Fn(&mut Vec<CartLine>) + Send + Sync,
    {
        self.cart_repo().modify_lines(user_id, apply).await
    }
}
