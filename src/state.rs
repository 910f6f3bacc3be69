use std::sync::Arc;
use tracing::info;

use crate::auth::TokenAuthority;
use crate::config::Config;
use crate::db::Store;
use crate::domain::Role;
use crate::services::{
    Argon2Hasher, AuthService, BacklinkStore, CartService, CategoryService,
    ConsistencyCoordinator, Hasher, ProductService, SeaOrmAuthService, SeaOrmCartService,
    SeaOrmCategoryService, SeaOrmProductService, SeaOrmUserService, UserService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub tokens: TokenAuthority,

    pub coordinator: ConsistencyCoordinator,

    /// Id of the seeded anonymous user, the owner of unauthenticated writes.
    pub anonymous_id: String,

    pub auth_service: Arc<dyn AuthService>,

    pub user_service: Arc<dyn UserService>,

    pub category_service: Arc<dyn CategoryService>,

    pub product_service: Arc<dyn ProductService>,

    pub cart_service: Arc<dyn CartService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::with_backlink_store(config, None).await
    }

    /// Builds the state, optionally routing backlink writes through `backlinks`
    /// instead of the database.
    pub async fn with_backlink_store(
        config: Config,
        backlinks: Option<Arc<dyn BacklinkStore>>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let hasher: Arc<dyn Hasher> = Arc::new(Argon2Hasher::new(config.security.clone()));
        let tokens = TokenAuthority::from_config(&config.auth);

        let backlinks = backlinks.unwrap_or_else(|| Arc::new(store.clone()));
        let coordinator = ConsistencyCoordinator::start(backlinks);

        let user_service: Arc<dyn UserService> =
            Arc::new(SeaOrmUserService::new(store.clone(), hasher.clone()));

        let anonymous = user_service
            .ensure_seeded(&config.bootstrap.anonymous, Role::Customer)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to seed anonymous user: {e}"))?;

        if let Some(admin) = &config.bootstrap.super_admin {
            user_service
                .ensure_seeded(admin, Role::SuperAdmin)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to seed super admin: {e}"))?;
        }
        info!(anonymous_id = %anonymous.id, "Bootstrap users ready");

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            user_service.clone(),
            hasher,
            tokens.clone(),
            config.auth.token_lifetime_ms,
        )) as Arc<dyn AuthService>;

        let category_service =
            Arc::new(SeaOrmCategoryService::new(store.clone())) as Arc<dyn CategoryService>;

        let product_service = Arc::new(SeaOrmProductService::new(
            store.clone(),
            coordinator.clone(),
            anonymous.id.clone(),
        )) as Arc<dyn ProductService>;

        let cart_service = Arc::new(SeaOrmCartService::new(store.clone(), anonymous.id.clone()))
            as Arc<dyn CartService>;

        Ok(Self {
            config: Arc::new(config),
            store,
            tokens,
            coordinator,
            anonymous_id: anonymous.id,
            auth_service,
            user_service,
            category_service,
            product_service,
            cart_service,
        })
    }
}
