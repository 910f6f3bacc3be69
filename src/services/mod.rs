pub mod password;
pub use password::{Argon2Hasher, Hasher};

pub mod slug;

pub mod propagation;
pub use propagation::{BacklinkEvent, BacklinkStore, ConsistencyCoordinator};

pub mod auth_service;
pub use auth_service::{AuthError, AuthService};

pub mod auth_service_impl;
pub use auth_service_impl::SeaOrmAuthService;

pub mod user_service;
pub use user_service::{AccountUpdate, NewAccount, UserError, UserService};

pub mod user_service_impl;
pub use user_service_impl::SeaOrmUserService;

pub mod category_service;
pub use category_service::{CatalogError, CategoryInput, CategoryService, CategoryUpdate};

pub mod category_service_impl;
pub use category_service_impl::SeaOrmCategoryService;

pub mod product_service;
pub use product_service::{ProductInput, ProductService, ProductUpdate};

pub mod product_service_impl;
pub use product_service_impl::SeaOrmProductService;

pub mod cart_service;
pub use cart_service::{CartError, CartService};

pub mod cart_service_impl;
pub use cart_service_impl::SeaOrmCartService;
