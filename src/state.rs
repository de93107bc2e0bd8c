use std::sync::Arc;

use crate::{
    audit::AuditLogger,
    cart::MemoryCartStore,
    config::AppConfig,
    db::{self, JsonStore, StoreResult},
    models::{MenuItem, Order, Product, Restaurant, User},
    repository::Repository,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<Repository<User>>,
    pub restaurants: Arc<Repository<Restaurant>>,
    pub menu_items: Arc<Repository<MenuItem>>,
    pub orders: Arc<Repository<Order>>,
    pub products: Arc<Repository<Product>>,
    pub audit: AuditLogger,
    /// Marketplace carts, keyed by the signed-in user.
    pub menu_carts: Arc<MemoryCartStore>,
    /// Snack shop carts, keyed by the signed-in user.
    pub shop_carts: Arc<MemoryCartStore>,
}

impl AppState {
    /// Open the data directory, creating any missing collection document.
    pub async fn open(config: AppConfig) -> StoreResult<Self> {
        let store = JsonStore::new(&config.data_dir);
        db::initialize(&store).await?;

        Ok(Self {
            users: Arc::new(Repository::new(store.clone())),
            restaurants: Arc::new(Repository::new(store.clone())),
            menu_items: Arc::new(Repository::new(store.clone())),
            orders: Arc::new(Repository::new(store.clone())),
            products: Arc::new(Repository::new(store.clone())),
            audit: AuditLogger::new(Repository::new(store)),
            menu_carts: Arc::new(MemoryCartStore::default()),
            shop_carts: Arc::new(MemoryCartStore::default()),
            config: Arc::new(config),
        })
    }
}
