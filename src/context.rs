/// Application context and dependency injection
use crate::{
    config::ServerConfig,
    db,
    error::ApiResult,
    rate_limit::RateLimiter,
    store::{
        RequestLinkStore, SpaceStore, TemplateStore, TestimonialStore, UserStore, WidgetStore,
    },
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub users: Arc<UserStore>,
    pub spaces: Arc<SpaceStore>,
    pub templates: Arc<TemplateStore>,
    pub links: Arc<RequestLinkStore>,
    pub testimonials: Arc<TestimonialStore>,
    pub widgets: Arc<WidgetStore>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> ApiResult<Self> {
        config.validate()?;

        if !config.storage.data_directory.exists() {
            tokio::fs::create_dir_all(&config.storage.data_directory).await?;
        }

        let pool = db::create_pool(&config.storage.database, db::DatabaseOptions::default())
            .await?;
        db::run_migrations(&pool).await?;
        db::test_connection(&pool).await?;

        Ok(Self::with_pool(config, pool))
    }

    /// Wire the stores over an existing pool. Tests use this with an
    /// in-memory database.
    pub fn with_pool(config: ServerConfig, pool: SqlitePool) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limit));

        Self {
            config: Arc::new(config),
            users: Arc::new(UserStore::new(pool.clone())),
            spaces: Arc::new(SpaceStore::new(pool.clone())),
            templates: Arc::new(TemplateStore::new(pool.clone())),
            links: Arc::new(RequestLinkStore::new(pool.clone())),
            testimonials: Arc::new(TestimonialStore::new(pool.clone())),
            widgets: Arc::new(WidgetStore::new(pool.clone())),
            db: pool,
            rate_limiter,
        }
    }

    /// Externally reachable service URL
    pub fn public_url(&self) -> &str {
        self.config.service.public_url.trim_end_matches('/')
    }
}
