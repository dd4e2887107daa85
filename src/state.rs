use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::settings::AppConfig;
use crate::infrastructure::db::pool::DbPool;
use crate::infrastructure::storage::ObjectStore;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
    pub storage: Arc<dyn ObjectStore>,
    /// Cancelled on shutdown; uploads run under child tokens.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: DbPool,
        storage: Arc<dyn ObjectStore>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config,
            db,
            storage,
            shutdown,
        }
    }
}
