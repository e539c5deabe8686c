use std::sync::Arc;

use common::storage::FileStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub file_store: Arc<dyn FileStore>,
    pub config: Arc<AppConfig>,
}
