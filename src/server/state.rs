use std::sync::Arc;

use crate::config::SearchOptions;
use crate::db::Database;

/// Application state
pub struct AppState {
    /// Database connection pool
    pub db: Database,
    /// Defaults for queries that leave them out
    pub search: SearchOptions,
}

impl AppState {
    pub fn new(db: Database, search: SearchOptions) -> Arc<Self> {
        Arc::new(AppState { db, search })
    }
}
