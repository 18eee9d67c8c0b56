use std::path::PathBuf;
use std::sync::Arc;

use tracing::error;

use showroom_db::Database;

use crate::error::{ApiError, ApiResult};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub uploads_dir: PathBuf,
}

impl AppStateInner {
    pub fn new(db: Database, jwt_secret: impl Into<String>, uploads_dir: impl Into<PathBuf>) -> AppState {
        Arc::new(Self {
            db,
            jwt_secret: jwt_secret.into(),
            uploads_dir: uploads_dir.into(),
        })
    }
}

/// Run store work (and password hashing) off the async runtime.
pub async fn with_db<T, F>(state: &AppState, f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&Database) -> ApiResult<T> + Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal("task join failed".to_string())
        })?
}
