use std::sync::Arc;

use extapi_bulk::BatchConfig;
use extapi_store::RecordStore;

use crate::auth::{AuthProvider, StoreAuth};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub batch: Arc<BatchConfig>,
}

impl AppState {
    /// State that authenticates against `store` itself.
    pub fn new(store: Arc<dyn RecordStore>, batch: BatchConfig) -> Self {
        Self {
            auth: Arc::new(StoreAuth::new(Arc::clone(&store))),
            store,
            batch: Arc::new(batch),
        }
    }

    pub fn with_auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = auth;
        self
    }
}
