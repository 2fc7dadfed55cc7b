use std::sync::Arc;

use tokio::net::TcpListener;

use extapi_store::{Fixture, InMemoryRecordStore};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router_with_body_limit;
use crate::state::AppState;

/// The extapi HTTP server.
pub struct ExtApiServer {
    config: ServerConfig,
    state: AppState,
}

impl ExtApiServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Build a server over an in-memory store, seeded from the configured
    /// fixture when there is one.
    pub fn from_config(config: ServerConfig) -> ServerResult<Self> {
        let store = InMemoryRecordStore::new();
        if let Some(path) = &config.fixture {
            Fixture::load(path)?.apply(&store)?;
            tracing::info!(fixture = %path.display(), stats = ?store.stats(), "fixture loaded");
        }
        let state = AppState::new(Arc::new(store), config.batch.clone());
        Ok(Self::new(config, state))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router_with_body_limit(self.state.clone(), self.config.body_limit)
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            addr = %self.config.bind_addr,
            max_batch = self.config.batch.max_items,
            "extapi server listening"
        );
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
